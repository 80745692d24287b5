//! Table location backends
//!
//! [`TableLocator`] is the seam between the engine and whatever finds tables
//! in a document. The default [`LayoutTableLocator`] reads text positions out
//! of the page content streams; [`StaticTableLocator`] serves grids that were
//! produced elsewhere (another layout engine, an OCR pass, test fixtures).

pub mod content;
pub mod layout;

use tracing::debug;

use crate::decrypt::{is_protected, load_document, open_protected};
use crate::error::ConvertError;
use crate::grid::{Grid, PageGrids};

pub use content::TextRun;

/// Finds tables in a document
pub trait TableLocator {
    /// Backend identifier
    fn name(&self) -> &'static str;

    /// Grids per page, in page order
    ///
    /// Pages without tables yield an empty entry. A document without any
    /// grid is reported as `NoTableFound`.
    fn locate_tables(&self, document: &[u8]) -> Result<Vec<PageGrids>, ConvertError>;
}

/// Tuning for layout-based detection
#[derive(Debug, Clone)]
pub struct LocatorSettings {
    /// Baselines closer than this (in points) share a line
    pub line_tolerance: f64,
    /// Runs closer than this many font sizes merge into one cell
    pub fragment_gap: f64,
    /// Single-cell lines tolerated inside a table before it ends
    pub max_interruptions: usize,
    /// Vertical gap, in font sizes, that ends a table
    pub max_row_gap: f64,
    /// Minimum lines (header included) for a table
    pub min_rows: usize,
    /// Fold wrapped cell text into the row above
    pub merge_continuation_lines: bool,
}

impl Default for LocatorSettings {
    fn default() -> Self {
        Self {
            line_tolerance: 2.0,
            fragment_gap: 1.0,
            max_interruptions: 1,
            max_row_gap: 3.0,
            min_rows: 2,
            merge_continuation_lines: true,
        }
    }
}

/// Layout analysis over lopdf content streams
#[derive(Debug, Clone, Default)]
pub struct LayoutTableLocator {
    settings: LocatorSettings,
}

impl LayoutTableLocator {
    pub fn new(settings: LocatorSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &LocatorSettings {
        &self.settings
    }
}

impl TableLocator for LayoutTableLocator {
    fn name(&self) -> &'static str {
        "layout"
    }

    fn locate_tables(&self, document: &[u8]) -> Result<Vec<PageGrids>, ConvertError> {
        let mut doc = load_document(document, ConvertError::PasswordRequired)?;
        if is_protected(&doc) {
            open_protected(&mut doc, "")?;
        }

        let mut pages = Vec::new();
        for (&page_number, &page_id) in doc.get_pages().iter() {
            let runs = content::page_text_runs(&doc, page_id);
            let grids = layout::grids_from_runs(&runs, &self.settings);
            debug!(page = page_number, runs = runs.len(), grids = grids.len(), "Scanned page");
            pages.push(PageGrids::new(page_number, grids));
        }

        if pages.iter().all(|p| p.grids.is_empty()) {
            return Err(ConvertError::NoTableFound);
        }
        Ok(pages)
    }
}

/// Serves a fixed set of grids regardless of the document bytes
#[derive(Debug, Clone, Default)]
pub struct StaticTableLocator {
    pages: Vec<PageGrids>,
}

impl StaticTableLocator {
    pub fn new(pages: Vec<PageGrids>) -> Self {
        Self { pages }
    }

    /// All grids on a single page
    pub fn single_page(grids: Vec<Grid>) -> Self {
        Self::new(vec![PageGrids::new(1, grids)])
    }
}

impl TableLocator for StaticTableLocator {
    fn name(&self) -> &'static str {
        "static"
    }

    fn locate_tables(&self, _document: &[u8]) -> Result<Vec<PageGrids>, ConvertError> {
        if self.pages.iter().all(|p| p.grids.is_empty()) {
            return Err(ConvertError::NoTableFound);
        }
        Ok(self.pages.clone())
    }
}

impl<T: TableLocator + ?Sized> TableLocator for &T {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn locate_tables(&self, document: &[u8]) -> Result<Vec<PageGrids>, ConvertError> {
        (**self).locate_tables(document)
    }
}

impl<T: TableLocator + ?Sized> TableLocator for Box<T> {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn locate_tables(&self, document: &[u8]) -> Result<Vec<PageGrids>, ConvertError> {
        (**self).locate_tables(document)
    }
}
