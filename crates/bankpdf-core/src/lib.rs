//! Bank statement PDF to ledger conversion
//!
//! This crate turns bank statement PDFs into a normalized transaction ledger:
//! - `decrypt`: strips password protection with lopdf
//! - `locator`: finds tables on each page (layout analysis by default)
//! - `header`: maps header cells to canonical fields per institution
//! - `normalize`: parses statement dates and amounts
//! - `assemble`: filters rows and builds the ordered ledger
//!
//! ```no_run
//! let pdf = std::fs::read("statement.pdf").unwrap();
//! let ledger = bankpdf_core::convert(&pdf, "HDFC", Some("secret")).unwrap();
//! let csv = ledger.to_csv_bytes().unwrap();
//! ```

pub mod assemble;
pub mod decrypt;
pub mod engine;
pub mod error;
pub mod grid;
pub mod header;
pub mod institution;
pub mod ledger;
pub mod locator;
pub mod normalize;

pub use decrypt::unlock;
pub use engine::{convert, ConversionMetrics, StatementEngine};
pub use error::{ConvertError, MalformedRow};
pub use grid::{Grid, PageGrids};
pub use header::{resolve_header, CanonicalField, HeaderMap};
pub use institution::{Institution, InstitutionProfile};
pub use ledger::{Transaction, TransactionLedger, CSV_COLUMNS};
pub use locator::{LayoutTableLocator, LocatorSettings, StaticTableLocator, TableLocator};
pub use normalize::{parse_amount, parse_date};
