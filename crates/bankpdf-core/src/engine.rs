//! Conversion entry point
//!
//! The pipeline is institution check, unlock, table location, then ledger
//! assembly. Every call is independent: the engine holds only its locator.

use rust_decimal::Decimal;
use serde::Serialize;
use std::time::Instant;
use tracing::info;

use crate::assemble::assemble_ledger;
use crate::decrypt::unlock;
use crate::error::ConvertError;
use crate::institution::Institution;
use crate::ledger::TransactionLedger;
use crate::locator::{LayoutTableLocator, TableLocator};

#[derive(Debug, Clone, Serialize)]
pub struct ConversionMetrics {
    pub input_size_bytes: usize,
    pub page_count: u32,
    pub grid_count: u32,
    pub transaction_count: u32,
    pub total_debit: Decimal,
    pub total_credit: Decimal,
    pub processing_time_ms: u64,
}

pub struct StatementEngine<L = LayoutTableLocator> {
    locator: L,
}

impl StatementEngine<LayoutTableLocator> {
    pub fn new() -> Self {
        Self::with_locator(LayoutTableLocator::default())
    }
}

impl Default for StatementEngine<LayoutTableLocator> {
    fn default() -> Self {
        Self::new()
    }
}

impl<L: TableLocator> StatementEngine<L> {
    pub fn with_locator(locator: L) -> Self {
        Self { locator }
    }

    pub fn locator(&self) -> &L {
        &self.locator
    }

    /// Convert a statement for the institution named by `institution_code`
    ///
    /// Unsupported codes are rejected before the document is touched.
    pub fn convert(
        &self,
        document: &[u8],
        institution_code: &str,
        password: Option<&str>,
    ) -> Result<TransactionLedger, ConvertError> {
        let institution = Institution::from_code(institution_code)?;
        self.convert_for(document, institution, password)
            .map(|(ledger, _)| ledger)
    }

    /// Convert for a resolved institution, reporting what was processed
    pub fn convert_for(
        &self,
        document: &[u8],
        institution: Institution,
        password: Option<&str>,
    ) -> Result<(TransactionLedger, ConversionMetrics), ConvertError> {
        let start = Instant::now();

        let unlocked = unlock(document, password)?;
        let pages = self.locator.locate_tables(&unlocked)?;
        let ledger = assemble_ledger(&pages, institution.profile())?;

        let (total_debit, total_credit) = ledger.totals();
        let metrics = ConversionMetrics {
            input_size_bytes: document.len(),
            page_count: pages.len() as u32,
            grid_count: pages.iter().map(|p| p.grids.len() as u32).sum(),
            transaction_count: ledger.len() as u32,
            total_debit,
            total_credit,
            processing_time_ms: start.elapsed().as_millis() as u64,
        };
        info!(
            institution = %institution,
            backend = self.locator.name(),
            pages = metrics.page_count,
            grids = metrics.grid_count,
            transactions = metrics.transaction_count,
            total_debit = %metrics.total_debit,
            total_credit = %metrics.total_credit,
            "Converted statement"
        );

        Ok((ledger, metrics))
    }
}

/// Convert with the default layout-based locator
pub fn convert(
    document: &[u8],
    institution_code: &str,
    password: Option<&str>,
) -> Result<TransactionLedger, ConvertError> {
    StatementEngine::new().convert(document, institution_code, password)
}
