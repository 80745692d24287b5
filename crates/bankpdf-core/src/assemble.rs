//! Row filtering and ledger assembly
//!
//! Turns detected grids into transactions. Row-level problems never abort a
//! conversion: a bad row is traced with its [`MalformedRow`] reason and
//! skipped.

use rust_decimal::Decimal;
use tracing::{debug, trace};

use crate::error::{ConvertError, MalformedRow};
use crate::grid::{Grid, PageGrids};
use crate::header::{resolve_header, CanonicalField, HeaderMap};
use crate::institution::InstitutionProfile;
use crate::ledger::{Transaction, TransactionLedger};
use crate::normalize::{parse_amount, parse_date};

/// Cell text for a resolved field; missing fields and short rows give `None`
fn cell<'a>(row: &'a [String], map: &HeaderMap, field: CanonicalField) -> Option<&'a str> {
    map.get(field)
        .and_then(|i| row.get(i))
        .map(String::as_str)
}

fn amount(row: &[String], map: &HeaderMap, field: CanonicalField) -> Decimal {
    cell(row, map, field)
        .and_then(|text| parse_amount(text))
        .map(|d| d.abs())
        .unwrap_or(Decimal::ZERO)
}

fn is_summary_row(narration: &str, profile: &InstitutionProfile) -> bool {
    let lowered = narration.to_lowercase();
    profile
        .summary_markers
        .iter()
        .any(|marker| lowered.contains(marker))
}

/// Normalize one data row, or say why it is not a transaction
pub fn assemble_row(
    row: &[String],
    map: &HeaderMap,
    profile: &InstitutionProfile,
) -> Result<Transaction, MalformedRow> {
    let date = cell(row, map, CanonicalField::Date).and_then(parse_date);
    let narration = cell(row, map, CanonicalField::Narration)
        .unwrap_or("")
        .trim()
        .to_string();
    let reference = cell(row, map, CanonicalField::Reference)
        .unwrap_or("")
        .trim()
        .to_string();
    let debit = amount(row, map, CanonicalField::Debit);
    let credit = amount(row, map, CanonicalField::Credit);

    let date = date.ok_or(MalformedRow::MissingDate)?;

    let has_content = !debit.is_zero()
        || !credit.is_zero()
        || !narration.is_empty()
        || !reference.is_empty();
    if !has_content {
        return Err(MalformedRow::NoContent);
    }

    if is_summary_row(&narration, profile) {
        return Err(MalformedRow::SummaryRow);
    }

    let narration = if narration.is_empty() {
        reference.clone()
    } else {
        narration
    };

    Ok(Transaction {
        date,
        narration,
        reference,
        debit,
        credit,
        balance: String::new(),
    })
}

/// Transactions from one grid, or `None` when it is not a transaction table
pub fn assemble_grid(grid: &Grid, profile: &InstitutionProfile) -> Option<Vec<Transaction>> {
    if !grid.has_data() {
        return None;
    }
    let header = grid.header()?;
    let map = resolve_header(header, &profile.aliases);
    if !map.is_transaction_table() {
        debug!(?header, "Skipping grid without date and amount columns");
        return None;
    }

    let mut out = Vec::with_capacity(grid.data_rows().len());
    for (i, row) in grid.data_rows().iter().enumerate() {
        match assemble_row(row, &map, profile) {
            Ok(txn) => out.push(txn),
            Err(reason) => trace!(row = i + 1, %reason, "Dropping row"),
        }
    }
    Some(out)
}

/// Build the ledger from every grid on every page, in order
///
/// Fails with `NoTableFound` when no grid has a data row and with
/// `NoTransactionsExtracted` when grids exist but none yields a row.
pub fn assemble_ledger(
    pages: &[PageGrids],
    profile: &InstitutionProfile,
) -> Result<TransactionLedger, ConvertError> {
    let grid_count = pages
        .iter()
        .flat_map(|p| &p.grids)
        .filter(|g| g.has_data())
        .count();
    if grid_count == 0 {
        return Err(ConvertError::NoTableFound);
    }

    let mut ledger = TransactionLedger::new();
    for page in pages {
        for grid in &page.grids {
            if let Some(txns) = assemble_grid(grid, profile) {
                debug!(
                    page = page.page_number,
                    rows = grid.data_rows().len(),
                    kept = txns.len(),
                    "Assembled grid"
                );
                ledger.extend(txns);
            }
        }
    }

    if ledger.is_empty() {
        return Err(ConvertError::NoTransactionsExtracted);
    }
    Ok(ledger)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::institution::HDFC_PROFILE;
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;

    const HEADER: [&str; 5] = [
        "Date",
        "Narration",
        "Chq/Ref No.",
        "Withdrawal Amt.",
        "Deposit Amt.",
    ];

    fn row(cells: &[&str]) -> Vec<String> {
        cells.iter().map(|c| c.to_string()).collect()
    }

    fn header_map() -> HeaderMap {
        resolve_header(&HEADER, &HDFC_PROFILE.aliases)
    }

    fn grid(rows: &[&[&str]]) -> Grid {
        let mut all = vec![HEADER.to_vec()];
        all.extend(rows.iter().map(|r| r.to_vec()));
        Grid::from_rows(all)
    }

    #[test]
    fn test_assemble_atm_withdrawal() {
        let txn = assemble_row(
            &row(&["01/04/2024", "ATM WDL", "", "500.00", ""]),
            &header_map(),
            &HDFC_PROFILE,
        )
        .unwrap();
        assert_eq!(
            txn,
            Transaction {
                date: NaiveDate::from_ymd_opt(2024, 4, 1).unwrap(),
                narration: "ATM WDL".into(),
                reference: "".into(),
                debit: Decimal::new(500, 0),
                credit: Decimal::ZERO,
                balance: "".into(),
            }
        );
    }

    #[test]
    fn test_row_without_date_is_dropped() {
        let err = assemble_row(
            &row(&["", "continued narration", "", "", ""]),
            &header_map(),
            &HDFC_PROFILE,
        )
        .unwrap_err();
        assert_eq!(err, MalformedRow::MissingDate);
    }

    #[test]
    fn test_row_without_content_is_dropped() {
        let err = assemble_row(
            &row(&["01/04/2024", "  ", "", "-", "0.00"]),
            &header_map(),
            &HDFC_PROFILE,
        )
        .unwrap_err();
        assert_eq!(err, MalformedRow::NoContent);
    }

    #[test]
    fn test_total_rows_are_dropped_in_any_case() {
        for narration in ["Total", "TOTAL", "Grand total", "Page Totals"] {
            let err = assemble_row(
                &row(&["31/03/2024", narration, "", "1,000.00", "2,000.00"]),
                &header_map(),
                &HDFC_PROFILE,
            )
            .unwrap_err();
            assert_eq!(err, MalformedRow::SummaryRow);
        }
    }

    #[test]
    fn test_empty_narration_falls_back_to_reference() {
        let txn = assemble_row(
            &row(&["02/04/2024", "", " UTR123 ", "", "250"]),
            &header_map(),
            &HDFC_PROFILE,
        )
        .unwrap();
        assert_eq!(txn.narration, "UTR123");
        assert_eq!(txn.reference, "UTR123");
        assert_eq!(txn.credit, Decimal::new(250, 0));
    }

    #[test]
    fn test_short_row_degrades_to_missing_cells() {
        let txn = assemble_row(&row(&["03/04/2024", "NEFT IN"]), &header_map(), &HDFC_PROFILE)
            .unwrap();
        assert_eq!(txn.narration, "NEFT IN");
        assert_eq!(txn.debit, Decimal::ZERO);
        assert_eq!(txn.credit, Decimal::ZERO);
    }

    #[test]
    fn test_malformed_amount_does_not_abort_row() {
        let txn = assemble_row(
            &row(&["04/04/2024", "POS PURCHASE", "", "12O.00", ""]),
            &header_map(),
            &HDFC_PROFILE,
        )
        .unwrap();
        assert_eq!(txn.debit, Decimal::ZERO);
        assert_eq!(txn.narration, "POS PURCHASE");
    }

    #[test]
    fn test_negative_amounts_are_stored_as_magnitude() {
        let txn = assemble_row(
            &row(&["05/04/2024", "REVERSAL", "", "-75.50", ""]),
            &header_map(),
            &HDFC_PROFILE,
        )
        .unwrap();
        assert_eq!(txn.debit, Decimal::new(7550, 2));
    }

    #[test]
    fn test_grid_without_amount_columns_is_skipped() {
        let g = Grid::from_rows([
            vec!["Date", "Narration", "Closing Balance"],
            vec!["01/04/2024", "ATM WDL", "1000.00"],
        ]);
        assert!(assemble_grid(&g, &HDFC_PROFILE).is_none());
    }

    #[test]
    fn test_header_only_grid_is_skipped() {
        let g = Grid::from_rows([HEADER.to_vec()]);
        assert!(assemble_grid(&g, &HDFC_PROFILE).is_none());
    }

    #[test]
    fn test_ledger_preserves_page_and_row_order() {
        let pages = vec![
            PageGrids::new(
                1,
                vec![grid(&[
                    &["02/04/2024", "B", "", "2", ""],
                    &["01/04/2024", "A", "", "1", ""],
                ])],
            ),
            PageGrids::new(2, vec![grid(&[&["01/03/2024", "C", "", "", "3"]])]),
        ];
        let ledger = assemble_ledger(&pages, &HDFC_PROFILE).unwrap();
        let narrations: Vec<&str> = ledger.iter().map(|t| t.narration.as_str()).collect();
        assert_eq!(narrations, vec!["B", "A", "C"]);
    }

    #[test]
    fn test_no_grids_is_no_table_found() {
        let pages = vec![PageGrids::new(1, vec![]), PageGrids::new(2, vec![])];
        assert_eq!(
            assemble_ledger(&pages, &HDFC_PROFILE).unwrap_err(),
            ConvertError::NoTableFound
        );
        assert_eq!(
            assemble_ledger(&[], &HDFC_PROFILE).unwrap_err(),
            ConvertError::NoTableFound
        );
    }

    #[test]
    fn test_header_only_grids_are_no_table_found() {
        let pages = vec![
            PageGrids::new(1, vec![Grid::from_rows([HEADER.to_vec()])]),
            PageGrids::new(2, vec![Grid::new(vec![])]),
        ];
        assert_eq!(
            assemble_ledger(&pages, &HDFC_PROFILE).unwrap_err(),
            ConvertError::NoTableFound
        );
    }

    #[test]
    fn test_grids_without_rows_is_no_transactions() {
        let pages = vec![PageGrids::new(
            1,
            vec![grid(&[&["31/03/2024", "Total", "", "10", "20"]])],
        )];
        assert_eq!(
            assemble_ledger(&pages, &HDFC_PROFILE).unwrap_err(),
            ConvertError::NoTransactionsExtracted
        );
    }
}
