//! Normalized transactions and the ledger export
//!
//! The CSV layout (`Date, Narration, RefNo, Debit, Credit, Balance`) is what
//! accounting imports consume; changing it breaks them.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::io::Write;

use crate::error::ConvertError;
use crate::normalize::format_iso_date;

/// Column order of the exported ledger
pub const CSV_COLUMNS: [&str; 6] = ["Date", "Narration", "RefNo", "Debit", "Credit", "Balance"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub date: NaiveDate,
    pub narration: String,
    pub reference: String,
    /// Withdrawal amount, never negative
    pub debit: Decimal,
    /// Deposit amount, never negative
    pub credit: Decimal,
    /// Always empty; running balances are left to the importing software
    pub balance: String,
}

impl Transaction {
    pub fn iso_date(&self) -> String {
        format_iso_date(self.date)
    }
}

/// Transactions in page order, then row order within a page
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TransactionLedger {
    transactions: Vec<Transaction>,
}

impl TransactionLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, transaction: Transaction) {
        self.transactions.push(transaction);
    }

    pub fn extend(&mut self, transactions: impl IntoIterator<Item = Transaction>) {
        self.transactions.extend(transactions);
    }

    pub fn len(&self) -> usize {
        self.transactions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transactions.is_empty()
    }

    pub fn transactions(&self) -> &[Transaction] {
        &self.transactions
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Transaction> {
        self.transactions.iter()
    }

    pub fn into_vec(self) -> Vec<Transaction> {
        self.transactions
    }

    /// Total withdrawals and deposits
    pub fn totals(&self) -> (Decimal, Decimal) {
        self.transactions
            .iter()
            .fold((Decimal::ZERO, Decimal::ZERO), |(dr, cr), t| {
                (dr + t.debit, cr + t.credit)
            })
    }

    /// Write the ledger as CSV, header row first
    pub fn write_csv<W: Write>(&self, writer: W) -> Result<(), ConvertError> {
        let mut wtr = csv::Writer::from_writer(writer);
        wtr.write_record(CSV_COLUMNS)?;
        for t in &self.transactions {
            wtr.write_record([
                t.iso_date(),
                t.narration.clone(),
                t.reference.clone(),
                format_amount(t.debit),
                format_amount(t.credit),
                t.balance.clone(),
            ])?;
        }
        wtr.flush().map_err(|e| ConvertError::Csv(e.to_string()))?;
        Ok(())
    }

    pub fn to_csv_bytes(&self) -> Result<Vec<u8>, ConvertError> {
        let mut buffer = Vec::new();
        self.write_csv(&mut buffer)?;
        Ok(buffer)
    }
}

impl IntoIterator for TransactionLedger {
    type Item = Transaction;
    type IntoIter = std::vec::IntoIter<Transaction>;

    fn into_iter(self) -> Self::IntoIter {
        self.transactions.into_iter()
    }
}

impl<'a> IntoIterator for &'a TransactionLedger {
    type Item = &'a Transaction;
    type IntoIter = std::slice::Iter<'a, Transaction>;

    fn into_iter(self) -> Self::IntoIter {
        self.transactions.iter()
    }
}

/// Shortest decimal form with at least one fractional digit: `500.0`, `1234.5`
pub fn format_amount(amount: Decimal) -> String {
    let normalized = amount.normalize();
    if normalized.scale() == 0 {
        format!("{}.0", normalized)
    } else {
        normalized.to_string()
    }
}
