//! Header row resolution
//!
//! Maps the free-text column headers of a detected table to the fixed set of
//! fields the assembler understands.

use serde::{Deserialize, Serialize};

use crate::institution::AliasTable;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CanonicalField {
    Date,
    Narration,
    Reference,
    Debit,
    Credit,
}

impl CanonicalField {
    /// Enumeration order; earlier fields claim a column first
    pub const ALL: &'static [CanonicalField] = &[
        CanonicalField::Date,
        CanonicalField::Narration,
        CanonicalField::Reference,
        CanonicalField::Debit,
        CanonicalField::Credit,
    ];

    fn slot(self) -> usize {
        match self {
            CanonicalField::Date => 0,
            CanonicalField::Narration => 1,
            CanonicalField::Reference => 2,
            CanonicalField::Debit => 3,
            CanonicalField::Credit => 4,
        }
    }
}

/// Partial mapping from field to column index within one grid
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HeaderMap {
    columns: [Option<usize>; 5],
}

impl HeaderMap {
    pub fn get(&self, field: CanonicalField) -> Option<usize> {
        self.columns[field.slot()]
    }

    pub fn set(&mut self, field: CanonicalField, column: usize) {
        self.columns[field.slot()] = Some(column);
    }

    /// Resolved fields with their columns, in enumeration order
    pub fn iter(&self) -> impl Iterator<Item = (CanonicalField, usize)> + '_ {
        CanonicalField::ALL
            .iter()
            .filter_map(|&field| self.get(field).map(|col| (field, col)))
    }

    /// A transaction table needs a date column and at least one amount column
    pub fn is_transaction_table(&self) -> bool {
        self.get(CanonicalField::Date).is_some()
            && (self.get(CanonicalField::Debit).is_some()
                || self.get(CanonicalField::Credit).is_some())
    }
}

/// Resolve a header row against an institution's alias table
///
/// Each cell is trimmed and lower-cased; a field matches a cell when any of
/// its aliases is a substring of it. Fields are resolved in enumeration order,
/// each taking the leftmost matching column not already claimed by an earlier
/// field.
pub fn resolve_header<S: AsRef<str>>(header_row: &[S], aliases: &AliasTable) -> HeaderMap {
    let lowered: Vec<String> = header_row
        .iter()
        .map(|cell| cell.as_ref().trim().to_lowercase())
        .collect();

    let mut map = HeaderMap::default();
    let mut claimed = vec![false; lowered.len()];

    for &field in CanonicalField::ALL {
        let candidates = aliases.aliases(field);
        let hit = lowered.iter().enumerate().find(|(i, cell)| {
            !claimed[*i] && candidates.iter().any(|alias| cell.contains(alias))
        });
        if let Some((i, _)) = hit {
            claimed[i] = true;
            map.set(field, i);
        }
    }

    map
}
