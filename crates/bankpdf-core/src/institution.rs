//! Supported institutions and their statement profiles
//!
//! Each institution maps to an [`InstitutionProfile`]: the header aliases used
//! to find its transaction tables and the markers of its summary rows. Adding
//! an institution means adding a variant and a profile; row assembly does not
//! change.

use serde::{Deserialize, Serialize};

use crate::error::ConvertError;
use crate::header::CanonicalField;

/// Lower-cased alias substrings for each canonical field
#[derive(Debug, Clone, Copy)]
pub struct AliasTable {
    pub date: &'static [&'static str],
    pub narration: &'static [&'static str],
    pub reference: &'static [&'static str],
    pub debit: &'static [&'static str],
    pub credit: &'static [&'static str],
}

impl AliasTable {
    pub fn aliases(&self, field: CanonicalField) -> &'static [&'static str] {
        match field {
            CanonicalField::Date => self.date,
            CanonicalField::Narration => self.narration,
            CanonicalField::Reference => self.reference,
            CanonicalField::Debit => self.debit,
            CanonicalField::Credit => self.credit,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct InstitutionProfile {
    pub aliases: AliasTable,
    /// Narrations containing any of these (case-insensitive) are summary rows
    pub summary_markers: &'static [&'static str],
}

pub const HDFC_PROFILE: InstitutionProfile = InstitutionProfile {
    aliases: AliasTable {
        date: &["date", "txn date", "transaction date"],
        narration: &["narration", "description", "particulars", "remarks"],
        reference: &[
            "chq/ref no.",
            "ref no.",
            "cheque no",
            "cheque/ref no",
            "utr no",
            "rrn",
        ],
        debit: &[
            "withdrawal amt.",
            "withdrawal amount",
            "debit",
            "withdrawal",
        ],
        credit: &["deposit amt.", "deposit amount", "credit", "deposit"],
    },
    summary_markers: &["total"],
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Institution {
    Hdfc,
}

impl Institution {
    pub const ALL: &'static [Institution] = &[Institution::Hdfc];

    /// Resolve an institution code (trimmed, case-insensitive exact match)
    pub fn from_code(code: &str) -> Result<Self, ConvertError> {
        let normalized = code.trim().to_uppercase();
        Self::ALL
            .iter()
            .copied()
            .find(|inst| inst.code() == normalized)
            .ok_or_else(|| ConvertError::UnsupportedInstitution(code.trim().to_string()))
    }

    pub fn code(&self) -> &'static str {
        match self {
            Institution::Hdfc => "HDFC",
        }
    }

    pub fn profile(&self) -> &'static InstitutionProfile {
        match self {
            Institution::Hdfc => &HDFC_PROFILE,
        }
    }
}

impl std::fmt::Display for Institution {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code())
    }
}
