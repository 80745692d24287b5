use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConvertError {
    #[error("Bank '{0}' not supported yet")]
    UnsupportedInstitution(String),

    #[error("Incorrect PDF password")]
    InvalidCredentials,

    #[error("PDF is password-protected; supply a password")]
    PasswordRequired,

    #[error("Unsupported PDF encryption: {0}")]
    UnsupportedEncryption(String),

    #[error("Failed to parse PDF: {0}")]
    MalformedDocument(String),

    #[error("No statement table found (if scanned, OCR comes next)")]
    NoTableFound,

    #[error("Tables were found but no transactions could be extracted; the statement format may be unrecognized")]
    NoTransactionsExtracted,

    #[error("CSV export failed: {0}")]
    Csv(String),
}

impl ConvertError {
    /// Stable identifier for the failure class
    pub fn kind(&self) -> &'static str {
        match self {
            ConvertError::UnsupportedInstitution(_) => "unsupported_institution",
            ConvertError::InvalidCredentials => "invalid_credentials",
            ConvertError::PasswordRequired => "password_required",
            ConvertError::UnsupportedEncryption(_) => "unsupported_encryption",
            ConvertError::MalformedDocument(_) => "malformed_document",
            ConvertError::NoTableFound => "no_table_found",
            ConvertError::NoTransactionsExtracted => "no_transactions_extracted",
            ConvertError::Csv(_) => "csv",
        }
    }
}

impl From<csv::Error> for ConvertError {
    fn from(e: csv::Error) -> Self {
        ConvertError::Csv(e.to_string())
    }
}

/// Why a single data row was left out of the ledger.
///
/// Never surfaced to callers; rows are dropped and the reason is traced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MalformedRow {
    /// Date cell missing or in none of the recognized formats
    MissingDate,
    /// No amount, narration or reference
    NoContent,
    /// Totals/footer line
    SummaryRow,
}

impl std::fmt::Display for MalformedRow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MalformedRow::MissingDate => write!(f, "missing or unparsable date"),
            MalformedRow::NoContent => write!(f, "no amount, narration or reference"),
            MalformedRow::SummaryRow => write!(f, "summary row"),
        }
    }
}
