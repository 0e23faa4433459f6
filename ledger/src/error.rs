use core_types::types::EXTERNAL_DATE_FORMAT;
use sheet_store::StoreError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, LedgerError>;

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("amount must be greater than zero, got {0}")]
    InvalidAmount(f64),
    #[error("invalid date {0:?}, expected {EXTERNAL_DATE_FORMAT} (DD/MM/YYYY)")]
    InvalidDate(String),
    #[error("invalid identifier {0:?}, expected a serial number or a DD/MM/YYYY date")]
    InvalidIdentifier(String),
    /// A lookup resolved nothing. An ordinary outcome, kept separate
    /// from transport failure so callers can tell the two apart.
    #[error("no receipt found for {0}")]
    NotFound(String),
    #[error("store error: {0}")]
    Store(#[from] StoreError),
}
