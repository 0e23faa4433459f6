use chrono::NaiveDate;
use core_types::types::{
    format_external_date, format_internal_date, parse_external_date, SerialNumber,
    COL_PAYMENT_DATE, COL_SERIAL,
};

use crate::error::LedgerError;

/// Lookup key for a ledger row: a bare serial number or an external
/// `DD/MM/YYYY` payment date. The two spaces cannot collide because a
/// value is treated as a serial if and only if it parses as an integer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Identifier {
    Serial(SerialNumber),
    Date(NaiveDate),
}

impl Identifier {
    pub fn parse(raw: &str) -> Result<Self, LedgerError> {
        let trimmed = raw.trim();
        if let Ok(serial) = trimmed.parse::<SerialNumber>() {
            return Ok(Identifier::Serial(serial));
        }
        match parse_external_date(trimmed) {
            Ok(date) => Ok(Identifier::Date(date)),
            Err(_) => Err(LedgerError::InvalidIdentifier(raw.to_string())),
        }
    }

    /// Column searched for this identifier.
    pub fn column(&self) -> usize {
        match self {
            Identifier::Serial(_) => COL_SERIAL,
            Identifier::Date(_) => COL_PAYMENT_DATE,
        }
    }

    /// The stored cell value this identifier matches against. Date
    /// identifiers convert to the internal format here, at the ledger
    /// boundary, never inside the store.
    pub fn stored_value(&self) -> String {
        match self {
            Identifier::Serial(serial) => serial.to_string(),
            Identifier::Date(date) => format_internal_date(*date),
        }
    }
}

impl std::fmt::Display for Identifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Identifier::Serial(serial) => write!(f, "serial number {serial}"),
            Identifier::Date(date) => write!(f, "{}", format_external_date(*date)),
        }
    }
}
