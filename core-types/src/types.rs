// Copyright (c) James Kassemi, SC, US. All rights reserved.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Column layout of one sheet row, in append order.
pub const COL_SERIAL: usize = 0;
pub const COL_PAYER: usize = 1;
pub const COL_PAYMENT_DATE: usize = 2;
pub const COL_AMOUNT: usize = 3;
pub const COL_LOG_DATE: usize = 4;
pub const COL_COVER_DATE: usize = 5;
pub const COL_NEXT_DUE: usize = 6;
pub const COLUMN_COUNT: usize = 7;

/// Date format used inside stored rows.
pub const INTERNAL_DATE_FORMAT: &str = "%Y-%m-%d";
/// Date format accepted from and shown to users.
pub const EXTERNAL_DATE_FORMAT: &str = "%d/%m/%Y";

pub type SerialNumber = u32;

#[derive(Debug, Error)]
pub enum RowParseError {
    #[error("row has {got} columns, expected {COLUMN_COUNT}")]
    MissingColumns { got: usize },
    #[error("bad serial number {0:?}")]
    BadSerial(String),
    #[error("bad date {0:?}")]
    BadDate(String),
    #[error("bad amount {0:?}")]
    BadAmount(String),
}

/// One persisted payment record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Receipt {
    pub serial_number: SerialNumber,
    pub payer: String,
    pub payment_date: NaiveDate,
    pub amount: f64,
    pub log_date: NaiveDate,
    pub cover_date: NaiveDate,
    pub next_due_date: NaiveDate,
}

impl Receipt {
    /// Serializes the receipt into its stored row form.
    pub fn to_fields(&self) -> Vec<String> {
        vec![
            self.serial_number.to_string(),
            self.payer.clone(),
            format_internal_date(self.payment_date),
            format_amount(self.amount),
            format_internal_date(self.log_date),
            format_internal_date(self.cover_date),
            format_internal_date(self.next_due_date),
        ]
    }

    /// Parses a stored row back into a receipt.
    pub fn from_fields(fields: &[String]) -> Result<Self, RowParseError> {
        if fields.len() < COLUMN_COUNT {
            return Err(RowParseError::MissingColumns { got: fields.len() });
        }
        let serial_number = fields[COL_SERIAL]
            .trim()
            .parse::<SerialNumber>()
            .map_err(|_| RowParseError::BadSerial(fields[COL_SERIAL].clone()))?;
        Ok(Self {
            serial_number,
            payer: fields[COL_PAYER].clone(),
            payment_date: parse_internal_date(&fields[COL_PAYMENT_DATE])?,
            amount: parse_amount(&fields[COL_AMOUNT])?,
            log_date: parse_internal_date(&fields[COL_LOG_DATE])?,
            cover_date: parse_internal_date(&fields[COL_COVER_DATE])?,
            next_due_date: parse_internal_date(&fields[COL_NEXT_DUE])?,
        })
    }
}

pub fn format_internal_date(date: NaiveDate) -> String {
    date.format(INTERNAL_DATE_FORMAT).to_string()
}

pub fn parse_internal_date(value: &str) -> Result<NaiveDate, RowParseError> {
    NaiveDate::parse_from_str(value.trim(), INTERNAL_DATE_FORMAT)
        .map_err(|_| RowParseError::BadDate(value.to_string()))
}

pub fn format_external_date(date: NaiveDate) -> String {
    date.format(EXTERNAL_DATE_FORMAT).to_string()
}

pub fn parse_external_date(value: &str) -> Result<NaiveDate, RowParseError> {
    NaiveDate::parse_from_str(value.trim(), EXTERNAL_DATE_FORMAT)
        .map_err(|_| RowParseError::BadDate(value.to_string()))
}

/// Renders an amount in its stored `$1234.56` form.
pub fn format_amount(amount: f64) -> String {
    format!("${:.2}", amount)
}

/// Parses a stored amount, tolerating the currency symbol and
/// thousands separators.
pub fn parse_amount(value: &str) -> Result<f64, RowParseError> {
    let cleaned: String = value
        .trim()
        .chars()
        .filter(|c| *c != '$' && *c != ',')
        .collect();
    cleaned
        .parse::<f64>()
        .map_err(|_| RowParseError::BadAmount(value.to_string()))
}
