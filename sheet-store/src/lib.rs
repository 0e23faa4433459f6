// Copyright (c) James Kassemi, SC, US. All rights reserved.

//! Row-store adapter for the remote payment sheet.
//!
//! The sheet offers no transactions and no row locking; each call is
//! atomic on its own and nothing more. [`SheetStore`] is the only
//! surface the rest of the system talks to, with [`HttpSheetStore`]
//! backing production and [`MemorySheet`] backing tests.

pub mod http;
pub mod memory;

use async_trait::async_trait;
use thiserror::Error;

pub use http::HttpSheetStore;
pub use memory::MemorySheet;

/// Opaque handle to one sheet row. Handles stay valid across deletes
/// of other rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RowId(pub u32);

impl std::fmt::Display for RowId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("request error: {0}")]
    Request(#[from] reqwest::Error),
    #[error("url parse error: {0}")]
    Url(#[from] url::ParseError),
    #[error("sheet endpoint returned status {status}")]
    Status { status: u16 },
    #[error("row {0} is not present in the sheet")]
    MissingRow(RowId),
}

#[async_trait]
pub trait SheetStore: Send + Sync {
    /// Appends one row and returns its handle.
    async fn append_row(&self, fields: Vec<String>) -> Result<RowId, StoreError>;

    /// First row whose `column` cell equals `value`, in insertion
    /// order. Absence is an ordinary `None`, not an error.
    async fn find_row(&self, column: usize, value: &str) -> Result<Option<RowId>, StoreError>;

    async fn read_row(&self, row: RowId) -> Result<Vec<String>, StoreError>;

    async fn update_cell(&self, row: RowId, column: usize, value: &str)
        -> Result<(), StoreError>;

    async fn delete_row(&self, row: RowId) -> Result<(), StoreError>;

    /// All live rows in insertion order.
    async fn read_all(&self) -> Result<Vec<Vec<String>>, StoreError>;

    async fn row_count(&self) -> Result<usize, StoreError> {
        Ok(self.read_all().await?.len())
    }
}
