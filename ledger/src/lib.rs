// Copyright (c) James Kassemi, SC, US. All rights reserved.

//! Payment ledger service.
//!
//! The crate exposes:
//! - [`LedgerService`]: serial assignment and all row mutations against
//!   the sheet store.
//! - [`Identifier`]: the serial-or-date lookup key.
//! - [`ReceiptView`]: the two read shapes over one search.

pub mod error;
pub mod identifier;
pub mod service;

pub use error::{LedgerError, Result};
pub use identifier::Identifier;
pub use service::{render_receipt, LedgerService, LoggedPayment, ReceiptView};
