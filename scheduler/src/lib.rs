// Copyright (c) James Kassemi, SC, US. All rights reserved.

//! Background notification loops.
//!
//! Three independent tasks share nothing but the store and the
//! notification destination: the due-date reminder, the fortnightly
//! report broadcast, and the weekday slot reminder. Each owns its own
//! state, is cancellable through a `CancellationToken`, and treats a
//! failed delivery as a logged, non-fatal event. The loops only read
//! the ledger; rows are created and deleted solely by user commands.

pub mod broadcast;
pub mod due;
pub mod slots;

use ledger::LedgerError;
use notify::NotifyError;
use sheet_store::StoreError;
use thiserror::Error;

pub use broadcast::ReportBroadcastLoop;
pub use due::{reminder_action, DueReminderLoop, ReminderAction};
pub use slots::{slot_due, SlotReminderLoop, SlotSchedule};

#[derive(Debug, Error)]
pub enum SchedulerError {
    #[error("ledger error: {0}")]
    Ledger(#[from] LedgerError),
    #[error("store error: {0}")]
    Store(#[from] StoreError),
    #[error("notify error: {0}")]
    Notify(#[from] NotifyError),
}
