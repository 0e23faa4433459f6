// Copyright (c) James Kassemi, SC, US. All rights reserved.

//! Shared row schema, configuration, retry policy, and service status
//! types for the fortnight payment ledger.

pub mod config;
pub mod retry;
pub mod status;
pub mod types;

pub use config::AppConfig;
pub use retry::RetryPolicy;
pub use status::{OverallStatus, ServiceStatusHandle, ServiceStatusSnapshot};
pub use types::{Receipt, RowParseError};
