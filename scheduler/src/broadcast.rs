// Copyright (c) James Kassemi, SC, US. All rights reserved.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use core_types::status::{OverallStatus, ServiceStatusHandle};
use log::{error, info};
use notify::{Notifier, Target};
use sheet_store::SheetStore;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;

use crate::SchedulerError;

/// Fortnightly report broadcast. Publishes the rolling report to its
/// destination on every tick and runs until cancelled.
pub struct ReportBroadcastLoop {
    store: Arc<dyn SheetStore>,
    notifier: Arc<dyn Notifier>,
    target: Target,
    interval: Duration,
    status: ServiceStatusHandle,
}

impl ReportBroadcastLoop {
    pub fn new(
        store: Arc<dyn SheetStore>,
        notifier: Arc<dyn Notifier>,
        target: Target,
        interval: Duration,
    ) -> Self {
        let status = ServiceStatusHandle::new("report_broadcast");
        Self {
            store,
            notifier,
            target,
            interval,
            status,
        }
    }

    pub fn status_handle(&self) -> ServiceStatusHandle {
        self.status.clone()
    }

    pub fn spawn(self, cancel: CancellationToken) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move { self.run(cancel).await })
    }

    async fn run(self, cancel: CancellationToken) {
        info!("[report_broadcast] loop starting");
        self.status.set_overall(OverallStatus::Ok);
        while !cancel.is_cancelled() {
            match self.tick().await {
                Ok(rows) => {
                    info!("[report_broadcast] published report with {rows} row(s)");
                    self.status.set_overall(OverallStatus::Ok);
                    self.status.clear_errors();
                }
                Err(err) => {
                    self.status.set_overall(OverallStatus::Crit);
                    self.status.push_error(err.to_string());
                    error!("[report_broadcast] tick failed: {err}");
                }
            }
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = sleep(self.interval) => {}
            }
        }
        info!("[report_broadcast] loop exiting");
    }

    async fn tick(&self) -> Result<usize, SchedulerError> {
        let today = Utc::now().date_naive();
        let rolling = report::rolling_report(self.store.as_ref(), today).await?;
        let message = report::render(&rolling);
        self.notifier.send(&self.target, &message).await?;
        Ok(rolling.rows.len())
    }
}
