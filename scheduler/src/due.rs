// Copyright (c) James Kassemi, SC, US. All rights reserved.

use std::sync::Arc;
use std::time::Duration;

use chrono::{NaiveDate, Utc};
use core_types::status::{OverallStatus, ServiceStatusHandle};
use core_types::types::format_external_date;
use ledger::LedgerService;
use log::{error, info};
use notify::{Notifier, Target};
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;

use crate::SchedulerError;

/// What one reminder tick should do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReminderAction {
    /// A payment was logged today; acknowledge and stop.
    ThankYou,
    /// Past the due date with nothing logged.
    Overdue,
    /// Before the due date with nothing logged.
    Upcoming,
}

/// Decision for one tick of the due-date reminder.
pub fn reminder_action(logged_today: bool, today: NaiveDate, due: NaiveDate) -> ReminderAction {
    if logged_today {
        ReminderAction::ThankYou
    } else if today > due {
        ReminderAction::Overdue
    } else {
        ReminderAction::Upcoming
    }
}

/// Daily due-date reminder.
///
/// The loop owns its `due_date` for its whole life and is single-shot
/// per process: once a payment is acknowledged with a thank-you it
/// terminates and does not re-arm on the next cycle. A process restart
/// (which re-derives the due date from the latest payment) starts the
/// next round. Known limitation, kept deliberately.
pub struct DueReminderLoop {
    ledger: LedgerService,
    notifier: Arc<dyn Notifier>,
    target: Target,
    due_date: NaiveDate,
    interval: Duration,
    status: ServiceStatusHandle,
}

impl DueReminderLoop {
    pub fn new(
        ledger: LedgerService,
        notifier: Arc<dyn Notifier>,
        target: Target,
        due_date: NaiveDate,
        interval: Duration,
    ) -> Self {
        let status = ServiceStatusHandle::new("due_reminder");
        Self {
            ledger,
            notifier,
            target,
            due_date,
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
        info!(
            "[due_reminder] loop starting, due {}",
            format_external_date(self.due_date)
        );
        self.status.set_overall(OverallStatus::Ok);
        while !cancel.is_cancelled() {
            match self.tick().await {
                Ok(true) => {
                    info!("[due_reminder] payment logged, loop done for this cycle");
                    break;
                }
                Ok(false) => {
                    self.status.set_overall(OverallStatus::Ok);
                    self.status.clear_errors();
                }
                Err(err) => {
                    // A missed delivery or store hiccup is never fatal;
                    // the next tick tries again.
                    self.status.set_overall(OverallStatus::Crit);
                    self.status.push_error(err.to_string());
                    error!("[due_reminder] tick failed: {err}");
                }
            }
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = sleep(self.interval) => {}
            }
        }
        info!("[due_reminder] loop exiting");
    }

    /// Returns true when the loop has reached its terminal thank-you.
    async fn tick(&self) -> Result<bool, SchedulerError> {
        let logged = self.ledger.is_payment_logged_today().await?;
        let today = Utc::now().date_naive();
        let action = reminder_action(logged, today, self.due_date);
        let message = match action {
            ReminderAction::ThankYou => "Thank you! The payment has been logged.".to_string(),
            ReminderAction::Overdue => {
                "Reminder: payment is overdue. Please log your payment with \
                 `!log_payment <amount>`."
                    .to_string()
            }
            ReminderAction::Upcoming => format!(
                "Reminder: your next payment is due on {}.",
                format_external_date(self.due_date)
            ),
        };
        self.notifier.send(&self.target, &message).await?;
        Ok(action == ReminderAction::ThankYou)
    }
}
