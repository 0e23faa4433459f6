// Copyright (c) James Kassemi, SC, US. All rights reserved.

//! Main runtime: wires the sheet store, ledger service, notifier, and
//! the three scheduler loops, then waits for shutdown.

use std::sync::Arc;
use std::time::Duration;

use core_types::AppConfig;
use ledger::LedgerService;
use log::{error, info, warn};
use notify::{HttpNotifier, Target};
use scheduler::{DueReminderLoop, ReportBroadcastLoop, SlotReminderLoop, SlotSchedule};
use sheet_store::{HttpSheetStore, SheetStore};
use tokio_util::sync::CancellationToken;

#[tokio::main]
async fn main() {
    env_logger::init();

    let config = match AppConfig::load() {
        Ok(config) => config,
        Err(err) => {
            error!("configuration error: {err}");
            std::process::exit(1);
        }
    };

    let client = reqwest::Client::new();
    let store: Arc<dyn SheetStore> = Arc::new(HttpSheetStore::new(
        client.clone(),
        &config.sheet.base_url,
        &config.sheet.sheet_id,
        &config.sheet.api_token,
    ));
    let ledger = LedgerService::new(Arc::clone(&store));
    let notifier = Arc::new(HttpNotifier::new(
        client,
        &config.notify.base_url,
        &config.notify.api_token,
    ));

    // load() already validated the anchor; the constant is only a
    // belt-and-braces fallback.
    let anchor = config
        .scheduler
        .anchor()
        .unwrap_or_else(|_| cycle::anchor_due_date());
    let due_date = match ledger.last_payment_date().await {
        Ok(Some(last)) => cycle::next_due_date(last),
        Ok(None) => anchor,
        Err(err) => {
            warn!("could not derive due date from the sheet, using anchor: {err}");
            anchor
        }
    };
    info!("next due date resolved to {due_date}");

    let cancel = CancellationToken::new();
    let mut handles = Vec::new();

    handles.push(
        DueReminderLoop::new(
            ledger.clone(),
            notifier.clone(),
            Target::Channel(config.notify.reminder_channel.clone()),
            due_date,
            Duration::from_secs(config.scheduler.reminder_interval_s),
        )
        .spawn(cancel.clone()),
    );
    handles.push(
        ReportBroadcastLoop::new(
            Arc::clone(&store),
            notifier.clone(),
            Target::Channel(config.notify.report_channel.clone()),
            Duration::from_secs(config.scheduler.report_interval_s),
        )
        .spawn(cancel.clone()),
    );
    handles.push(
        SlotReminderLoop::new(
            SlotSchedule::from_config(config.scheduler.chore_weekday, &config.scheduler.chore_hours),
            notifier,
            Target::Channel(config.notify.chore_channel.clone()),
            "Reminder: take the trash or bin out!",
        )
        .spawn(cancel.clone()),
    );

    info!("payment ledger service running");
    if let Err(err) = tokio::signal::ctrl_c().await {
        error!("shutdown signal listener failed: {err}");
    }
    info!("shutting down");
    cancel.cancel();
    for handle in handles {
        if let Err(err) = handle.await {
            error!("loop task failed to join: {err}");
        }
    }
}
