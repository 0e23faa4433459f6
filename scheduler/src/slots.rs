// Copyright (c) James Kassemi, SC, US. All rights reserved.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use chrono::{Datelike, NaiveDate, NaiveDateTime, Timelike, Utc, Weekday};
use core_types::status::{OverallStatus, ServiceStatusHandle};
use log::{error, info};
use notify::{Notifier, Target};
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;

/// Width of the firing window at the top of a slot hour, in minutes.
/// Wide enough that a one-minute poll cannot step over it, narrow
/// enough that one poll cannot land in it twice.
const SLOT_WINDOW_MIN: u32 = 2;

const ON_DAY_POLL: Duration = Duration::from_secs(60);
const OFF_DAY_POLL: Duration = Duration::from_secs(3_600);

/// Fixed weekday and hour slots for the chore reminder.
#[derive(Debug, Clone)]
pub struct SlotSchedule {
    pub weekday: Weekday,
    pub hours: Vec<u32>,
}

impl SlotSchedule {
    pub fn from_config(weekday: u8, hours: &[u8]) -> Self {
        Self {
            weekday: weekday_from_index(weekday),
            hours: hours.iter().map(|h| *h as u32 % 24).collect(),
        }
    }
}

fn weekday_from_index(index: u8) -> Weekday {
    match index % 7 {
        0 => Weekday::Mon,
        1 => Weekday::Tue,
        2 => Weekday::Wed,
        3 => Weekday::Thu,
        4 => Weekday::Fri,
        5 => Weekday::Sat,
        _ => Weekday::Sun,
    }
}

/// Slot that should fire at `now`, if any: the weekday matches, the
/// hour is one of the schedule's slots, `now` is inside the leading
/// window of that hour, and the slot has not fired yet today.
pub fn slot_due(schedule: &SlotSchedule, now: NaiveDateTime, fired: &HashSet<u32>) -> Option<u32> {
    if now.weekday() != schedule.weekday || now.minute() >= SLOT_WINDOW_MIN {
        return None;
    }
    let hour = now.hour();
    if schedule.hours.contains(&hour) && !fired.contains(&hour) {
        Some(hour)
    } else {
        None
    }
}

/// Weekday chore reminder: one notice per slot per matching day,
/// polling each minute on the target day and hourly otherwise.
pub struct SlotReminderLoop {
    schedule: SlotSchedule,
    notifier: Arc<dyn Notifier>,
    target: Target,
    message: String,
    status: ServiceStatusHandle,
}

impl SlotReminderLoop {
    pub fn new(
        schedule: SlotSchedule,
        notifier: Arc<dyn Notifier>,
        target: Target,
        message: impl Into<String>,
    ) -> Self {
        let status = ServiceStatusHandle::new("slot_reminder");
        Self {
            schedule,
            notifier,
            target,
            message: message.into(),
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
            "[slot_reminder] loop starting for {:?} at {:?}",
            self.schedule.weekday, self.schedule.hours
        );
        self.status.set_overall(OverallStatus::Ok);
        let mut fired: HashSet<u32> = HashSet::new();
        let mut fired_day: Option<NaiveDate> = None;

        while !cancel.is_cancelled() {
            let now = Utc::now().naive_utc();
            if fired_day != Some(now.date()) {
                fired.clear();
                fired_day = Some(now.date());
            }

            let on_target_day = now.weekday() == self.schedule.weekday;
            if on_target_day {
                if let Some(hour) = slot_due(&self.schedule, now, &fired) {
                    let text = format!("{} (slot {:02}:00)", self.message, hour);
                    match self.notifier.send(&self.target, &text).await {
                        Ok(()) => {
                            info!("[slot_reminder] fired slot {hour:02}:00");
                            fired.insert(hour);
                            self.status.set_overall(OverallStatus::Ok);
                            self.status.clear_errors();
                        }
                        Err(err) => {
                            // Leave the slot unfired; the next minute
                            // inside the window retries it.
                            self.status.set_overall(OverallStatus::Crit);
                            self.status.push_error(err.to_string());
                            error!("[slot_reminder] delivery failed: {err}");
                        }
                    }
                }
            }

            let poll = if on_target_day { ON_DAY_POLL } else { OFF_DAY_POLL };
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = sleep(poll) => {}
            }
        }
        info!("[slot_reminder] loop exiting");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use notify::MemoryNotifier;

    fn schedule() -> SlotSchedule {
        SlotSchedule::from_config(3, &[20, 22, 0])
    }

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, min, 0)
            .unwrap()
    }

    #[test]
    fn config_indices_map_to_weekdays() {
        assert_eq!(weekday_from_index(0), Weekday::Mon);
        assert_eq!(weekday_from_index(3), Weekday::Thu);
        assert_eq!(weekday_from_index(6), Weekday::Sun);
    }

    #[test]
    fn slots_fire_only_in_the_leading_window_of_the_target_day() {
        let sched = schedule();
        let none_fired = HashSet::new();

        // 2024-09-19 is a Thursday.
        assert_eq!(slot_due(&sched, at(2024, 9, 19, 20, 0), &none_fired), Some(20));
        assert_eq!(slot_due(&sched, at(2024, 9, 19, 20, 1), &none_fired), Some(20));
        // Outside the two-minute window.
        assert_eq!(slot_due(&sched, at(2024, 9, 19, 20, 2), &none_fired), None);
        // Hour not in the schedule.
        assert_eq!(slot_due(&sched, at(2024, 9, 19, 21, 0), &none_fired), None);
        // Wrong weekday (a Friday).
        assert_eq!(slot_due(&sched, at(2024, 9, 20, 20, 0), &none_fired), None);
        // Midnight slot.
        assert_eq!(slot_due(&sched, at(2024, 9, 19, 0, 1), &none_fired), Some(0));
    }

    #[test]
    fn a_fired_slot_does_not_fire_twice() {
        let sched = schedule();
        let mut fired = HashSet::new();
        fired.insert(20);
        assert_eq!(slot_due(&sched, at(2024, 9, 19, 20, 1), &fired), None);
        // Other slots remain live.
        assert_eq!(slot_due(&sched, at(2024, 9, 19, 22, 0), &fired), Some(22));
    }

    #[tokio::test(start_paused = true)]
    async fn cancellation_interrupts_the_off_day_sleep() {
        let reminder = SlotReminderLoop::new(
            schedule(),
            Arc::new(MemoryNotifier::new()),
            Target::Channel("chores".to_string()),
            "Reminder: take the trash or bin out!",
        );
        let cancel = CancellationToken::new();
        let handle = reminder.spawn(cancel.clone());

        tokio::time::advance(Duration::from_secs(1)).await;
        cancel.cancel();
        handle.await.unwrap();
    }
}
