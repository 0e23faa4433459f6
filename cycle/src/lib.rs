// Copyright (c) James Kassemi, SC, US. All rights reserved.

//! Fortnight cycle arithmetic.
//!
//! Pure date functions shared by the ledger, the report generator, and
//! the scheduler. Every derived date is a fixed offset from a payment
//! date, so no cycle state needs separate persistence.

use chrono::{Duration, NaiveDate};

/// Length of one payment cycle in days.
pub const CYCLE_DAYS: i64 = 14;

/// First due date of the cycle, before any payment is logged.
pub fn anchor_due_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 9, 20).expect("valid anchor date")
}

/// Start of the period a payment covers.
pub fn cover_date(payment_date: NaiveDate) -> NaiveDate {
    payment_date - Duration::days(CYCLE_DAYS)
}

/// When the following payment is expected.
pub fn next_due_date(payment_date: NaiveDate) -> NaiveDate {
    payment_date + Duration::days(CYCLE_DAYS)
}

/// Inclusive `(start, end)` window for a trailing-fortnight report.
pub fn report_window(now: NaiveDate) -> (NaiveDate, NaiveDate) {
    (now - Duration::days(CYCLE_DAYS), now)
}

/// Due date following the given last payment, or the anchor when no
/// payment has been logged yet.
pub fn next_due_after(last_payment: Option<NaiveDate>) -> NaiveDate {
    match last_payment {
        Some(date) => next_due_date(date),
        None => anchor_due_date(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn cover_and_due_are_fixed_fortnight_offsets() {
        let paid = date(2024, 9, 20);
        assert_eq!(cover_date(paid), date(2024, 9, 6));
        assert_eq!(next_due_date(paid), date(2024, 10, 4));
    }

    #[test]
    fn offsets_cross_month_and_year_boundaries() {
        assert_eq!(next_due_date(date(2024, 12, 25)), date(2025, 1, 8));
        assert_eq!(cover_date(date(2024, 1, 5)), date(2023, 12, 22));
    }

    #[test]
    fn report_window_trails_by_one_cycle() {
        let (start, end) = report_window(date(2024, 10, 4));
        assert_eq!(start, date(2024, 9, 20));
        assert_eq!(end, date(2024, 10, 4));
    }

    #[test]
    fn due_falls_back_to_the_anchor_without_payments() {
        assert_eq!(next_due_after(None), date(2024, 9, 20));
        assert_eq!(
            next_due_after(Some(date(2024, 10, 4))),
            date(2024, 10, 18)
        );
    }
}
