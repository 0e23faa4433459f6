// Copyright (c) James Kassemi, SC, US. All rights reserved.

//! Range and rolling reports over the payment sheet.

use chrono::NaiveDate;
use log::warn;

use core_types::types::{format_amount, format_internal_date, Receipt};
use sheet_store::{SheetStore, StoreError};

/// Aggregate over one inclusive date range.
///
/// A report with no rows is a valid "no receipts in range" outcome.
/// `skipped` counts rows that failed to parse during the scan; a
/// malformed row never silently corrupts the total.
#[derive(Debug, Clone)]
pub struct Report {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub rows: Vec<Receipt>,
    pub total: f64,
    pub skipped: usize,
}

/// Linear scan of all rows with an inclusive payment-date filter.
pub async fn range_report(
    store: &dyn SheetStore,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<Report, StoreError> {
    let mut rows = Vec::new();
    let mut total = 0.0;
    let mut skipped = 0;
    for fields in store.read_all().await? {
        let receipt = match Receipt::from_fields(&fields) {
            Ok(receipt) => receipt,
            Err(err) => {
                skipped += 1;
                warn!("report scan skipping malformed row: {err}");
                continue;
            }
        };
        if receipt.payment_date >= start && receipt.payment_date <= end {
            total += receipt.amount;
            rows.push(receipt);
        }
    }
    Ok(Report {
        start,
        end,
        rows,
        total,
        skipped,
    })
}

/// Range report over the trailing fortnight ending at `now`.
pub async fn rolling_report(store: &dyn SheetStore, now: NaiveDate) -> Result<Report, StoreError> {
    let (start, end) = cycle::report_window(now);
    range_report(store, start, end).await
}

/// Broadcast message: header, one line per receipt, total footer.
pub fn render(report: &Report) -> String {
    let mut message = format!(
        "Fortnightly Report (from {} to {}):\n",
        format_internal_date(report.start),
        format_internal_date(report.end),
    );
    for receipt in &report.rows {
        message.push_str(&format!(
            "User: {}, Date: {}, Amount: {}\n",
            receipt.payer,
            format_internal_date(receipt.payment_date),
            format_amount(receipt.amount),
        ));
    }
    message.push_str(&format!("\nTotal amount paid: {}", format_amount(report.total)));
    if report.skipped > 0 {
        message.push_str(&format!(
            "\n({} unreadable row(s) skipped)",
            report.skipped
        ));
    }
    message
}

#[cfg(test)]
mod tests {
    use super::*;
    use sheet_store::MemorySheet;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn row(serial: &str, payer: &str, paid: &str, amount: &str) -> Vec<String> {
        vec![
            serial.to_string(),
            payer.to_string(),
            paid.to_string(),
            amount.to_string(),
            paid.to_string(),
            paid.to_string(),
            paid.to_string(),
        ]
    }

    async fn sheet_with_two_payments() -> MemorySheet {
        MemorySheet::seeded(vec![
            row("1", "a", "2024-09-20", "$100.00"),
            row("2", "b", "2024-10-04", "$50.00"),
        ])
        .await
    }

    #[tokio::test]
    async fn range_is_inclusive_on_both_ends() {
        let sheet = sheet_with_two_payments().await;
        let report = range_report(&sheet, date(2024, 9, 20), date(2024, 10, 4))
            .await
            .unwrap();
        assert_eq!(report.rows.len(), 2);
        assert_eq!(report.total, 150.0);
        assert_eq!(report.skipped, 0);
    }

    #[tokio::test]
    async fn empty_range_is_a_valid_report() {
        let sheet = sheet_with_two_payments().await;
        let report = range_report(&sheet, date(2025, 1, 1), date(2025, 1, 31))
            .await
            .unwrap();
        assert!(report.rows.is_empty());
        assert_eq!(report.total, 0.0);
    }

    #[tokio::test]
    async fn malformed_rows_are_skipped_and_counted() {
        let sheet = MemorySheet::seeded(vec![
            row("1", "a", "2024-09-20", "$100.00"),
            row("2", "b", "2024-09-21", "not-money"),
            row("x", "c", "2024-09-22", "$10.00"),
        ])
        .await;
        let report = range_report(&sheet, date(2024, 9, 1), date(2024, 9, 30))
            .await
            .unwrap();
        assert_eq!(report.rows.len(), 1);
        assert_eq!(report.total, 100.0);
        assert_eq!(report.skipped, 2);
    }

    #[tokio::test]
    async fn rolling_report_uses_the_trailing_fortnight() {
        let sheet = sheet_with_two_payments().await;
        let report = rolling_report(&sheet, date(2024, 10, 4)).await.unwrap();
        assert_eq!(report.start, date(2024, 9, 20));
        assert_eq!(report.rows.len(), 2);
        assert_eq!(report.total, 150.0);
    }

    #[tokio::test]
    async fn render_lists_rows_and_total() {
        let sheet = sheet_with_two_payments().await;
        let report = rolling_report(&sheet, date(2024, 10, 4)).await.unwrap();
        let message = render(&report);
        assert!(message.contains("User: a, Date: 2024-09-20, Amount: $100.00"));
        assert!(message.contains("Total amount paid: $150.00"));
        assert!(!message.contains("skipped"));
    }
}
