// Copyright (c) James Kassemi, SC, US. All rights reserved.

use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use log::warn;
use sheet_store::{RowId, SheetStore};

use core_types::types::{
    format_amount, format_external_date, format_internal_date, parse_external_date,
    parse_internal_date, Receipt, COL_AMOUNT, COL_PAYER, COL_PAYMENT_DATE,
};

use crate::{
    error::{LedgerError, Result},
    identifier::Identifier,
};

/// Read shape for a receipt lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReceiptView {
    /// Serial, payer, payment date, amount.
    Summary,
    /// Summary plus the cover date.
    Detailed,
}

/// Outcome of a successful `log_payment`.
#[derive(Debug, Clone)]
pub struct LoggedPayment {
    pub receipt: Receipt,
    pub row: RowId,
    pub confirmation: String,
}

/// Serial assignment and all CRUD against the sheet store.
///
/// Serial numbers are derived from row position: the next serial is
/// the current live-row count plus one. Deleting a row renumbers
/// nothing already written; it only shifts what the next append will
/// compute.
#[derive(Clone)]
pub struct LedgerService {
    store: Arc<dyn SheetStore>,
}

impl LedgerService {
    pub fn new(store: Arc<dyn SheetStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> Arc<dyn SheetStore> {
        Arc::clone(&self.store)
    }

    /// Validates and appends one payment, deriving the cycle dates.
    ///
    /// The count-then-append sequence is not atomic: two concurrent
    /// calls can observe the same row count and write duplicate
    /// serials. The sheet has no compare-and-set to close that window,
    /// so it is accepted and kept as small as possible (validation
    /// happens before the count is read).
    pub async fn log_payment(
        &self,
        payer: &str,
        amount: f64,
        payment_date: Option<&str>,
    ) -> Result<LoggedPayment> {
        self.log_payment_on(payer, amount, payment_date, Utc::now().date_naive())
            .await
    }

    /// `log_payment` with an explicit log date. The public entry point
    /// passes the current date; tests pin it.
    pub async fn log_payment_on(
        &self,
        payer: &str,
        amount: f64,
        payment_date: Option<&str>,
        log_date: NaiveDate,
    ) -> Result<LoggedPayment> {
        if amount <= 0.0 {
            return Err(LedgerError::InvalidAmount(amount));
        }
        let payment_date = match payment_date {
            Some(raw) => {
                parse_external_date(raw).map_err(|_| LedgerError::InvalidDate(raw.to_string()))?
            }
            None => log_date,
        };

        let serial_number = self.store.row_count().await? as u32 + 1;
        let receipt = Receipt {
            serial_number,
            payer: payer.to_string(),
            payment_date,
            amount,
            log_date,
            cover_date: cycle::cover_date(payment_date),
            next_due_date: cycle::next_due_date(payment_date),
        };
        let row = self.store.append_row(receipt.to_fields()).await?;

        let confirmation = format!(
            "Logged payment of {} for {} on {}. Serial number: {}. \
             Your next payment is due on {}.",
            format_amount(receipt.amount),
            receipt.payer,
            format_internal_date(receipt.payment_date),
            receipt.serial_number,
            format_external_date(receipt.next_due_date),
        );
        Ok(LoggedPayment {
            receipt,
            row,
            confirmation,
        })
    }

    /// First receipt matching the identifier, in insertion order.
    ///
    /// `Ok(None)` is the ordinary no-match outcome. A stored row that
    /// matches but fails to parse is skipped with a warning and the
    /// scan continues; a row corrupted in place never masks a later
    /// valid match.
    pub async fn find_by_identifier(&self, raw: &str) -> Result<Option<Receipt>> {
        let identifier = Identifier::parse(raw)?;
        let column = identifier.column();
        let wanted = identifier.stored_value();
        for fields in self.store.read_all().await? {
            if fields.get(column).map(String::as_str) != Some(wanted.as_str()) {
                continue;
            }
            match Receipt::from_fields(&fields) {
                Ok(receipt) => return Ok(Some(receipt)),
                Err(err) => {
                    warn!("skipping malformed row matching {identifier}: {err}");
                }
            }
        }
        Ok(None)
    }

    /// Overwrites the amount of the row the identifier resolves to.
    pub async fn edit_amount(&self, raw: &str, new_amount: f64) -> Result<()> {
        if new_amount <= 0.0 {
            return Err(LedgerError::InvalidAmount(new_amount));
        }
        let identifier = Identifier::parse(raw)?;
        let row = self.resolve(&identifier).await?;
        self.store
            .update_cell(row, COL_AMOUNT, &format_amount(new_amount))
            .await?;
        Ok(())
    }

    /// Deletes the row the identifier resolves to. Serials already
    /// assigned to other rows are unaffected; only the next append's
    /// count changes.
    pub async fn delete_by_identifier(&self, raw: &str) -> Result<()> {
        let identifier = Identifier::parse(raw)?;
        let row = self.resolve(&identifier).await?;
        self.store.delete_row(row).await?;
        Ok(())
    }

    /// Rewrites the payer cell of every row currently equal to `old`.
    /// Returns the number of rows touched; zero matches is a no-op,
    /// not an error, so reapplying is harmless.
    ///
    /// The find-update loop terminates because a rewritten row stops
    /// matching `old`, which requires `old != new`; the identical
    /// rename is answered up front as zero rows touched.
    pub async fn rename_payer_alias(&self, old: &str, new: &str) -> Result<usize> {
        if old == new {
            return Ok(0);
        }
        let mut renamed = 0;
        while let Some(row) = self.store.find_row(COL_PAYER, old).await? {
            self.store.update_cell(row, COL_PAYER, new).await?;
            renamed += 1;
        }
        Ok(renamed)
    }

    /// True iff any row's payment date equals the current date. Used
    /// by the reminder loop to stop nagging. Compares exact days, so a
    /// payment logged for a non-current date does not count.
    pub async fn is_payment_logged_today(&self) -> Result<bool> {
        self.is_payment_logged_on(Utc::now().date_naive()).await
    }

    pub async fn is_payment_logged_on(&self, day: NaiveDate) -> Result<bool> {
        let wanted = format_internal_date(day);
        Ok(self
            .store
            .read_all()
            .await?
            .iter()
            .any(|fields| fields.get(COL_PAYMENT_DATE).map(String::as_str) == Some(wanted.as_str())))
    }

    /// Latest payment date on record, skipping malformed date cells.
    pub async fn last_payment_date(&self) -> Result<Option<NaiveDate>> {
        let mut latest: Option<NaiveDate> = None;
        for fields in self.store.read_all().await? {
            let Some(cell) = fields.get(COL_PAYMENT_DATE) else {
                continue;
            };
            match parse_internal_date(cell) {
                Ok(date) => latest = Some(latest.map_or(date, |cur| cur.max(date))),
                Err(err) => warn!("skipping row with bad payment date: {err}"),
            }
        }
        Ok(latest)
    }

    async fn resolve(&self, identifier: &Identifier) -> Result<RowId> {
        self.store
            .find_row(identifier.column(), &identifier.stored_value())
            .await?
            .ok_or_else(|| LedgerError::NotFound(identifier.to_string()))
    }
}

/// Renders a receipt in one of the two read shapes.
pub fn render_receipt(receipt: &Receipt, view: ReceiptView) -> String {
    let mut line = format!(
        "Receipt for {}: Serial Number: {}, Payment Date: {}",
        receipt.payer,
        receipt.serial_number,
        format_internal_date(receipt.payment_date),
    );
    if view == ReceiptView::Detailed {
        line.push_str(&format!(
            ", Cover Date: {}",
            format_internal_date(receipt.cover_date)
        ));
    }
    line.push_str(&format!(", Amount: {}", format_amount(receipt.amount)));
    line
}

#[cfg(test)]
mod tests {
    use super::*;
    use sheet_store::MemorySheet;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn service() -> (LedgerService, Arc<MemorySheet>) {
        let sheet = Arc::new(MemorySheet::new());
        (LedgerService::new(sheet.clone()), sheet)
    }

    #[tokio::test]
    async fn first_payment_gets_serial_one_and_cycle_dates() {
        let (svc, _) = service();
        let logged = svc
            .log_payment_on("sonam", 100.0, Some("20/09/2024"), date(2024, 9, 20))
            .await
            .unwrap();

        assert_eq!(logged.receipt.serial_number, 1);
        assert_eq!(logged.receipt.cover_date, date(2024, 9, 6));
        assert_eq!(logged.receipt.next_due_date, date(2024, 10, 4));
        assert!(logged.confirmation.contains("due on 04/10/2024"));
    }

    #[tokio::test]
    async fn serials_count_up_in_append_order() {
        let (svc, _) = service();
        for i in 0..3 {
            let logged = svc
                .log_payment_on("payer", 50.0, None, date(2024, 10, 1))
                .await
                .unwrap();
            assert_eq!(logged.receipt.serial_number, i + 1);
        }
    }

    #[tokio::test]
    async fn omitted_payment_date_defaults_to_the_log_date() {
        let (svc, _) = service();
        let logged = svc
            .log_payment_on("payer", 25.0, None, date(2024, 9, 21))
            .await
            .unwrap();
        assert_eq!(logged.receipt.payment_date, date(2024, 9, 21));
    }

    #[tokio::test]
    async fn validation_happens_before_any_write() {
        let (svc, sheet) = service();

        let err = svc
            .log_payment_on("payer", 0.0, None, date(2024, 9, 20))
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerError::InvalidAmount(_)));

        let err = svc
            .log_payment_on("payer", 10.0, Some("2024-09-20"), date(2024, 9, 20))
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerError::InvalidDate(_)));

        assert_eq!(sheet.row_count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn a_row_is_findable_by_serial_and_by_date() {
        let (svc, _) = service();
        svc.log_payment_on("sonam", 100.0, Some("20/09/2024"), date(2024, 9, 20))
            .await
            .unwrap();

        let by_serial = svc.find_by_identifier("1").await.unwrap().unwrap();
        let by_date = svc.find_by_identifier("20/09/2024").await.unwrap().unwrap();
        assert_eq!(by_serial, by_date);
        assert_eq!(by_serial.amount, 100.0);
    }

    #[tokio::test]
    async fn find_rejects_non_identifier_input() {
        let (svc, _) = service();
        assert!(matches!(
            svc.find_by_identifier("soon").await,
            Err(LedgerError::InvalidIdentifier(_))
        ));
    }

    #[tokio::test]
    async fn malformed_matching_row_is_skipped_not_fatal() {
        let sheet = Arc::new(
            // Serial 1 with an unparseable amount, then a valid row.
            MemorySheet::seeded(vec![
                vec![
                    "1".into(),
                    "payer".into(),
                    "2024-09-20".into(),
                    "not-money".into(),
                    "2024-09-20".into(),
                    "2024-09-06".into(),
                    "2024-10-04".into(),
                ],
                vec![
                    "1".into(),
                    "payer".into(),
                    "2024-09-20".into(),
                    "$60.00".into(),
                    "2024-09-20".into(),
                    "2024-09-06".into(),
                    "2024-10-04".into(),
                ],
            ])
            .await,
        );
        let svc = LedgerService::new(sheet);
        let found = svc.find_by_identifier("1").await.unwrap().unwrap();
        assert_eq!(found.amount, 60.0);
    }

    #[tokio::test]
    async fn edit_amount_rewrites_in_place() {
        let (svc, _) = service();
        svc.log_payment_on("payer", 100.0, Some("20/09/2024"), date(2024, 9, 20))
            .await
            .unwrap();

        svc.edit_amount("1", 120.5).await.unwrap();

        let refetched = svc.find_by_identifier("20/09/2024").await.unwrap().unwrap();
        assert_eq!(refetched.amount, 120.5);
        assert_eq!(refetched.serial_number, 1);
    }

    #[tokio::test]
    async fn edit_on_missing_serial_is_not_found_and_mutates_nothing() {
        let (svc, sheet) = service();
        svc.log_payment_on("payer", 100.0, Some("20/09/2024"), date(2024, 9, 20))
            .await
            .unwrap();
        let before = sheet.read_all().await.unwrap();

        let err = svc.edit_amount("9", 55.0).await.unwrap_err();
        assert!(matches!(err, LedgerError::NotFound(_)));
        assert_eq!(sheet.read_all().await.unwrap(), before);
    }

    #[tokio::test]
    async fn edit_rejects_non_positive_amounts_before_lookup() {
        let (svc, _) = service();
        assert!(matches!(
            svc.edit_amount("1", -5.0).await,
            Err(LedgerError::InvalidAmount(_))
        ));
    }

    #[tokio::test]
    async fn delete_removes_only_the_resolved_row() {
        let (svc, _) = service();
        svc.log_payment_on("a", 100.0, Some("20/09/2024"), date(2024, 9, 20))
            .await
            .unwrap();
        svc.log_payment_on("b", 50.0, Some("04/10/2024"), date(2024, 10, 4))
            .await
            .unwrap();

        svc.delete_by_identifier("1").await.unwrap();

        assert!(svc.find_by_identifier("1").await.unwrap().is_none());
        // The surviving row keeps its own serial, unrenumbered.
        let second = svc.find_by_identifier("2").await.unwrap().unwrap();
        assert_eq!(second.serial_number, 2);

        let err = svc.delete_by_identifier("1").await.unwrap_err();
        assert!(matches!(err, LedgerError::NotFound(_)));
    }

    #[tokio::test]
    async fn next_serial_follows_the_live_row_count_after_delete() {
        let (svc, _) = service();
        svc.log_payment_on("a", 100.0, Some("20/09/2024"), date(2024, 9, 20))
            .await
            .unwrap();
        svc.log_payment_on("b", 50.0, Some("04/10/2024"), date(2024, 10, 4))
            .await
            .unwrap();
        svc.delete_by_identifier("1").await.unwrap();

        let third = svc
            .log_payment_on("c", 75.0, Some("18/10/2024"), date(2024, 10, 18))
            .await
            .unwrap();
        // Two live rows remain, so the count-derived serial repeats 2.
        assert_eq!(third.receipt.serial_number, 2);
    }

    #[tokio::test]
    async fn rename_alias_is_idempotent() {
        let (svc, sheet) = service();
        svc.log_payment_on("heheboi_2024", 100.0, Some("20/09/2024"), date(2024, 9, 20))
            .await
            .unwrap();
        svc.log_payment_on("heheboi_2024", 50.0, Some("04/10/2024"), date(2024, 10, 4))
            .await
            .unwrap();
        svc.log_payment_on("siru0785", 25.0, Some("04/10/2024"), date(2024, 10, 4))
            .await
            .unwrap();

        assert_eq!(svc.rename_payer_alias("heheboi_2024", "sonam").await.unwrap(), 2);
        let after_first = sheet.read_all().await.unwrap();

        assert_eq!(svc.rename_payer_alias("heheboi_2024", "sonam").await.unwrap(), 0);
        assert_eq!(sheet.read_all().await.unwrap(), after_first);
    }

    #[tokio::test]
    async fn rename_to_the_same_name_terminates_and_touches_nothing() {
        let (svc, sheet) = service();
        svc.log_payment_on("sonam", 100.0, Some("20/09/2024"), date(2024, 9, 20))
            .await
            .unwrap();
        let before = sheet.read_all().await.unwrap();

        let touched = tokio::time::timeout(
            std::time::Duration::from_secs(2),
            svc.rename_payer_alias("sonam", "sonam"),
        )
        .await
        .expect("identical rename must return promptly")
        .unwrap();

        assert_eq!(touched, 0);
        assert_eq!(sheet.read_all().await.unwrap(), before);
    }

    #[tokio::test]
    async fn payment_logged_today_compares_exact_days() {
        let (svc, _) = service();
        svc.log_payment_on("payer", 100.0, Some("20/09/2024"), date(2024, 9, 20))
            .await
            .unwrap();

        assert!(svc.is_payment_logged_on(date(2024, 9, 20)).await.unwrap());
        assert!(!svc.is_payment_logged_on(date(2024, 9, 21)).await.unwrap());
    }

    #[tokio::test]
    async fn last_payment_date_is_the_maximum_on_record() {
        let (svc, _) = service();
        assert_eq!(svc.last_payment_date().await.unwrap(), None);

        svc.log_payment_on("a", 100.0, Some("04/10/2024"), date(2024, 10, 4))
            .await
            .unwrap();
        svc.log_payment_on("b", 50.0, Some("20/09/2024"), date(2024, 9, 20))
            .await
            .unwrap();
        assert_eq!(
            svc.last_payment_date().await.unwrap(),
            Some(date(2024, 10, 4))
        );
    }

    #[test]
    fn the_two_read_shapes_differ_only_by_cover_date() {
        let receipt = Receipt {
            serial_number: 1,
            payer: "sonam".to_string(),
            payment_date: date(2024, 9, 20),
            amount: 100.0,
            log_date: date(2024, 9, 20),
            cover_date: date(2024, 9, 6),
            next_due_date: date(2024, 10, 4),
        };
        let summary = render_receipt(&receipt, ReceiptView::Summary);
        let detailed = render_receipt(&receipt, ReceiptView::Detailed);
        assert!(!summary.contains("Cover Date"));
        assert!(detailed.contains("Cover Date: 2024-09-06"));
        assert!(summary.contains("Amount: $100.00"));
    }
}
