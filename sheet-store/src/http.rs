// Copyright (c) James Kassemi, SC, US. All rights reserved.

use async_trait::async_trait;
use core_types::retry::RetryPolicy;
use core_types::status::{OverallStatus, ServiceStatusHandle};
use log::debug;
use reqwest::{Client, Url};
use serde::Deserialize;

use crate::{RowId, SheetStore, StoreError};

/// Remote sheet client.
///
/// Reads run under the retry policy; mutations are sent exactly once,
/// since the sheet API gives no way to tell a lost response from a
/// lost request.
#[derive(Clone)]
pub struct HttpSheetStore {
    client: Client,
    base_url: String,
    sheet_id: String,
    api_token: String,
    retry: RetryPolicy,
    status: ServiceStatusHandle,
}

#[derive(Debug, Deserialize)]
struct RowsResponse {
    rows: Vec<Vec<String>>,
}

#[derive(Debug, Deserialize)]
struct AppendResponse {
    row: u32,
}

#[derive(Debug, Deserialize)]
struct FindResponse {
    row: Option<u32>,
}

impl HttpSheetStore {
    pub fn new(
        client: Client,
        base_url: impl Into<String>,
        sheet_id: impl Into<String>,
        api_token: impl Into<String>,
    ) -> Self {
        let status = ServiceStatusHandle::new("sheet_store");
        status.set_overall(OverallStatus::Warn);
        Self {
            client,
            base_url: base_url.into(),
            sheet_id: sheet_id.into(),
            api_token: api_token.into(),
            retry: RetryPolicy::default_network(),
            status,
        }
    }

    pub fn status_handle(&self) -> ServiceStatusHandle {
        self.status.clone()
    }

    fn rows_url(&self) -> Result<Url, StoreError> {
        let mut url = Url::parse(&self.base_url)?;
        url.set_path(&format!("/v1/sheets/{}/rows", self.sheet_id));
        Ok(url)
    }

    fn row_url(&self, row: RowId) -> Result<Url, StoreError> {
        let mut url = Url::parse(&self.base_url)?;
        url.set_path(&format!("/v1/sheets/{}/rows/{}", self.sheet_id, row.0));
        Ok(url)
    }

    fn mark_ok(&self) {
        self.status.set_overall(OverallStatus::Ok);
        self.status.clear_errors();
    }

    fn mark_failed(&self, err: &StoreError) {
        self.status.set_overall(OverallStatus::Crit);
        self.status.push_error(err.to_string());
    }

    fn check_status(resp: &reqwest::Response) -> Result<(), StoreError> {
        if resp.status().is_success() {
            Ok(())
        } else {
            Err(StoreError::Status {
                status: resp.status().as_u16(),
            })
        }
    }

    async fn fetch_all(&self) -> Result<Vec<Vec<String>>, StoreError> {
        let url = self.rows_url()?;
        let resp = self
            .client
            .get(url)
            .bearer_auth(&self.api_token)
            .send()
            .await?;
        Self::check_status(&resp)?;
        let parsed: RowsResponse = resp.json().await?;
        Ok(parsed.rows)
    }

    async fn fetch_find(
        &self,
        column: usize,
        value: &str,
    ) -> Result<Option<RowId>, StoreError> {
        let mut url = self.rows_url()?;
        url.set_path(&format!("/v1/sheets/{}/rows/find", self.sheet_id));
        url.query_pairs_mut()
            .append_pair("column", &column.to_string())
            .append_pair("value", value);
        let resp = self
            .client
            .get(url)
            .bearer_auth(&self.api_token)
            .send()
            .await?;
        Self::check_status(&resp)?;
        let parsed: FindResponse = resp.json().await?;
        Ok(parsed.row.map(RowId))
    }

    async fn fetch_row(&self, row: RowId) -> Result<Vec<String>, StoreError> {
        let resp = self
            .client
            .get(self.row_url(row)?)
            .bearer_auth(&self.api_token)
            .send()
            .await?;
        if resp.status().as_u16() == 404 {
            return Err(StoreError::MissingRow(row));
        }
        Self::check_status(&resp)?;
        let fields: Vec<String> = resp.json().await?;
        Ok(fields)
    }

    fn track<T>(&self, result: Result<T, StoreError>) -> Result<T, StoreError> {
        match result {
            Ok(val) => {
                self.mark_ok();
                Ok(val)
            }
            Err(err) => {
                self.mark_failed(&err);
                Err(err)
            }
        }
    }
}

#[async_trait]
impl SheetStore for HttpSheetStore {
    async fn append_row(&self, fields: Vec<String>) -> Result<RowId, StoreError> {
        let url = self.rows_url()?;
        debug!("appending row to sheet {}", self.sheet_id);
        let result = async {
            let resp = self
                .client
                .post(url)
                .bearer_auth(&self.api_token)
                .json(&serde_json::json!({ "values": fields }))
                .send()
                .await?;
            Self::check_status(&resp)?;
            let parsed: AppendResponse = resp.json().await?;
            Ok(RowId(parsed.row))
        }
        .await;
        self.track(result)
    }

    async fn find_row(&self, column: usize, value: &str) -> Result<Option<RowId>, StoreError> {
        let result = self.retry.run(|| self.fetch_find(column, value)).await;
        self.track(result)
    }

    async fn read_row(&self, row: RowId) -> Result<Vec<String>, StoreError> {
        let result = self.retry.run(|| self.fetch_row(row)).await;
        self.track(result)
    }

    async fn update_cell(
        &self,
        row: RowId,
        column: usize,
        value: &str,
    ) -> Result<(), StoreError> {
        let url = self.row_url(row)?;
        let result = async {
            let resp = self
                .client
                .patch(url)
                .bearer_auth(&self.api_token)
                .json(&serde_json::json!({ "column": column, "value": value }))
                .send()
                .await?;
            if resp.status().as_u16() == 404 {
                return Err(StoreError::MissingRow(row));
            }
            Self::check_status(&resp)
        }
        .await;
        self.track(result)
    }

    async fn delete_row(&self, row: RowId) -> Result<(), StoreError> {
        let result = async {
            let resp = self
                .client
                .delete(self.row_url(row)?)
                .bearer_auth(&self.api_token)
                .send()
                .await?;
            if resp.status().as_u16() == 404 {
                return Err(StoreError::MissingRow(row));
            }
            Self::check_status(&resp)
        }
        .await;
        self.track(result)
    }

    async fn read_all(&self) -> Result<Vec<Vec<String>>, StoreError> {
        let result = self.retry.run(|| self.fetch_all()).await;
        self.track(result)
    }
}
