// Copyright (c) James Kassemi, SC, US. All rights reserved.

//! Notification destination boundary.
//!
//! A [`Target`] is either a broadcast channel or a direct-message
//! handle; [`Notifier`] delivers one text message to one target.
//! Delivery is best effort: callers that loop must log a failure and
//! carry on, never die on it.

use async_trait::async_trait;
use log::debug;
use reqwest::{Client, Url};
use std::sync::Mutex;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    Channel(String),
    Direct(String),
}

impl std::fmt::Display for Target {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Target::Channel(id) => write!(f, "channel {id}"),
            Target::Direct(id) => write!(f, "user {id}"),
        }
    }
}

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("request error: {0}")]
    Request(#[from] reqwest::Error),
    #[error("url parse error: {0}")]
    Url(#[from] url::ParseError),
    #[error("notify endpoint returned status {status}")]
    Status { status: u16 },
}

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, target: &Target, text: &str) -> Result<(), NotifyError>;
}

/// Posts messages to the chat gateway's channel and user endpoints.
#[derive(Clone)]
pub struct HttpNotifier {
    client: Client,
    base_url: String,
    api_token: String,
}

impl HttpNotifier {
    pub fn new(
        client: Client,
        base_url: impl Into<String>,
        api_token: impl Into<String>,
    ) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            api_token: api_token.into(),
        }
    }

    fn message_url(&self, target: &Target) -> Result<Url, NotifyError> {
        let mut url = Url::parse(&self.base_url)?;
        let path = match target {
            Target::Channel(id) => format!("/v1/channels/{id}/messages"),
            Target::Direct(id) => format!("/v1/users/{id}/messages"),
        };
        url.set_path(&path);
        Ok(url)
    }
}

#[async_trait]
impl Notifier for HttpNotifier {
    async fn send(&self, target: &Target, text: &str) -> Result<(), NotifyError> {
        let url = self.message_url(target)?;
        debug!("sending notification to {target}");
        let resp = self
            .client
            .post(url)
            .bearer_auth(&self.api_token)
            .json(&serde_json::json!({ "content": text }))
            .send()
            .await?;
        if !resp.status().is_success() {
            return Err(NotifyError::Status {
                status: resp.status().as_u16(),
            });
        }
        Ok(())
    }
}

/// Test double recording every delivery.
#[derive(Default)]
pub struct MemoryNotifier {
    sent: Mutex<Vec<(Target, String)>>,
}

impl MemoryNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sent(&self) -> Vec<(Target, String)> {
        self.sent.lock().expect("notifier poisoned").clone()
    }
}

#[async_trait]
impl Notifier for MemoryNotifier {
    async fn send(&self, target: &Target, text: &str) -> Result<(), NotifyError> {
        self.sent
            .lock()
            .expect("notifier poisoned")
            .push((target.clone(), text.to_string()));
        Ok(())
    }
}

/// Test double that always fails, for delivery-failure paths.
#[derive(Default)]
pub struct FailingNotifier;

#[async_trait]
impl Notifier for FailingNotifier {
    async fn send(&self, _target: &Target, _text: &str) -> Result<(), NotifyError> {
        Err(NotifyError::Status { status: 503 })
    }
}
