// Copyright (c) James Kassemi, SC, US. All rights reserved.

//! Text-completion collaborator and the free-text question pipeline.
//!
//! Free-text questions run a two-stage pipeline: structured ledger
//! lookup first, completion second. A completion that names a ledger
//! command is folded through a bounded one-command grammar and handed
//! back as a *suggestion*; nothing in this crate re-invokes an
//! operation from model output.

use async_trait::async_trait;
use core_types::types::{format_amount, format_internal_date, parse_external_date, Receipt};
use ledger::{Identifier, LedgerError, LedgerService};
use log::debug;
use reqwest::{Client, Url};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AssistantError {
    #[error("request error: {0}")]
    Request(#[from] reqwest::Error),
    #[error("url parse error: {0}")]
    Url(#[from] url::ParseError),
    #[error("completion endpoint returned status {status}")]
    Upstream { status: u16 },
    #[error("completion response carried no text")]
    EmptyCompletion,
    #[error("ledger error: {0}")]
    Ledger(#[from] LedgerError),
}

/// Capability preamble sent ahead of every free-text question.
const CAPABILITY_PROMPT: &str = "You are assisting with a payment tracking service. \
It supports these commands:\n\
- `!show_receipt <serial or DD/MM/YYYY>`: look up a logged payment.\n\
- `!log_payment <amount>`: log a payment.\n\
- `!delete_receipt <serial or DD/MM/YYYY>`: delete a payment record.\n\
If one of these would answer the question, name it in your reply.";

#[async_trait]
pub trait Completion: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<String, AssistantError>;
}

/// Messages-style completion API client.
#[derive(Clone)]
pub struct CompletionClient {
    client: Client,
    base_url: String,
    api_key: String,
    model: String,
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    messages: Vec<Message<'a>>,
}

#[derive(Debug, Serialize)]
struct Message<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    text: Option<String>,
}

impl CompletionClient {
    pub fn new(
        client: Client,
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
        max_tokens: u32,
    ) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            api_key: api_key.into(),
            model: model.into(),
            max_tokens,
        }
    }
}

#[async_trait]
impl Completion for CompletionClient {
    async fn complete(&self, prompt: &str) -> Result<String, AssistantError> {
        let mut url = Url::parse(&self.base_url)?;
        url.set_path("/v1/messages");
        let body = CompletionRequest {
            model: &self.model,
            max_tokens: self.max_tokens,
            messages: vec![Message {
                role: "user",
                content: prompt,
            }],
        };
        let resp = self
            .client
            .post(url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", "2023-06-01")
            .json(&body)
            .send()
            .await?;
        if !resp.status().is_success() {
            return Err(AssistantError::Upstream {
                status: resp.status().as_u16(),
            });
        }
        let parsed: CompletionResponse = resp.json().await?;
        parsed
            .content
            .into_iter()
            .find_map(|block| block.text)
            .ok_or(AssistantError::EmptyCompletion)
    }
}

/// The one command shape a completion may suggest.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SuggestedCommand {
    ShowReceipt(Identifier),
}

/// Extracts a suggested command from completion text.
///
/// Only the first `!show_receipt <identifier>` form is recognized and
/// only when its argument parses as a real identifier. The suggestion
/// is returned to the caller, never executed here.
pub fn parse_suggestion(response: &str) -> Option<SuggestedCommand> {
    let mut tokens = response.split_whitespace();
    while let Some(token) = tokens.next() {
        if token.trim_matches(|c: char| c == '`' || c == '"') == "!show_receipt" {
            let arg = tokens.next()?;
            let arg = arg.trim_matches(|c: char| c == '`' || c == '"' || c == '.' || c == ',');
            return Identifier::parse(arg).ok().map(SuggestedCommand::ShowReceipt);
        }
    }
    None
}

/// Outcome of a free-text question.
#[derive(Debug, Clone)]
pub enum Answer {
    /// The structured lookup resolved the question directly.
    Found { receipt: Receipt, text: String },
    /// The completion collaborator answered, possibly naming a command
    /// the caller may choose to run.
    FromCompletion {
        text: String,
        suggestion: Option<SuggestedCommand>,
    },
}

/// First token in `question` that parses as an external-format date.
fn extract_date_token(question: &str) -> Option<&str> {
    question
        .split_whitespace()
        .map(|token| token.trim_matches(|c: char| !c.is_ascii_digit() && c != '/'))
        .find(|token| parse_external_date(token).is_ok())
}

/// Two-stage question pipeline: structured lookup first, completion
/// as the fallback. Never mutates the ledger.
pub async fn answer_question(
    ledger: &LedgerService,
    completion: &dyn Completion,
    question: &str,
) -> Result<Answer, AssistantError> {
    if let Some(token) = extract_date_token(question) {
        if let Some(receipt) = ledger.find_by_identifier(token).await? {
            let text = format!(
                "Yes, a payment of {} was logged for {} on {}.",
                format_amount(receipt.amount),
                receipt.payer,
                format_internal_date(receipt.payment_date),
            );
            return Ok(Answer::Found { receipt, text });
        }
        debug!("no receipt for {token}, falling back to completion");
    }
    let prompt = format!("{CAPABILITY_PROMPT}\n\nUser Question: {question}");
    let text = completion.complete(&prompt).await?;
    let suggestion = parse_suggestion(&text);
    Ok(Answer::FromCompletion { text, suggestion })
}
