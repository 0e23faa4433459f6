use chrono::NaiveDate;
use config::{Config, ConfigError};
use serde::{Deserialize, Serialize};

use crate::types::{parse_internal_date, INTERNAL_DATE_FORMAT};

/// Top-level configuration, loaded from `config.toml` and the
/// environment.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    pub sheet: SheetConfig,
    pub notify: NotifyConfig,
    pub assistant: AssistantConfig,
    pub scheduler: SchedulerConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct SheetConfig {
    pub base_url: String,
    pub sheet_id: String,
    pub api_token: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct NotifyConfig {
    pub base_url: String,
    pub api_token: String,
    /// Channel receiving due-date reminders.
    pub reminder_channel: String,
    /// Channel receiving the fortnightly report broadcast.
    pub report_channel: String,
    /// Channel receiving the weekday chore reminders.
    pub chore_channel: String,
}

/// Completion collaborator settings. Read by the chat front end that
/// embeds the `assistant` crate; the loop binary loads and validates
/// the section but does not consume it itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssistantConfig {
    #[serde(default = "default_assistant_base_url")]
    pub base_url: String,
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_assistant_model")]
    pub model: String,
    #[serde(default = "default_assistant_max_tokens")]
    pub max_tokens: u32,
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            base_url: default_assistant_base_url(),
            api_key: String::new(),
            model: default_assistant_model(),
            max_tokens: default_assistant_max_tokens(),
        }
    }
}

fn default_assistant_base_url() -> String {
    "https://api.anthropic.com".to_string()
}

fn default_assistant_model() -> String {
    "claude-3-haiku-20240307".to_string()
}

fn default_assistant_max_tokens() -> u32 {
    150
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// First due date of the cycle, `%Y-%m-%d`.
    #[serde(default = "default_anchor_due_date")]
    pub anchor_due_date: String,
    #[serde(default = "default_reminder_interval_s")]
    pub reminder_interval_s: u64,
    #[serde(default = "default_report_interval_s")]
    pub report_interval_s: u64,
    /// Chore reminder weekday, 0 = Monday .. 6 = Sunday.
    #[serde(default = "default_chore_weekday")]
    pub chore_weekday: u8,
    /// Hour-of-day slots fired on the chore weekday.
    #[serde(default = "default_chore_hours")]
    pub chore_hours: Vec<u8>,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            anchor_due_date: default_anchor_due_date(),
            reminder_interval_s: default_reminder_interval_s(),
            report_interval_s: default_report_interval_s(),
            chore_weekday: default_chore_weekday(),
            chore_hours: default_chore_hours(),
        }
    }
}

fn default_anchor_due_date() -> String {
    "2024-09-20".to_string()
}

fn default_reminder_interval_s() -> u64 {
    86_400
}

fn default_report_interval_s() -> u64 {
    1_209_600
}

fn default_chore_weekday() -> u8 {
    3 // Thursday
}

fn default_chore_hours() -> Vec<u8> {
    vec![20, 22, 0]
}

impl SchedulerConfig {
    pub fn anchor(&self) -> Result<NaiveDate, ConfigError> {
        parse_internal_date(&self.anchor_due_date).map_err(|_| {
            ConfigError::Message(format!(
                "scheduler.anchor_due_date must be {INTERNAL_DATE_FORMAT}, got {:?}",
                self.anchor_due_date
            ))
        })
    }
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(config::File::with_name("config.toml").required(false))
            .add_source(config::Environment::with_prefix("APP").separator("__"))
            .build()?;
        let config: Self = settings.try_deserialize()?;
        if config.sheet.base_url.is_empty() {
            return Err(ConfigError::Message(
                "APP_SHEET__BASE_URL is required".to_string(),
            ));
        }
        if config.sheet.api_token.is_empty() {
            return Err(ConfigError::Message(
                "APP_SHEET__API_TOKEN is required".to_string(),
            ));
        }
        if config.notify.base_url.is_empty() {
            return Err(ConfigError::Message(
                "APP_NOTIFY__BASE_URL is required".to_string(),
            ));
        }
        config.scheduler.anchor()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scheduler_defaults_match_the_fortnight_cycle() {
        let cfg = SchedulerConfig::default();
        assert_eq!(cfg.reminder_interval_s, 86_400);
        assert_eq!(cfg.report_interval_s, 14 * 86_400);
        assert_eq!(cfg.chore_hours, vec![20, 22, 0]);
        assert_eq!(
            cfg.anchor().unwrap(),
            NaiveDate::from_ymd_opt(2024, 9, 20).unwrap()
        );
    }

    #[test]
    fn bad_anchor_is_a_config_error() {
        let cfg = SchedulerConfig {
            anchor_due_date: "20/09/2024".to_string(),
            ..Default::default()
        };
        assert!(cfg.anchor().is_err());
    }
}
