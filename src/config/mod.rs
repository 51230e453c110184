pub mod cli;
pub mod lambda;
pub mod toml_config;

#[cfg(feature = "cli")]
use crate::core::reply::{DEFAULT_REPLY_ENDPOINT, DEFAULT_REPLY_TEXT};
#[cfg(feature = "cli")]
use crate::core::ConfigProvider;
#[cfg(feature = "cli")]
use crate::utils::error::{EtlError, Result};
#[cfg(feature = "cli")]
use crate::utils::validation::{validate_path, validate_provider, Validate};
#[cfg(feature = "cli")]
use clap::Parser;
#[cfg(feature = "cli")]
use serde::{Deserialize, Serialize};

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Serialize, Deserialize, Parser)]
#[command(name = "shift-report-etl")]
#[command(about = "Parse shift report messages and append them to CSV sheets")]
pub struct CliConfig {
    /// Webhook request body (JSON) to process
    #[arg(long, conflicts_with = "message")]
    pub payload: Option<String>,

    /// Raw report message text to process; no reply is sent
    #[arg(long)]
    pub message: Option<String>,

    /// TOML configuration file; overrides the sheet and reply options below
    #[arg(long)]
    pub config: Option<String>,

    #[arg(long, default_value = "./output")]
    pub output_path: String,

    #[arg(long, default_value = "data.csv")]
    pub main_sheet: String,

    #[arg(long, default_value = "data_report.csv")]
    pub report_sheet: String,

    #[arg(long, default_value = DEFAULT_REPLY_ENDPOINT)]
    pub reply_endpoint: String,

    #[arg(long, env = "LINE_TOKEN", default_value = "", hide_env_values = true)]
    #[serde(skip_serializing)]
    pub channel_token: String,

    #[arg(long, default_value = DEFAULT_REPLY_TEXT)]
    pub reply_text: String,

    #[arg(long, default_value = "9", allow_negative_numbers = true)]
    pub utc_offset_hours: i32,

    #[arg(long, help = "Print the parsed report without saving or replying")]
    pub dry_run: bool,

    #[arg(long, help = "Enable verbose output")]
    pub verbose: bool,
}

#[cfg(feature = "cli")]
impl ConfigProvider for CliConfig {
    fn output_path(&self) -> &str {
        &self.output_path
    }

    fn main_sheet(&self) -> &str {
        &self.main_sheet
    }

    fn report_sheet(&self) -> &str {
        &self.report_sheet
    }

    fn reply_endpoint(&self) -> &str {
        &self.reply_endpoint
    }

    fn channel_token(&self) -> &str {
        &self.channel_token
    }

    fn reply_text(&self) -> &str {
        &self.reply_text
    }

    fn utc_offset_hours(&self) -> i32 {
        self.utc_offset_hours
    }
}

#[cfg(feature = "cli")]
impl Validate for CliConfig {
    fn validate(&self) -> Result<()> {
        match (&self.payload, &self.message) {
            (Some(path), _) => validate_path("payload", path)?,
            (None, Some(path)) => validate_path("message", path)?,
            (None, None) => {
                return Err(EtlError::MissingConfigError {
                    field: "payload or message".to_string(),
                })
            }
        }

        if let Some(config) = &self.config {
            validate_path("config", config)?;
        }

        // Only webhook payloads carry a reply token. A TOML file brings its own.
        if self.payload.is_some()
            && self.config.is_none()
            && !self.dry_run
            && self.channel_token.is_empty()
        {
            return Err(EtlError::MissingConfigError {
                field: "channel_token (LINE_TOKEN)".to_string(),
            });
        }

        validate_provider(self)
    }
}
