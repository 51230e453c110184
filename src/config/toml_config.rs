use crate::core::reply::{DEFAULT_REPLY_ENDPOINT, DEFAULT_REPLY_TEXT};
use crate::core::ConfigProvider;
use crate::utils::error::{EtlError, Result};
use crate::utils::validation::{validate_non_empty_string, validate_provider, Validate};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::LazyLock;

static ENV_VAR: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\$\{([^}]+)\}").unwrap());

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TomlConfig {
    pub service: Option<ServiceConfig>,
    pub storage: StorageConfig,
    pub reply: ReplyConfig,
    pub timestamp: Option<TimestampConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    pub output_path: String,
    pub main_sheet: Option<String>,
    pub report_sheet: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReplyConfig {
    pub endpoint: Option<String>,
    pub channel_token: String,
    pub text: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimestampConfig {
    pub utc_offset_hours: Option<i32>,
}

impl TomlConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(EtlError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content);

        toml::from_str(&processed_content).map_err(|e| EtlError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${LINE_TOKEN})，未設定的變數保持原樣
    fn substitute_env_vars(content: &str) -> String {
        ENV_VAR
            .replace_all(content, |caps: &regex::Captures| {
                let var_name = &caps[1];
                std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
            })
            .into_owned()
    }

    pub fn service_name(&self) -> &str {
        self.service
            .as_ref()
            .map(|s| s.name.as_str())
            .unwrap_or("shift-report-etl")
    }
}

impl ConfigProvider for TomlConfig {
    fn output_path(&self) -> &str {
        &self.storage.output_path
    }

    fn main_sheet(&self) -> &str {
        self.storage.main_sheet.as_deref().unwrap_or("data.csv")
    }

    fn report_sheet(&self) -> &str {
        self.storage
            .report_sheet
            .as_deref()
            .unwrap_or("data_report.csv")
    }

    fn reply_endpoint(&self) -> &str {
        self.reply.endpoint.as_deref().unwrap_or(DEFAULT_REPLY_ENDPOINT)
    }

    fn channel_token(&self) -> &str {
        &self.reply.channel_token
    }

    fn reply_text(&self) -> &str {
        self.reply.text.as_deref().unwrap_or(DEFAULT_REPLY_TEXT)
    }

    fn utc_offset_hours(&self) -> i32 {
        self.timestamp
            .as_ref()
            .and_then(|t| t.utc_offset_hours)
            .unwrap_or(9)
    }
}

impl Validate for TomlConfig {
    fn validate(&self) -> Result<()> {
        validate_non_empty_string("service.name", self.service_name())?;
        validate_provider(self)?;
        validate_non_empty_string("reply.channel_token", &self.reply.channel_token)?;

        if ENV_VAR.is_match(&self.reply.channel_token) {
            return Err(EtlError::ConfigValidationError {
                field: "reply.channel_token".to_string(),
                message: format!(
                    "environment variable {} is not set",
                    self.reply.channel_token
                ),
            });
        }

        Ok(())
    }
}
