use thiserror::Error;

/// Failure to turn a message body into a report.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("empty input")]
    EmptyInput,

    #[error("invalid report format")]
    InvalidReportFormat,
}

#[derive(Error, Debug)]
pub enum EtlError {
    #[error("Failed to parse message: {0}")]
    ParseError(#[from] ParseError),

    #[error("API request failed: {0}")]
    ApiError(#[from] reqwest::Error),

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Webhook error: {message}")]
    WebhookError { message: String },

    #[error("Storage error: {message}")]
    StorageError { message: String },

    #[error("Reply API returned status {status}")]
    ReplyError { status: u16 },

    #[error("Missing configuration: {field}")]
    MissingConfigError { field: String },

    #[error("Invalid value '{value}' for {field}: {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Configuration validation failed for {field}: {message}")]
    ConfigValidationError { field: String, message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Input,
    Network,
    Storage,
    Configuration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl EtlError {
    pub fn webhook(message: impl Into<String>) -> Self {
        Self::WebhookError {
            message: message.into(),
        }
    }

    pub fn storage(message: impl Into<String>) -> Self {
        Self::StorageError {
            message: message.into(),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            EtlError::ParseError(_)
            | EtlError::WebhookError { .. }
            | EtlError::SerializationError(_) => ErrorCategory::Input,
            EtlError::ApiError(_) | EtlError::ReplyError { .. } => ErrorCategory::Network,
            EtlError::CsvError(_) | EtlError::IoError(_) | EtlError::StorageError { .. } => {
                ErrorCategory::Storage
            }
            EtlError::MissingConfigError { .. }
            | EtlError::InvalidConfigValueError { .. }
            | EtlError::ConfigValidationError { .. } => ErrorCategory::Configuration,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            // The records are already stored when the reply fails.
            ErrorCategory::Network => ErrorSeverity::Medium,
            ErrorCategory::Input => ErrorSeverity::High,
            ErrorCategory::Storage | ErrorCategory::Configuration => ErrorSeverity::Critical,
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            EtlError::ParseError(ParseError::EmptyInput) => "Send a non-empty report message",
            EtlError::ParseError(ParseError::InvalidReportFormat) => {
                "Numbered lines must look like '1. organization/全日2,半日1/site'"
            }
            EtlError::WebhookError { .. } | EtlError::SerializationError(_) => {
                "Check that the payload is a webhook event with a text message"
            }
            EtlError::ApiError(_) | EtlError::ReplyError { .. } => {
                "Check the channel access token and the reply endpoint"
            }
            EtlError::CsvError(_) | EtlError::IoError(_) | EtlError::StorageError { .. } => {
                "Check that the output location exists and is writable"
            }
            EtlError::MissingConfigError { .. }
            | EtlError::InvalidConfigValueError { .. }
            | EtlError::ConfigValidationError { .. } => "Review the configuration values",
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self.category() {
            ErrorCategory::Input => format!("The report could not be read: {}", self),
            ErrorCategory::Network => format!("The reply could not be sent: {}", self),
            ErrorCategory::Storage => format!("The report could not be saved: {}", self),
            ErrorCategory::Configuration => format!("Invalid configuration: {}", self),
        }
    }
}

pub type Result<T> = std::result::Result<T, EtlError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_error_message_is_wrapped() {
        let err = EtlError::from(ParseError::InvalidReportFormat);
        assert_eq!(
            err.to_string(),
            "Failed to parse message: invalid report format"
        );
        assert_eq!(err.category(), ErrorCategory::Input);
        assert_eq!(err.severity(), ErrorSeverity::High);
    }

    #[test]
    fn test_reply_failure_is_not_critical() {
        let err = EtlError::ReplyError { status: 401 };
        assert_eq!(err.category(), ErrorCategory::Network);
        assert!(err.severity() < ErrorSeverity::Critical);
    }

    #[test]
    fn test_config_errors_are_critical() {
        let errors = [
            EtlError::MissingConfigError {
                field: "S3_BUCKET".to_string(),
            },
            EtlError::InvalidConfigValueError {
                field: "utc_offset_hours".to_string(),
                value: "30".to_string(),
                reason: "Offset is out of range".to_string(),
            },
            EtlError::ConfigValidationError {
                field: "reply.channel_token".to_string(),
                message: "environment variable ${LINE_TOKEN} is not set".to_string(),
            },
        ];

        for err in errors {
            assert_eq!(err.category(), ErrorCategory::Configuration);
            assert_eq!(err.severity(), ErrorSeverity::Critical);
            assert_eq!(err.recovery_suggestion(), "Review the configuration values");
        }
    }
}
