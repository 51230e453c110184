use crate::utils::error::{EtlError, Result};
use std::collections::HashSet;
use url::Url;

pub trait Validate {
    fn validate(&self) -> Result<()>;
}

pub fn validate_url(field_name: &str, url_str: &str) -> Result<()> {
    if url_str.is_empty() {
        return Err(EtlError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: url_str.to_string(),
            reason: "URL cannot be empty".to_string(),
        });
    }

    match Url::parse(url_str) {
        Ok(url) => match url.scheme() {
            "http" | "https" => Ok(()),
            scheme => Err(EtlError::InvalidConfigValueError {
                field: field_name.to_string(),
                value: url_str.to_string(),
                reason: format!("Unsupported URL scheme: {}", scheme),
            }),
        },
        Err(e) => Err(EtlError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: url_str.to_string(),
            reason: format!("Invalid URL format: {}", e),
        }),
    }
}

pub fn validate_path(field_name: &str, path: &str) -> Result<()> {
    if path.is_empty() {
        return Err(EtlError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: path.to_string(),
            reason: "Path cannot be empty".to_string(),
        });
    }

    if path.contains('\0') {
        return Err(EtlError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: path.to_string(),
            reason: "Path contains null bytes".to_string(),
        });
    }

    Ok(())
}

/// Sheet files must be plain file names with an allowed extension.
pub fn validate_sheet_file(field_name: &str, file: &str, allowed_extensions: &[&str]) -> Result<()> {
    validate_path(field_name, file)?;

    if file.contains('/') || file.contains('\\') {
        return Err(EtlError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: file.to_string(),
            reason: "Sheet file must be a file name, not a path".to_string(),
        });
    }

    let allowed_set: HashSet<&str> = allowed_extensions.iter().copied().collect();

    match std::path::Path::new(file)
        .extension()
        .and_then(|ext| ext.to_str())
    {
        Some(extension) if allowed_set.contains(extension) => Ok(()),
        Some(extension) => Err(EtlError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: file.to_string(),
            reason: format!(
                "Unsupported file extension: {}. Allowed extensions: {}",
                extension,
                allowed_extensions.join(", ")
            ),
        }),
        None => Err(EtlError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: file.to_string(),
            reason: "File has no extension or invalid filename".to_string(),
        }),
    }
}

pub fn validate_non_empty_string(field_name: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(EtlError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: "Value cannot be empty or whitespace-only".to_string(),
        });
    }
    Ok(())
}

pub fn validate_range<T: PartialOrd + std::fmt::Display + Copy>(
    field_name: &str,
    value: T,
    min: T,
    max: T,
) -> Result<()> {
    if value < min || value > max {
        return Err(EtlError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: format!("Value must be between {} and {}", min, max),
        });
    }
    Ok(())
}

/// Checks shared by every `ConfigProvider`.
pub fn validate_provider<C: crate::core::ConfigProvider>(config: &C) -> Result<()> {
    validate_path("output_path", config.output_path())?;
    validate_sheet_file("main_sheet", config.main_sheet(), &["csv"])?;
    validate_sheet_file("report_sheet", config.report_sheet(), &["csv"])?;

    if config.main_sheet() == config.report_sheet() {
        return Err(EtlError::ConfigValidationError {
            field: "report_sheet".to_string(),
            message: "main and report sheets must be different files".to_string(),
        });
    }

    validate_url("reply_endpoint", config.reply_endpoint())?;
    validate_non_empty_string("reply_text", config.reply_text())?;
    validate_range("utc_offset_hours", config.utc_offset_hours(), -12, 14)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_url() {
        assert!(validate_url("reply_endpoint", "https://api.line.me/v2/bot/message/reply").is_ok());
        assert!(validate_url("reply_endpoint", "http://localhost:8080/reply").is_ok());
        assert!(validate_url("reply_endpoint", "").is_err());
        assert!(validate_url("reply_endpoint", "invalid-url").is_err());
        assert!(validate_url("reply_endpoint", "ftp://example.com").is_err());
    }

    #[test]
    fn test_validate_sheet_file() {
        assert!(validate_sheet_file("main_sheet", "data.csv", &["csv"]).is_ok());
        assert!(validate_sheet_file("main_sheet", "data.txt", &["csv"]).is_err());
        assert!(validate_sheet_file("main_sheet", "data", &["csv"]).is_err());
        assert!(validate_sheet_file("main_sheet", "../data.csv", &["csv"]).is_err());
    }

    #[test]
    fn test_validate_range() {
        assert!(validate_range("utc_offset_hours", 9, -12, 14).is_ok());
        assert!(validate_range("utc_offset_hours", 15, -12, 14).is_err());
    }
}
