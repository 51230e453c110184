#[cfg(feature = "lambda")]
use crate::core::reply::{DEFAULT_REPLY_ENDPOINT, DEFAULT_REPLY_TEXT};
#[cfg(feature = "lambda")]
use crate::core::{ConfigProvider, Storage};
#[cfg(feature = "lambda")]
use crate::utils::error::{EtlError, Result};
#[cfg(feature = "lambda")]
use aws_sdk_s3::Client as S3Client;
#[cfg(feature = "lambda")]
use std::env;
#[cfg(feature = "lambda")]
use std::time::Duration;

#[cfg(feature = "lambda")]
#[derive(Debug, Clone)]
pub struct LambdaConfig {
    pub s3_bucket: String,
    pub s3_prefix: String,
    pub s3_region: String,
    pub main_sheet: String,
    pub report_sheet: String,
    pub reply_endpoint: String,
    pub channel_token: String,
    pub reply_text: String,
    pub utc_offset_hours: i32,
}

#[cfg(feature = "lambda")]
impl LambdaConfig {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            s3_bucket: env::var("S3_BUCKET").map_err(|_| EtlError::MissingConfigError {
                field: "S3_BUCKET".to_string(),
            })?,
            s3_prefix: env::var("S3_PREFIX").unwrap_or_else(|_| "shift-reports".to_string()),
            s3_region: env::var("S3_REGION").unwrap_or_else(|_| "ap-northeast-1".to_string()),
            main_sheet: env::var("MAIN_SHEET").unwrap_or_else(|_| "data.csv".to_string()),
            report_sheet: env::var("REPORT_SHEET")
                .unwrap_or_else(|_| "data_report.csv".to_string()),
            reply_endpoint: env::var("REPLY_ENDPOINT")
                .unwrap_or_else(|_| DEFAULT_REPLY_ENDPOINT.to_string()),
            channel_token: env::var("LINE_TOKEN").map_err(|_| EtlError::MissingConfigError {
                field: "LINE_TOKEN".to_string(),
            })?,
            reply_text: env::var("REPLY_TEXT").unwrap_or_else(|_| DEFAULT_REPLY_TEXT.to_string()),
            utc_offset_hours: match env::var("UTC_OFFSET_HOURS") {
                Ok(value) => value
                    .parse::<i32>()
                    .map_err(|_| EtlError::InvalidConfigValueError {
                        field: "UTC_OFFSET_HOURS".to_string(),
                        value,
                        reason: "Expected a whole number of hours".to_string(),
                    })?,
                Err(_) => 9,
            },
        })
    }
}

#[cfg(feature = "lambda")]
impl ConfigProvider for LambdaConfig {
    fn output_path(&self) -> &str {
        &self.s3_prefix
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

#[cfg(feature = "lambda")]
impl crate::utils::validation::Validate for LambdaConfig {
    fn validate(&self) -> Result<()> {
        use crate::utils::validation::*;

        validate_s3_bucket_name("s3_bucket", &self.s3_bucket)?;
        validate_non_empty_string("s3_prefix", &self.s3_prefix)?;
        validate_aws_region("s3_region", &self.s3_region)?;
        validate_non_empty_string("channel_token", &self.channel_token)?;
        validate_provider(self)?;

        tracing::info!("✅ Lambda configuration validation passed");
        Ok(())
    }
}

#[cfg(feature = "lambda")]
fn validate_s3_bucket_name(field_name: &str, bucket_name: &str) -> Result<()> {
    let invalid = |reason: &str| EtlError::InvalidConfigValueError {
        field: field_name.to_string(),
        value: bucket_name.to_string(),
        reason: reason.to_string(),
    };

    if bucket_name.len() < 3 || bucket_name.len() > 63 {
        return Err(invalid("S3 bucket name must be between 3 and 63 characters"));
    }

    if !bucket_name
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' || c == '.')
    {
        return Err(invalid(
            "S3 bucket name can only contain lowercase letters, numbers, hyphens, and dots",
        ));
    }

    if bucket_name.starts_with('-') || bucket_name.ends_with('-') {
        return Err(invalid("S3 bucket name cannot start or end with a hyphen"));
    }

    Ok(())
}

#[cfg(feature = "lambda")]
fn validate_aws_region(field_name: &str, region: &str) -> Result<()> {
    crate::utils::validation::validate_non_empty_string(field_name, region)?;

    if !region
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
    {
        return Err(EtlError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: region.to_string(),
            reason: "AWS region can only contain lowercase letters, numbers, and hyphens"
                .to_string(),
        });
    }

    Ok(())
}

/// Sheets stored as objects under `prefix/`.
#[cfg(feature = "lambda")]
#[derive(Debug, Clone)]
pub struct S3Storage {
    client: S3Client,
    bucket: String,
    prefix: String,
}

#[cfg(feature = "lambda")]
impl S3Storage {
    pub fn new(client: S3Client, bucket: String, prefix: String) -> Self {
        Self {
            client,
            bucket,
            prefix,
        }
    }

    fn key(&self, path: &str) -> String {
        if self.prefix.is_empty() {
            path.to_string()
        } else {
            format!("{}/{}", self.prefix.trim_end_matches('/'), path)
        }
    }
}

#[cfg(feature = "lambda")]
impl Storage for S3Storage {
    async fn read_file(&self, path: &str) -> Result<Vec<u8>> {
        let resp = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(self.key(path))
            .send()
            .await
            .map_err(|e| EtlError::storage(format!("Failed to read from S3: {}", e)))?;

        let data = resp
            .body
            .collect()
            .await
            .map_err(|e| EtlError::storage(format!("Failed to collect S3 data: {}", e)))?;

        Ok(data.into_bytes().to_vec())
    }

    /// S3 has no append, so this is read-modify-write guarded by the object's ETag.
    /// A put that loses the race fails its precondition and is retried.
    async fn append_file(&self, path: &str, header: &[u8], data: &[u8]) -> Result<()> {
        let key = self.key(path);

        for attempt in 1..=APPEND_ATTEMPTS {
            let (existing, etag) = self.fetch_for_append(&key).await?;
            let body = append_body(existing, header, data);

            let put = self
                .client
                .put_object()
                .bucket(&self.bucket)
                .key(&key)
                .content_type("text/csv; charset=utf-8")
                .body(body.into());
            let put = match &etag {
                Some(etag) => put.if_match(etag),
                None => put.if_none_match("*"),
            };

            match put.send().await {
                Ok(_) => return Ok(()),
                Err(err) => {
                    let status = err.raw_response().map(|r| r.status().as_u16());
                    if matches!(status, Some(409 | 412)) && attempt < APPEND_ATTEMPTS {
                        tracing::warn!(
                            "Concurrent write to s3://{}/{}, retrying (attempt {})",
                            self.bucket,
                            key,
                            attempt
                        );
                        tokio::time::sleep(Duration::from_millis(50 * u64::from(attempt))).await;
                        continue;
                    }
                    return Err(EtlError::storage(format!(
                        "Failed to write to S3: {}",
                        err.into_service_error()
                    )));
                }
            }
        }

        Err(EtlError::storage(format!(
            "Gave up appending to s3://{}/{} after {} attempts",
            self.bucket, key, APPEND_ATTEMPTS
        )))
    }
}

#[cfg(feature = "lambda")]
const APPEND_ATTEMPTS: u32 = 5;

#[cfg(feature = "lambda")]
impl S3Storage {
    /// Current object bytes and ETag; a missing object is empty with no ETag.
    async fn fetch_for_append(&self, key: &str) -> Result<(Vec<u8>, Option<String>)> {
        let resp = match self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
        {
            Ok(resp) => resp,
            Err(err) => {
                let service_err = err.into_service_error();
                if service_err.is_no_such_key() {
                    return Ok((Vec::new(), None));
                }
                return Err(EtlError::storage(format!(
                    "Failed to read from S3: {}",
                    service_err
                )));
            }
        };

        let etag = resp.e_tag().map(str::to_string);
        let data = resp
            .body
            .collect()
            .await
            .map_err(|e| EtlError::storage(format!("Failed to collect S3 data: {}", e)))?;

        Ok((data.into_bytes().to_vec(), etag))
    }
}

/// New contents for an object: header first when empty, a newline kept between rows.
#[cfg(feature = "lambda")]
fn append_body(mut existing: Vec<u8>, header: &[u8], data: &[u8]) -> Vec<u8> {
    if existing.is_empty() {
        existing.extend_from_slice(header);
    } else if !existing.ends_with(b"\n") {
        existing.push(b'\n');
    }
    existing.extend_from_slice(data);
    existing
}
