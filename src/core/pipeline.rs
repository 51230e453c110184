use crate::core::parser::parse_message;
use crate::core::webhook::WebhookPayload;
use crate::core::{
    ConfigProvider, InboundMessage, LoadSummary, Pipeline, ReplySender, SheetRow, Storage,
    TransformResult,
};
use crate::utils::error::{EtlError, Result};
use chrono::{DateTime, FixedOffset, Utc};
use tokio::sync::Mutex;

/// Sheet timestamp format, e.g. `2024/05/01 9:05:00`.
pub const RECEIVED_AT_FORMAT: &str = "%Y/%m/%d %-H:%M:%S";

pub fn format_received_at(now: DateTime<Utc>, utc_offset_hours: i32) -> Result<String> {
    let offset = FixedOffset::east_opt(utc_offset_hours * 3600).ok_or_else(|| {
        EtlError::InvalidConfigValueError {
            field: "utc_offset_hours".to_string(),
            value: utc_offset_hours.to_string(),
            reason: "Offset is out of range".to_string(),
        }
    })?;

    Ok(now
        .with_timezone(&offset)
        .format(RECEIVED_AT_FORMAT)
        .to_string())
}

/// Webhook body -> report -> CSV sheets -> reply.
pub struct ReportPipeline<S: Storage, C: ConfigProvider, R: ReplySender> {
    pub(crate) storage: S,
    pub(crate) config: C,
    pub(crate) replier: R,
    // Held for a whole load so rows of concurrent messages never interleave.
    sheet_lock: Mutex<()>,
}

impl<S: Storage, C: ConfigProvider, R: ReplySender> ReportPipeline<S, C, R> {
    pub fn new(storage: S, config: C, replier: R) -> Self {
        Self {
            storage,
            config,
            replier,
            sheet_lock: Mutex::new(()),
        }
    }

    pub fn config(&self) -> &C {
        &self.config
    }

    /// Appends `rows` to a sheet; the storage writes the header when the sheet is new.
    async fn append_rows<T: SheetRow + Sync>(&self, sheet: &str, rows: &[T]) -> Result<()> {
        let mut header = csv::Writer::from_writer(Vec::new());
        header.write_record(T::HEADER)?;

        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(Vec::new());
        for row in rows {
            writer.serialize(row)?;
        }

        let header = into_bytes(header, sheet)?;
        let data = into_bytes(writer, sheet)?;

        tracing::debug!("Appending {} row(s) ({} bytes) to {}", rows.len(), data.len(), sheet);
        self.storage.append_file(sheet, &header, &data).await
    }
}

fn into_bytes(writer: csv::Writer<Vec<u8>>, sheet: &str) -> Result<Vec<u8>> {
    writer
        .into_inner()
        .map_err(|e| EtlError::storage(format!("Failed to flush {}: {}", sheet, e)))
}

#[async_trait::async_trait]
impl<S: Storage, C: ConfigProvider, R: ReplySender> Pipeline for ReportPipeline<S, C, R> {
    async fn extract(&self, payload: &str) -> Result<InboundMessage> {
        tracing::debug!("Extracting message from {} byte payload", payload.len());
        WebhookPayload::from_json(payload)?.into_message()
    }

    async fn transform(&self, message: InboundMessage) -> Result<TransformResult> {
        let report = parse_message(&message.text)?;
        tracing::info!(
            "Parsed report '{}' with {} sub entries",
            report.identifier,
            report.sub_entries.len()
        );

        let received_at = format_received_at(Utc::now(), self.config.utc_offset_hours())?;
        Ok(TransformResult::new(report, received_at))
    }

    async fn load(&self, result: TransformResult) -> Result<LoadSummary> {
        let main_sheet = self.config.main_sheet();
        let report_sheet = self.config.report_sheet();
        let _guard = self.sheet_lock.lock().await;

        self.append_rows(main_sheet, std::slice::from_ref(&result.main_row))
            .await?;

        if !result.sub_entry_rows.is_empty() {
            self.append_rows(report_sheet, &result.sub_entry_rows).await?;
        } else if !result.report.sub_entries.is_empty() {
            tracing::debug!(
                "Skipping {} sub entries, other reports flag is {:?}",
                result.report.sub_entries.len(),
                result.report.has_other_reports
            );
        }

        Ok(LoadSummary {
            main_sheet: main_sheet.to_string(),
            report_sheet: report_sheet.to_string(),
            main_rows: 1,
            sub_entry_rows: result.sub_entry_rows.len(),
        })
    }

    async fn reply(&self, reply_token: &str) -> Result<()> {
        self.replier
            .send_reply(reply_token, self.config.reply_text())
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::reply::DEFAULT_REPLY_TEXT;
    use chrono::TimeZone;
    use std::collections::HashMap;
    use std::sync::Arc;

    #[derive(Clone, Default)]
    struct MockStorage {
        files: Arc<Mutex<HashMap<String, Vec<u8>>>>,
    }

    impl MockStorage {
        async fn get_file(&self, path: &str) -> Option<String> {
            self.read_file(path)
                .await
                .ok()
                .map(|data| String::from_utf8_lossy(&data).into_owned())
        }
    }

    impl Storage for MockStorage {
        async fn read_file(&self, path: &str) -> Result<Vec<u8>> {
            let files = self.files.lock().await;
            files.get(path).cloned().ok_or_else(|| {
                EtlError::IoError(std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    format!("File not found: {}", path),
                ))
            })
        }

        // Read, yield, write back: a storage without native append.
        async fn append_file(&self, path: &str, header: &[u8], data: &[u8]) -> Result<()> {
            let mut contents = self
                .files
                .lock()
                .await
                .get(path)
                .cloned()
                .unwrap_or_default();
            tokio::task::yield_now().await;

            if contents.is_empty() {
                contents.extend_from_slice(header);
            }
            contents.extend_from_slice(data);
            self.files.lock().await.insert(path.to_string(), contents);
            Ok(())
        }
    }

    #[derive(Clone, Default)]
    struct MockReply {
        sent: Arc<Mutex<Vec<(String, String)>>>,
    }

    impl ReplySender for MockReply {
        async fn send_reply(&self, reply_token: &str, text: &str) -> Result<()> {
            self.sent
                .lock()
                .await
                .push((reply_token.to_string(), text.to_string()));
            Ok(())
        }
    }

    struct MockConfig;

    impl ConfigProvider for MockConfig {
        fn output_path(&self) -> &str {
            "test_output"
        }

        fn main_sheet(&self) -> &str {
            "data.csv"
        }

        fn report_sheet(&self) -> &str {
            "data_report.csv"
        }

        fn reply_endpoint(&self) -> &str {
            "http://localhost/reply"
        }

        fn channel_token(&self) -> &str {
            "token"
        }

        fn reply_text(&self) -> &str {
            DEFAULT_REPLY_TEXT
        }

        fn utc_offset_hours(&self) -> i32 {
            9
        }
    }

    fn pipeline() -> (ReportPipeline<MockStorage, MockConfig, MockReply>, MockStorage, MockReply) {
        let storage = MockStorage::default();
        let replier = MockReply::default();
        (
            ReportPipeline::new(storage.clone(), MockConfig, replier.clone()),
            storage,
            replier,
        )
    }

    #[test]
    fn test_format_received_at_uses_offset() {
        let now = Utc.with_ymd_and_hms(2024, 4, 30, 23, 5, 7).unwrap();
        assert_eq!(format_received_at(now, 9).unwrap(), "2024/05/01 8:05:07");
        assert_eq!(format_received_at(now, 0).unwrap(), "2024/04/30 23:05:07");
        assert!(format_received_at(now, 30).is_err());
    }

    #[tokio::test]
    async fn test_load_writes_header_once_and_appends() {
        let (pipeline, storage, _) = pipeline();

        for text in ["識別子：A1\n氏名：山田", "識別子：A2\n出向日： 2024/05/02 "] {
            let result = pipeline.transform(InboundMessage::new(text)).await.unwrap();
            pipeline.load(result).await.unwrap();
        }

        let main = storage.get_file("data.csv").await.unwrap();
        let lines: Vec<&str> = main.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(
            lines[0],
            "received_at,identifier,date,name,assignment_type,site_name"
        );
        assert!(lines[1].ends_with(",A1,,山田,,"));
        assert!(lines[2].ends_with(",A2,2024/05/02,,,"));
        assert!(storage.get_file("data_report.csv").await.is_none());
    }

    #[tokio::test]
    async fn test_sub_entries_written_only_with_yes_flag() {
        let (pipeline, storage, _) = pipeline();
        let text = "識別子：A1\n出向日：2024/05/01\n他の出向報告：はい\n1. X社/全日2,半日1/支店A\n2. Y社/夜間1/支店B";

        let result = pipeline.transform(InboundMessage::new(text)).await.unwrap();
        let summary = pipeline.load(result).await.unwrap();
        assert_eq!(summary.main_rows, 1);
        assert_eq!(summary.sub_entry_rows, 2);

        let report = storage.get_file("data_report.csv").await.unwrap();
        let lines: Vec<&str> = report.lines().collect();
        assert_eq!(
            lines[0],
            "received_at,identifier,date,organization,full_day_count,half_day_count,night_count,site_name"
        );
        assert!(lines[1].ends_with(",A1,2024/05/01,X社,2,1,0,支店A"));
        assert!(lines[2].ends_with(",A1,2024/05/01,Y社,0,0,1,支店B"));

        let (pipeline, storage, _) = self::pipeline();
        let text = "識別子：A1\n他の出向報告：いいえ\n1. X社/全日2/支店A";
        let result = pipeline.transform(InboundMessage::new(text)).await.unwrap();
        let summary = pipeline.load(result).await.unwrap();
        assert_eq!(summary.sub_entry_rows, 0);
        assert!(storage.get_file("data_report.csv").await.is_none());
    }

    #[tokio::test]
    async fn test_concurrent_loads_keep_every_row() {
        let (pipeline, storage, _) = pipeline();
        let first = pipeline
            .transform(InboundMessage::new("識別子：A1"))
            .await
            .unwrap();
        let second = pipeline
            .transform(InboundMessage::new("識別子：B2"))
            .await
            .unwrap();

        let (a, b) = tokio::join!(pipeline.load(first), pipeline.load(second));
        a.unwrap();
        b.unwrap();

        let main = storage.get_file("data.csv").await.unwrap();
        let lines: Vec<&str> = main.lines().collect();
        assert_eq!(lines.len(), 3, "{}", main);
        assert_eq!(
            lines.iter().filter(|l| l.starts_with("received_at,")).count(),
            1
        );
        assert!(lines.iter().any(|l| l.contains(",A1,")));
        assert!(lines.iter().any(|l| l.contains(",B2,")));
    }

    #[tokio::test]
    async fn test_transform_rejects_malformed_sub_entry() {
        let (pipeline, _, _) = pipeline();
        let err = pipeline
            .transform(InboundMessage::new("1. X/Y"))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Failed to parse message: invalid report format");
    }

    #[tokio::test]
    async fn test_reply_uses_configured_text() {
        let (pipeline, _, replier) = pipeline();
        pipeline.reply("reply-token").await.unwrap();

        let sent = replier.sent.lock().await;
        assert_eq!(
            sent.as_slice(),
            [("reply-token".to_string(), DEFAULT_REPLY_TEXT.to_string())]
        );
    }
}
