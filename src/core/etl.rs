use crate::core::webhook::WebhookResponse;
use crate::core::{InboundMessage, LoadSummary, Pipeline};
use crate::utils::error::Result;

pub struct EtlEngine<P: Pipeline> {
    pipeline: P,
}

impl<P: Pipeline> EtlEngine<P> {
    pub fn new(pipeline: P) -> Self {
        Self { pipeline }
    }

    pub fn pipeline(&self) -> &P {
        &self.pipeline
    }

    /// Runs all stages for one webhook body.
    pub async fn run(&self, payload: &str) -> Result<LoadSummary> {
        tracing::info!("Starting report processing");

        // Extract
        let message = self.pipeline.extract(payload).await?;
        tracing::debug!("Extracted message ({} chars)", message.text.chars().count());

        self.process(message).await
    }

    /// Parses, stores and acknowledges one message. Nothing is stored if
    /// parsing fails, and the reply is only sent after storing succeeds.
    pub async fn process(&self, message: InboundMessage) -> Result<LoadSummary> {
        let reply_token = message.reply_token.clone();

        // Transform
        let result = self.pipeline.transform(message).await?;

        // Load
        let summary = self.pipeline.load(result).await?;
        tracing::info!(
            "Saved {} row(s) to {} and {} row(s) to {}",
            summary.main_rows,
            summary.main_sheet,
            summary.sub_entry_rows,
            summary.report_sheet
        );

        match reply_token {
            Some(token) => {
                self.pipeline.reply(&token).await?;
                tracing::info!("Reply sent");
            }
            None => tracing::debug!("No reply token, skipping reply"),
        }

        Ok(summary)
    }

    /// Maps a webhook request to the JSON body returned to the caller.
    /// Failures are reported in the body rather than as an error.
    pub async fn handle_webhook(&self, method: &str, body: Option<&str>) -> WebhookResponse {
        if method.eq_ignore_ascii_case("GET") {
            return WebhookResponse::get_ok();
        }

        match self.run(body.unwrap_or_default()).await {
            Ok(_) => WebhookResponse::post_ok(),
            Err(e) => {
                tracing::error!(
                    "Webhook processing failed: {} (Category: {:?}, Severity: {:?})",
                    e,
                    e.category(),
                    e.severity()
                );
                WebhookResponse::failed(&e)
            }
        }
    }
}
