use crate::core::ReplySender;
use crate::utils::error::{EtlError, Result};
use reqwest::Client;
use serde::Serialize;

pub const DEFAULT_REPLY_ENDPOINT: &str = "https://api.line.me/v2/bot/message/reply";
pub const DEFAULT_REPLY_TEXT: &str = "入力を受け付けました！\n本日もお疲れ様でした。😌";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ReplyRequest<'a> {
    reply_token: &'a str,
    messages: [TextMessage<'a>; 1],
}

#[derive(Debug, Serialize)]
struct TextMessage<'a> {
    r#type: &'static str,
    text: &'a str,
}

/// Sends the acknowledgement through the LINE reply API.
#[derive(Debug, Clone)]
pub struct LineReplyClient {
    client: Client,
    endpoint: String,
    channel_token: String,
}

impl LineReplyClient {
    pub fn new(endpoint: impl Into<String>, channel_token: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            endpoint: endpoint.into(),
            channel_token: channel_token.into(),
        }
    }

    pub fn from_config<C: crate::core::ConfigProvider>(config: &C) -> Self {
        Self::new(config.reply_endpoint(), config.channel_token())
    }
}

impl ReplySender for LineReplyClient {
    async fn send_reply(&self, reply_token: &str, text: &str) -> Result<()> {
        let body = ReplyRequest {
            reply_token,
            messages: [TextMessage {
                r#type: "text",
                text,
            }],
        };

        tracing::debug!("Sending reply to: {}", self.endpoint);
        let response = self
            .client
            .post(&self.endpoint)
            .header("Content-Type", "application/json; charset=UTF-8")
            .bearer_auth(&self.channel_token)
            .body(serde_json::to_vec(&body)?)
            .send()
            .await?;

        let status = response.status();
        tracing::debug!("Reply API response status: {}", status);

        if status != reqwest::StatusCode::OK {
            return Err(EtlError::ReplyError {
                status: status.as_u16(),
            });
        }

        Ok(())
    }
}
