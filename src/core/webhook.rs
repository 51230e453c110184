use crate::domain::model::InboundMessage;
use crate::utils::error::{EtlError, Result};
use serde::{Deserialize, Serialize};

/// LINE Messaging API webhook body. Unused fields are ignored.
#[derive(Debug, Clone, Deserialize)]
pub struct WebhookPayload {
    #[serde(default)]
    pub events: Vec<WebhookEvent>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookEvent {
    pub reply_token: Option<String>,
    pub message: Option<EventMessage>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EventMessage {
    pub text: Option<String>,
}

impl WebhookPayload {
    pub fn from_json(body: &str) -> Result<Self> {
        Ok(serde_json::from_str(body)?)
    }

    /// Takes the first event; the rest of the batch is not processed.
    pub fn into_message(self) -> Result<InboundMessage> {
        let event = self
            .events
            .into_iter()
            .next()
            .ok_or_else(|| EtlError::webhook("Invalid event data"))?;

        let reply_token = event
            .reply_token
            .filter(|token| !token.is_empty())
            .ok_or_else(|| EtlError::webhook("Invalid event data"))?;

        let text = event
            .message
            .and_then(|message| message.text)
            .filter(|text| !text.is_empty())
            .ok_or_else(|| EtlError::webhook("No message content"))?;

        Ok(InboundMessage {
            text,
            reply_token: Some(reply_token),
        })
    }
}

/// JSON body returned to the webhook caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebhookResponse {
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl WebhookResponse {
    pub fn get_ok() -> Self {
        Self {
            content: "get ok".to_string(),
            error: None,
        }
    }

    pub fn post_ok() -> Self {
        Self {
            content: "post ok".to_string(),
            error: None,
        }
    }

    pub fn failed(error: &EtlError) -> Self {
        Self {
            content: "error occurred".to_string(),
            error: Some(error.to_string()),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_extract_first_event() {
        let body = json!({
            "destination": "U123",
            "events": [
                {
                    "type": "message",
                    "replyToken": "token-1",
                    "message": { "type": "text", "id": "1", "text": "氏名：山田" }
                },
                {
                    "type": "message",
                    "replyToken": "token-2",
                    "message": { "type": "text", "id": "2", "text": "ignored" }
                }
            ]
        })
        .to_string();

        let message = WebhookPayload::from_json(&body).unwrap().into_message().unwrap();
        assert_eq!(message.text, "氏名：山田");
        assert_eq!(message.reply_token.as_deref(), Some("token-1"));
    }

    #[test]
    fn test_no_events_is_invalid() {
        let err = WebhookPayload::from_json(r#"{"events": []}"#)
            .unwrap()
            .into_message()
            .unwrap_err();
        assert_eq!(err.to_string(), "Webhook error: Invalid event data");
    }

    #[test]
    fn test_missing_reply_token_is_invalid() {
        let body = r#"{"events": [{"message": {"text": "hi"}}]}"#;
        let err = WebhookPayload::from_json(body)
            .unwrap()
            .into_message()
            .unwrap_err();
        assert_eq!(err.to_string(), "Webhook error: Invalid event data");
    }

    #[test]
    fn test_non_text_message_has_no_content() {
        let body = r#"{"events": [{"replyToken": "t", "message": {"type": "sticker"}}]}"#;
        let err = WebhookPayload::from_json(body)
            .unwrap()
            .into_message()
            .unwrap_err();
        assert_eq!(err.to_string(), "Webhook error: No message content");
    }

    #[test]
    fn test_malformed_json_fails() {
        assert!(matches!(
            WebhookPayload::from_json("not json"),
            Err(EtlError::SerializationError(_))
        ));
    }

    #[test]
    fn test_response_bodies() {
        assert_eq!(
            serde_json::to_value(WebhookResponse::post_ok()).unwrap(),
            json!({ "content": "post ok" })
        );

        let failed = WebhookResponse::failed(&EtlError::webhook("No message content"));
        assert!(!failed.is_ok());
        assert_eq!(
            serde_json::to_value(failed).unwrap(),
            json!({ "content": "error occurred", "error": "Webhook error: No message content" })
        );
    }
}
