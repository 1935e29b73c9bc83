//! Chat notification client interface and payload types

use crate::core::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// One chat message, shaped like the `chat.postMessage` request body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub text: String,
    pub channel: String,
    pub username: String,
    pub icon_emoji: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attachments: Option<Vec<Attachment>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    pub fields: Vec<AttachmentField>,
    pub color: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttachmentField {
    pub title: String,
    pub value: String,
    pub short: bool,
}

/// Transport for chat messages.
///
/// Implementations return `Err` on any API or network failure; the caller
/// decides what to do with it.
///
/// # Example
///
/// ```no_run
/// use rust_scoped_logger::notify::{ChatMessage, NotificationClient};
/// use rust_scoped_logger::Result;
/// use async_trait::async_trait;
///
/// struct WebhookClient;
///
/// #[async_trait]
/// impl NotificationClient for WebhookClient {
///     async fn post_message(&self, message: &ChatMessage) -> Result<()> {
///         // POST the message somewhere
///         Ok(())
///     }
/// }
/// ```
#[async_trait]
pub trait NotificationClient: Send + Sync {
    async fn post_message(&self, message: &ChatMessage) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_wire_shape() {
        let message = ChatMessage {
            text: "WARN: disk".to_string(),
            channel: "#ops".to_string(),
            username: "Logger".to_string(),
            icon_emoji: ":warning:".to_string(),
            attachments: Some(vec![Attachment {
                fields: vec![AttachmentField {
                    title: "host".to_string(),
                    value: "db-1".to_string(),
                    short: false,
                }],
                color: "#F18009".to_string(),
            }]),
        };

        let json = serde_json::to_value(&message).unwrap();
        assert_eq!(json["icon_emoji"], ":warning:");
        assert_eq!(json["attachments"][0]["fields"][0]["title"], "host");
        assert_eq!(json["attachments"][0]["fields"][0]["short"], false);

        let plain = ChatMessage {
            attachments: None,
            ..message
        };
        let json = serde_json::to_value(&plain).unwrap();
        assert!(json.get("attachments").is_none());
    }
}
