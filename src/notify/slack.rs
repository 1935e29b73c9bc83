//! Slack web API client

use super::client::{ChatMessage, NotificationClient};
use crate::core::{LoggerError, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::fmt;
use std::time::Duration;

pub const SLACK_POST_MESSAGE_URL: &str = "https://slack.com/api/chat.postMessage";

#[derive(Debug, Deserialize)]
struct ApiResponse {
    ok: bool,
    #[serde(default)]
    error: Option<String>,
}

/// Posts [`ChatMessage`]s to `chat.postMessage` with a bot token.
#[derive(Clone)]
pub struct SlackWebClient {
    http: Client,
    token: String,
    endpoint: String,
}

impl SlackWebClient {
    pub fn new(token: impl Into<String>) -> Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(30))
            .connect_timeout(Duration::from_secs(10))
            .build()?;

        Ok(Self {
            http,
            token: token.into(),
            endpoint: SLACK_POST_MESSAGE_URL.to_string(),
        })
    }

    /// Post somewhere other than the public Slack API (proxies, tests)
    #[must_use]
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl fmt::Debug for SlackWebClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SlackWebClient")
            .field("endpoint", &self.endpoint)
            .field("token", &"<redacted>")
            .finish()
    }
}

#[async_trait]
impl NotificationClient for SlackWebClient {
    /// A non-2xx status or an `"ok": false` body is a delivery error.
    async fn post_message(&self, message: &ChatMessage) -> Result<()> {
        let response = self
            .http
            .post(&self.endpoint)
            .bearer_auth(&self.token)
            .json(message)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(LoggerError::delivery(
                &message.channel,
                format!("HTTP {} - {}", status, text),
            ));
        }

        let body: ApiResponse = response.json().await?;
        if body.ok {
            Ok(())
        } else {
            Err(LoggerError::delivery(
                &message.channel,
                body.error.unwrap_or_else(|| "unknown API error".to_string()),
            ))
        }
    }
}
