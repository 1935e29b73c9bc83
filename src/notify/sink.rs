//! Level-gated chat notification sink

use super::client::{Attachment, AttachmentField, ChatMessage, NotificationClient};
use crate::config::NotificationConfig;
use crate::core::{
    is_level_enabled, stderr_diagnostics, DiagnosticCallback, LogContext, LogLevel, LoggerError,
    NotificationMetrics, Notifier, Result, ROUTE_KEY,
};
use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;

/// Sender name used when the context carries no override
pub const DEFAULT_USERNAME: &str = "Logger";

/// Sender icon used when the context carries no override
pub const DEFAULT_ICON: &str = ":warning:";

/// Sender icon for [`NotificationSink::send_direct`]
pub const DIRECT_ICON: &str = ":bell:";

/// Sends log calls at or above a threshold to a chat channel.
///
/// Delivery failures never reach the caller: they are counted and reported
/// once to the diagnostic callback.
pub struct NotificationSink {
    config: NotificationConfig,
    client: Arc<dyn NotificationClient>,
    metrics: NotificationMetrics,
    on_diagnostic: DiagnosticCallback,
}

impl NotificationSink {
    pub fn new(config: NotificationConfig, client: Arc<dyn NotificationClient>) -> Self {
        Self {
            config,
            client,
            metrics: NotificationMetrics::new(),
            on_diagnostic: stderr_diagnostics(),
        }
    }

    /// Build a sink posting through the Slack web API with the configured token.
    #[cfg(feature = "slack")]
    pub fn from_config(config: NotificationConfig) -> Result<Self> {
        let client = super::slack::SlackWebClient::new(config.api_token.clone())?;
        Ok(Self::new(config, Arc::new(client)))
    }

    #[cfg(not(feature = "slack"))]
    pub fn from_config(_config: NotificationConfig) -> Result<Self> {
        Err(LoggerError::config(
            "notification",
            "no notification client available; enable the `slack` feature or use NotificationSink::new",
        ))
    }

    /// Set the callback receiving delivery failures (default: stderr)
    #[must_use = "builder methods return a new value"]
    pub fn with_diagnostics(mut self, callback: DiagnosticCallback) -> Self {
        self.on_diagnostic = callback;
        self
    }

    pub fn config(&self) -> &NotificationConfig {
        &self.config
    }

    pub fn metrics(&self) -> &NotificationMetrics {
        &self.metrics
    }

    /// The message [`send`](Self::send) would post, or `None` when the level
    /// is below the threshold or no channel can be resolved.
    ///
    /// The `slack` routing key picks channel, username and icon; it is not
    /// rendered as an attachment field.
    pub fn build_message(
        &self,
        level: LogLevel,
        message: &str,
        context: Option<&LogContext>,
    ) -> Option<ChatMessage> {
        if !is_level_enabled(level, self.config.level) {
            return None;
        }

        let route = context.and_then(LogContext::route).unwrap_or_default();
        let channel = route.channel.or_else(|| self.config.default_channel.clone())?;

        let attachments = context
            .map(|ctx| {
                ctx.iter()
                    .filter(|(key, _)| key.as_str() != ROUTE_KEY)
                    .map(|(key, value)| AttachmentField {
                        title: key.clone(),
                        value: value.to_string(),
                        short: false,
                    })
                    .collect::<Vec<_>>()
            })
            .filter(|fields| !fields.is_empty())
            .map(|fields| {
                vec![Attachment {
                    fields,
                    color: level.color_hex().to_string(),
                }]
            });

        Some(ChatMessage {
            text: format!("{}: {}", level.to_str(), message),
            channel,
            username: route.username.unwrap_or_else(|| DEFAULT_USERNAME.to_string()),
            icon_emoji: route.icon_emoji.unwrap_or_else(|| DEFAULT_ICON.to_string()),
            attachments,
        })
    }

    /// Post one log call if it passes the threshold and has a destination.
    ///
    /// Never fails; delivery errors go to the diagnostic callback.
    pub async fn send(&self, level: LogLevel, message: &str, context: Option<&LogContext>) {
        match self.build_message(level, message, context) {
            Some(chat) => self.deliver(&chat).await,
            None => {
                self.metrics.record_suppressed();
            }
        }
    }

    /// Post plain text to `channel` regardless of level.
    pub async fn send_direct(&self, channel: &str, message: &str) {
        let chat = ChatMessage {
            text: message.to_string(),
            channel: channel.to_string(),
            username: DEFAULT_USERNAME.to_string(),
            icon_emoji: DIRECT_ICON.to_string(),
            attachments: None,
        };
        self.deliver(&chat).await;
    }

    async fn deliver(&self, chat: &ChatMessage) {
        match self.client.post_message(chat).await {
            Ok(()) => {
                self.metrics.record_sent();
            }
            Err(e) => {
                self.metrics.record_failed();
                (self.on_diagnostic)(&LoggerError::delivery(&chat.channel, e.to_string()));
            }
        }
    }
}

impl fmt::Debug for NotificationSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NotificationSink")
            .field("level", &self.config.level)
            .field("default_channel", &self.config.default_channel)
            .finish()
    }
}

#[async_trait]
impl Notifier for NotificationSink {
    async fn notify(&self, level: LogLevel, message: &str, context: &LogContext) -> Result<()> {
        self.send(level, message, Some(context)).await;
        Ok(())
    }

    fn name(&self) -> &str {
        "notification-sink"
    }

    fn enabled(&self, level: LogLevel) -> bool {
        is_level_enabled(level, self.config.level)
    }
}
