//! Configuration schema definitions.
//!
//! One environment-keyed shape: a logger name, an optional notification
//! credential, and per-environment stream lists with optional notification
//! settings. All types derive Serde traits; the wire format is camelCase JSON.

use crate::core::{LogLevel, LoggerError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use super::defaults;

/// Root logger configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LogConfig {
    /// Logger name, stamped on every record.
    pub name: String,

    /// Credential for the chat notification client.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notification_token: Option<String>,

    /// Per-environment overrides, merged over the built-in defaults.
    #[serde(default)]
    pub environments: BTreeMap<String, EnvironmentConfig>,
}

/// Settings for a single environment.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EnvironmentConfig {
    #[serde(default)]
    pub streams: Vec<StreamConfig>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notification: Option<NotificationSettings>,
}

/// One primary output destination, as written in configuration.
///
/// `type` stays a free string here; it is checked when the writer is built,
/// so an unknown kind surfaces as a construction error naming the kind.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct StreamConfig {
    pub level: LogLevel,

    #[serde(rename = "type")]
    pub kind: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
}

/// Validated stream destination.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamTarget {
    Stdout,
    File(PathBuf),
}

/// Per-environment notification settings (credential lives on [`LogConfig`]).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationSettings {
    /// Records below this level are never sent.
    pub level: LogLevel,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_channel: Option<String>,
}

/// Everything a notification sink needs.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationConfig {
    pub api_token: String,
    pub level: LogLevel,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_channel: Option<String>,
}

/// Configuration for one environment after defaults have been applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedConfig {
    pub name: String,
    pub environment: String,
    pub streams: Vec<StreamConfig>,
    pub notification: Option<NotificationConfig>,
}

impl StreamConfig {
    pub fn stdout(level: LogLevel) -> Self {
        Self {
            level,
            kind: "stdout".to_string(),
            path: None,
        }
    }

    pub fn file(level: LogLevel, path: impl Into<PathBuf>) -> Self {
        Self {
            level,
            kind: "file".to_string(),
            path: Some(path.into()),
        }
    }

    /// Check the descriptor and turn it into a destination.
    pub fn target(&self) -> Result<StreamTarget> {
        match self.kind.as_str() {
            "stdout" => Ok(StreamTarget::Stdout),
            "file" => self
                .path
                .clone()
                .map(StreamTarget::File)
                .ok_or(LoggerError::MissingFilePath),
            other => Err(LoggerError::unknown_stream_type(other)),
        }
    }
}

impl NotificationConfig {
    pub fn new(api_token: impl Into<String>, level: LogLevel) -> Self {
        Self {
            api_token: api_token.into(),
            level,
            default_channel: None,
        }
    }

    #[must_use]
    pub fn with_default_channel(mut self, channel: impl Into<String>) -> Self {
        self.default_channel = Some(channel.into());
        self
    }
}

impl EnvironmentConfig {
    pub fn new(streams: Vec<StreamConfig>) -> Self {
        Self {
            streams,
            notification: None,
        }
    }

    #[must_use]
    pub fn with_notification(mut self, settings: NotificationSettings) -> Self {
        self.notification = Some(settings);
        self
    }

    /// Field-wise override: non-empty `streams` and a present `notification`
    /// on `self` replace the values of `base`.
    fn over(&self, base: &EnvironmentConfig) -> EnvironmentConfig {
        EnvironmentConfig {
            streams: if self.streams.is_empty() {
                base.streams.clone()
            } else {
                self.streams.clone()
            },
            notification: self
                .notification
                .clone()
                .or_else(|| base.notification.clone()),
        }
    }
}

impl LogConfig {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            notification_token: None,
            environments: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn with_notification_token(mut self, token: impl Into<String>) -> Self {
        self.notification_token = Some(token.into());
        self
    }

    #[must_use]
    pub fn with_environment(mut self, environment: impl Into<String>, config: EnvironmentConfig) -> Self {
        self.environments.insert(environment.into(), config);
        self
    }

    /// Parse a configuration from JSON text.
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load a configuration from a JSON file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            LoggerError::io_operation(
                "reading logger configuration",
                path.display().to_string(),
                e,
            )
        })?;
        Self::from_json_str(&content)
    }

    /// Merge the user entry for `environment` over the built-in default.
    ///
    /// Fails when neither exists. A notification config is produced only when
    /// both a credential and notification settings are present.
    pub fn resolve(&self, environment: &str) -> Result<ResolvedConfig> {
        let user = self.environments.get(environment);
        let default = defaults::default_environment(environment);

        let merged = match (user, default) {
            (Some(user), Some(default)) => user.over(&default),
            (Some(user), None) => user.clone(),
            (None, Some(default)) => default,
            (None, None) => return Err(LoggerError::unknown_environment(environment)),
        };

        let notification = match (&self.notification_token, merged.notification) {
            (Some(token), Some(settings)) => Some(NotificationConfig {
                api_token: token.clone(),
                level: settings.level,
                default_channel: settings.default_channel,
            }),
            _ => None,
        };

        Ok(ResolvedConfig {
            name: self.name.clone(),
            environment: environment.to_string(),
            streams: merged.streams,
            notification,
        })
    }

    /// [`resolve`](Self::resolve) for the environment named by `APP_ENV`.
    pub fn resolve_current(&self) -> Result<ResolvedConfig> {
        self.resolve(&defaults::current_environment())
    }
}
