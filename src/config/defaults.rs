//! Built-in per-environment defaults.

use super::schema::{EnvironmentConfig, NotificationSettings, StreamConfig};
use crate::core::LogLevel;

/// Environment variable naming the active environment.
pub const ENVIRONMENT_VAR: &str = "APP_ENV";

/// Environment assumed when [`ENVIRONMENT_VAR`] is unset.
pub const DEFAULT_ENVIRONMENT: &str = "local";

/// The active environment name.
pub fn current_environment() -> String {
    std::env::var(ENVIRONMENT_VAR)
        .ok()
        .filter(|env| !env.is_empty())
        .unwrap_or_else(|| DEFAULT_ENVIRONMENT.to_string())
}

/// Default settings for the well-known environments.
pub fn default_environment(environment: &str) -> Option<EnvironmentConfig> {
    match environment {
        "test" => Some(EnvironmentConfig::new(vec![StreamConfig::stdout(LogLevel::Fatal)])),
        "local" | "localhost" => {
            Some(EnvironmentConfig::new(vec![StreamConfig::stdout(LogLevel::Info)]))
        }
        "staging" => Some(
            EnvironmentConfig::new(vec![StreamConfig::stdout(LogLevel::Info)]).with_notification(
                NotificationSettings {
                    level: LogLevel::Warn,
                    default_channel: Some("#staging-logs".to_string()),
                },
            ),
        ),
        "production" => Some(
            EnvironmentConfig::new(vec![StreamConfig::stdout(LogLevel::Info)]).with_notification(
                NotificationSettings {
                    level: LogLevel::Warn,
                    default_channel: Some("#prod-alerts".to_string()),
                },
            ),
        ),
        _ => None,
    }
}
