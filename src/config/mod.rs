//! Logger configuration: schema, built-in environment defaults, resolution.

pub mod defaults;
pub mod schema;

pub use defaults::{current_environment, default_environment, DEFAULT_ENVIRONMENT, ENVIRONMENT_VAR};
pub use schema::{
    EnvironmentConfig, LogConfig, NotificationConfig, NotificationSettings, ResolvedConfig,
    StreamConfig, StreamTarget,
};
