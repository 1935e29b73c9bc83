//! Log record structure handed to appenders

use super::log_context::{FieldValue, LogContext};
use super::log_level::LogLevel;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};

/// Record keys owned by the record itself. Context fields with these names
/// are left out of serialized output.
pub const RESERVED_KEYS: [&str; 5] = ["name", "pid", "level", "msg", "time"];

/// One primary-sink record: logger name, process id, level, message,
/// timestamp and the flattened structured fields.
#[derive(Debug, Clone, Deserialize)]
pub struct LogRecord {
    pub name: String,
    pub pid: u32,
    pub level: LogLevel,
    pub msg: String,
    pub time: DateTime<Utc>,
    #[serde(flatten)]
    pub fields: LogContext,
}

impl LogRecord {
    /// Sanitize log message to prevent log injection attacks
    ///
    /// Replaces newlines, carriage returns, and tabs with escape sequences
    /// to prevent attackers from injecting fake log entries.
    fn sanitize_message(message: &str) -> String {
        message
            .replace('\n', "\\n")
            .replace('\r', "\\r")
            .replace('\t', "\\t")
    }

    pub fn new(name: impl Into<String>, level: LogLevel, message: &str, fields: LogContext) -> Self {
        Self {
            name: name.into(),
            pid: std::process::id(),
            level,
            msg: Self::sanitize_message(message),
            time: Utc::now(),
            fields,
        }
    }

    /// Serialize to a single JSON line
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// RFC 3339 timestamp with millisecond precision
    pub fn timestamp(&self) -> String {
        self.time.to_rfc3339_opts(SecondsFormat::Millis, true)
    }

    /// Structured fields that do not collide with a reserved key
    pub fn user_fields(&self) -> impl Iterator<Item = (&String, &FieldValue)> {
        self.fields
            .iter()
            .filter(|(key, _)| !RESERVED_KEYS.contains(&key.as_str()))
    }
}

impl Serialize for LogRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry("name", &self.name)?;
        map.serialize_entry("pid", &self.pid)?;
        map.serialize_entry("level", &self.level)?;
        map.serialize_entry("msg", &self.msg)?;
        map.serialize_entry("time", &self.timestamp())?;
        for (key, value) in self.user_fields() {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}
