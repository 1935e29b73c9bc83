//! Output format configuration for log records
//!
//! Provides different line formats for primary-sink records:
//! - Json: one JSON object per line (default)
//! - Text: Human-readable single line
//! - Logfmt: Key-value format compatible with log aggregation tools

use super::log_context::FieldValue;
use super::log_record::LogRecord;

/// Output format for log records
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// JSON format for machine processing (default)
    ///
    /// Example: `{"name":"api","pid":42,"level":"info","msg":"Request processed","time":"2025-01-08T10:30:45.123Z","userId":"7"}`
    #[default]
    Json,

    /// Human-readable text format
    ///
    /// Example: `[2025-01-08T10:30:45.123Z] INFO  api: Request processed userId=7`
    Text,

    /// Logfmt format (key=value pairs)
    ///
    /// Example: `time=2025-01-08T10:30:45.123Z level=info name=api msg="Request processed" userId="7"`
    Logfmt,
}

impl OutputFormat {
    /// Format a record according to this output format
    pub fn format(&self, record: &LogRecord) -> String {
        match self {
            OutputFormat::Json => self.format_json(record),
            OutputFormat::Text => self.format_text(record),
            OutputFormat::Logfmt => self.format_logfmt(record),
        }
    }

    fn format_json(&self, record: &LogRecord) -> String {
        record.to_json().unwrap_or_default()
    }

    fn format_text(&self, record: &LogRecord) -> String {
        let base = format!(
            "[{}] {:5} {}: {}",
            record.timestamp(),
            record.level.to_str(),
            record.name,
            record.msg
        );

        if record.fields.is_empty() {
            base
        } else {
            format!("{} {}", base, record.fields.format_fields())
        }
    }

    fn format_logfmt(&self, record: &LogRecord) -> String {
        let mut parts = vec![
            format!("time={}", record.timestamp()),
            format!("level={}", record.level.as_str()),
            format!("name={}", self.escape_logfmt_value(&record.name)),
            format!("msg={}", self.quote_logfmt_value(&record.msg)),
        ];

        for (key, value) in record.user_fields() {
            let formatted_value = match value {
                FieldValue::String(s) => self.quote_logfmt_value(s),
                FieldValue::List(_) | FieldValue::Map(_) => {
                    self.quote_logfmt_value(&value.to_string())
                }
                other => other.to_string(),
            };
            parts.push(format!("{}={}", self.escape_logfmt_key(key), formatted_value));
        }

        parts.join(" ")
    }

    /// Escape a logfmt key (remove spaces and special chars)
    fn escape_logfmt_key(&self, key: &str) -> String {
        key.chars()
            .filter(|c| c.is_alphanumeric() || *c == '_' || *c == '-')
            .collect()
    }

    /// Escape a logfmt value (quote if contains spaces)
    fn escape_logfmt_value(&self, value: &str) -> String {
        if value.contains(' ') || value.contains('"') || value.contains('=') {
            self.quote_logfmt_value(value)
        } else {
            value.to_string()
        }
    }

    fn quote_logfmt_value(&self, value: &str) -> String {
        format!("\"{}\"", value.replace('\\', "\\\\").replace('"', "\\\""))
    }
}
