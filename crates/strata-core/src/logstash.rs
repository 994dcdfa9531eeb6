//! Logstash-style JSON log formatter.
//!
//! Mirrors the field names and merge order of the Python `LogstashFormatter`
//! this framework is modeled on: a flat, single-line JSON object per log
//! record carrying `@timestamp`/`@version`/`message`/`host`/`path`/`tags`/
//! `type`/`thread_name`/`level`/`logger_name`, with the current trace
//! context snapshot merged in, then any extra structured fields on the
//! record (scalars passed through, everything else stringified), then debug
//! fields when the record carries an error.
//!
//! Selected at startup by `LOG_TYPE=logstash`; otherwise `tracing_subscriber`'s
//! default formatter is used (the `flat` default).

use std::fmt;

use chrono::Utc;
use serde_json::{Map, Value};
use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::{FmtContext, FormatEvent, FormatFields};
use tracing_subscriber::registry::LookupSpan;

use crate::trace_context;

#[derive(Default)]
struct FieldVisitor {
    message: Option<String>,
    extra: Map<String, Value>,
}

impl FieldVisitor {
    fn record_scalar(&mut self, field: &Field, value: Value) {
        if field.name() == "message" {
            self.message = Some(value_to_message(&value));
        } else {
            self.extra.insert(field.name().to_string(), value);
        }
    }
}

fn value_to_message(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

impl Visit for FieldVisitor {
    fn record_str(&mut self, field: &Field, value: &str) {
        self.record_scalar(field, Value::from(value));
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        self.record_scalar(field, Value::from(value));
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.record_scalar(field, Value::from(value));
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        self.record_scalar(field, Value::from(value));
    }

    fn record_f64(&mut self, field: &Field, value: f64) {
        self.record_scalar(field, Value::from(value));
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        self.record_scalar(field, Value::from(format!("{value:?}")));
    }
}

/// A `tracing_subscriber::fmt::FormatEvent` producing one single-line JSON
/// object per record, in the shape described above.
pub struct LogstashFormatter {
    message_type: String,
    tags: Vec<String>,
    host: String,
}

impl LogstashFormatter {
    pub fn new(message_type: impl Into<String>) -> Self {
        Self::with_tags(message_type, Vec::new())
    }

    pub fn with_tags(message_type: impl Into<String>, tags: Vec<String>) -> Self {
        Self {
            message_type: message_type.into(),
            tags,
            host: gethostname::gethostname().to_string_lossy().into_owned(),
        }
    }

    fn format_timestamp(now: chrono::DateTime<Utc>) -> String {
        // %Y-%m-%dT%H:%M:%S.mmmZ — matches the original's
        // strftime("%Y-%m-%dT%H:%M:%S") + ".%03dZ" construction.
        now.format("%Y-%m-%dT%H:%M:%S").to_string() + &format!(".{:03}Z", now.timestamp_subsec_millis())
    }
}

impl<S, N> FormatEvent<S, N> for LogstashFormatter
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        _ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> fmt::Result {
        let metadata = event.metadata();

        let mut visitor = FieldVisitor::default();
        event.record(&mut visitor);

        let mut record = Map::new();
        record.insert("@timestamp".to_string(), Value::from(Self::format_timestamp(Utc::now())));
        record.insert("@version".to_string(), Value::from("1"));
        record.insert("message".to_string(), Value::from(visitor.message.unwrap_or_default()));
        record.insert("host".to_string(), Value::from(self.host.clone()));
        record.insert("path".to_string(), Value::from(metadata.target()));
        record.insert(
            "tags".to_string(),
            Value::Array(self.tags.iter().cloned().map(Value::from).collect()),
        );
        record.insert("type".to_string(), Value::from(self.message_type.clone()));
        record.insert(
            "thread_name".to_string(),
            Value::from(std::thread::current().name().unwrap_or("unknown").to_string()),
        );
        record.insert("level".to_string(), Value::from(metadata.level().to_string()));
        record.insert("logger_name".to_string(), Value::from(metadata.target()));

        for (key, value) in trace_context::get_all().iter() {
            record.insert(key.to_string(), Value::from(value));
        }

        for (key, value) in visitor.extra {
            record.insert(key, value);
        }

        if metadata.level() == &Level::ERROR && record.contains_key("error") {
            record.insert(
                "stack_trace".to_string(),
                record.get("error").cloned().unwrap_or(Value::Null),
            );
            if let Some(line) = metadata.line() {
                record.insert("lineno".to_string(), Value::from(line));
            }
            record.insert("process".to_string(), Value::from(std::process::id()));
            record.insert("funcName".to_string(), Value::from(metadata.name()));
            record.insert(
                "processName".to_string(),
                Value::from(std::env::current_exe().ok().and_then(|p| p.file_name().map(|n| n.to_string_lossy().into_owned())).unwrap_or_default()),
            );
        }

        writeln!(writer, "{}", Value::Object(record))
    }
}
