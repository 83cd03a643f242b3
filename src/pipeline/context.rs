use crate::error::ProcessingError;
use indexmap::IndexMap;
use std::time::Duration;

/// Text used when a missing or null value has to be compared as a string.
/// Exported CSV logs carry absent values as this literal.
pub const NULL_TEXT: &str = "None";

/// A record that flows through the pipeline: field name to (nullable) value,
/// in the order the fields were first seen.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Record {
    fields: IndexMap<String, Option<String>>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Record {
            fields: IndexMap::with_capacity(capacity),
        }
    }

    /// Build a record from string pairs (all values non-null)
    pub fn from_pairs<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        let mut record = Record::new();
        for (key, value) in pairs {
            record.insert(key, value);
        }
        record
    }

    /// Value of a field; `None` when the field is missing or null
    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields.get(name).and_then(|v| v.as_deref())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.fields.insert(name.into(), Some(value.into()));
    }

    pub fn set(&mut self, name: impl Into<String>, value: Option<String>) {
        self.fields.insert(name.into(), value);
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(|k| k.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<&str>)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v.as_deref()))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Ordered JSON object; nulls stay null
    pub fn to_json(&self) -> serde_json::Value {
        let mut map = serde_json::Map::with_capacity(self.fields.len());
        for (key, value) in &self.fields {
            let json = match value {
                Some(s) => serde_json::Value::String(s.clone()),
                None => serde_json::Value::Null,
            };
            map.insert(key.clone(), json);
        }
        serde_json::Value::Object(map)
    }
}

/// Parse error details for deferred reporting
#[derive(Debug, Clone)]
pub struct ParseErrorInfo {
    /// Position of the record in the stream, counting from 1
    pub record_number: usize,
    /// Input line, known only when the record could not be decoded
    pub line_number: Option<usize>,
    pub format_name: String,
    pub error: String,
}

/// Runtime statistics for one pipeline run
#[derive(Debug, Default, Clone)]
pub struct ProcessingStats {
    pub records_processed: usize,
    pub records_output: usize,
    pub records_skipped: usize,
    pub errors: usize,
    pub processing_time: Duration,
    pub parse_errors: Vec<ParseErrorInfo>,
}

impl ProcessingStats {
    /// Remember a per-record error so the run can continue
    pub fn record_error(&mut self, format_name: &str, err: &ProcessingError) {
        self.errors += 1;
        let (line_number, error) = match err {
            ProcessingError::MalformedRecord { line, message, .. } => {
                (Some(*line), message.clone())
            }
            other => (None, other.to_string()),
        };
        self.parse_errors.push(ParseErrorInfo {
            record_number: self.records_processed,
            line_number,
            format_name: format_name.to_string(),
            error,
        });
    }

    pub fn has_errors(&self) -> bool {
        self.errors > 0
    }

    /// Log collected record errors and a run summary
    pub fn report(&self) {
        for info in &self.parse_errors {
            match info.line_number {
                Some(line) => tracing::warn!(
                    record = info.record_number,
                    line,
                    format = %info.format_name,
                    "skipped record: {}",
                    info.error
                ),
                None => tracing::warn!(
                    record = info.record_number,
                    format = %info.format_name,
                    "skipped record: {}",
                    info.error
                ),
            }
        }
        tracing::info!(
            processed = self.records_processed,
            output = self.records_output,
            skipped = self.records_skipped,
            errors = self.errors,
            elapsed = %humantime::format_duration(self.processing_time),
            "run finished"
        );
    }
}
