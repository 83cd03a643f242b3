// src/processors/extractors.rs
use crate::context::Record;
use crate::error::{ConfigError, ProcessingError};
use crate::timestamp::{format_timestamp, is_valid_date_format, parse_timestamp};

pub const TIMESTAMP_FIELD: &str = "timestamp";

/// Maps one record to a derived record. The result must carry an entry for
/// every name in `field_names`.
pub trait Extractor: Send + Sync {
    fn extract(&self, record: &Record) -> Result<Record, ProcessingError>;
    fn field_names(&self) -> Vec<String>;
}

/// Keeps `timestamp` plus a subset of fields, optionally reformatting the
/// timestamp with a strftime pattern.
#[derive(Debug, Clone)]
pub struct FieldExtractor {
    fields: Vec<String>,
    date_format: Option<String>,
}

impl FieldExtractor {
    pub fn new<S: Into<String>>(
        fields: impl IntoIterator<Item = S>,
        date_format: Option<&str>,
    ) -> Result<Self, ConfigError> {
        if let Some(format) = date_format {
            if !is_valid_date_format(format) {
                return Err(ConfigError::InvalidDateFormat(format.to_string()));
            }
        }
        Ok(FieldExtractor {
            fields: fields.into_iter().map(Into::into).collect(),
            date_format: date_format.map(|s| s.to_string()),
        })
    }

    fn timestamp(&self, record: &Record) -> Result<Option<String>, ProcessingError> {
        let raw = record.get(TIMESTAMP_FIELD);
        let (Some(format), Some(raw)) = (self.date_format.as_deref(), raw) else {
            return Ok(raw.map(|s| s.to_string()));
        };

        parse_timestamp(raw)
            .and_then(|ts| format_timestamp(&ts, format))
            .map(Some)
            .ok_or_else(|| ProcessingError::InvalidTimestamp {
                value: raw.to_string(),
            })
    }
}

impl Extractor for FieldExtractor {
    fn extract(&self, record: &Record) -> Result<Record, ProcessingError> {
        let mut result = Record::with_capacity(self.fields.len() + 1);
        result.set(TIMESTAMP_FIELD, self.timestamp(record)?);
        for field in &self.fields {
            result.set(field.as_str(), record.get(field).map(|s| s.to_string()));
        }
        Ok(result)
    }

    fn field_names(&self) -> Vec<String> {
        let mut names = Vec::with_capacity(self.fields.len() + 1);
        names.push(TIMESTAMP_FIELD.to_string());
        names.extend(self.fields.iter().cloned());
        names
    }
}

/// Composition of extractors: the first sees the input record, each later
/// one sees its predecessor's output.
pub struct ExtractorChain {
    links: Vec<Box<dyn Extractor>>,
}

impl ExtractorChain {
    pub fn new(head: impl Extractor + 'static) -> Self {
        ExtractorChain {
            links: vec![Box::new(head)],
        }
    }

    pub fn chain(mut self, next: impl Extractor + 'static) -> Self {
        self.links.push(Box::new(next));
        self
    }

    pub fn process(&self, record: &Record) -> Result<Record, ProcessingError> {
        let (head, rest) = self
            .links
            .split_first()
            .ok_or_else(|| ProcessingError::OutputError("empty extractor chain".to_string()))?;
        rest.iter()
            .try_fold(head.extract(record)?, |current, link| link.extract(&current))
    }

    /// Every member's declared names, concatenated. Duplicates are kept.
    pub fn field_names(&self) -> Vec<String> {
        self.links.iter().flat_map(|link| link.field_names()).collect()
    }
}
