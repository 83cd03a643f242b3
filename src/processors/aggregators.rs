// src/processors/aggregators.rs
use crate::context::Record;
use crate::error::{ConfigError, ProcessingError};
use crate::processors::extractors::TIMESTAMP_FIELD;
use indexmap::IndexMap;
use serde::Deserialize;
use std::collections::{BTreeMap, HashSet};

/// Stateful accumulator. Records go in one at a time; summaries come out
/// once, after the input is exhausted, in ascending group-key order.
pub trait Aggregator {
    fn aggregate(&mut self, record: &Record) -> Result<(), ProcessingError>;

    /// Output columns: the group key followed by the configured fields
    fn field_names(&self) -> Vec<String>;

    /// Consumes the aggregator, so the summaries can only be read once
    fn into_summaries(self: Box<Self>) -> Box<dyn Iterator<Item = Record>>;

    fn name(&self) -> &str;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum AggregatorKind {
    /// Number of distinct values per field
    Uniques,
    /// Number of records per field
    Count,
}

impl AggregatorKind {
    pub fn build(&self, fields: Vec<String>) -> Result<Box<dyn Aggregator>, ConfigError> {
        if fields.is_empty() {
            return Err(ConfigError::NoAggregateFields);
        }
        Ok(match self {
            AggregatorKind::Uniques => Box::new(UniquesAggregator::new(fields)),
            AggregatorKind::Count => Box::new(CountAggregator::new(fields)),
        })
    }
}

fn group_key(record: &Record) -> Result<String, ProcessingError> {
    if !record.contains(TIMESTAMP_FIELD) {
        return Err(ProcessingError::MissingField {
            field: TIMESTAMP_FIELD.to_string(),
        });
    }
    Ok(record.get(TIMESTAMP_FIELD).unwrap_or_default().to_string())
}

fn summary_field_names(fields: &[String]) -> Vec<String> {
    std::iter::once(TIMESTAMP_FIELD.to_string())
        .chain(fields.iter().cloned())
        .collect()
}

fn summary_record<'a>(key: String, counts: impl Iterator<Item = (&'a String, usize)>) -> Record {
    let mut record = Record::new();
    record.insert(TIMESTAMP_FIELD, key);
    for (field, count) in counts {
        record.insert(field.as_str(), count.to_string());
    }
    record
}

/// Distinct values seen per field, grouped by the verbatim timestamp
pub struct UniquesAggregator {
    fields: Vec<String>,
    data: BTreeMap<String, IndexMap<String, HashSet<Option<String>>>>,
}

impl UniquesAggregator {
    pub fn new(fields: Vec<String>) -> Self {
        UniquesAggregator {
            fields,
            data: BTreeMap::new(),
        }
    }

    pub fn group_count(&self) -> usize {
        self.data.len()
    }
}

impl Aggregator for UniquesAggregator {
    fn aggregate(&mut self, record: &Record) -> Result<(), ProcessingError> {
        let key = group_key(record)?;
        let fields = &self.fields;
        let group = self.data.entry(key).or_insert_with(|| {
            fields
                .iter()
                .map(|field| (field.clone(), HashSet::new()))
                .collect()
        });
        for field in &self.fields {
            if let Some(seen) = group.get_mut(field) {
                seen.insert(record.get(field).map(|s| s.to_string()));
            }
        }
        Ok(())
    }

    fn field_names(&self) -> Vec<String> {
        summary_field_names(&self.fields)
    }

    fn into_summaries(self: Box<Self>) -> Box<dyn Iterator<Item = Record>> {
        Box::new(self.data.into_iter().map(|(key, group)| {
            summary_record(key, group.iter().map(|(field, seen)| (field, seen.len())))
        }))
    }

    fn name(&self) -> &str {
        "uniques"
    }
}

/// Records seen per field, grouped by the verbatim timestamp. Every record
/// increments every configured field, whatever its value.
pub struct CountAggregator {
    fields: Vec<String>,
    data: BTreeMap<String, IndexMap<String, usize>>,
}

impl CountAggregator {
    pub fn new(fields: Vec<String>) -> Self {
        CountAggregator {
            fields,
            data: BTreeMap::new(),
        }
    }

    pub fn group_count(&self) -> usize {
        self.data.len()
    }
}

impl Aggregator for CountAggregator {
    fn aggregate(&mut self, record: &Record) -> Result<(), ProcessingError> {
        let key = group_key(record)?;
        let group = self.data.entry(key).or_default();
        for field in &self.fields {
            *group.entry(field.clone()).or_insert(0) += 1;
        }
        Ok(())
    }

    fn field_names(&self) -> Vec<String> {
        summary_field_names(&self.fields)
    }

    fn into_summaries(self: Box<Self>) -> Box<dyn Iterator<Item = Record>> {
        Box::new(self.data.into_iter().map(|(key, group)| {
            summary_record(key, group.iter().map(|(field, count)| (field, *count)))
        }))
    }

    fn name(&self) -> &str {
        "count"
    }
}
