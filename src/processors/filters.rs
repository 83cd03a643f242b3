// src/processors/filters.rs
use crate::context::{Record, NULL_TEXT};
use crate::error::ConfigError;
use crate::timestamp::{parse_timestamp, week_of_year};
use chrono::{Datelike, NaiveDateTime};
use regex::{Regex, RegexBuilder};
use std::collections::{BTreeSet, HashSet};
use std::path::Path;
use std::str::FromStr;

/// A boolean condition over one record. Implementations must be free of
/// side effects visible to the pipeline.
pub trait Filter: Send + Sync {
    fn apply(&self, record: &Record) -> bool;
    fn name(&self) -> &str;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Inbound,
    Outbound,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Inbound => "inbound",
            Direction::Outbound => "outbound",
        }
    }
}

impl FromStr for Direction {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "inbound" => Ok(Direction::Inbound),
            "outbound" => Ok(Direction::Outbound),
            other => Err(ConfigError::UnsupportedDirection(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddressField {
    ToAddr,
    FromAddr,
}

impl AddressField {
    pub fn as_str(&self) -> &'static str {
        match self {
            AddressField::ToAddr => "to_addr",
            AddressField::FromAddr => "from_addr",
        }
    }
}

impl FromStr for AddressField {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "to_addr" => Ok(AddressField::ToAddr),
            "from_addr" => Ok(AddressField::FromAddr),
            other => Err(ConfigError::UnsupportedAddressField(other.to_string())),
        }
    }
}

/// The built-in predicates
#[derive(Debug, Clone)]
pub enum Predicate {
    Direction(Direction),
    Address {
        field: AddressField,
        value: String,
    },
    TimeRange {
        start: NaiveDateTime,
        end: Option<NaiveDateTime>,
    },
    Week {
        year: i32,
        weeks: BTreeSet<u32>,
    },
    SessionEvent(Option<String>),
    Contacts(HashSet<String>),
    Regex {
        field: String,
        regex: Regex,
    },
    IsReply,
    IsNotReply,
}

impl Predicate {
    pub fn direction(direction: &str) -> Result<Self, ConfigError> {
        Ok(Predicate::Direction(direction.parse()?))
    }

    pub fn address(field: &str, value: impl Into<String>) -> Result<Self, ConfigError> {
        Ok(Predicate::Address {
            field: field.parse()?,
            value: value.into(),
        })
    }

    /// `start <= timestamp < end`, or just `start <= timestamp` without an end
    pub fn time_range(
        start: NaiveDateTime,
        end: Option<NaiveDateTime>,
    ) -> Result<Self, ConfigError> {
        if let Some(end) = end {
            if end < start {
                return Err(ConfigError::InvalidRange);
            }
        }
        Ok(Predicate::TimeRange { start, end })
    }

    /// Same as `time_range`, with both bounds given as timestamp text
    pub fn time_range_str(start: &str, end: Option<&str>) -> Result<Self, ConfigError> {
        let parse = |text: &str| {
            parse_timestamp(text).ok_or_else(|| ConfigError::InvalidTimestamp(text.to_string()))
        };
        let start = parse(start)?;
        let end = end.map(parse).transpose()?;
        Self::time_range(start, end)
    }

    pub fn week(year: i32, weeks: impl IntoIterator<Item = u32>) -> Result<Self, ConfigError> {
        let weeks: BTreeSet<u32> = weeks.into_iter().collect();
        if let Some(&bad) = weeks.iter().find(|&&w| w > 53) {
            return Err(ConfigError::InvalidWeek(bad));
        }
        Ok(Predicate::Week { year, weeks })
    }

    pub fn session_event(event_type: Option<&str>) -> Self {
        Predicate::SessionEvent(event_type.map(|s| s.to_string()))
    }

    pub fn contacts<S: Into<String>>(addresses: impl IntoIterator<Item = S>) -> Self {
        Predicate::Contacts(addresses.into_iter().map(Into::into).collect())
    }

    /// Load a contact list: one address per line, `#` starts a comment
    pub fn contacts_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            ConfigError::FileNotFound(format!("{}: {}", path.display(), e))
        })?;
        let addresses = content
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && !line.starts_with('#'));
        Ok(Self::contacts(addresses))
    }

    /// Regex matched from the start of the field value
    pub fn regex(field: &str, pattern: &str, ignore_case: bool) -> Result<Self, ConfigError> {
        let regex = RegexBuilder::new(&format!("^(?:{})", pattern))
            .case_insensitive(ignore_case)
            .build()
            .map_err(|source| ConfigError::InvalidPattern {
                pattern: pattern.to_string(),
                source,
            })?;
        Ok(Predicate::Regex {
            field: field.to_string(),
            regex,
        })
    }

    fn record_timestamp(record: &Record) -> Option<NaiveDateTime> {
        let raw = record.get("timestamp")?;
        let parsed = parse_timestamp(raw);
        if parsed.is_none() {
            tracing::debug!(timestamp = raw, "unparseable timestamp, record rejected");
        }
        parsed
    }

    fn is_reply(record: &Record) -> bool {
        matches!(record.get("in_reply_to"), Some(v) if !v.is_empty())
    }
}

impl Filter for Predicate {
    fn apply(&self, record: &Record) -> bool {
        match self {
            Predicate::Direction(direction) => record.get("direction") == Some(direction.as_str()),
            Predicate::Address { field, value } => {
                record.get(field.as_str()) == Some(value.as_str())
            }
            Predicate::TimeRange { start, end } => match Self::record_timestamp(record) {
                Some(ts) => *start <= ts && end.map_or(true, |end| ts < end),
                None => false,
            },
            Predicate::Week { year, weeks } => match Self::record_timestamp(record) {
                Some(ts) => ts.year() == *year && weeks.contains(&week_of_year(&ts)),
                None => false,
            },
            Predicate::SessionEvent(event_type) => {
                let actual = record.get("session_event").unwrap_or(NULL_TEXT);
                actual == event_type.as_deref().unwrap_or(NULL_TEXT)
            }
            Predicate::Contacts(addresses) => record
                .get("from_addr")
                .is_some_and(|addr| addresses.contains(addr)),
            Predicate::Regex { field, regex } => match record.get(field) {
                Some(value) if !value.is_empty() => regex.is_match(value),
                _ => false,
            },
            Predicate::IsReply => Self::is_reply(record),
            Predicate::IsNotReply => !Self::is_reply(record),
        }
    }

    fn name(&self) -> &str {
        match self {
            Predicate::Direction(_) => "direction",
            Predicate::Address { .. } => "address",
            Predicate::TimeRange { .. } => "time_range",
            Predicate::Week { .. } => "week",
            Predicate::SessionEvent(_) => "session_event",
            Predicate::Contacts(_) => "contacts",
            Predicate::Regex { .. } => "regex",
            Predicate::IsReply => "is_reply",
            Predicate::IsNotReply => "is_not_reply",
        }
    }
}

/// AND of its members, evaluated left to right, stopping at the first
/// rejection. Built once, then read-only.
pub struct FilterChain {
    links: Vec<Box<dyn Filter>>,
}

impl FilterChain {
    pub fn new(head: impl Filter + 'static) -> Self {
        FilterChain {
            links: vec![Box::new(head)],
        }
    }

    /// Append a member and hand the chain back
    pub fn chain(mut self, next: impl Filter + 'static) -> Self {
        self.links.push(Box::new(next));
        self
    }

    pub fn process(&self, record: &Record) -> bool {
        self.links.iter().all(|link| link.apply(record))
    }

    pub fn names(&self) -> Vec<&str> {
        self.links.iter().map(|link| link.name()).collect()
    }
}
