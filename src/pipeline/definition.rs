// src/pipeline/definition.rs - declarative pipeline setup (YAML or CLI)
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::error::ConfigError;
use crate::input_format::InputFormat;
use crate::pipeline::aggregate::AggregatorPipeline;
use crate::pipeline::config::{ErrorStrategy, PipelineConfig};
use crate::pipeline::extract::ExtractorPipeline;
use crate::pipeline::filter::FilterPipeline;
use crate::pipeline::stream::Pipeline;
use crate::processors::aggregators::AggregatorKind;
use crate::processors::extractors::{ExtractorChain, FieldExtractor};
use crate::processors::filters::{FilterChain, Predicate};

/// A whole pipeline: input settings plus exactly one stage.
///
/// ```yaml
/// input_format: csv
/// filter:
///   chains:
///     - [{direction: inbound}, {address: {field: from_addr, value: "+27831234567"}}]
///     - [{direction: outbound}, {address: {field: to_addr, value: "+27831234567"}}]
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PipelineDefinition {
    #[serde(default)]
    pub input_format: InputFormat,
    #[serde(default)]
    pub fail_fast: bool,
    #[serde(default)]
    pub filter: Option<FilterDefinition>,
    #[serde(default)]
    pub extract: Option<ExtractDefinition>,
    #[serde(default)]
    pub aggregate: Option<AggregateDefinition>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FilterDefinition {
    pub chains: Vec<Vec<PredicateDefinition>>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PredicateDefinition {
    Direction(String),
    Address {
        field: String,
        value: String,
    },
    TimeRange {
        start: String,
        #[serde(default)]
        end: Option<String>,
    },
    Week {
        year: i32,
        weeks: Vec<u32>,
    },
    SessionEvent(Option<String>),
    Contacts(Vec<String>),
    ContactsFile(PathBuf),
    Regex {
        field: String,
        pattern: String,
        #[serde(default)]
        ignore_case: bool,
    },
    IsReply,
    IsNotReply,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ExtractDefinition {
    pub chains: Vec<Vec<FieldExtractorDefinition>>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FieldExtractorDefinition {
    pub fields: Vec<String>,
    #[serde(default)]
    pub date_format: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AggregateDefinition {
    pub kind: AggregatorKind,
    pub fields: Vec<String>,
}

impl PipelineDefinition {
    pub fn from_yaml(text: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(text)?)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            ConfigError::FileNotFound(format!("{}: {}", path.display(), e))
        })?;
        Self::from_yaml(&text)
    }

    pub fn config(&self) -> PipelineConfig {
        let error_strategy = if self.fail_fast {
            ErrorStrategy::FailFast
        } else {
            ErrorStrategy::Skip
        };
        PipelineConfig::default()
            .with_input_format(self.input_format)
            .with_error_strategy(error_strategy)
    }

    /// Construct the pipeline. Every predicate, extractor and aggregator is
    /// validated here, before any input is read.
    pub fn build(&self) -> Result<Pipeline, ConfigError> {
        let config = self.config();
        match (&self.filter, &self.extract, &self.aggregate) {
            (Some(filter), None, None) => Ok(filter.build(config)?.into()),
            (None, Some(extract), None) => Ok(extract.build(config)?.into()),
            (None, None, Some(aggregate)) => Ok(aggregate.build(config)?.into()),
            (None, None, None) => Err(ConfigError::InvalidDefinition(
                "no stage given (expected filter, extract or aggregate)".to_string(),
            )),
            _ => Err(ConfigError::InvalidDefinition(
                "only one of filter, extract or aggregate may be given".to_string(),
            )),
        }
    }
}

impl FilterDefinition {
    pub fn build(&self, config: PipelineConfig) -> Result<FilterPipeline, ConfigError> {
        let mut pipeline = FilterPipeline::new(config);
        for (i, links) in self.chains.iter().enumerate() {
            let mut predicates = links.iter().map(PredicateDefinition::build);
            let head = predicates.next().ok_or_else(|| {
                ConfigError::InvalidDefinition(format!("filter chain {} is empty", i + 1))
            })??;
            let chain = predicates.try_fold(FilterChain::new(head), |chain, next| {
                next.map(|p| chain.chain(p))
            })?;
            tracing::debug!(chain = i + 1, links = ?chain.names(), "filter chain configured");
            pipeline.add(chain);
        }
        Ok(pipeline)
    }
}

impl PredicateDefinition {
    pub fn build(&self) -> Result<Predicate, ConfigError> {
        match self {
            PredicateDefinition::Direction(direction) => Predicate::direction(direction),
            PredicateDefinition::Address { field, value } => {
                Predicate::address(field, value.as_str())
            }
            PredicateDefinition::TimeRange { start, end } => {
                Predicate::time_range_str(start, end.as_deref())
            }
            PredicateDefinition::Week { year, weeks } => {
                Predicate::week(*year, weeks.iter().copied())
            }
            PredicateDefinition::SessionEvent(event) => {
                Ok(Predicate::session_event(event.as_deref()))
            }
            PredicateDefinition::Contacts(addresses) => {
                Ok(Predicate::contacts(addresses.iter().cloned()))
            }
            PredicateDefinition::ContactsFile(path) => Predicate::contacts_from_file(path),
            PredicateDefinition::Regex {
                field,
                pattern,
                ignore_case,
            } => Predicate::regex(field, pattern, *ignore_case),
            PredicateDefinition::IsReply => Ok(Predicate::IsReply),
            PredicateDefinition::IsNotReply => Ok(Predicate::IsNotReply),
        }
    }
}

impl ExtractDefinition {
    pub fn build(&self, config: PipelineConfig) -> Result<ExtractorPipeline, ConfigError> {
        let mut pipeline = ExtractorPipeline::new(config);
        for (i, links) in self.chains.iter().enumerate() {
            let mut extractors = links.iter().map(FieldExtractorDefinition::build);
            let head = extractors.next().ok_or_else(|| {
                ConfigError::InvalidDefinition(format!("extract chain {} is empty", i + 1))
            })??;
            let chain = extractors.try_fold(ExtractorChain::new(head), |chain, next| {
                next.map(|e| chain.chain(e))
            })?;
            pipeline.add(chain);
        }
        if pipeline.is_empty() {
            return Err(ConfigError::InvalidDefinition(
                "extract needs at least one chain".to_string(),
            ));
        }
        Ok(pipeline)
    }
}

impl FieldExtractorDefinition {
    pub fn build(&self) -> Result<FieldExtractor, ConfigError> {
        FieldExtractor::new(self.fields.iter().cloned(), self.date_format.as_deref())
    }
}

impl AggregateDefinition {
    pub fn build(&self, config: PipelineConfig) -> Result<AggregatorPipeline, ConfigError> {
        let aggregator = self.kind.build(self.fields.clone())?;
        Ok(AggregatorPipeline::new(aggregator, config))
    }
}
