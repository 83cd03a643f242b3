// src/pipeline/stream.rs
use std::io::{Read, Write};

use crate::error::ProcessingError;
use crate::pipeline::aggregate::AggregatorPipeline;
use crate::pipeline::config::{ErrorStrategy, PipelineConfig};
use crate::pipeline::context::{ProcessingStats, Record};
use crate::pipeline::extract::ExtractorPipeline;
use crate::pipeline::filter::FilterPipeline;

/// Drive `step` over every record, applying the configured error strategy.
/// Per-record failures (unreadable lines, bad timestamps, missing keys) are
/// either collected into `stats` or returned; I/O failures always return.
pub(crate) fn for_each_record<I, F>(
    records: I,
    config: &PipelineConfig,
    format_name: &str,
    stats: &mut ProcessingStats,
    mut step: F,
) -> Result<(), ProcessingError>
where
    I: Iterator<Item = Result<Record, ProcessingError>>,
    F: FnMut(Record, &mut ProcessingStats) -> Result<(), ProcessingError>,
{
    for item in records {
        stats.records_processed += 1;

        let result = match item {
            Ok(record) => step(record, stats),
            Err(e) => Err(e),
        };

        if let Err(err) = result {
            if !err.is_record_error() {
                return Err(err);
            }
            match config.error_strategy {
                ErrorStrategy::FailFast => return Err(err),
                ErrorStrategy::Skip => {
                    tracing::debug!(record = stats.records_processed, "{}", err);
                    stats.record_error(format_name, &err);
                }
            }
        }
    }
    Ok(())
}

/// Any one of the three pipeline kinds, ready to run
pub enum Pipeline {
    Filter(FilterPipeline),
    Extract(ExtractorPipeline),
    Aggregate(AggregatorPipeline),
}

impl Pipeline {
    pub fn name(&self) -> &'static str {
        match self {
            Pipeline::Filter(_) => "filter",
            Pipeline::Extract(_) => "extract",
            Pipeline::Aggregate(_) => "aggregate",
        }
    }

    /// Process one input stream to completion
    pub fn run<R: Read, W: Write>(
        self,
        input: R,
        output: &mut W,
    ) -> Result<ProcessingStats, ProcessingError> {
        tracing::debug!(pipeline = self.name(), "starting run");
        match self {
            Pipeline::Filter(pipeline) => pipeline.process(input, output),
            Pipeline::Extract(pipeline) => pipeline.process(input, output),
            Pipeline::Aggregate(pipeline) => pipeline.process(input, output),
        }
    }
}

impl From<FilterPipeline> for Pipeline {
    fn from(pipeline: FilterPipeline) -> Self {
        Pipeline::Filter(pipeline)
    }
}

impl From<ExtractorPipeline> for Pipeline {
    fn from(pipeline: ExtractorPipeline) -> Self {
        Pipeline::Extract(pipeline)
    }
}

impl From<AggregatorPipeline> for Pipeline {
    fn from(pipeline: AggregatorPipeline) -> Self {
        Pipeline::Aggregate(pipeline)
    }
}
