// src/pipeline/aggregate.rs
use std::io::{Read, Write};
use std::time::Instant;

use crate::error::ProcessingError;
use crate::output_format::OutputFormat;
use crate::pipeline::config::PipelineConfig;
use crate::pipeline::context::ProcessingStats;
use crate::pipeline::stream::for_each_record;
use crate::processors::aggregators::Aggregator;

/// Drains the input into one aggregator, then writes its summaries as CSV.
///
/// `process` consumes the pipeline, so aggregator state never outlives a
/// single run; build a fresh pipeline for every stream.
pub struct AggregatorPipeline {
    aggregator: Box<dyn Aggregator>,
    config: PipelineConfig,
}

impl AggregatorPipeline {
    pub fn new(aggregator: Box<dyn Aggregator>, config: PipelineConfig) -> Self {
        AggregatorPipeline { aggregator, config }
    }

    pub fn field_names(&self) -> Vec<String> {
        self.aggregator.field_names()
    }

    pub fn process<R: Read, W: Write>(
        mut self,
        input: R,
        output: &mut W,
    ) -> Result<ProcessingStats, ProcessingError> {
        let start_time = Instant::now();
        let mut stats = ProcessingStats::default();

        let reader = self.config.input_format.reader(input)?;
        let format_name = reader.format_name();
        let aggregator = &mut self.aggregator;
        for_each_record(reader, &self.config, format_name, &mut stats, |record, _| {
            aggregator.aggregate(&record)
        })?;
        tracing::debug!(aggregator = self.aggregator.name(), "input drained");

        let mut writer = OutputFormat::Csv.writer(&mut *output, self.aggregator.field_names(), true);
        writer.write_header()?;
        for summary in self.aggregator.into_summaries() {
            writer.write_record(&summary)?;
            stats.records_output += 1;
        }

        writer.flush()?;
        stats.processing_time = start_time.elapsed();
        Ok(stats)
    }
}
