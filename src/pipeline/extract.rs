// src/pipeline/extract.rs
use std::io::{Read, Write};
use std::time::Instant;

use crate::error::ProcessingError;
use crate::output_format::OutputFormat;
use crate::pipeline::config::PipelineConfig;
use crate::pipeline::context::ProcessingStats;
use crate::pipeline::stream::for_each_record;
use crate::processors::extractors::ExtractorChain;

/// Runs every registered chain on every record: N chains turn one input
/// record into N output rows. Output is always CSV.
pub struct ExtractorPipeline {
    chains: Vec<ExtractorChain>,
    config: PipelineConfig,
}

impl ExtractorPipeline {
    pub fn new(config: PipelineConfig) -> Self {
        ExtractorPipeline {
            chains: Vec::new(),
            config,
        }
    }

    pub fn add(&mut self, chain: ExtractorChain) {
        self.chains.push(chain);
    }

    pub fn with_chain(mut self, chain: ExtractorChain) -> Self {
        self.add(chain);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.chains.is_empty()
    }

    /// Output header: each chain's declared names, in registration order
    pub fn field_names(&self) -> Vec<String> {
        self.chains.iter().flat_map(|chain| chain.field_names()).collect()
    }

    pub fn process<R: Read, W: Write>(
        &self,
        input: R,
        output: &mut W,
    ) -> Result<ProcessingStats, ProcessingError> {
        let start_time = Instant::now();
        let mut stats = ProcessingStats::default();

        // The input header is never echoed; this stage writes its own.
        let reader = self.config.input_format.reader(input)?;
        let format_name = reader.format_name();
        let mut writer = OutputFormat::Csv.writer(&mut *output, self.field_names(), true);
        writer.write_header()?;

        for_each_record(reader, &self.config, format_name, &mut stats, |record, stats| {
            // All chains must succeed before any row of this record is written
            let rows = self
                .chains
                .iter()
                .map(|chain| chain.process(&record))
                .collect::<Result<Vec<_>, _>>()?;
            for row in &rows {
                writer.write_record(row)?;
                stats.records_output += 1;
            }
            Ok(())
        })?;

        writer.flush()?;
        stats.processing_time = start_time.elapsed();
        Ok(stats)
    }
}
