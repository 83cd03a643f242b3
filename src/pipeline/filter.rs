// src/pipeline/filter.rs
use std::io::{Read, Write};
use std::time::Instant;

use crate::codec::CodecOptions;
use crate::error::ProcessingError;
use crate::pipeline::config::PipelineConfig;
use crate::pipeline::context::ProcessingStats;
use crate::pipeline::stream::for_each_record;
use crate::processors::filters::FilterChain;

/// Passes a record through if any of its chains accepts it (OR of ANDs).
/// Output uses the same codec as the input.
pub struct FilterPipeline {
    chains: Vec<FilterChain>,
    config: PipelineConfig,
}

impl FilterPipeline {
    pub fn new(config: PipelineConfig) -> Self {
        FilterPipeline {
            chains: Vec::new(),
            config,
        }
    }

    pub fn add(&mut self, chain: FilterChain) {
        self.chains.push(chain);
    }

    pub fn with_chain(mut self, chain: FilterChain) -> Self {
        self.add(chain);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.chains.is_empty()
    }

    /// Stream `input` to `output`. Each record is written at most once: the
    /// first accepting chain claims it and the rest are not consulted.
    pub fn process<R: Read, W: Write>(
        &self,
        input: R,
        output: &mut W,
    ) -> Result<ProcessingStats, ProcessingError> {
        let start_time = Instant::now();
        let mut stats = ProcessingStats::default();

        let options = CodecOptions {
            write_header: self.config.write_header,
        };
        let mut session = self.config.input_format.open(input, &mut *output, options)?;
        let format_name = session.format_name();

        {
            let (reader, writer) = session.split();
            for_each_record(reader, &self.config, format_name, &mut stats, |record, stats| {
                match self.chains.iter().position(|chain| chain.process(&record)) {
                    Some(index) => {
                        tracing::trace!(chain = index, "record accepted");
                        writer.write_record(&record)?;
                        stats.records_output += 1;
                    }
                    None => stats.records_skipped += 1,
                }
                Ok(())
            })?;
        }

        session.finish()?;
        stats.processing_time = start_time.elapsed();
        Ok(stats)
    }
}
