// src/lib.rs
pub mod codec;
pub mod error;
pub mod input_format;
pub mod logging;
pub mod output_format;
pub mod pipeline;
pub mod processors;
pub mod timestamp;

pub use error::*;
pub use pipeline::*;

pub use codec::{CodecOptions, CodecSession};
pub use input_format::{InputFormat, RecordReader};
pub use output_format::{OutputFormat, RecordWriter};
pub use pipeline::config::{ErrorStrategy, PipelineConfig};
pub use pipeline::context::{ParseErrorInfo, ProcessingStats, Record};
pub use pipeline::definition::PipelineDefinition;
pub use processors::{
    Aggregator, AggregatorKind, CountAggregator, Extractor, ExtractorChain, FieldExtractor,
    Filter, FilterChain, Predicate, UniquesAggregator,
};
