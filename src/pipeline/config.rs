use crate::input_format::InputFormat;

/// Configuration for pipeline behavior
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub error_strategy: ErrorStrategy,
    pub input_format: InputFormat,
    /// Write the CSV header for pass-through output
    pub write_header: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        PipelineConfig {
            error_strategy: ErrorStrategy::Skip,
            input_format: InputFormat::Csv,
            write_header: true,
        }
    }
}

impl PipelineConfig {
    pub fn with_input_format(mut self, input_format: InputFormat) -> Self {
        self.input_format = input_format;
        self
    }

    pub fn with_error_strategy(mut self, error_strategy: ErrorStrategy) -> Self {
        self.error_strategy = error_strategy;
        self
    }
}

/// What to do with a record that cannot be read or processed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorStrategy {
    /// Skip the record, remember the error, keep going
    Skip,
    /// Stop processing on first error
    FailFast,
}
