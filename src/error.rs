#[derive(Debug, thiserror::Error)]
pub enum ProcessingError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("JSON encoding error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Malformed {format} record on line {line}: {message}")]
    MalformedRecord {
        line: usize,
        format: &'static str,
        message: String,
    },

    #[error("Cannot parse timestamp '{value}'")]
    InvalidTimestamp { value: String },

    #[error("Record has no '{field}' field")]
    MissingField { field: String },

    #[error("Output error: {0}")]
    OutputError(String),
}

impl ProcessingError {
    /// Errors that concern a single record and can be skipped without
    /// losing the rest of the stream.
    pub fn is_record_error(&self) -> bool {
        matches!(
            self,
            ProcessingError::MalformedRecord { .. }
                | ProcessingError::InvalidTimestamp { .. }
                | ProcessingError::MissingField { .. }
        )
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Unsupported direction '{0}' (expected inbound or outbound)")]
    UnsupportedDirection(String),

    #[error("Unsupported address field '{0}' (expected to_addr or from_addr)")]
    UnsupportedAddressField(String),

    #[error("End timestamp must come after start timestamp")]
    InvalidRange,

    #[error("Cannot parse timestamp '{0}'")]
    InvalidTimestamp(String),

    #[error("Week number {0} is out of range (0-53)")]
    InvalidWeek(u32),

    #[error("Invalid regex pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("Invalid date format '{0}'")]
    InvalidDateFormat(String),

    #[error("Aggregator needs at least one field")]
    NoAggregateFields,

    #[error("Invalid pipeline definition: {0}")]
    InvalidDefinition(String),

    #[error("File not found: {0}")]
    FileNotFound(String),
}

impl From<serde_yaml::Error> for ConfigError {
    fn from(err: serde_yaml::Error) -> Self {
        ConfigError::InvalidDefinition(err.to_string())
    }
}

impl From<std::io::Error> for ConfigError {
    fn from(err: std::io::Error) -> Self {
        ConfigError::FileNotFound(err.to_string())
    }
}
