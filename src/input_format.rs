use crate::context::Record;
use crate::error::ProcessingError;
use serde::Deserialize;
use std::io::{BufRead, BufReader, Lines, Read};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum InputFormat {
    #[default]
    #[value(name = "csv")]
    Csv,
    #[value(name = "jsonl")]
    Jsonl,
}

impl InputFormat {
    pub fn name(&self) -> &'static str {
        match self {
            InputFormat::Csv => "CSV",
            InputFormat::Jsonl => "JSON",
        }
    }

    /// Start reading records. For CSV the header line is consumed here.
    pub fn reader<R: Read>(&self, input: R) -> Result<RecordReader<R>, ProcessingError> {
        match self {
            InputFormat::Csv => Ok(RecordReader::Csv(CsvRecordReader::new(input)?)),
            InputFormat::Jsonl => Ok(RecordReader::Jsonl(JsonlRecordReader::new(input))),
        }
    }
}

/// Lazy, single-pass record source
pub enum RecordReader<R: Read> {
    Csv(CsvRecordReader<R>),
    Jsonl(JsonlRecordReader<R>),
}

impl<R: Read> RecordReader<R> {
    /// Field names declared by the stream, if the format has a header
    pub fn headers(&self) -> Option<&[String]> {
        match self {
            RecordReader::Csv(reader) => Some(reader.headers()),
            RecordReader::Jsonl(_) => None,
        }
    }

    pub fn format_name(&self) -> &'static str {
        match self {
            RecordReader::Csv(_) => InputFormat::Csv.name(),
            RecordReader::Jsonl(_) => InputFormat::Jsonl.name(),
        }
    }
}

impl<R: Read> Iterator for RecordReader<R> {
    type Item = Result<Record, ProcessingError>;

    fn next(&mut self) -> Option<Self::Item> {
        match self {
            RecordReader::Csv(reader) => reader.next(),
            RecordReader::Jsonl(reader) => reader.next(),
        }
    }
}

/// Delimited-text reader; the first line fixes the field order
pub struct CsvRecordReader<R: Read> {
    headers: Vec<String>,
    rows: csv::StringRecordsIntoIter<R>,
}

impl<R: Read> CsvRecordReader<R> {
    pub fn new(input: R) -> Result<Self, ProcessingError> {
        // Flexible so that short or long rows reach us and can be
        // reported per record instead of failing the whole stream.
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(input);

        let headers = reader
            .headers()?
            .iter()
            .map(|h| h.to_string())
            .collect::<Vec<_>>();

        let headers = if headers.iter().all(|h| h.is_empty()) {
            Vec::new()
        } else {
            headers
        };

        Ok(CsvRecordReader {
            headers,
            rows: reader.into_records(),
        })
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    fn to_record(&self, row: &csv::StringRecord) -> Result<Record, ProcessingError> {
        if row.len() != self.headers.len() {
            return Err(ProcessingError::MalformedRecord {
                line: row.position().map(|p| p.line() as usize).unwrap_or(0),
                format: InputFormat::Csv.name(),
                message: format!(
                    "CSV line has {} fields but expected {} headers",
                    row.len(),
                    self.headers.len()
                ),
            });
        }

        let mut record = Record::with_capacity(self.headers.len());
        for (header, value) in self.headers.iter().zip(row.iter()) {
            record.insert(header.as_str(), value);
        }
        Ok(record)
    }
}

impl<R: Read> Iterator for CsvRecordReader<R> {
    type Item = Result<Record, ProcessingError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.headers.is_empty() {
            return None;
        }
        let row = self.rows.next()?;
        Some(match row {
            Ok(row) => self.to_record(&row),
            Err(e) if e.is_io_error() => Err(ProcessingError::CsvError(e)),
            Err(e) => Err(ProcessingError::MalformedRecord {
                line: e.position().map(|p| p.line() as usize).unwrap_or(0),
                format: InputFormat::Csv.name(),
                message: e.to_string(),
            }),
        })
    }
}

/// Line-delimited JSON reader; each line is an independent object
pub struct JsonlRecordReader<R: Read> {
    lines: Lines<BufReader<R>>,
    line_number: usize,
}

impl<R: Read> JsonlRecordReader<R> {
    pub fn new(input: R) -> Self {
        JsonlRecordReader {
            lines: BufReader::new(input).lines(),
            line_number: 0,
        }
    }

    fn parse_line(&self, line: &str) -> Result<Record, ProcessingError> {
        let malformed = |message: String| ProcessingError::MalformedRecord {
            line: self.line_number,
            format: InputFormat::Jsonl.name(),
            message,
        };

        let value: serde_json::Value = serde_json::from_str(line)
            .map_err(|e| malformed(format!("Failed to parse JSONL: {}", e)))?;

        let serde_json::Value::Object(obj) = value else {
            return Err(malformed("JSONL line is not an object".to_string()));
        };

        let mut record = Record::with_capacity(obj.len());
        for (key, value) in obj {
            let value = match value {
                serde_json::Value::Null => None,
                serde_json::Value::String(s) => Some(s),
                other => Some(other.to_string()),
            };
            record.set(key, value);
        }
        Ok(record)
    }
}

impl<R: Read> Iterator for JsonlRecordReader<R> {
    type Item = Result<Record, ProcessingError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let line = match self.lines.next()? {
                Ok(line) => line,
                Err(e) => return Some(Err(ProcessingError::IoError(e))),
            };
            self.line_number += 1;

            let line_content = line.trim();
            if line_content.is_empty() {
                continue;
            }
            return Some(self.parse_line(line_content));
        }
    }
}
