use crate::context::Record;
use crate::error::ProcessingError;
use std::io::Write;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    #[default]
    #[value(name = "csv", help = "Comma-separated values with a header row")]
    Csv,
    #[value(name = "jsonl", help = "JSON Lines format (one JSON object per line)")]
    Jsonl,
}

impl OutputFormat {
    /// Writer for this format. `fields` fixes the CSV column order and is
    /// ignored for JSONL.
    pub fn writer<W: Write>(
        &self,
        output: W,
        fields: Vec<String>,
        write_header: bool,
    ) -> RecordWriter<W> {
        match self {
            OutputFormat::Csv => RecordWriter::Csv(CsvRecordWriter::new(output, fields, write_header)),
            OutputFormat::Jsonl => RecordWriter::Jsonl(JsonlRecordWriter::new(output)),
        }
    }
}

pub enum RecordWriter<W: Write> {
    Csv(CsvRecordWriter<W>),
    Jsonl(JsonlRecordWriter<W>),
}

impl<W: Write> RecordWriter<W> {
    pub fn write_record(&mut self, record: &Record) -> Result<(), ProcessingError> {
        match self {
            RecordWriter::Csv(writer) => writer.write_record(record),
            RecordWriter::Jsonl(writer) => writer.write_record(record),
        }
    }

    /// Emit the header now if the format has one and it is still pending
    pub fn write_header(&mut self) -> Result<(), ProcessingError> {
        match self {
            RecordWriter::Csv(writer) => writer.write_header(),
            RecordWriter::Jsonl(_) => Ok(()),
        }
    }

    pub fn flush(&mut self) -> Result<(), ProcessingError> {
        match self {
            RecordWriter::Csv(writer) => writer.flush(),
            RecordWriter::Jsonl(writer) => writer.flush(),
        }
    }
}

/// Delimited-text writer with a column list frozen at construction
pub struct CsvRecordWriter<W: Write> {
    writer: csv::Writer<W>,
    fields: Vec<String>,
    headers_written: bool,
}

impl<W: Write> CsvRecordWriter<W> {
    pub fn new(output: W, fields: Vec<String>, write_header: bool) -> Self {
        let writer = csv::WriterBuilder::new()
            .has_headers(false)
            .flexible(true)
            .quote_style(csv::QuoteStyle::Necessary)
            .from_writer(output);

        CsvRecordWriter {
            writer,
            fields,
            // A suppressed header counts as already written
            headers_written: !write_header,
        }
    }

    pub fn write_header(&mut self) -> Result<(), ProcessingError> {
        if self.headers_written {
            return Ok(());
        }
        self.headers_written = true;
        if self.fields.is_empty() {
            return Ok(());
        }
        self.writer.write_record(&self.fields)?;
        Ok(())
    }

    /// Write values in column order. Fields the record lacks, and null
    /// values, become empty cells; fields outside the column list are dropped.
    pub fn write_record(&mut self, record: &Record) -> Result<(), ProcessingError> {
        self.write_header()?;
        let values = self
            .fields
            .iter()
            .map(|field| record.get(field).unwrap_or(""));
        self.writer.write_record(values)?;
        Ok(())
    }

    pub fn flush(&mut self) -> Result<(), ProcessingError> {
        self.writer.flush()?;
        Ok(())
    }
}

/// One JSON object per line, keys in record order
pub struct JsonlRecordWriter<W: Write> {
    output: W,
}

impl<W: Write> JsonlRecordWriter<W> {
    pub fn new(output: W) -> Self {
        JsonlRecordWriter { output }
    }

    pub fn write_record(&mut self, record: &Record) -> Result<(), ProcessingError> {
        let json_line = serde_json::to_string(&record.to_json())?;
        writeln!(self.output, "{}", json_line)?;
        Ok(())
    }

    pub fn flush(&mut self) -> Result<(), ProcessingError> {
        self.output.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_csv_writer_quotes_delimiters() {
        let mut output = Vec::new();
        {
            let mut writer = OutputFormat::Csv.writer(&mut output, fields(&["a", "b"]), true);
            writer
                .write_record(&Record::from_pairs([("a", "1,5"), ("b", "say \"hi\"")]))
                .unwrap();
            writer.flush().unwrap();
        }
        assert_eq!(
            String::from_utf8(output).unwrap(),
            "a,b\n\"1,5\",\"say \"\"hi\"\"\"\n"
        );
    }

    #[test]
    fn test_csv_writer_fills_missing_and_null_fields() {
        let mut output = Vec::new();
        {
            let mut writer = OutputFormat::Csv.writer(&mut output, fields(&["a", "b", "c"]), false);
            let mut record = Record::from_pairs([("c", "3"), ("extra", "x")]);
            record.set("b", None);
            writer.write_record(&record).unwrap();
            writer.flush().unwrap();
        }
        assert_eq!(String::from_utf8(output).unwrap(), ",,3\n");
    }

    #[test]
    fn test_csv_writer_header_written_once_even_without_records() {
        let mut output = Vec::new();
        {
            let mut writer = OutputFormat::Csv.writer(&mut output, fields(&["a"]), true);
            writer.write_header().unwrap();
            writer.write_header().unwrap();
            writer.flush().unwrap();
        }
        assert_eq!(String::from_utf8(output).unwrap(), "a\n");
    }

    #[test]
    fn test_jsonl_writer_keeps_key_order_and_nulls() {
        let mut output = Vec::new();
        {
            let mut writer = OutputFormat::Jsonl.writer(&mut output, Vec::new(), true);
            let mut record = Record::from_pairs([("z", "1"), ("a", "2")]);
            record.set("in_reply_to", None);
            writer.write_record(&record).unwrap();
        }
        assert_eq!(
            String::from_utf8(output).unwrap(),
            "{\"z\":\"1\",\"a\":\"2\",\"in_reply_to\":null}\n"
        );
    }
}
