use crate::error::ProcessingError;
use crate::input_format::{InputFormat, RecordReader};
use crate::output_format::{OutputFormat, RecordWriter};
use std::io::{Read, Write};

#[derive(Debug, Clone, Copy)]
pub struct CodecOptions {
    /// Emit the CSV header on the output side. Turned off when a later
    /// stage writes its own header.
    pub write_header: bool,
}

impl Default for CodecOptions {
    fn default() -> Self {
        CodecOptions { write_header: true }
    }
}

/// A reader and a writer bound to the same wire format
pub struct CodecSession<R: Read, W: Write> {
    reader: RecordReader<R>,
    writer: RecordWriter<W>,
}

impl InputFormat {
    pub fn output_format(&self) -> OutputFormat {
        match self {
            InputFormat::Csv => OutputFormat::Csv,
            InputFormat::Jsonl => OutputFormat::Jsonl,
        }
    }

    /// Open a session. The CSV header is read immediately and becomes the
    /// writer's column list; it is written out right away unless suppressed.
    pub fn open<R: Read, W: Write>(
        &self,
        input: R,
        output: W,
        options: CodecOptions,
    ) -> Result<CodecSession<R, W>, ProcessingError> {
        let reader = self.reader(input)?;
        let fields = reader.headers().map(|h| h.to_vec()).unwrap_or_default();
        let mut writer = self
            .output_format()
            .writer(output, fields, options.write_header);
        writer.write_header()?;

        Ok(CodecSession { reader, writer })
    }
}

impl<R: Read, W: Write> CodecSession<R, W> {
    pub fn format_name(&self) -> &'static str {
        self.reader.format_name()
    }

    /// Borrow both halves at once so records can be written while reading
    pub fn split(&mut self) -> (&mut RecordReader<R>, &mut RecordWriter<W>) {
        (&mut self.reader, &mut self.writer)
    }

    pub fn finish(mut self) -> Result<(), ProcessingError> {
        self.writer.flush()
    }
}
