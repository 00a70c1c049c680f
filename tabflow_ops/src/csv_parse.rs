//! Delimited-text source stage.
//!
//! [`CsvParse`] reads a file whose first record is a header and lazily yields
//! one record per following line, keyed by the header names. Every value is a
//! string scalar; empty fields stay as empty strings.

use std::fs::File;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};

use tabflow_table::{Record, Value};

use crate::error::StageError;
use crate::stage::{Stage, StageInput, StageOutput};

/// Parsing options for [`CsvParse`].
///
/// - delimiter / quote: single-byte field separator and quote character.
/// - trim: strip surrounding whitespace from headers and fields.
/// - flexible: accept records whose length differs from the header. Short
///   records leave the missing trailing fields absent; extra fields are dropped.
///   With `flexible = false` a length mismatch fails the stream.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CsvConfig {
    /// Field separator.
    pub delimiter: u8,
    /// Quote character.
    pub quote: u8,
    /// Whether to trim whitespace around headers and fields.
    pub trim: bool,
    /// Whether records may differ in length from the header.
    pub flexible: bool,
}

impl CsvConfig {
    /// Create a configuration with the given delimiter and defaults otherwise.
    #[must_use]
    pub const fn new(delimiter: u8) -> Self {
        Self {
            delimiter,
            quote: b'"',
            trim: false,
            flexible: true,
        }
    }

    /// Convenience: tab-separated values.
    #[must_use]
    pub const fn tab_separated() -> Self {
        Self::new(b'\t')
    }

    /// Set the quote character.
    #[must_use]
    pub const fn with_quote(mut self, quote: u8) -> Self {
        self.quote = quote;
        self
    }

    /// Enable or disable whitespace trimming.
    #[must_use]
    pub const fn with_trim(mut self, trim: bool) -> Self {
        self.trim = trim;
        self
    }

    /// Enable or disable tolerance of ragged records.
    #[must_use]
    pub const fn with_flexible(mut self, flexible: bool) -> Self {
        self.flexible = flexible;
        self
    }

    /// The `csv` reader builder for these options.
    fn reader_builder(&self) -> csv::ReaderBuilder {
        let mut builder = csv::ReaderBuilder::new();
        builder
            .delimiter(self.delimiter)
            .quote(self.quote)
            .flexible(self.flexible)
            .has_headers(true)
            .trim(if self.trim {
                csv::Trim::All
            } else {
                csv::Trim::None
            });
        builder
    }
}

impl Default for CsvConfig {
    /// Comma-separated, double-quoted, untrimmed, flexible.
    fn default() -> Self {
        Self::new(b',')
    }
}

/// Stage that loads a delimited file with a header row.
#[derive(Clone, Debug)]
pub struct CsvParse {
    /// The file to read.
    path: PathBuf,
    /// Parsing options.
    config: CsvConfig,
}

impl CsvParse {
    /// Read `path` with the default configuration.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self::with_config(path, CsvConfig::default())
    }

    /// Read `path` with explicit options.
    pub fn with_config(path: impl Into<PathBuf>, config: CsvConfig) -> Self {
        Self {
            path: path.into(),
            config,
        }
    }

    /// The file this stage reads.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Open the source and read its header.
    ///
    /// # Errors
    ///
    /// Returns `StageError::Io` if the file cannot be opened, or
    /// `StageError::Csv` if the header cannot be read.
    pub fn open<'a>(&self) -> Result<CsvRecords<'a>, StageError> {
        let file = File::open(&self.path).map_err(|e| StageError::io(&self.path, e))?;
        let mut reader = self.config.reader_builder().from_reader(file);
        let headers: Vec<String> = reader.headers()?.iter().map(String::from).collect();
        tracing::debug!(
            "opened '{}' with {} header fields",
            self.path.display(),
            headers.len()
        );
        Ok(CsvRecords {
            path: self.path.clone(),
            reader,
            headers,
            record: csv::StringRecord::new(),
            done: false,
            _records: PhantomData,
        })
    }
}

impl Stage for CsvParse {
    fn name(&self) -> &str {
        "csv-parse"
    }

    fn run<'a>(&self, _input: StageInput<'a>) -> Result<StageOutput<'a>, StageError> {
        Ok(StageOutput::Stream(Box::new(self.open()?)))
    }
}

/// One-shot iterator over the records of an open delimited file.
///
/// Stops for good after the end of input or the first error.
#[derive(Debug)]
pub struct CsvRecords<'a> {
    /// Source path, for diagnostics.
    path: PathBuf,
    /// The underlying reader, positioned after the header.
    reader: csv::Reader<File>,
    /// Header names in source order.
    headers: Vec<String>,
    /// Reused read buffer.
    record: csv::StringRecord,
    /// Set once the stream is exhausted or has failed.
    done: bool,
    /// Lifetime of the records handed out.
    _records: PhantomData<Record<'a>>,
}

impl<'a> CsvRecords<'a> {
    /// Header names in source order.
    #[must_use]
    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    /// Key the current buffer by header name.
    fn to_record(&self) -> Record<'a> {
        let mut out = Record::with_capacity(self.headers.len());
        for (name, field) in self.headers.iter().zip(self.record.iter()) {
            out.insert(name.clone(), Value::from(field));
        }
        if self.record.len() > self.headers.len() {
            tracing::warn!(
                "'{}' line {}: dropping {} fields beyond the header",
                self.path.display(),
                self.record.position().map_or(0, csv::Position::line),
                self.record.len() - self.headers.len()
            );
        }
        out
    }
}

impl<'a> Iterator for CsvRecords<'a> {
    type Item = Result<Record<'a>, StageError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.reader.read_record(&mut self.record) {
            Ok(true) => Some(Ok(self.to_record())),
            Ok(false) => {
                self.done = true;
                None
            }
            Err(e) => {
                self.done = true;
                Some(Err(e.into()))
            }
        }
    }
}

impl std::iter::FusedIterator for CsvRecords<'_> {}
