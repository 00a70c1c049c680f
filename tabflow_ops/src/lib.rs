//! Stage plumbing for the tabflow table model.
//!
//! A [`Stage`] runs on a table, a row view, or a scalar and hands back records,
//! a scalar, or a record stream. [`apply`] wraps that output into a
//! [`Table`](tabflow_table::Table), linking produced rows to the invoking row
//! so that its fields stay visible through the scope chain.
//!
//! [`CsvParse`] is the bundled source stage for delimited files:
//!
//! ```
//! use std::io::Write;
//!
//! use tabflow_ops::{CsvParse, StageInput, apply};
//!
//! let mut file = tempfile::NamedTempFile::new()?;
//! writeln!(file, "title,year\nDune,1965")?;
//!
//! let table = apply(&CsvParse::new(file.path()), StageInput::Scalar(0.into()))?;
//! assert_eq!(table.column_names(), ["title", "year"]);
//! assert_eq!(table.len(), 1);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

mod csv_parse;
mod error;
mod stage;

pub use csv_parse::{CsvConfig, CsvParse, CsvRecords};
pub use error::StageError;
pub use stage::{RecordStream, Stage, StageInput, StageOutput, apply};
