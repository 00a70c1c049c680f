//! Nested tabular data model for row-oriented pipelines.
//!
//! This crate provides the in-memory representation passed between pipeline
//! stages:
//! - [`Table`]: rows with an ordered column schema, or a single scalar
//! - [`Column`]: a named accessor into a row, optionally through a nested path
//!   or a nested record contributed by another table
//! - [`Row`]: raw field storage plus an optional link to an ancestor row context
//! - [`LazyRow`]: a view that resolves names through its table and the
//!   ancestor scope chain
//!
//! Cells may hold further tables, which makes a table behave like a ragged
//! array of records with a [`shape`](Table::shape) and a [`rank`](Table::rank).

mod column;
mod error;
mod flatten;
mod lazy_row;
mod row;
mod table;
mod value;

pub use column::{Column, ColumnKey, ColumnKind, HIDDEN_PREFIX, RESERVED_PREFIX};
pub use error::{ProducerError, TableError};
pub use flatten::{FlatRecord, FlatValue};
pub use lazy_row::{CURRENT_COLUMN, LazyRow};
pub use row::{Row, RowInput};
pub use table::Table;
pub use value::{Opaque, Record, Scalar, Value};
