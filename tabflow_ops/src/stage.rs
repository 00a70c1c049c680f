//! The boundary between the table model and the stages that produce tables.
//!
//! A stage is invoked on a table, a single row view, or a bare scalar, and
//! returns records, a scalar, or a one-shot stream of records. [`apply`] turns
//! that output into a new [`Table`]. When the stage ran on a row view, every
//! produced row is linked back to it, so later stages can still resolve the
//! invoking row's fields through the scope chain.

use tabflow_table::{LazyRow, Record, Row, Scalar, Table};

use crate::error::StageError;

/// A lazily produced, single-pass sequence of records.
pub type RecordStream<'a> = Box<dyn Iterator<Item = Result<Record<'a>, StageError>> + 'a>;

/// The context a stage is invoked on.
#[derive(Debug, Clone)]
pub enum StageInput<'a> {
    /// A whole table.
    Table(&'a Table<'a>),
    /// One row of a table.
    Row(LazyRow<'a>),
    /// A bare scalar.
    Scalar(Scalar),
}

impl<'a> StageInput<'a> {
    /// The row view that produced rows should be linked to.
    #[must_use]
    pub const fn parent_row(&self) -> Option<LazyRow<'a>> {
        match self {
            Self::Row(view) => Some(*view),
            _ => None,
        }
    }

    /// The table the result is derived from.
    #[must_use]
    pub const fn parent_table(&self) -> Option<&'a Table<'a>> {
        match self {
            Self::Table(table) => Some(*table),
            Self::Row(view) => Some(view.table()),
            Self::Scalar(_) => None,
        }
    }
}

impl<'a> From<&'a Table<'a>> for StageInput<'a> {
    fn from(table: &'a Table<'a>) -> Self {
        Self::Table(table)
    }
}

impl<'a> From<LazyRow<'a>> for StageInput<'a> {
    fn from(view: LazyRow<'a>) -> Self {
        Self::Row(view)
    }
}

/// What a stage hands back to the pipeline.
pub enum StageOutput<'a> {
    /// A single record; becomes a one-row table.
    Record(Record<'a>),
    /// A list of records.
    Records(Vec<Record<'a>>),
    /// A scalar; becomes a rank-0 table.
    Scalar(Scalar),
    /// A stream drained exactly once while the table is built.
    Stream(RecordStream<'a>),
}

impl std::fmt::Debug for StageOutput<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Record(r) => f.debug_tuple("Record").field(r).finish(),
            Self::Records(rs) => f.debug_tuple("Records").field(&rs.len()).finish(),
            Self::Scalar(s) => f.debug_tuple("Scalar").field(s).finish(),
            Self::Stream(_) => f.write_str("Stream(..)"),
        }
    }
}

impl<'a> StageOutput<'a> {
    /// Wrap this output into a table derived from `input`.
    ///
    /// # Errors
    ///
    /// Returns `StageError::Table` if a record uses a reserved field name, or
    /// if a stream fails while being drained. In the latter case no table is
    /// returned.
    pub fn into_table(self, input: &StageInput<'a>) -> Result<Table<'a>, StageError> {
        let link = input.parent_row();
        let to_row = move |fields: Record<'a>| match link {
            Some(parent) => Row::with_parent(fields, parent),
            None => Row::new(fields),
        };

        let table = match self {
            Self::Scalar(s) => Table::from_scalar(s),
            Self::Record(fields) => Table::from_records([to_row(fields)])?,
            Self::Records(records) => Table::from_records(records.into_iter().map(to_row))?,
            Self::Stream(stream) => {
                Table::try_from_records(stream.map(|item| item.map(to_row)))?
            }
        };

        Ok(match input.parent_table() {
            Some(parent) => table.with_parent(parent),
            None => table,
        })
    }
}

/// A pipeline stage.
pub trait Stage {
    /// Name used in logs and errors.
    fn name(&self) -> &str;

    /// Run the stage on `input`.
    ///
    /// # Errors
    ///
    /// Returns a `StageError` if the stage cannot produce its output.
    fn run<'a>(&self, input: StageInput<'a>) -> Result<StageOutput<'a>, StageError>;
}

/// Run `stage` on `input` and build the resulting table.
///
/// # Errors
///
/// Returns the stage's own error, or a `StageError::Table` if its output
/// cannot be turned into a table.
pub fn apply<'a, S>(stage: &S, input: StageInput<'a>) -> Result<Table<'a>, StageError>
where
    S: Stage + ?Sized,
{
    tracing::debug!("applying stage '{}'", stage.name());
    let output = stage.run(input.clone())?;
    let table = output.into_table(&input)?;
    tracing::debug!(
        "stage '{}' produced a table of shape {:?}",
        stage.name(),
        table.shape()
    );
    Ok(table)
}
