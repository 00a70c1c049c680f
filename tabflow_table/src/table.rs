//! Nested tables.
//!
//! A [`Table`] is either a list of rows with an ordered, name-unique column
//! schema, or a single scalar (a rank-0 table). Cells may hold further tables,
//! so a table of tables behaves like a ragged multi-dimensional array whose
//! dimensions are reported by [`Table::shape`].
//!
//! # Construction
//!
//! ```
//! use tabflow_table::{record, Table};
//!
//! let t = Table::from_records([
//!     record! { "a" => 1, "b" => 2 },
//!     record! { "a" => 3, "c" => 4 },
//! ])?;
//! assert_eq!(t.column_names(), ["a", "b", "c"]);
//! assert_eq!(t.shape(), [2]);
//! # Ok::<(), tabflow_table::TableError>(())
//! ```
//!
//! Rows passed in as [`LazyRow`]s are reused rather than copied, and do not
//! register columns; the caller adds the columns it wants to expose.

use std::fmt;

use contracts::*;
use itertools::Itertools;

use crate::column::{Column, RESERVED_PREFIX};
use crate::error::TableError;
use crate::flatten::{FlatValue, truncate};
use crate::lazy_row::{CURRENT_COLUMN, LazyRow, flatten_value};
use crate::row::{Row, RowInput, RowSlot};
use crate::value::{Scalar, Value};

/// Width of the first-row preview in `Display`.
const PREVIEW_LEN: usize = 20;

/// The two mutually exclusive kinds of table content.
#[derive(Debug, Clone)]
enum Body<'a> {
    /// Rows interpreted through an ordered column schema.
    Rows {
        /// Row storage in insertion order.
        rows: Vec<RowSlot<'a>>,
        /// Column schema in insertion order; names are unique.
        columns: Vec<Column>,
    },
    /// A single value standing for a rank-0 table. Always `Value::Scalar`,
    /// so it can be lent out like any other cell value.
    Scalar(Box<Value<'a>>),
}

/// An ordered collection of rows and columns, or a single scalar.
#[derive(Debug, Clone)]
pub struct Table<'a> {
    /// Rows and columns, or a scalar.
    body: Body<'a>,
    /// The table this one was derived from. Provenance only; lookups use row links.
    parent: Option<&'a Table<'a>>,
}

impl Default for Table<'_> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a> Table<'a> {
    /// Create an empty table with no rows and no columns.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            body: Body::Rows {
                rows: Vec::new(),
                columns: Vec::new(),
            },
            parent: None,
        }
    }

    /// Create a rank-0 table holding `scalar`.
    #[must_use]
    pub fn from_scalar(scalar: impl Into<Scalar>) -> Self {
        Self {
            body: Body::Scalar(Box::new(Value::Scalar(scalar.into()))),
            parent: None,
        }
    }

    /// Build a table from a sequence of records, rows, or row views.
    ///
    /// Every field name not yet in the schema becomes a new column, in the
    /// order first seen. Row views are reused as-is and add no columns.
    ///
    /// # Errors
    ///
    /// Returns `TableError::InvariantViolation` if a record uses a field name
    /// with the reserved `__` prefix.
    pub fn from_records<I>(records: I) -> Result<Self, TableError>
    where
        I: IntoIterator,
        I::Item: Into<RowInput<'a>>,
    {
        let mut table = Self::new();
        for record in records {
            table.push(record)?;
        }
        tracing::debug!(
            "built table with {} rows and {} columns",
            table.len(),
            table.columns().len()
        );
        Ok(table)
    }

    /// Build a table by draining a fallible, single-pass row producer.
    ///
    /// The producer is consumed exactly once, in order. If it fails, the
    /// partially built table is discarded.
    ///
    /// # Errors
    ///
    /// Returns `TableError::StageProducer` wrapping the first producer error,
    /// or `TableError::InvariantViolation` as for [`Table::from_records`].
    pub fn try_from_records<I, T, E>(records: I) -> Result<Self, TableError>
    where
        I: IntoIterator<Item = Result<T, E>>,
        T: Into<RowInput<'a>>,
        E: Into<crate::error::ProducerError>,
    {
        let mut table = Self::new();
        for record in records {
            let record = record.map_err(|e| {
                let err = TableError::producer(e);
                tracing::debug!("abandoning table after {} rows: {}", table.len(), err);
                err
            })?;
            table.push(record)?;
        }
        Ok(table)
    }

    /// Set the table this one was derived from.
    #[must_use]
    pub fn with_parent(mut self, parent: &'a Self) -> Self {
        self.parent = Some(parent);
        self
    }

    /// The table this one was derived from.
    #[inline]
    #[must_use]
    pub const fn parent(&self) -> Option<&'a Self> {
        self.parent
    }

    /// Append one row, registering the columns of new records.
    ///
    /// Field names with the reserved `__` prefix are rejected rather than
    /// skipped during column registration: the ancestor link lives on
    /// [`Row::parent`], so such a name can only come from a misbehaving stage.
    ///
    /// # Errors
    ///
    /// Returns `TableError::InvariantViolation` if this is a scalar table, or if
    /// the record uses a field name with the reserved `__` prefix.
    pub fn push(&mut self, input: impl Into<RowInput<'a>>) -> Result<(), TableError> {
        let Body::Rows { rows, columns } = &mut self.body else {
            return Err(TableError::invariant("cannot append rows to a scalar table"));
        };

        match input.into() {
            RowInput::Lazy(view) => rows.push(RowSlot::Shared(view.row())),
            RowInput::Row(row) => {
                for name in row.fields().keys() {
                    if name.starts_with(RESERVED_PREFIX) {
                        return Err(TableError::invariant(format!(
                            "field '{name}' uses the reserved '{RESERVED_PREFIX}' prefix"
                        )));
                    }
                }
                for name in row.fields().keys() {
                    if !columns.iter().any(|c| c.name() == name.as_str()) {
                        tracing::trace!("new column '{}'", name);
                        columns.push(Column::new(name.clone()));
                    }
                }
                rows.push(RowSlot::Owned(row));
            }
        }
        Ok(())
    }

    /// Append a column unless one with the same name already exists.
    ///
    /// # Errors
    ///
    /// Returns `TableError::InvariantViolation` if the name uses the reserved
    /// `__` prefix or this is a scalar table.
    pub fn add_column(&mut self, column: Column) -> Result<(), TableError> {
        if column.is_reserved() {
            return Err(TableError::invariant(format!(
                "column name '{}' uses the reserved '{RESERVED_PREFIX}' prefix",
                column.name()
            )));
        }
        let Body::Rows { columns, .. } = &mut self.body else {
            return Err(TableError::invariant("cannot add columns to a scalar table"));
        };
        if columns.iter().any(|c| c.name() == column.name()) {
            return Ok(());
        }
        columns.push(column);
        Ok(())
    }

    /// A table with the same columns and no rows.
    ///
    /// The columns are cloned, so the copy's schema evolves independently.
    /// A scalar table copies to the same scalar.
    #[must_use]
    #[ensures(ret.is_empty())]
    pub fn structural_copy(&self) -> Table<'a> {
        let body = match &self.body {
            Body::Rows { columns, .. } => Body::Rows {
                rows: Vec::new(),
                columns: columns.clone(),
            },
            Body::Scalar(s) => Body::Scalar(s.clone()),
        };
        Table { body, parent: None }
    }

    /// Number of rows. Zero for a scalar table.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        match &self.body {
            Body::Rows { rows, .. } => rows.len(),
            Body::Scalar(_) => 0,
        }
    }

    /// Check if the table has no rows.
    #[inline]
    #[ensures(ret == (self.len() == 0))]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Check if this is a rank-0 table.
    #[inline]
    #[must_use]
    pub const fn is_scalar(&self) -> bool {
        matches!(self.body, Body::Scalar(_))
    }

    /// The scalar of a rank-0 table.
    #[inline]
    #[must_use]
    pub fn scalar(&self) -> Option<&Scalar> {
        match &self.body {
            Body::Scalar(v) => v.as_scalar(),
            Body::Rows { .. } => None,
        }
    }

    /// The column schema. Empty for a scalar table.
    #[inline]
    #[must_use]
    pub fn columns(&self) -> &[Column] {
        match &self.body {
            Body::Rows { columns, .. } => columns,
            Body::Scalar(_) => &[],
        }
    }

    /// Column names in schema order.
    #[must_use]
    #[debug_ensures(ret.iter().all_unique())]
    pub fn column_names(&self) -> Vec<&str> {
        self.columns().iter().map(Column::name).collect()
    }

    /// Column keys in schema order.
    #[must_use]
    pub fn column_keys(&self) -> Vec<&crate::column::ColumnKey> {
        self.columns().iter().map(Column::key).collect()
    }

    /// The most recently added column.
    #[inline]
    #[must_use]
    pub fn current_column(&self) -> Option<&Column> {
        self.columns().last()
    }

    /// Find a column by name. `"_"` names the current column.
    #[must_use]
    pub fn get_column(&self, name: &str) -> Option<&Column> {
        if name == CURRENT_COLUMN {
            return self.current_column();
        }
        self.columns().iter().find(|c| c.name() == name)
    }

    /// Raw storage of the first row.
    pub(crate) fn first_row(&self) -> Option<&Row<'a>> {
        match &self.body {
            Body::Rows { rows, .. } => rows.first().map(|slot| &**slot),
            Body::Scalar(_) => None,
        }
    }

    /// A view of the row at `index`.
    ///
    /// # Errors
    ///
    /// Returns `TableError::IndexOutOfRange` if `index >= self.len()`.
    pub fn row(&self, index: usize) -> Result<LazyRow<'_>, TableError> {
        self.get(index).ok_or(TableError::IndexOutOfRange {
            index,
            len: self.len(),
        })
    }

    /// A view of the row at `index`, or `None` if out of range.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<LazyRow<'_>> {
        match &self.body {
            Body::Rows { rows, .. } => rows.get(index).map(|slot| LazyRow::new(self, slot)),
            Body::Scalar(_) => None,
        }
    }

    /// Iterate views of all rows in order. Empty for a scalar table.
    pub fn rows(&self) -> impl Iterator<Item = LazyRow<'_>> + '_ {
        let slots = match &self.body {
            Body::Rows { rows, .. } => rows.as_slice(),
            Body::Scalar(_) => &[],
        };
        slots.iter().map(move |slot| LazyRow::new(self, slot))
    }

    /// The current-column value of every row.
    ///
    /// A rank-0 table reports its scalar as the only value.
    #[must_use]
    pub fn values(&self) -> Vec<Option<&Value<'_>>> {
        match &self.body {
            Body::Scalar(v) => vec![Some(v.as_ref())],
            Body::Rows { .. } => self.rows().map(|r| r.value()).collect(),
        }
    }

    /// Size of each nesting level, outermost first.
    ///
    /// Only the current column's value in the first row is inspected for
    /// nesting; other columns holding tables of a different size do not
    /// change the result. A scalar table has an empty shape.
    #[must_use]
    pub fn shape(&self) -> Vec<usize> {
        if self.is_scalar() {
            return Vec::new();
        }
        let mut dims = vec![self.len()];
        if let Some(nested) = self.first_nested() {
            dims.extend(nested.shape());
        }
        dims
    }

    /// Number of nesting levels; `self.shape().len()`.
    #[inline]
    #[must_use]
    pub fn rank(&self) -> usize {
        self.shape().len()
    }

    /// The table in the current column of the first row, if any.
    fn first_nested(&self) -> Option<&Table<'a>> {
        let column = self.current_column()?;
        column.get_value(self.first_row()?)?.as_table()
    }

    /// Descend through first-row nested tables until the rank is at most `rank`.
    ///
    /// Returns `None` if a level that would have to be entered does not hold a table.
    #[must_use]
    pub fn axis(&self, rank: usize) -> Option<&Table<'a>> {
        if self.rank() > rank {
            return self.first_nested()?.axis(rank);
        }
        Some(self)
    }

    /// Deep names of the visible columns and the current column, comma-joined.
    ///
    /// Returns `"no cols"` if there are none to show.
    #[must_use]
    pub fn deep_column_names(&self) -> String {
        let columns = self.columns();
        let last = columns.len().checked_sub(1);
        let names = columns
            .iter()
            .enumerate()
            .filter(|(idx, c)| !c.hidden() || Some(*idx) == last)
            .map(|(_, c)| c.deep_name(self))
            .join(",");
        if names.is_empty() {
            "no cols".to_string()
        } else {
            names
        }
    }

    /// Flatten into plain output: the scalar of a rank-0 table, otherwise one
    /// mapping per row (see [`LazyRow::to_mapping`]).
    #[must_use]
    pub fn flatten(&self) -> FlatValue {
        match &self.body {
            Body::Scalar(v) => flatten_value(v),
            Body::Rows { .. } => FlatValue::Rows(self.rows().map(|r| r.to_mapping(false)).collect()),
        }
    }
}

impl fmt::Display for Table<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Body::Scalar(s) = &self.body {
            return write!(f, "{s}");
        }

        let shape = self.shape().iter().join("x");
        let mut content = String::new();
        if let Some(first) = self.get(0) {
            content.push_str(&truncate(&first.to_string(), PREVIEW_LEN));
        }
        if self.len() > 1 {
            content.push_str(" ...");
        }
        write!(f, "<Table [{shape} {}] {content}>", self.deep_column_names())
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;
    use crate::record;

    #[test]
    fn test_schema_union_in_first_seen_order() {
        let t = Table::from_records([
            record! { "a" => 1 },
            record! { "b" => 2, "a" => 3 },
            record! { "c" => 4 },
        ])
        .unwrap();
        assert_eq!(t.column_names(), ["a", "b", "c"]);
        assert_eq!(t.len(), 3);
    }

    #[test]
    fn test_add_existing_column_is_noop() {
        let mut t = Table::from_records([record! { "a" => 1 }]).unwrap();
        t.add_column(Column::named("a", "other")).unwrap();
        assert_eq!(t.columns().len(), 1);
        assert_eq!(t.columns()[0].key().to_string(), "a");
        assert_eq!(t.column_keys(), [&crate::column::ColumnKey::from("a")]);
    }

    #[rstest]
    #[case("__parent")]
    #[case("__")]
    fn test_reserved_column_rejected(#[case] name: &str) {
        let mut t = Table::new();
        let err = t.add_column(Column::new(name)).unwrap_err();
        assert!(matches!(err, TableError::InvariantViolation(_)));
    }

    #[test]
    fn test_reserved_field_rejected() {
        let err = Table::from_records([record! { "__parent" => 1 }]).unwrap_err();
        assert!(matches!(err, TableError::InvariantViolation(_)));
    }

    #[test]
    fn test_scalar_table() {
        let mut t = Table::from_scalar(5);
        assert!(t.is_scalar());
        assert_eq!(t.shape(), Vec::<usize>::new());
        assert_eq!(t.rank(), 0);
        assert_eq!(t.len(), 0);
        assert_eq!(t.flatten(), FlatValue::Scalar(Scalar::Int(5)));
        assert_eq!(t.to_string(), "5");
        assert!(t.add_column(Column::new("a")).is_err());
        assert!(t.push(record! { "a" => 1 }).is_err());
    }

    #[test]
    fn test_index_out_of_range() {
        let t = Table::from_records([record! { "a" => 1 }]).unwrap();
        assert!(t.row(0).is_ok());
        assert!(matches!(
            t.row(1),
            Err(TableError::IndexOutOfRange { index: 1, len: 1 })
        ));
        assert!(t.get(1).is_none());
    }

    #[test]
    fn test_get_column() {
        let t = Table::from_records([record! { "a" => 1, "b" => 2 }]).unwrap();
        assert_eq!(t.get_column("a").map(Column::name), Some("a"));
        assert_eq!(t.get_column("_").map(Column::name), Some("b"));
        assert!(t.get_column("zzz").is_none());
        assert!(Table::new().get_column("_").is_none());
    }

    #[test]
    fn test_shape_uses_current_column_only() {
        let small = Table::from_records([record! { "y" => 1 }]).unwrap();
        let big = Table::from_records([record! { "y" => 1 }, record! { "y" => 2 }, record! { "y" => 3 }])
            .unwrap();
        let t = Table::from_records([record! { "side" => big, "cur" => small }]).unwrap();
        assert_eq!(t.shape(), [1, 1]);
        assert_eq!(t.rank(), 2);
    }

    #[test]
    fn test_shape_empty_table() {
        assert_eq!(Table::new().shape(), [0]);
        assert_eq!(Table::new().rank(), 1);
    }

    #[test]
    fn test_structural_copy() {
        let t = Table::from_records([record! { "a" => 1, "b" => 2 }, record! { "a" => 3 }]).unwrap();
        let mut copy = t.structural_copy();
        assert!(copy.is_empty());
        assert_eq!(copy.column_names(), t.column_names());

        copy.add_column(Column::new("c")).unwrap();
        assert_eq!(t.columns().len(), 2);
        assert_eq!(copy.columns().len(), 3);

        copy.push(t.row(1).unwrap()).unwrap();
        assert_eq!(copy.len(), 1);
        assert_eq!(copy.columns().len(), 3);
    }

    #[test]
    fn test_lazy_rows_reused() {
        let t = Table::from_records([record! { "a" => 1 }, record! { "a" => 2 }]).unwrap();
        let reused = Table::from_records(t.rows()).unwrap();
        assert_eq!(reused.len(), 2);
        assert!(reused.columns().is_empty());
        assert!(std::ptr::eq(
            reused.row(1).unwrap().row(),
            t.row(1).unwrap().row()
        ));
    }

    #[test]
    fn test_try_from_records_abandons_on_error() {
        let produced: Vec<Result<_, std::io::Error>> = vec![
            Ok(record! { "a" => 1 }),
            Err(std::io::Error::other("disk gone")),
            Ok(record! { "a" => 2 }),
        ];
        let err = Table::try_from_records(produced).unwrap_err();
        assert!(matches!(err, TableError::StageProducer(_)));
        assert!(err.to_string().contains("disk gone"));
    }

    #[test]
    fn test_axis() {
        let inner = Table::from_records([record! { "y" => 1 }]).unwrap();
        let outer = Table::from_records([record! { "x" => inner }]).unwrap();
        assert_eq!(outer.rank(), 2);
        assert_eq!(outer.axis(2).map(Table::rank), Some(2));
        assert_eq!(outer.axis(1).map(Table::column_names), Some(vec!["y"]));
        assert!(outer.axis(0).is_none());
    }

    #[test]
    fn test_deep_column_names() {
        let inner = Table::from_records([record! { "y" => 1, "_h" => 2, "z" => 3 }]).unwrap();
        let outer = Table::from_records([record! { "id" => 7, "_tmp" => 0, "x" => inner }]).unwrap();
        assert_eq!(outer.deep_column_names(), "id,x:y,z");
        assert_eq!(Table::new().deep_column_names(), "no cols");
    }

    #[test]
    fn test_display() {
        let t = Table::from_records([record! { "a" => 1 }, record! { "a" => 2 }]).unwrap();
        assert_eq!(t.to_string(), r#"<Table [2 a] {"a":1} ...>"#);
    }

    #[test]
    fn test_values() {
        let t = Table::from_records([record! { "a" => 1, "b" => 2 }, record! { "a" => 3 }]).unwrap();
        let values = t.values();
        assert_eq!(values.len(), 2);
        assert!(values[0].is_some());
        assert!(values[1].is_none());
    }

    #[test]
    fn test_values_of_scalar_table() {
        let t = Table::from_scalar(5);
        let values = t.values();
        assert_eq!(values.len(), 1);
        assert_eq!(values[0].and_then(Value::as_scalar), Some(&Scalar::Int(5)));
        assert_eq!(t.scalar(), Some(&Scalar::Int(5)));
    }
}
