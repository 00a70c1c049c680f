//! Resolving views over table rows.
//!
//! A [`LazyRow`] pairs a borrowed [`Table`] with one of its rows. Field names
//! are resolved against the table's columns first, then against the row's
//! ancestor context, then that context's ancestor, and so on:
//!
//! ```text
//! child row ──parent──▶ row of stage-1 table ──parent──▶ row of source table
//!   (own columns)         (columns of stage 1)            (columns of source)
//! ```
//!
//! This lets a stage read a field produced several stages earlier without
//! copying it into every derived row.

use std::fmt;

use crate::column::{Column, HIDDEN_PREFIX};
use crate::error::TableError;
use crate::flatten::{FlatRecord, FlatValue};
use crate::row::Row;
use crate::table::Table;
use crate::value::Value;

/// Reserved alias for the current (last-added) column.
pub const CURRENT_COLUMN: &str = HIDDEN_PREFIX;

/// A read-only view of one row within its owning table.
#[derive(Clone, Copy)]
pub struct LazyRow<'a> {
    /// The table whose columns interpret `row`.
    table: &'a Table<'a>,
    /// The underlying row storage.
    row: &'a Row<'a>,
}

impl<'a> LazyRow<'a> {
    /// Bind a row to the table that interprets it.
    #[must_use]
    pub const fn new(table: &'a Table<'a>, row: &'a Row<'a>) -> Self {
        Self { table, row }
    }

    /// The owning table.
    #[inline]
    #[must_use]
    pub const fn table(&self) -> &'a Table<'a> {
        self.table
    }

    /// The underlying row.
    #[inline]
    #[must_use]
    pub const fn row(&self) -> &'a Row<'a> {
        self.row
    }

    /// The ancestor context this row was derived under.
    #[inline]
    #[must_use]
    pub const fn parent(&self) -> Option<Self> {
        self.row.parent()
    }

    /// Number of columns in the owning table.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.table.columns().len()
    }

    /// Check if the owning table has no columns.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The value of the owning table's current column.
    #[must_use]
    pub fn value(&self) -> Option<&'a Value<'a>> {
        self.table
            .current_column()
            .and_then(|c| c.get_value(self.row))
    }

    /// The current value as a nested table, if it is one.
    #[must_use]
    pub fn nested(&self) -> Option<&'a Table<'a>> {
        self.value().and_then(Value::as_table)
    }

    /// Iterate the rows of the nested table held in the current column.
    ///
    /// Empty if the current value is not a table.
    pub fn iter(&self) -> impl Iterator<Item = LazyRow<'a>> + use<'a> {
        self.nested().into_iter().flat_map(|t| t.rows())
    }

    /// Resolve `name` through this row's table and then its ancestor contexts.
    ///
    /// `"_"` always means the current column of this row's own table. A column
    /// that exists but holds no value for the row yields `Ok(None)`; the search
    /// does not continue past the first table that defines the name.
    ///
    /// # Errors
    ///
    /// Returns `TableError::KeyNotFound` if no table in the scope chain defines
    /// a column named `name`.
    pub fn get(&self, name: &str) -> Result<Option<&'a Value<'a>>, TableError> {
        if name == CURRENT_COLUMN {
            let current = self
                .table
                .current_column()
                .ok_or_else(|| TableError::key_not_found(name))?;
            return Ok(current.get_value(self.row));
        }

        let mut scope = Some(*self);
        while let Some(view) = scope {
            if let Some(column) = view.table.get_column(name) {
                return Ok(column.get_value(view.row));
            }
            scope = view.parent();
        }

        tracing::trace!("scope chain exhausted for '{}'", name);
        Err(TableError::key_not_found(name))
    }

    /// Resolve `name`, treating a scope-chain miss like an absent value.
    #[must_use]
    pub fn get_opt(&self, name: &str) -> Option<&'a Value<'a>> {
        self.get(name).ok().flatten()
    }

    /// Flatten this row into a plain mapping.
    ///
    /// Hidden columns are left out, except that the current column is kept
    /// under `"_"` when `named_only` is false. Absent values are omitted;
    /// nested tables become their scalar (rank 0) or their flattened rows; records
    /// and opaque values become text. When two columns map to the same key the
    /// later one wins and takes the later position.
    #[must_use]
    pub fn to_mapping(&self, named_only: bool) -> FlatRecord {
        let columns = self.table.columns();
        let last = columns.len().checked_sub(1);
        let mut out = FlatRecord::with_capacity(columns.len());

        for (idx, column) in columns.iter().enumerate() {
            let key = if column.hidden() {
                if named_only || Some(idx) != last {
                    continue;
                }
                CURRENT_COLUMN
            } else {
                column.name()
            };

            let Some(value) = column.get_value(self.row) else {
                continue;
            };

            out.shift_remove(key);
            out.insert(key.to_string(), flatten_value(value));
        }

        out
    }

    /// Keys of the flattened mapping, current column included.
    #[must_use]
    pub fn keys(&self) -> Vec<String> {
        self.to_mapping(false).into_keys().collect()
    }

    /// Look up a column of the owning table only, without the scope chain.
    #[must_use]
    pub fn own_column(&self, name: &str) -> Option<&'a Column> {
        self.table.get_column(name)
    }
}

/// Flatten one cell value.
pub(crate) fn flatten_value(value: &Value<'_>) -> FlatValue {
    match value {
        Value::Scalar(s) => FlatValue::Scalar(s.clone()),
        Value::Table(t) => t.flatten(),
        Value::Record(_) | Value::Opaque(_) => FlatValue::Text(value.to_string()),
    }
}

impl fmt::Debug for LazyRow<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LazyRow")
            .field("row", &self.to_mapping(false))
            .field("parent", &self.parent())
            .finish()
    }
}

impl fmt::Display for LazyRow<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rendered = serde_json::to_string(&self.to_mapping(false)).map_err(|_| fmt::Error)?;
        f.write_str(&rendered)
    }
}
