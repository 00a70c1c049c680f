//! Raw row storage.

use std::ops::Deref;

use crate::lazy_row::LazyRow;
use crate::value::{Record, Value};

/// One raw record plus an optional link to the row context it was derived under.
///
/// The link is a borrowed view into an ancestor table and is never part of the
/// field mapping, so it cannot collide with or be projected as a column.
#[derive(Debug, Clone, Default)]
pub struct Row<'a> {
    /// The record's fields in insertion order.
    fields: Record<'a>,
    /// The ancestor row context, consulted by scope-chain lookups.
    parent: Option<LazyRow<'a>>,
}

impl<'a> Row<'a> {
    /// Create a row without an ancestor context.
    #[must_use]
    pub const fn new(fields: Record<'a>) -> Self {
        Self {
            fields,
            parent: None,
        }
    }

    /// Create a row derived under `parent`.
    #[must_use]
    pub const fn with_parent(fields: Record<'a>, parent: LazyRow<'a>) -> Self {
        Self {
            fields,
            parent: Some(parent),
        }
    }

    /// The field mapping.
    #[inline]
    #[must_use]
    pub const fn fields(&self) -> &Record<'a> {
        &self.fields
    }

    /// Look up a raw field by name, ignoring any schema.
    #[inline]
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&Value<'a>> {
        self.fields.get(name)
    }

    /// The ancestor row context, if any.
    #[inline]
    #[must_use]
    pub const fn parent(&self) -> Option<LazyRow<'a>> {
        self.parent
    }

    /// Replace the ancestor row context.
    pub fn set_parent(&mut self, parent: Option<LazyRow<'a>>) {
        self.parent = parent;
    }
}

impl<'a> From<Record<'a>> for Row<'a> {
    fn from(fields: Record<'a>) -> Self {
        Self::new(fields)
    }
}

/// A row held by a table: either owned, or shared from a view of another table.
#[derive(Debug, Clone)]
pub(crate) enum RowSlot<'a> {
    /// Appended from a record; the table registered its fields as columns.
    Owned(Row<'a>),
    /// Reused from a [`LazyRow`] without copying.
    Shared(&'a Row<'a>),
}

impl<'a> Deref for RowSlot<'a> {
    type Target = Row<'a>;

    fn deref(&self) -> &Self::Target {
        match self {
            Self::Owned(row) => row,
            Self::Shared(row) => row,
        }
    }
}

/// Anything a table can be built from, one row at a time.
#[derive(Debug, Clone)]
pub enum RowInput<'a> {
    /// A new row; its unseen field names become columns.
    Row(Row<'a>),
    /// An existing row, reused as-is. No columns are registered.
    Lazy(LazyRow<'a>),
}

impl<'a> From<Row<'a>> for RowInput<'a> {
    fn from(row: Row<'a>) -> Self {
        Self::Row(row)
    }
}

impl<'a> From<Record<'a>> for RowInput<'a> {
    fn from(fields: Record<'a>) -> Self {
        Self::Row(Row::new(fields))
    }
}

impl<'a> From<LazyRow<'a>> for RowInput<'a> {
    fn from(view: LazyRow<'a>) -> Self {
        Self::Lazy(view)
    }
}
