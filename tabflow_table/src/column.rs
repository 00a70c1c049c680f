//! Column accessors.
//!
//! A [`Column`] names a value inside a row. Its key is either a single field
//! or a path through nested records. A sub-column first locates a nested record
//! through its own key, then applies the column it was created from; this lets
//! a table address the fields of rows contributed by another table.

use std::fmt;

use crate::row::Row;
use crate::table::Table;
use crate::value::{Record, Value};

/// Name prefix marking a hidden (intermediate) column.
pub const HIDDEN_PREFIX: &str = "_";

/// Name prefix reserved for internal structural links. Never a valid column name.
pub const RESERVED_PREFIX: &str = "__";

/// How a column locates its value inside a record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColumnKey {
    /// A single top-level field.
    Field(String),
    /// A path through nested records, outermost field first.
    Path(Vec<String>),
}

impl ColumnKey {
    /// Resolve this key against a record.
    ///
    /// Returns `None` if any step is missing or an intermediate value is not a record.
    #[must_use]
    pub fn resolve<'r, 'a>(&self, record: &'r Record<'a>) -> Option<&'r Value<'a>> {
        match self {
            Self::Field(field) => record.get(field.as_str()),
            Self::Path(path) => {
                let (last, init) = path.split_last()?;
                let mut obj = record;
                for step in init {
                    obj = obj.get(step.as_str())?.as_record()?;
                }
                obj.get(last.as_str())
            }
        }
    }
}

impl fmt::Display for ColumnKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Field(field) => f.write_str(field),
            Self::Path(path) => write!(f, "{}", path.join(".")),
        }
    }
}

impl From<&str> for ColumnKey {
    fn from(field: &str) -> Self {
        Self::Field(field.to_string())
    }
}

impl From<String> for ColumnKey {
    fn from(field: String) -> Self {
        Self::Field(field)
    }
}

impl From<Vec<String>> for ColumnKey {
    fn from(path: Vec<String>) -> Self {
        Self::Path(path)
    }
}

/// Whether a column reads its key directly or through a nested record.
#[derive(Debug, Clone)]
pub enum ColumnKind {
    /// The key is resolved against the row itself.
    Direct,
    /// The key locates a nested record; the origin column is applied to it.
    Sub(Box<Column>),
}

impl ColumnKind {
    /// Check if this is a sub-column.
    #[must_use]
    pub const fn is_sub(&self) -> bool {
        matches!(self, Self::Sub(_))
    }

    /// Get the origin column for a `Sub` kind, if applicable.
    #[must_use]
    pub fn origin(&self) -> Option<&Column> {
        match self {
            Self::Sub(origin) => Some(origin),
            Self::Direct => None,
        }
    }
}

/// A named accessor into a row.
#[derive(Debug, Clone)]
pub struct Column {
    /// Display name, unique within a table.
    name: String,
    /// Location of the value in the row.
    key: ColumnKey,
    /// Direct or sub-column.
    kind: ColumnKind,
}

impl Column {
    /// Create a column reading the field `key`, named after it.
    pub fn new(key: impl Into<String>) -> Self {
        let key = key.into();
        Self {
            name: key.clone(),
            key: ColumnKey::Field(key),
            kind: ColumnKind::Direct,
        }
    }

    /// Create a column with an explicit name and key.
    pub fn named(name: impl Into<String>, key: impl Into<ColumnKey>) -> Self {
        Self {
            name: name.into(),
            key: key.into(),
            kind: ColumnKind::Direct,
        }
    }

    /// Create a column that walks `path` through nested records.
    pub fn path<I, S>(name: impl Into<String>, path: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::named(name, ColumnKey::Path(path.into_iter().map(Into::into).collect()))
    }

    /// Create a sub-column: `key` locates a nested record, `origin` is applied to it.
    ///
    /// The sub-column takes the origin column's name.
    pub fn sub(key: impl Into<ColumnKey>, origin: Self) -> Self {
        Self {
            name: origin.name.clone(),
            key: key.into(),
            kind: ColumnKind::Sub(Box::new(origin)),
        }
    }

    /// The display name.
    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The key used to locate the value.
    #[inline]
    #[must_use]
    pub const fn key(&self) -> &ColumnKey {
        &self.key
    }

    /// Direct or sub-column.
    #[inline]
    #[must_use]
    pub const fn kind(&self) -> &ColumnKind {
        &self.kind
    }

    /// Hidden columns hold intermediate results and are left out of named projections.
    #[inline]
    #[must_use]
    pub fn hidden(&self) -> bool {
        self.name.starts_with(HIDDEN_PREFIX)
    }

    /// Check whether the name uses the reserved internal prefix.
    #[inline]
    #[must_use]
    pub fn is_reserved(&self) -> bool {
        self.name.starts_with(RESERVED_PREFIX)
    }

    /// Read this column's value from a row.
    #[inline]
    #[must_use]
    pub fn get_value<'r, 'a>(&self, row: &'r Row<'a>) -> Option<&'r Value<'a>> {
        self.value_in(row.fields())
    }

    /// Read this column's value from a bare record.
    #[must_use]
    pub fn value_in<'r, 'a>(&self, record: &'r Record<'a>) -> Option<&'r Value<'a>> {
        let found = self.key.resolve(record)?;
        match &self.kind {
            ColumnKind::Direct => Some(found),
            ColumnKind::Sub(origin) => origin.value_in(found.as_record()?),
        }
    }

    /// The name, expanded with the nested schema when the first row holds a table.
    ///
    /// A column `x` whose first value is a table with columns `a,b` renders as `x:a,b`.
    #[must_use]
    pub fn deep_name(&self, table: &Table<'_>) -> String {
        let nested = table
            .first_row()
            .and_then(|row| self.get_value(row))
            .and_then(Value::as_table);

        match nested {
            Some(inner) => format!("{}:{}", self.name, inner.deep_column_names()),
            None => self.name.clone(),
        }
    }
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[Column {}]", self.name)
    }
}
