//! Plain output produced by flattening tables and rows.

use std::fmt;

use indexmap::IndexMap;
use serde::Serialize;

use crate::value::Scalar;

/// A flattened row: output key to flattened value, in column order.
pub type FlatRecord = IndexMap<String, FlatValue>;

/// A value with all nesting resolved to scalars, text, and lists of rows.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FlatValue {
    /// A primitive value, or the scalar of a rank-0 table.
    Scalar(Scalar),
    /// The textual rendering of a record or opaque object.
    Text(String),
    /// The rows of a nested table of rank one or more.
    Rows(Vec<FlatRecord>),
}

impl FlatValue {
    /// Extract the scalar if this is `Scalar`.
    #[must_use]
    pub const fn as_scalar(&self) -> Option<&Scalar> {
        match self {
            Self::Scalar(s) => Some(s),
            _ => None,
        }
    }

    /// Extract the rows if this is `Rows`.
    #[must_use]
    pub fn as_rows(&self) -> Option<&[FlatRecord]> {
        match self {
            Self::Rows(rows) => Some(rows),
            _ => None,
        }
    }

    /// Render as compact JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

impl From<Scalar> for FlatValue {
    fn from(s: Scalar) -> Self {
        Self::Scalar(s)
    }
}

impl fmt::Display for FlatValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Scalar(s) => write!(f, "{s}"),
            Self::Text(t) => f.write_str(t),
            Self::Rows(_) => match self.to_json() {
                Ok(json) => f.write_str(&json),
                Err(_) => Err(fmt::Error),
            },
        }
    }
}

/// Truncate a rendering to `max_len` characters, marking the cut with `...`.
pub(crate) fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        return s.to_string();
    }
    let mut out: String = s.chars().take(max_len.saturating_sub(3)).collect();
    out.push_str("...");
    out
}
