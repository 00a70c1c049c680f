//! Cell values stored in rows.
//!
//! A cell holds one of four kinds of data: a primitive [`Scalar`], a nested
//! [`Record`], a nested [`Table`], or an [`Opaque`] object that is only ever
//! rendered as text. Absence is modelled with `Option::None` by every accessor,
//! so a falsy scalar (`0`, `""`, `false`) is never confused with a missing one.

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use serde::Serialize;

use crate::table::Table;

/// An insertion-ordered field mapping.
pub type Record<'a> = IndexMap<String, Value<'a>>;

/// A primitive cell value.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Scalar {
    /// A boolean.
    Bool(bool),
    /// A signed integer.
    Int(i64),
    /// A floating point number.
    Float(f64),
    /// A string.
    Str(String),
}

impl Scalar {
    /// Extract the integer if this is `Int`.
    #[must_use]
    pub const fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(n) => Some(*n),
            _ => None,
        }
    }

    /// Extract the float if this is `Float`.
    #[must_use]
    pub const fn as_float(&self) -> Option<f64> {
        match self {
            Self::Float(x) => Some(*x),
            _ => None,
        }
    }

    /// Extract the boolean if this is `Bool`.
    #[must_use]
    pub const fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Extract the string slice if this is `Str`.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(n) => write!(f, "{n}"),
            Self::Float(x) => write!(f, "{x:?}"),
            Self::Str(s) => f.write_str(s),
        }
    }
}

macro_rules! impl_scalar_from {
    ($($ty:ty => $variant:ident),+ $(,)?) => {
        $(
            impl From<$ty> for Scalar {
                fn from(v: $ty) -> Self {
                    Self::$variant(v.into())
                }
            }

            impl From<$ty> for Value<'_> {
                fn from(v: $ty) -> Self {
                    Self::Scalar(Scalar::from(v))
                }
            }
        )+
    };
}

impl_scalar_from! {
    bool => Bool,
    i32 => Int,
    i64 => Int,
    u32 => Int,
    f32 => Float,
    f64 => Float,
    String => Str,
    &str => Str,
}

/// A shared object that the model does not interpret.
///
/// Flattening renders it through its `Display` implementation.
#[derive(Clone)]
pub struct Opaque(Arc<dyn fmt::Display + Send + Sync>);

impl Opaque {
    /// Wrap any displayable object.
    pub fn new(obj: impl fmt::Display + Send + Sync + 'static) -> Self {
        Self(Arc::new(obj))
    }
}

impl fmt::Display for Opaque {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl fmt::Debug for Opaque {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Opaque({})", self.0)
    }
}

/// A value stored in a row field.
#[derive(Debug, Clone)]
pub enum Value<'a> {
    /// A primitive value.
    Scalar(Scalar),
    /// A nested record, addressable through path keys and sub-columns.
    Record(Record<'a>),
    /// A nested table.
    Table(Table<'a>),
    /// An uninterpreted object.
    Opaque(Opaque),
}

impl<'a> Value<'a> {
    /// Extract the scalar if this is `Scalar`.
    #[must_use]
    pub const fn as_scalar(&self) -> Option<&Scalar> {
        match self {
            Self::Scalar(s) => Some(s),
            _ => None,
        }
    }

    /// Extract the nested record if this is `Record`.
    #[must_use]
    pub const fn as_record(&self) -> Option<&Record<'a>> {
        match self {
            Self::Record(r) => Some(r),
            _ => None,
        }
    }

    /// Extract the nested table if this is `Table`.
    #[must_use]
    pub const fn as_table(&self) -> Option<&Table<'a>> {
        match self {
            Self::Table(t) => Some(t),
            _ => None,
        }
    }

    /// Check if this value is a nested table.
    #[must_use]
    pub const fn is_table(&self) -> bool {
        matches!(self, Self::Table(_))
    }
}

impl From<Scalar> for Value<'_> {
    fn from(s: Scalar) -> Self {
        Self::Scalar(s)
    }
}

impl<'a> From<Table<'a>> for Value<'a> {
    fn from(t: Table<'a>) -> Self {
        Self::Table(t)
    }
}

impl<'a> From<Record<'a>> for Value<'a> {
    fn from(r: Record<'a>) -> Self {
        Self::Record(r)
    }
}

impl From<Opaque> for Value<'_> {
    fn from(o: Opaque) -> Self {
        Self::Opaque(o)
    }
}

impl fmt::Display for Value<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Scalar(s) => write!(f, "{s}"),
            Self::Record(r) => fmt_record(r, f),
            Self::Table(t) => write!(f, "{t}"),
            Self::Opaque(o) => write!(f, "{o}"),
        }
    }
}

/// Render a record as `{"key": value, ...}`, quoting string scalars.
fn fmt_record(record: &Record<'_>, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str("{")?;
    for (i, (k, v)) in record.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        match v {
            Value::Scalar(Scalar::Str(s)) => write!(f, "{k:?}: {s:?}")?,
            other => write!(f, "{k:?}: {other}")?,
        }
    }
    f.write_str("}")
}

/// Build a [`Record`] from `key => value` pairs.
///
/// ```
/// use tabflow_table::{record, Value};
///
/// let r = record! { "a" => 1, "b" => "two" };
/// assert_eq!(r.len(), 2);
/// assert!(matches!(r["a"], Value::Scalar(_)));
/// ```
#[macro_export]
macro_rules! record {
    () => {
        $crate::Record::new()
    };
    ($($key:expr => $value:expr),+ $(,)?) => {{
        let mut record = $crate::Record::new();
        $(
            record.insert(::std::string::String::from($key), $crate::Value::from($value));
        )+
        record
    }};
}
