//! Error types for table construction and field resolution.
//!
//! Only `KeyNotFound` is expected to be handled at pipeline runtime. The
//! remaining variants indicate a contract violation by the caller or a failed
//! row producer, and are propagated unchanged.

use thiserror::Error;

/// Boxed error raised by an external row producer.
pub type ProducerError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors that can occur while building or reading a [`Table`](crate::Table).
#[derive(Debug, Error)]
pub enum TableError {
    /// Field resolution walked the whole scope chain without finding a column.
    #[error("Key not found: '{0}'")]
    KeyNotFound(String),

    /// A row position at or beyond the row count was requested.
    #[error("Table index out of range: index {index} but table has {len} rows")]
    IndexOutOfRange {
        /// The requested row position.
        index: usize,
        /// The number of rows in the table.
        len: usize,
    },

    /// A reserved name was used, or an operation does not apply to this kind of table.
    #[error("Invariant violation: {0}")]
    InvariantViolation(String),

    /// The row producer feeding a table failed while it was being drained.
    #[error("Row producer failed: {0}")]
    StageProducer(#[source] ProducerError),
}

impl TableError {
    /// Create a key-not-found error.
    pub fn key_not_found(name: impl Into<String>) -> Self {
        Self::KeyNotFound(name.into())
    }

    /// Create an invariant violation error.
    pub fn invariant(msg: impl Into<String>) -> Self {
        Self::InvariantViolation(msg.into())
    }

    /// Wrap a producer failure.
    pub fn producer(err: impl Into<ProducerError>) -> Self {
        Self::StageProducer(err.into())
    }

    /// Check if this error is a scope-chain miss.
    #[must_use]
    pub const fn is_key_not_found(&self) -> bool {
        matches!(self, Self::KeyNotFound(_))
    }
}
