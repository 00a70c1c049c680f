//! Error types for pipeline stages.

use std::path::PathBuf;

use tabflow_table::TableError;
use thiserror::Error;

/// Errors raised while running a stage or wrapping its output.
#[derive(Debug, Error)]
pub enum StageError {
    /// The stage's input source could not be opened or read.
    #[error("I/O error on '{path}': {source}")]
    Io {
        /// The source being accessed.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    /// A delimited record could not be parsed.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Building or reading the result table failed.
    #[error(transparent)]
    Table(#[from] TableError),

    /// The stage rejected its input or arguments.
    #[error("Stage '{stage}' failed: {message}")]
    Stage {
        /// The stage name.
        stage: String,
        /// What went wrong.
        message: String,
    },
}

impl StageError {
    /// Create an I/O error for `path`.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Create a stage-level failure.
    pub fn stage(stage: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Stage {
            stage: stage.into(),
            message: message.into(),
        }
    }
}
