//! Error type shared by every generation stage.
//!
//! Stages return `Result<T>`; the pipeline catches each error, logs it and records it
//! in the `ProcessReport`. Nothing here ever reaches the host's save handler.

use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GenError {
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed XML in {origin}: {message}")]
    XmlParse { origin: String, message: String },

    #[error("malformed JSON in {origin}: {message}")]
    JsonParse { origin: String, message: String },

    #[error("invalid theme document {}: {reason}", path.display())]
    InvalidTheme { path: PathBuf, reason: String },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("invalid event pattern '{pattern}': {source}")]
    Pattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },
}

impl GenError {
    pub fn io(path: &Path, source: std::io::Error) -> Self {
        GenError::Io {
            path: path.to_path_buf(),
            source,
        }
    }

    pub fn xml(origin: &str, message: impl ToString) -> Self {
        GenError::XmlParse {
            origin: origin.to_string(),
            message: message.to_string(),
        }
    }

    pub fn json(origin: &str, message: impl ToString) -> Self {
        GenError::JsonParse {
            origin: origin.to_string(),
            message: message.to_string(),
        }
    }

    /// Parse failures abort a stage without writing anything.
    pub fn is_parse_failure(&self) -> bool {
        matches!(self, GenError::XmlParse { .. } | GenError::JsonParse { .. })
    }
}

pub type Result<T> = std::result::Result<T, GenError>;
