//! Error type for the data layer
//!
//! Reading and decoding message logs is the only fallible step of a run; the
//! grouping engine itself never fails.

use thiserror::Error;

/// Errors raised while loading or writing message logs
#[derive(Error, Debug)]
pub enum DataError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Whole-document JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Malformed record in a JSONL log
    #[error("Invalid message on line {line}: {source}")]
    JsonLine {
        /// 1-based line number
        line: usize,
        source: serde_json::Error,
    },

    /// JSON document that is neither an array nor an object with a message array
    #[error("Unsupported log shape: expected an array of messages or an object with a `{key}` array, found {found}")]
    UnsupportedShape { key: &'static str, found: &'static str },
}

impl DataError {
    /// Create a JSONL line error
    pub fn json_line(line: usize, source: serde_json::Error) -> Self {
        Self::JsonLine { line, source }
    }

    /// Line of the failing record, for JSONL errors
    pub fn line(&self) -> Option<usize> {
        match self {
            Self::JsonLine { line, .. } => Some(*line),
            _ => None,
        }
    }
}
