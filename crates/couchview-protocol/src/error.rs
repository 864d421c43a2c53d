//! Transport-level protocol errors.
//!
//! I/O and serialization sources are wrapped in `Arc` to satisfy the
//! `result_large_err` Clippy lint and keep the errors cloneable.

use std::io;
use std::sync::Arc;

use thiserror::Error;

/// Errors raised while reading, decoding, or writing protocol lines.
#[derive(Debug, Clone, Error)]
pub enum ProtocolError {
    /// The input line is not valid JSON.
    #[error("malformed command line: {message}")]
    MalformedLine {
        /// Human-readable description of the parse failure.
        message: String,
        /// Underlying JSON error, when one exists.
        #[source]
        source: Option<Arc<serde_json::Error>>,
    },

    /// The input line decoded to something other than an array.
    #[error("command line must be a JSON array, got {found}")]
    NotAnArray {
        /// JSON type that was received instead.
        found: &'static str,
    },

    /// The array did not start with a non-empty command name.
    #[error("command line must start with a command name")]
    MissingCommandName,

    /// Reading from the input channel failed.
    #[error("failed to read command line: {source}")]
    Read {
        /// Underlying I/O error.
        #[source]
        source: Arc<io::Error>,
    },

    /// Writing to the output channel failed.
    #[error("failed to write response: {source}")]
    Write {
        /// Underlying I/O error.
        #[source]
        source: Arc<io::Error>,
    },

    /// Encoding a response as JSON failed.
    #[error("failed to serialise response: {source}")]
    Serialize {
        /// Underlying JSON error.
        #[source]
        source: Arc<serde_json::Error>,
    },
}

impl ProtocolError {
    /// Creates a malformed line error from a serde error.
    #[must_use]
    pub fn from_json_error(source: serde_json::Error) -> Self {
        Self::MalformedLine {
            message: source.to_string(),
            source: Some(Arc::new(source)),
        }
    }

    /// Creates a malformed line error with a custom message.
    #[must_use]
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::MalformedLine {
            message: message.into(),
            source: None,
        }
    }

    /// Wraps a read failure.
    #[must_use]
    pub fn read(source: io::Error) -> Self {
        Self::Read {
            source: Arc::new(source),
        }
    }

    /// Wraps a write failure.
    #[must_use]
    pub fn write(source: io::Error) -> Self {
        Self::Write {
            source: Arc::new(source),
        }
    }

    /// Returns true when the output channel itself is broken, so no error
    /// event can be delivered.
    #[must_use]
    pub const fn is_output_failure(&self) -> bool {
        matches!(self, Self::Write { .. } | Self::Serialize { .. })
    }
}

impl From<serde_json::Error> for ProtocolError {
    fn from(source: serde_json::Error) -> Self {
        Self::Serialize {
            source: Arc::new(source),
        }
    }
}
