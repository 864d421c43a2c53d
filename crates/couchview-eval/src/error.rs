//! Error types for function validation and evaluation.

use thiserror::Error;

/// Source text failed to parse.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct SyntaxError {
    message: String,
}

impl SyntaxError {
    /// Creates a syntax error with the parser's message.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// Returns the parser's message.
    #[must_use]
    pub const fn message(&self) -> &str {
        self.message.as_str()
    }
}

/// Failures raised while compiling or invoking user functions.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EvaluationError {
    /// The source parses but does not produce a callable function.
    #[error("expression does not eval to a function: {message}")]
    NotInvocable {
        /// Description of what the source produced instead.
        message: String,
    },

    /// The source failed to compile.
    #[error("{0}")]
    Syntax(#[from] SyntaxError),

    /// The function raised while running.
    #[error("{message}")]
    Runtime {
        /// The runtime error message.
        message: String,
    },

    /// A value crossing the engine boundary has no JSON representation.
    #[error("cannot convert {what} to JSON: {message}")]
    Conversion {
        /// Which value failed to convert.
        what: &'static str,
        /// The converter's message.
        message: String,
    },

    /// User code rejected the request as forbidden.
    #[error("forbidden: {reason}")]
    Forbidden {
        /// Reason supplied by user code.
        reason: String,
    },

    /// User code rejected the request as unauthorized.
    #[error("unauthorized: {reason}")]
    Unauthorized {
        /// Reason supplied by user code.
        reason: String,
    },
}

impl EvaluationError {
    /// Creates a runtime error.
    #[must_use]
    pub fn runtime(message: impl Into<String>) -> Self {
        Self::Runtime {
            message: message.into(),
        }
    }

    /// Creates a not-invocable error.
    #[must_use]
    pub fn not_invocable(message: impl Into<String>) -> Self {
        Self::NotInvocable {
            message: message.into(),
        }
    }
}
