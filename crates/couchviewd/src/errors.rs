//! Error types for command handling and the serve loop.
//!
//! Every failure that reaches the output channel is written as
//! `{"error": keyword, "reason": message}`. The keyword comes from
//! [`HandlerError::keyword`] or, for transport failures, is
//! [`PROTOCOL_ERROR`].

use couchview_eval::{EvaluationError, SyntaxError};
use couchview_protocol::{CommandError, ProtocolError, Response};
use thiserror::Error;

/// Keyword reported for undecodable input and I/O failures.
pub const PROTOCOL_ERROR: &str = "protocol_error";

/// Failures raised while handling one decoded command.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HandlerError {
    /// The command name or its arguments were rejected.
    #[error(transparent)]
    Command(#[from] CommandError),

    /// A function source failed to parse.
    #[error(transparent)]
    Syntax(#[from] SyntaxError),

    /// A user function failed to compile or run.
    #[error(transparent)]
    Evaluation(#[from] EvaluationError),
}

impl HandlerError {
    /// Returns the wire keyword for this failure.
    #[must_use]
    pub const fn keyword(&self) -> &'static str {
        match self {
            Self::Command(CommandError::Unsupported { .. }) => "unsupported_command",
            Self::Command(CommandError::InvalidArguments { .. }) => "invalid_arguments",
            Self::Syntax(_)
            | Self::Evaluation(EvaluationError::NotInvocable { .. } | EvaluationError::Syntax(_)) => {
                "compilation_error"
            }
            Self::Evaluation(EvaluationError::Runtime { .. } | EvaluationError::Conversion { .. }) => {
                "runtime_error"
            }
            Self::Evaluation(EvaluationError::Forbidden { .. }) => "forbidden",
            Self::Evaluation(EvaluationError::Unauthorized { .. }) => "unauthorized",
        }
    }

    /// Returns true for an unknown command name.
    #[must_use]
    pub const fn is_unsupported_command(&self) -> bool {
        matches!(self, Self::Command(CommandError::Unsupported { .. }))
    }

    /// Returns the control event replacing the reply, for authorization
    /// short-circuits raised by user code.
    #[must_use]
    pub fn control_response(&self) -> Option<Response> {
        match self {
            Self::Evaluation(EvaluationError::Forbidden { reason }) => {
                Some(Response::Forbidden(reason.clone()))
            }
            Self::Evaluation(EvaluationError::Unauthorized { reason }) => {
                Some(Response::Unauthorized(reason.clone()))
            }
            _ => None,
        }
    }

    /// Returns the error event written for this failure.
    #[must_use]
    pub fn to_response(&self) -> Response {
        self.control_response()
            .unwrap_or_else(|| Response::error(self.keyword(), self.to_string()))
    }
}

/// Fatal outcomes that end the serve loop.
#[derive(Debug, Clone, Error)]
pub enum ServeError {
    /// Input could not be read or decoded, or output could not be written.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// A command handler failed.
    #[error("'{command}' failed: {source}")]
    Command {
        /// Name of the failing command.
        command: String,
        /// Underlying handler failure.
        #[source]
        source: HandlerError,
    },
}

impl ServeError {
    /// Returns the wire keyword reported for this failure.
    #[must_use]
    pub const fn keyword(&self) -> &'static str {
        match self {
            Self::Protocol(_) => PROTOCOL_ERROR,
            Self::Command { source, .. } => source.keyword(),
        }
    }
}
