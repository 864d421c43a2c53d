//! Engine seams used by the dispatcher.

use couchview_protocol::EmitRecord;
use serde_json::Value;

use crate::error::{EvaluationError, SyntaxError};

/// A value computed by user code plus the messages it logged.
#[derive(Debug, Clone, PartialEq)]
pub struct Evaluated<T> {
    /// The computed value.
    pub value: T,
    /// Messages passed to `log`, in call order.
    pub logs: Vec<String>,
}

impl<T> Evaluated<T> {
    /// Wraps a value that produced no log messages.
    #[must_use]
    pub const fn silent(value: T) -> Self {
        Self {
            value,
            logs: Vec::new(),
        }
    }
}

/// Checks that function source text parses.
pub trait SyntaxValidator {
    /// Validates `source` without running it.
    ///
    /// # Errors
    ///
    /// Returns a [`SyntaxError`] describing the first parse failure.
    fn validate(&self, source: &str) -> Result<(), SyntaxError>;
}

/// Compiles and invokes function source text.
pub trait Evaluator {
    /// Runs a map function against one document.
    ///
    /// Every record passed to `emit` during the call is returned in emission
    /// order. The accumulator starts empty on each call.
    ///
    /// # Errors
    ///
    /// Returns an [`EvaluationError`] if the source is not invocable, raises
    /// during the call, or emits values that cannot be represented as JSON.
    fn map_document(
        &self,
        source: &str,
        document: &Value,
    ) -> Result<Evaluated<Vec<EmitRecord>>, EvaluationError>;

    /// Runs a reduce function over `keys` and `values`.
    ///
    /// `keys` is `null` when `rereduce` is true.
    ///
    /// # Errors
    ///
    /// Returns an [`EvaluationError`] if the source is not invocable, raises
    /// during the call, or returns a value that cannot be represented as JSON.
    fn reduce(
        &self,
        source: &str,
        keys: &Value,
        values: &[Value],
        rereduce: bool,
    ) -> Result<Evaluated<Value>, EvaluationError>;
}

/// An engine usable by the view server: validates and evaluates.
pub trait ViewEngine: SyntaxValidator + Evaluator {}

impl<T: SyntaxValidator + Evaluator> ViewEngine for T {}
