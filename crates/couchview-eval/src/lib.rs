//! Evaluation of user-authored view functions.
//!
//! The server never runs user code directly. It talks to an engine through
//! two seams:
//!
//! - [`SyntaxValidator`] checks that a source string parses, which is all
//!   `add_fun` needs.
//! - [`Evaluator`] compiles a source and invokes it, either as a map function
//!   with an `emit` capability or as a reduce function taking
//!   `(keys, values, rereduce)`.
//!
//! [`ViewEngine`] combines both. [`RhaiEngine`] is the production engine,
//! backed by the embedded `rhai` interpreter.

mod engine;
mod error;
mod rhai_engine;

pub use self::engine::{Evaluated, Evaluator, SyntaxValidator, ViewEngine};
pub use self::error::{EvaluationError, SyntaxError};
pub use self::rhai_engine::RhaiEngine;
