//! Wire protocol for the couchview view server.
//!
//! The database drives the server over stdio with newline-delimited JSON.
//! Every input line is an array whose first element names the command:
//!
//! ```json
//! ["add_fun", "|doc| emit(doc.title, 1)"]
//! ["map_doc", {"_id": "a", "title": "A"}]
//! ```
//!
//! The server answers each command with exactly one line: `true` for state
//! changes, a nested array for `map_doc`, `[true, [...]]` for reductions, or
//! an error object. `["log", message]` lines may precede a data reply.
//!
//! This crate owns the data model shared by the server and the evaluator
//! ([`EmitRecord`], [`MapResult`]), the two-stage decoding of input lines
//! ([`CommandInvocation`] then [`Command`]), and the [`ResponseWriter`] that
//! frames and flushes every output line.

pub mod command;
pub mod error;
pub mod request;
pub mod response;

pub use self::command::{Command, CommandError, CommandName, ReduceLimit, ReducePair, ResetOptions};
pub use self::error::ProtocolError;
pub use self::request::CommandInvocation;
pub use self::response::{EmitRecord, MapResult, Response, ResponseWriter};
