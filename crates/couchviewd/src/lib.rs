//! The couchview view server.
//!
//! A document database launches `couchviewd` as a subprocess and drives it
//! over stdin and stdout with newline-delimited JSON commands. The server
//! stores map functions, runs them against documents, runs reduce and
//! rereduce functions over mapped rows, and answers every command with one
//! line.
//!
//! The crate is organised around a [`Session`] holding the stored functions,
//! a [`Dispatcher`] that decodes and handles one command at a time on top of
//! a [`couchview_eval::ViewEngine`], and the [`serve`] loop that reads lines
//! until the input closes. [`launch`] wires configuration and telemetry
//! around the loop for the binary.

mod dispatch;
mod errors;
mod launch;
mod registry;
mod server;
mod session;
mod telemetry;

pub use dispatch::{Dispatcher, Reply};
pub use errors::{HandlerError, PROTOCOL_ERROR, ServeError};
pub use launch::{ConfigLoader, LaunchError, StaticConfigLoader, SystemConfigLoader, launch};
pub use registry::FunctionRegistry;
pub use server::{run_with_engine, serve};
pub use session::Session;
pub use telemetry::{TelemetryError, TelemetryHandle};

#[cfg(test)]
mod tests;
