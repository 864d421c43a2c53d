//! Command dispatch and handlers.
//!
//! The dispatcher decodes an invocation into a [`Command`], runs its handler,
//! and writes exactly one reply line, optionally preceded by `["log", ...]`
//! lines. Handler failures never escape as panics or process exits: they are
//! written as a single error event and returned as a fatal [`ServeError`],
//! except for unsupported commands under the lenient policy and for
//! authorization short-circuits raised by user code.

use std::io::Write;

use couchview_eval::ViewEngine;
use couchview_protocol::{Command, CommandInvocation, ReducePair, ResetOptions, Response};
use serde_json::Value;
use tracing::{debug, error, warn};

use crate::errors::{HandlerError, ServeError};
use crate::session::Session;

/// Tracing target for dispatch operations.
pub(crate) const DISPATCH_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::dispatch");

/// A successful handler result: log lines followed by the reply.
#[derive(Debug, Clone, PartialEq)]
pub struct Reply {
    logs: Vec<String>,
    response: Response,
}

impl Reply {
    /// Creates a reply with no log lines.
    #[must_use]
    pub const fn new(response: Response) -> Self {
        Self {
            logs: Vec::new(),
            response,
        }
    }

    /// Creates a reply preceded by log lines.
    #[must_use]
    pub const fn with_logs(logs: Vec<String>, response: Response) -> Self {
        Self { logs, response }
    }

    /// Returns the log messages written before the reply.
    #[must_use]
    pub const fn logs(&self) -> &[String] {
        self.logs.as_slice()
    }

    /// Returns the reply.
    #[must_use]
    pub const fn response(&self) -> &Response {
        &self.response
    }
}

/// Routes decoded commands to handlers backed by a [`ViewEngine`].
pub struct Dispatcher<E> {
    engine: E,
    strict_mode: bool,
}

impl<E: ViewEngine> Dispatcher<E> {
    /// Creates a dispatcher. With `strict_mode`, unsupported commands end the
    /// session.
    #[must_use]
    pub const fn new(engine: E, strict_mode: bool) -> Self {
        Self {
            engine,
            strict_mode,
        }
    }

    /// Handles one invocation and writes its output lines.
    ///
    /// # Errors
    ///
    /// Returns [`ServeError::Command`] for fatal handler failures, after the
    /// error event has been written, and [`ServeError::Protocol`] when the
    /// output channel fails.
    pub fn dispatch<W: Write>(
        &self,
        session: &mut Session<W>,
        invocation: CommandInvocation,
    ) -> Result<(), ServeError> {
        let name = invocation.name().to_owned();
        debug!(target: DISPATCH_TARGET, command = %name, "dispatching command");

        let outcome = Command::decode(invocation)
            .map_err(HandlerError::from)
            .and_then(|command| self.handle(session, command));

        match outcome {
            Ok(reply) => {
                let output = session.output();
                output.write_logs(reply.logs())?;
                output.write(reply.response())?;
                Ok(())
            }
            Err(failure) => self.report(session, name, failure),
        }
    }

    /// Runs the handler for a decoded command.
    ///
    /// # Errors
    ///
    /// Returns the handler's failure without writing anything.
    pub fn handle<W: Write>(
        &self,
        session: &mut Session<W>,
        command: Command,
    ) -> Result<Reply, HandlerError> {
        match command {
            Command::AddFun { source } => self.add_fun(session, source),
            Command::MapDoc { document } => self.map_doc(session, &document),
            Command::Reduce { functions, pairs } => self.reduce(&functions, pairs),
            Command::Rereduce { functions, values } => self.rereduce(&functions, &values),
            Command::Reset { options } => Ok(reset(session, options)),
        }
    }

    fn report<W: Write>(
        &self,
        session: &mut Session<W>,
        command: String,
        failure: HandlerError,
    ) -> Result<(), ServeError> {
        session.output().write(&failure.to_response())?;

        if failure.control_response().is_some() {
            warn!(target: DISPATCH_TARGET, command = %command, reason = %failure, "request rejected by user code");
            return Ok(());
        }
        if failure.is_unsupported_command() && !self.strict_mode {
            warn!(target: DISPATCH_TARGET, command = %command, "ignoring unsupported command");
            return Ok(());
        }

        error!(
            target: DISPATCH_TARGET,
            command = %command,
            keyword = failure.keyword(),
            reason = %failure,
            "command failed"
        );
        Err(ServeError::Command {
            command,
            source: failure,
        })
    }

    fn add_fun<W: Write>(
        &self,
        session: &mut Session<W>,
        source: String,
    ) -> Result<Reply, HandlerError> {
        self.engine.validate(&source)?;
        session.registry_mut().add(source);
        debug!(
            target: DISPATCH_TARGET,
            stored = session.registry().len(),
            "stored map function"
        );
        Ok(Reply::new(Response::Ok))
    }

    fn map_doc<W: Write>(
        &self,
        session: &Session<W>,
        document: &Value,
    ) -> Result<Reply, HandlerError> {
        let mut logs = Vec::new();
        let mut results = Vec::with_capacity(session.registry().len());
        for source in session.registry().sources() {
            let evaluated = self.engine.map_document(source, document)?;
            logs.extend(evaluated.logs);
            results.push(evaluated.value);
        }
        Ok(Reply::with_logs(logs, Response::Map(results)))
    }

    fn reduce(&self, functions: &[String], pairs: Vec<ReducePair>) -> Result<Reply, HandlerError> {
        let (keys, values): (Vec<Value>, Vec<Value>) =
            pairs.into_iter().map(ReducePair::into_parts).unzip();
        self.run_reduction(functions, &Value::Array(keys), &values, false)
    }

    fn rereduce(&self, functions: &[String], values: &[Value]) -> Result<Reply, HandlerError> {
        self.run_reduction(functions, &Value::Null, values, true)
    }

    fn run_reduction(
        &self,
        functions: &[String],
        keys: &Value,
        values: &[Value],
        rereduce: bool,
    ) -> Result<Reply, HandlerError> {
        for source in functions {
            self.engine.validate(source)?;
        }

        let mut logs = Vec::new();
        let mut results = Vec::with_capacity(functions.len());
        for source in functions {
            let evaluated = self.engine.reduce(source, keys, values, rereduce)?;
            logs.extend(evaluated.logs);
            results.push(evaluated.value);
        }
        Ok(Reply::with_logs(logs, Response::Reduce(results)))
    }
}

fn reset<W: Write>(session: &mut Session<W>, options: ResetOptions) -> Reply {
    debug!(target: DISPATCH_TARGET, limits = ?options, "session reset");
    session.reset(options);
    Reply::new(Response::Ok)
}
