//! The read-dispatch-respond loop.

use std::io::{BufRead, Write};

use couchview_eval::ViewEngine;
use couchview_protocol::{CommandInvocation, ProtocolError, Response};
use tracing::{error, info, warn};

use crate::dispatch::Dispatcher;
use crate::errors::{PROTOCOL_ERROR, ServeError};
use crate::session::Session;

/// Tracing target for the serve loop.
pub(crate) const SERVER_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::server");

/// Serves commands from `input` until end of input or a blank line.
///
/// Each reply is flushed before the next line is read. A line that cannot be
/// read or decoded is reported as a `protocol_error` event and ends the loop.
///
/// # Errors
///
/// Returns the fatal [`ServeError`] that ended the loop. The corresponding
/// error event has already been written when the output channel allows it.
pub fn serve<E, R, W>(
    dispatcher: &Dispatcher<E>,
    input: &mut R,
    session: &mut Session<W>,
) -> Result<(), ServeError>
where
    E: ViewEngine,
    R: BufRead,
    W: Write,
{
    let mut line = String::new();
    let mut handled: u64 = 0;
    loop {
        line.clear();
        let read = match input.read_line(&mut line) {
            Ok(read) => read,
            Err(source) => return fail(session, ProtocolError::read(source)),
        };
        if read == 0 || line.trim().is_empty() {
            info!(target: SERVER_TARGET, handled, "input closed, shutting down");
            return Ok(());
        }

        let invocation = match CommandInvocation::parse(&line) {
            Ok(invocation) => invocation,
            Err(failure) => return fail(session, failure),
        };
        dispatcher.dispatch(session, invocation)?;
        handled = handled.saturating_add(1);
    }
}

/// Serves a whole session over the given streams with a fresh [`Session`].
///
/// # Errors
///
/// Returns the fatal [`ServeError`] that ended the loop.
pub fn run_with_engine<E: ViewEngine>(
    input: &mut impl BufRead,
    output: &mut impl Write,
    engine: E,
    strict_mode: bool,
) -> Result<(), ServeError> {
    let dispatcher = Dispatcher::new(engine, strict_mode);
    let mut session = Session::new(output);
    serve(&dispatcher, input, &mut session)
}

fn fail<W: Write>(session: &mut Session<W>, failure: ProtocolError) -> Result<(), ServeError> {
    error!(target: SERVER_TARGET, reason = %failure, "protocol failure");
    if !failure.is_output_failure() {
        let event = Response::error(PROTOCOL_ERROR, failure.to_string());
        if let Err(write_failure) = session.output().write(&event) {
            warn!(
                target: SERVER_TARGET,
                reason = %write_failure,
                "could not report protocol failure"
            );
        }
    }
    Err(ServeError::Protocol(failure))
}
