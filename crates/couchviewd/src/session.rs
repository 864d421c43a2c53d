//! Per-process session state.

use std::io::Write;

use couchview_protocol::{ResetOptions, ResponseWriter};

use crate::registry::FunctionRegistry;

/// State shared by every command in one server process.
///
/// The session owns the output channel so handlers and the loop write through
/// a single [`ResponseWriter`].
pub struct Session<W> {
    registry: FunctionRegistry,
    limits: ResetOptions,
    output: ResponseWriter<W>,
}

impl<W: Write> Session<W> {
    /// Creates an empty session writing to `output`.
    #[must_use]
    pub const fn new(output: W) -> Self {
        Self {
            registry: FunctionRegistry::new(),
            limits: ResetOptions {
                reduce_limit: None,
                timeout: None,
            },
            output: ResponseWriter::new(output),
        }
    }

    /// Returns the stored map functions.
    #[must_use]
    pub const fn registry(&self) -> &FunctionRegistry {
        &self.registry
    }

    /// Returns the stored map functions for mutation.
    pub const fn registry_mut(&mut self) -> &mut FunctionRegistry {
        &mut self.registry
    }

    /// Returns the limits recorded by the last `reset`.
    ///
    /// The limits are informational; nothing enforces them.
    #[must_use]
    pub const fn limits(&self) -> &ResetOptions {
        &self.limits
    }

    /// Clears stored functions and records new limits.
    pub fn reset(&mut self, options: ResetOptions) {
        self.registry.clear();
        self.limits = options;
    }

    /// Returns the response writer.
    pub const fn output(&mut self) -> &mut ResponseWriter<W> {
        &mut self.output
    }

    /// Consumes the session, returning the output stream.
    #[must_use]
    pub fn into_output(self) -> W {
        self.output.into_inner()
    }
}
