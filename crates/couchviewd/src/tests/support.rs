//! Shared helpers for driving a session in tests.

use std::io::Cursor;

use couchview_eval::ViewEngine;
use serde_json::Value;

use crate::{Dispatcher, ServeError, Session, serve};

/// Output of one served script.
pub(super) struct Transcript {
    pub(super) result: Result<(), ServeError>,
    pub(super) lines: Vec<String>,
}

impl Transcript {
    /// Parses every output line as JSON.
    pub(super) fn values(&self) -> Vec<Value> {
        self.lines
            .iter()
            .map(|line| serde_json::from_str(line).expect("output line is JSON"))
            .collect()
    }
}

/// Serves `script` to completion and collects the output lines.
pub(super) fn run_script<E: ViewEngine>(dispatcher: &Dispatcher<E>, script: &str) -> Transcript {
    let mut input = Cursor::new(script.as_bytes().to_vec());
    let mut session = Session::new(Vec::new());
    let result = serve(dispatcher, &mut input, &mut session);
    let output = String::from_utf8(session.into_output()).expect("utf8 output");
    Transcript {
        result,
        lines: output.lines().map(str::to_owned).collect(),
    }
}
