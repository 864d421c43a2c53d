//! Host functions exposed to user code and the values they collect.

use std::cell::RefCell;
use std::rc::Rc;

use couchview_protocol::EmitRecord;
use rhai::{Dynamic, Engine, EvalAltResult};
use serde_json::Value;
use tracing::{debug, info};

use super::USER_TARGET;

/// Records and messages produced by one invocation.
#[derive(Debug, Default)]
pub(super) struct Capture {
    pub(super) emitted: Vec<EmitRecord>,
    pub(super) logs: Vec<String>,
}

pub(super) type SharedCapture = Rc<RefCell<Capture>>;

/// Registers `emit`, `log`, and the `print`/`debug` sinks.
pub(super) fn register(engine: &mut Engine, capture: &SharedCapture) {
    let sink = Rc::clone(capture);
    engine.register_fn(
        "emit",
        move |key: Dynamic, value: Dynamic| -> Result<(), Box<EvalAltResult>> {
            let record = EmitRecord::new(to_json(&key)?, to_json(&value)?);
            sink.borrow_mut().emitted.push(record);
            Ok(())
        },
    );

    let sink = Rc::clone(capture);
    engine.register_fn("emit", move |key: Dynamic| -> Result<(), Box<EvalAltResult>> {
        let record = EmitRecord::new(to_json(&key)?, Value::Null);
        sink.borrow_mut().emitted.push(record);
        Ok(())
    });

    let sink = Rc::clone(capture);
    engine.register_fn("log", move |message: Dynamic| {
        sink.borrow_mut().logs.push(message_text(&message));
    });

    engine.on_print(|text| info!(target: USER_TARGET, "{text}"));
    engine.on_debug(|text, _source, position| {
        debug!(target: USER_TARGET, %position, "{text}");
    });
}

fn to_json(value: &Dynamic) -> Result<Value, Box<EvalAltResult>> {
    rhai::serde::from_dynamic::<Value>(value)
}

/// Renders a user-supplied message: strings verbatim, anything else as JSON.
pub(super) fn message_text(message: &Dynamic) -> String {
    if let Ok(text) = message.clone().into_immutable_string() {
        return text.to_string();
    }
    to_json(message).map_or_else(|_| message.to_string(), |value| value.to_string())
}
