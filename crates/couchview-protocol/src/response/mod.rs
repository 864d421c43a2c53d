//! Response encoding and line framing.
//!
//! Every reply is a single JSON value on its own line. [`ResponseWriter`]
//! appends the newline and flushes after each line so the database never
//! waits on buffered output.

use std::io::Write;

use serde::ser::{SerializeMap, SerializeTuple};
use serde::{Serialize, Serializer};
use serde_json::Value;

use crate::error::ProtocolError;

/// One `emit(key, value)` call, encoded as `[key, value]`.
#[derive(Debug, Clone, PartialEq)]
pub struct EmitRecord {
    key: Value,
    value: Value,
}

impl EmitRecord {
    /// Creates a record from an emitted key and value.
    #[must_use]
    pub const fn new(key: Value, value: Value) -> Self {
        Self { key, value }
    }

    /// Returns the emitted key.
    #[must_use]
    pub const fn key(&self) -> &Value {
        &self.key
    }

    /// Returns the emitted value.
    #[must_use]
    pub const fn value(&self) -> &Value {
        &self.value
    }
}

impl Serialize for EmitRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut tuple = serializer.serialize_tuple(2)?;
        tuple.serialize_element(&self.key)?;
        tuple.serialize_element(&self.value)?;
        tuple.end()
    }
}

/// Records emitted by each stored map function, in registration order.
pub type MapResult = Vec<Vec<EmitRecord>>;

/// A single output line.
#[derive(Debug, Clone, PartialEq)]
pub enum Response {
    /// `true`: acknowledges `add_fun` and `reset`.
    Ok,
    /// Nested emit records for `map_doc`.
    Map(MapResult),
    /// `[true, [results...]]` for `reduce` and `rereduce`.
    Reduce(Vec<Value>),
    /// `["log", message]` produced by user code.
    Log(String),
    /// `{"error": keyword, "reason": message}`.
    Error {
        /// Machine-readable error keyword.
        error: &'static str,
        /// Human-readable description.
        reason: String,
    },
    /// `{"forbidden": reason}` raised by user code.
    Forbidden(String),
    /// `{"unauthorized": reason}` raised by user code.
    Unauthorized(String),
}

impl Response {
    /// Creates an error response.
    #[must_use]
    pub fn error(keyword: &'static str, reason: impl Into<String>) -> Self {
        Self::Error {
            error: keyword,
            reason: reason.into(),
        }
    }
}

impl Serialize for Response {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Ok => serializer.serialize_bool(true),
            Self::Map(results) => results.serialize(serializer),
            Self::Reduce(results) => {
                let mut tuple = serializer.serialize_tuple(2)?;
                tuple.serialize_element(&true)?;
                tuple.serialize_element(results)?;
                tuple.end()
            }
            Self::Log(message) => {
                let mut tuple = serializer.serialize_tuple(2)?;
                tuple.serialize_element("log")?;
                tuple.serialize_element(message)?;
                tuple.end()
            }
            Self::Error { error, reason } => {
                let mut map = serializer.serialize_map(Some(2))?;
                map.serialize_entry("error", error)?;
                map.serialize_entry("reason", reason)?;
                map.end()
            }
            Self::Forbidden(reason) => single_entry(serializer, "forbidden", reason),
            Self::Unauthorized(reason) => single_entry(serializer, "unauthorized", reason),
        }
    }
}

fn single_entry<S: Serializer>(serializer: S, key: &str, reason: &str) -> Result<S::Ok, S::Error> {
    let mut map = serializer.serialize_map(Some(1))?;
    map.serialize_entry(key, reason)?;
    map.end()
}

/// Writer that frames responses as JSON lines.
pub struct ResponseWriter<W> {
    writer: W,
}

impl<W: Write> ResponseWriter<W> {
    /// Creates a new response writer wrapping the given output stream.
    #[must_use]
    pub const fn new(writer: W) -> Self {
        Self { writer }
    }

    /// Writes one response line and flushes it.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::Serialize`] if encoding fails and
    /// [`ProtocolError::Write`] if the stream rejects the bytes or the flush.
    pub fn write(&mut self, response: &Response) -> Result<(), ProtocolError> {
        serde_json::to_writer(&mut self.writer, response)?;
        self.writer.write_all(b"\n").map_err(ProtocolError::write)?;
        self.writer.flush().map_err(ProtocolError::write)
    }

    /// Writes each log message as a `["log", message]` line.
    ///
    /// # Errors
    ///
    /// Returns the first write failure.
    pub fn write_logs(&mut self, messages: &[String]) -> Result<(), ProtocolError> {
        messages
            .iter()
            .try_for_each(|message| self.write(&Response::Log(message.clone())))
    }

    /// Consumes the writer, returning the wrapped stream.
    #[must_use]
    pub fn into_inner(self) -> W {
        self.writer
    }
}

#[cfg(test)]
mod tests;
