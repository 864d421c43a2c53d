//! First-stage decoding of input lines.
//!
//! A line becomes a [`CommandInvocation`]: the command name plus its raw JSON
//! arguments. Only the command knows how many arguments it takes and what
//! shape they have; see [`crate::command`] for the second stage.

use serde_json::Value;

use crate::error::ProtocolError;

/// A decoded input line: command name and positional arguments.
#[derive(Debug, Clone, PartialEq)]
pub struct CommandInvocation {
    name: String,
    args: Vec<Value>,
}

impl CommandInvocation {
    /// Creates an invocation from its parts.
    #[must_use]
    pub fn new(name: impl Into<String>, args: Vec<Value>) -> Self {
        Self {
            name: name.into(),
            args,
        }
    }

    /// Parses one protocol line.
    ///
    /// Surrounding whitespace, including the newline delimiter, is trimmed
    /// before parsing. Callers treat a blank line as the shutdown signal and
    /// must not pass it here.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::MalformedLine`] for blank or non-JSON input,
    /// [`ProtocolError::NotAnArray`] when the JSON value is not an array, and
    /// [`ProtocolError::MissingCommandName`] when the first element is not a
    /// non-empty string.
    pub fn parse(line: &str) -> Result<Self, ProtocolError> {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            return Err(ProtocolError::malformed("empty command line"));
        }

        let value: Value = serde_json::from_str(trimmed).map_err(ProtocolError::from_json_error)?;
        let elements = match value {
            Value::Array(elements) => elements,
            other => {
                return Err(ProtocolError::NotAnArray {
                    found: json_type_name(&other),
                });
            }
        };

        let mut items = elements.into_iter();
        match items.next() {
            Some(Value::String(name)) if !name.trim().is_empty() => Ok(Self {
                name,
                args: items.collect(),
            }),
            _ => Err(ProtocolError::MissingCommandName),
        }
    }

    /// Returns the command name.
    #[must_use]
    pub const fn name(&self) -> &str {
        self.name.as_str()
    }

    /// Returns the raw arguments.
    #[must_use]
    pub fn args(&self) -> &[Value] {
        &self.args
    }

    /// Splits the invocation into name and arguments.
    #[must_use]
    pub fn into_parts(self) -> (String, Vec<Value>) {
        (self.name, self.args)
    }
}

const fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;
    use serde_json::json;

    use super::*;

    #[test]
    fn parses_name_and_arguments() {
        let invocation = CommandInvocation::parse(r#"["add_fun", "|doc| emit(doc._id, 1)"]"#)
            .expect("parse add_fun");
        assert_eq!(invocation.name(), "add_fun");
        assert_eq!(invocation.args(), &[json!("|doc| emit(doc._id, 1)")]);
    }

    #[test]
    fn parses_command_without_arguments() {
        let invocation = CommandInvocation::parse("[\"reset\"]\n").expect("parse reset");
        assert_eq!(invocation.name(), "reset");
        assert!(invocation.args().is_empty());
    }

    #[test]
    fn keeps_argument_order() {
        let invocation =
            CommandInvocation::parse(r#"["rereduce", ["f"], [1, 2, 3]]"#).expect("parse");
        let (name, args) = invocation.into_parts();
        assert_eq!(name, "rereduce");
        assert_eq!(args, vec![json!(["f"]), json!([1, 2, 3])]);
    }

    #[rstest]
    #[case::blank("   ")]
    #[case::not_json("add_fun")]
    #[case::truncated(r#"["map_doc", {"#)]
    fn rejects_malformed_lines(#[case] line: &str) {
        let result = CommandInvocation::parse(line);
        assert!(matches!(result, Err(ProtocolError::MalformedLine { .. })));
    }

    #[test]
    fn rejects_non_array_values() {
        let result = CommandInvocation::parse(r#"{"command":"reset"}"#);
        assert!(matches!(
            result,
            Err(ProtocolError::NotAnArray { found: "object" })
        ));
    }

    #[rstest]
    #[case::empty_array("[]")]
    #[case::numeric_name("[1, 2]")]
    #[case::blank_name(r#"["  ", {}]"#)]
    fn rejects_missing_command_name(#[case] line: &str) {
        let result = CommandInvocation::parse(line);
        assert!(matches!(result, Err(ProtocolError::MissingCommandName)));
    }
}
