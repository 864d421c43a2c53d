//! Second-stage decoding: typed commands.
//!
//! The command set is closed. A [`CommandInvocation`] whose name is not one of
//! the five known commands decodes to [`CommandError::Unsupported`]; a known
//! name with arguments of the wrong shape decodes to
//! [`CommandError::InvalidArguments`]. Extra trailing arguments are ignored.

use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use strum::{Display, EnumString, IntoStaticStr};
use thiserror::Error;

use crate::request::CommandInvocation;

/// Names of the commands understood by the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumString, Display, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum CommandName {
    /// Stores a map function.
    AddFun,
    /// Maps a document through every stored function.
    MapDoc,
    /// Reduces mapped key/value pairs.
    Reduce,
    /// Reduces the outputs of earlier reductions.
    Rereduce,
    /// Clears stored functions and records limits.
    Reset,
}

impl CommandName {
    /// Returns the wire name of the command.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        self.into()
    }
}

/// A fully decoded command with its typed payload.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// `["add_fun", source]`.
    AddFun {
        /// Source text of the map function.
        source: String,
    },
    /// `["map_doc", document]`.
    MapDoc {
        /// Document passed to every stored map function.
        document: Value,
    },
    /// `["reduce", [functions...], [[[key, doc_id], value]...]]`.
    Reduce {
        /// Reduce function sources, in reply order.
        functions: Vec<String>,
        /// Mapped rows to reduce.
        pairs: Vec<ReducePair>,
    },
    /// `["rereduce", [functions...], [values...]]`.
    Rereduce {
        /// Reduce function sources, in reply order.
        functions: Vec<String>,
        /// Previously reduced values.
        values: Vec<Value>,
    },
    /// `["reset", {"reduce_limit": ..., "timeout": ...}]`.
    Reset {
        /// Limits recorded for the session.
        options: ResetOptions,
    },
}

impl Command {
    /// Decodes an invocation into a typed command.
    ///
    /// # Errors
    ///
    /// Returns [`CommandError::Unsupported`] for unknown command names and
    /// [`CommandError::InvalidArguments`] when the arguments do not match the
    /// command's shape.
    pub fn decode(invocation: CommandInvocation) -> Result<Self, CommandError> {
        let (name, args) = invocation.into_parts();
        let Ok(command) = name.parse::<CommandName>() else {
            return Err(CommandError::Unsupported { name });
        };

        let mut arguments = Arguments::new(command, args);
        match command {
            CommandName::AddFun => Ok(Self::AddFun {
                source: arguments.required("source")?,
            }),
            CommandName::MapDoc => Ok(Self::MapDoc {
                document: arguments.required("document")?,
            }),
            CommandName::Reduce => Ok(Self::Reduce {
                functions: arguments.required("functions")?,
                pairs: arguments.required("pairs")?,
            }),
            CommandName::Rereduce => Ok(Self::Rereduce {
                functions: arguments.required("functions")?,
                values: arguments.required("values")?,
            }),
            CommandName::Reset => Ok(Self::Reset {
                options: arguments.optional("options")?.unwrap_or_default(),
            }),
        }
    }

    /// Returns the name of the command.
    #[must_use]
    pub const fn name(&self) -> CommandName {
        match self {
            Self::AddFun { .. } => CommandName::AddFun,
            Self::MapDoc { .. } => CommandName::MapDoc,
            Self::Reduce { .. } => CommandName::Reduce,
            Self::Rereduce { .. } => CommandName::Rereduce,
            Self::Reset { .. } => CommandName::Reset,
        }
    }
}

/// One mapped row handed to `reduce`: `[[key, doc_id], value]`.
///
/// The key half is kept as the raw `[key, doc_id]` array because that is the
/// shape user reduce functions receive in their `keys` argument.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(from = "(Value, Value)")]
pub struct ReducePair {
    key: Value,
    value: Value,
}

impl ReducePair {
    /// Creates a pair from its key (`[key, doc_id]`) and value.
    #[must_use]
    pub const fn new(key: Value, value: Value) -> Self {
        Self { key, value }
    }

    /// Returns the `[key, doc_id]` entry.
    #[must_use]
    pub const fn key(&self) -> &Value {
        &self.key
    }

    /// Returns the mapped value.
    #[must_use]
    pub const fn value(&self) -> &Value {
        &self.value
    }

    /// Splits the pair into key and value.
    #[must_use]
    pub fn into_parts(self) -> (Value, Value) {
        (self.key, self.value)
    }
}

impl From<(Value, Value)> for ReducePair {
    fn from((key, value): (Value, Value)) -> Self {
        Self::new(key, value)
    }
}

/// Options carried by `reset`.
///
/// Both values are recorded on the session but never enforced, so any JSON
/// the database sends for them is accepted as-is.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ResetOptions {
    /// Reduce call limit as sent by the database.
    #[serde(default)]
    pub reduce_limit: Option<ReduceLimit>,
    /// Evaluation timeout, usually a number of milliseconds.
    #[serde(default)]
    pub timeout: Option<Value>,
}

/// The `reduce_limit` option.
///
/// Databases send a flag, a count, or a mode name such as `"log"`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum ReduceLimit {
    /// Limit switched on or off.
    Enabled(bool),
    /// Explicit call count.
    Count(u64),
    /// Any other value, kept verbatim.
    Other(Value),
}

/// Errors raised while turning an invocation into a [`Command`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    /// The command name is not one of the known commands.
    #[error("'{name}' command is not supported")]
    Unsupported {
        /// Name that was received.
        name: String,
    },

    /// The arguments do not match the command's shape.
    #[error("invalid arguments for '{command}': {message}")]
    InvalidArguments {
        /// Command whose arguments were rejected.
        command: CommandName,
        /// Description of the mismatch.
        message: String,
    },
}

impl CommandError {
    /// Creates an invalid arguments error.
    #[must_use]
    pub fn invalid_arguments(command: CommandName, message: impl Into<String>) -> Self {
        Self::InvalidArguments {
            command,
            message: message.into(),
        }
    }
}

/// Positional argument reader for one command.
struct Arguments {
    command: CommandName,
    values: std::vec::IntoIter<Value>,
}

impl Arguments {
    fn new(command: CommandName, values: Vec<Value>) -> Self {
        Self {
            command,
            values: values.into_iter(),
        }
    }

    fn required<T: DeserializeOwned>(&mut self, label: &str) -> Result<T, CommandError> {
        let value = self.values.next().ok_or_else(|| {
            CommandError::invalid_arguments(self.command, format!("missing {label} argument"))
        })?;
        self.decode(label, value)
    }

    fn optional<T: DeserializeOwned>(&mut self, label: &str) -> Result<Option<T>, CommandError> {
        match self.values.next() {
            None | Some(Value::Null) => Ok(None),
            Some(value) => self.decode(label, value).map(Some),
        }
    }

    fn decode<T: DeserializeOwned>(&self, label: &str, value: Value) -> Result<T, CommandError> {
        serde_json::from_value(value).map_err(|error| {
            CommandError::invalid_arguments(self.command, format!("invalid {label} argument: {error}"))
        })
    }
}
