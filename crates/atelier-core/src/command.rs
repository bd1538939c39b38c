//! Command envelope and execute options
//!
//! A command is a named mutation request with a plain structured argument.
//! The envelope derives serde traits so transport boundaries (keyboard
//! binding tables, menu payloads) can carry commands as data; the in-process
//! dispatch path stays typed and never round-trips through a string.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Reserved name of the built-in undo pseudo-command
pub const UNDO: &str = "Undo";

/// Reserved name of the built-in redo pseudo-command
pub const REDO: &str = "Redo";

/// A named, queueable mutation request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Command {
    /// Registered handler name (or a built-in pseudo-command)
    pub name: String,
    /// Argument payload; `Null` for argument-less commands
    #[serde(default)]
    pub arg: Value,
}

impl Command {
    /// Build a command from a name and argument payload
    pub fn new(name: impl Into<String>, arg: Value) -> Self {
        Command {
            name: name.into(),
            arg,
        }
    }
}

/// Per-invocation options accepted by `execute`
#[derive(Debug, Clone, Default)]
pub struct ExecuteOptions {
    /// Run the dry-run check first and no-op (resolved task, nothing queued)
    /// if the command is currently disabled
    pub skip_if_disabled: bool,
    /// Title for the allocated task, shown by progress UIs
    pub title: Option<String>,
}
