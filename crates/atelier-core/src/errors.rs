//! Canonical error taxonomy for the command engine
//!
//! Every failure surfaced by the engine falls into one of three families:
//! validation (preconditions unmet), execution (the mutation's real work
//! failed), and history boundary (undo/redo with nothing to apply). All
//! families are local-recoverable: a single failing command never poisons the
//! queue or the document.

use thiserror::Error;

/// Result type alias using EngineError
pub type Result<T> = std::result::Result<T, EngineError>;

/// Stable classification of engine errors
///
/// Each kind maps to a stable error code usable for programmatic handling,
/// testing, and external API responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    Execution,
    NothingToUndo,
    NothingToRedo,
    UnknownCommand,
    QueueClosed,
    Internal,
}

impl ErrorKind {
    /// Get the stable error code for this kind
    pub fn code(&self) -> &'static str {
        match self {
            ErrorKind::Validation => "ERR_VALIDATION",
            ErrorKind::Execution => "ERR_EXECUTION",
            ErrorKind::NothingToUndo => "ERR_NOTHING_TO_UNDO",
            ErrorKind::NothingToRedo => "ERR_NOTHING_TO_REDO",
            ErrorKind::UnknownCommand => "ERR_UNKNOWN_COMMAND",
            ErrorKind::QueueClosed => "ERR_QUEUE_CLOSED",
            ErrorKind::Internal => "ERR_INTERNAL",
        }
    }
}

/// Error taxonomy for command execution
///
/// `Validation` and the two history-boundary variants display as a bare,
/// human-readable reason: `message_if_disabled` hands them straight to UI
/// tooltips.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EngineError {
    /// A handler precondition is unmet (dry-run or real execution)
    #[error("{message}")]
    Validation { message: String },

    /// The mutation's real work failed (I/O, downstream system)
    #[error("{message}")]
    Execution { message: String },

    /// Undo requested with the cursor at the base state
    #[error("nothing to undo")]
    NothingToUndo,

    /// Redo requested with the cursor at the tail
    #[error("nothing to redo")]
    NothingToRedo,

    /// No handler is registered under this command name
    #[error("unknown command: {name}")]
    UnknownCommand { name: String },

    /// The engine was torn down before the invocation could be queued
    #[error("command queue is closed")]
    QueueClosed,

    /// Unexpected internal failure
    #[error("internal error: {message}")]
    Internal { message: String },
}

impl EngineError {
    /// Build a validation error from a disable reason
    pub fn validation(message: impl Into<String>) -> Self {
        EngineError::Validation {
            message: message.into(),
        }
    }

    /// Build an execution error from a failure description
    pub fn execution(message: impl Into<String>) -> Self {
        EngineError::Execution {
            message: message.into(),
        }
    }

    /// Get the error kind
    pub fn kind(&self) -> ErrorKind {
        match self {
            EngineError::Validation { .. } => ErrorKind::Validation,
            EngineError::Execution { .. } => ErrorKind::Execution,
            EngineError::NothingToUndo => ErrorKind::NothingToUndo,
            EngineError::NothingToRedo => ErrorKind::NothingToRedo,
            EngineError::UnknownCommand { .. } => ErrorKind::UnknownCommand,
            EngineError::QueueClosed => ErrorKind::QueueClosed,
            EngineError::Internal { .. } => ErrorKind::Internal,
        }
    }

    /// Get the stable error code
    pub fn code(&self) -> &'static str {
        self.kind().code()
    }
}
