//! Atelier Core - building blocks of the command execution engine
//!
//! This crate provides the domain-independent pieces the dispatcher is
//! assembled from:
//! - Single-settlement, progress-reporting [`Task`] handles
//! - The cursor-indexed, bounded undo/redo [`HistoryStack`]
//! - The serializable [`Command`] envelope and execute options
//! - The canonical [`EngineError`] taxonomy with stable codes
//! - Tracing-based logging initialization

pub mod command;
pub mod errors;
pub mod history;
pub mod logging;
pub mod task;

// Re-export commonly used types
pub use command::{Command, ExecuteOptions, REDO, UNDO};
pub use errors::{EngineError, ErrorKind, Result};
pub use history::{HistoryEntry, HistoryStack, StepFn, DEFAULT_MAX_HISTORY};
pub use task::{Task, TaskState, TaskStatus};
