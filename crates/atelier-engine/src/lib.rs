//! Atelier Engine - serialized command dispatch with undo/redo
//!
//! This crate assembles the core building blocks into the command execution
//! engine: a named-handler registry, a FIFO serialized execution queue,
//! dry-run validation for UI enablement, built-in `Undo` / `Redo`
//! pseudo-commands, and lifecycle events for cross-cutting concerns.

pub mod dispatch;
pub mod events;
pub mod handler;

// Re-export commonly used types
pub use atelier_core::{
    Command, EngineError, ErrorKind, ExecuteOptions, HistoryEntry, Result, Task, TaskState,
    TaskStatus, REDO, UNDO,
};
pub use dispatch::{Engine, EngineConfig};
pub use events::EngineEvent;
pub use handler::{CommandHandler, Registry, UndoStep};
