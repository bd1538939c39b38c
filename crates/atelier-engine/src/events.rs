//! Lifecycle events emitted around each dequeued invocation
//!
//! Cross-cutting concerns (spinners, toasts, logging) subscribe here instead
//! of being embedded in individual handlers. Delivery is via a broadcast
//! channel: lossy for receivers that fall behind, which is acceptable for
//! observability consumers.

use atelier_core::errors::EngineError;
use atelier_core::task::Task;

/// Notification emitted by the dispatcher's drain loop
#[derive(Debug, Clone)]
pub enum EngineEvent {
    /// The invocation was dequeued and its handler is about to run
    BeforeInvoke { command: String, task: Task },
    /// The invocation's task resolved
    AfterInvoke { command: String, task: Task },
    /// The invocation's task rejected (the queue continues regardless)
    AfterError {
        command: String,
        task: Task,
        error: EngineError,
    },
}

impl EngineEvent {
    /// Command name this event refers to
    pub fn command(&self) -> &str {
        match self {
            EngineEvent::BeforeInvoke { command, .. }
            | EngineEvent::AfterInvoke { command, .. }
            | EngineEvent::AfterError { command, .. } => command,
        }
    }

    /// Task carried by this event
    pub fn task(&self) -> &Task {
        match self {
            EngineEvent::BeforeInvoke { task, .. }
            | EngineEvent::AfterInvoke { task, .. }
            | EngineEvent::AfterError { task, .. } => task,
        }
    }
}
