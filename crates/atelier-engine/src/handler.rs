//! Handler contract and registry
//!
//! A handler is the integration point supplied by the domain layer, one per
//! command name. It exposes two explicit modes: a side-effect-free dry-run
//! (`validate`) used to enable/disable UI controls, and the real mutation
//! (`execute`). The registry is built once at startup and never re-registered.

use std::collections::HashMap;
use std::sync::Arc;

use atelier_core::errors::Result;
use atelier_core::history::StepFn;
use atelier_core::task::Task;
use atelier_core::{REDO, UNDO};
use serde_json::Value;

/// Reversible-step descriptor returned by an undoable handler
///
/// Both closures must be self-contained: they re-apply / revert the mutation
/// from data captured when the handler ran, given only the document.
pub struct UndoStep<D> {
    pub forward: StepFn<D>,
    pub backward: StepFn<D>,
}

impl<D> UndoStep<D> {
    /// Build a step pair from forward and backward closures
    pub fn new(
        forward: impl FnMut(&mut D) -> Result<()> + Send + 'static,
        backward: impl FnMut(&mut D) -> Result<()> + Send + 'static,
    ) -> Self {
        UndoStep {
            forward: Box::new(forward),
            backward: Box::new(backward),
        }
    }
}

/// Domain-supplied implementation of one command
///
/// `validate` must not mutate anything observable; its error message is the
/// reason a UI control shows as disabled. `execute` performs the mutation and
/// must settle `task` exactly once: synchronously for instantaneous
/// commands, or later from spawned work. A returned `Err` is folded into a
/// task rejection by the dispatcher, so observers see a single failure
/// channel: the task.
pub trait CommandHandler<D>: Send + Sync {
    /// Dry-run precondition check; no observable mutation
    fn validate(&self, _doc: &D, _arg: &Value) -> Result<()> {
        Ok(())
    }

    /// Perform the real mutation
    ///
    /// Runs with the document lock held; long asynchronous work must be
    /// spawned off with captured data, settling the task when it completes.
    /// Return an [`UndoStep`] to make the mutation undoable; non-reversible,
    /// informational, or navigation commands return `None` and never produce
    /// history.
    fn execute(&self, doc: &mut D, arg: Value, task: &Task) -> Result<Option<UndoStep<D>>>;
}

/// Build-once lookup from command name to handler
///
/// The built-in `Undo` / `Redo` pseudo-commands are matched by the dispatcher
/// before this registry is consulted; registering under those names is
/// ignored with a warning.
pub struct Registry<D> {
    handlers: HashMap<String, Arc<dyn CommandHandler<D>>>,
}

impl<D> Registry<D> {
    /// Create an empty registry
    pub fn new() -> Self {
        Registry {
            handlers: HashMap::new(),
        }
    }

    /// Register a handler under a command name (builder style)
    pub fn register(
        mut self,
        name: impl Into<String>,
        handler: impl CommandHandler<D> + 'static,
    ) -> Self {
        let name = name.into();
        if name == UNDO || name == REDO {
            tracing::warn!(command = %name, "ignoring registration under reserved built-in name");
            return self;
        }
        self.handlers.insert(name, Arc::new(handler));
        self
    }

    /// Look up the handler for a command name
    pub fn get(&self, name: &str) -> Option<&Arc<dyn CommandHandler<D>>> {
        self.handlers.get(name)
    }

    /// Number of registered handlers
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    /// True if no handlers are registered
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

impl<D> Default for Registry<D> {
    fn default() -> Self {
        Registry::new()
    }
}
