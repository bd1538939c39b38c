//! FIFO serialized command dispatcher
//!
//! The engine owns the one shared document of an editing session and
//! guarantees at-most-one mutation in flight: every `execute` call allocates a
//! task, queues a pending invocation, and a single drain loop runs handlers
//! one at a time, in submission order, waiting for each task to settle before
//! starting the next. Undo and redo are pseudo-commands routed through the
//! same queue, so a user cannot trigger an undo that jumps ahead of a slow
//! in-flight command.
//!
//! Each drain iteration is a fresh `recv().await` turn on the run loop rather
//! than a recursive call, so back-to-back command chains never grow the call
//! stack.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use atelier_core::command::{Command, ExecuteOptions, REDO, UNDO};
use atelier_core::errors::{EngineError, Result};
use atelier_core::history::{HistoryEntry, HistoryStack, DEFAULT_MAX_HISTORY};
use atelier_core::task::Task;
use serde::Deserialize;
use serde_json::Value;
use tokio::sync::{broadcast, mpsc};
use tracing::{debug, warn};

use crate::events::EngineEvent;
use crate::handler::{Registry, UndoStep};

const EVENT_CHANNEL_CAPACITY: usize = 64;

/// Engine construction options
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Bound on retained undo history steps
    pub max_history: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            max_history: DEFAULT_MAX_HISTORY,
        }
    }
}

/// One open document plus its undo history
///
/// Mutated only under the session lock, only from a dequeued invocation.
/// That discipline is the sole thing keeping the document consistent; no
/// other code path gets a mutable reference.
struct Session<D> {
    doc: D,
    history: HistoryStack<D>,
}

struct PendingInvocation {
    sequence: u64,
    command: String,
    arg: Value,
    task: Task,
}

struct Shared<D> {
    session: Mutex<Session<D>>,
    registry: Registry<D>,
    events: broadcast::Sender<EngineEvent>,
}

impl<D> Shared<D> {
    fn session(&self) -> MutexGuard<'_, Session<D>> {
        // A panicking handler poisons the lock; recover the guard so the
        // queue stays available for subsequent commands.
        self.session
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Cloneable handle to the command execution engine for one document
///
/// Dropping every handle closes the queue; already-accepted invocations still
/// drain, then the loop exits and the history is discarded with the session.
pub struct Engine<D> {
    shared: Arc<Shared<D>>,
    queue: mpsc::UnboundedSender<PendingInvocation>,
    sequence: Arc<AtomicU64>,
}

impl<D> Clone for Engine<D> {
    fn clone(&self) -> Self {
        Engine {
            shared: Arc::clone(&self.shared),
            queue: self.queue.clone(),
            sequence: Arc::clone(&self.sequence),
        }
    }
}

impl<D: Send + 'static> Engine<D> {
    /// Create an engine with the default configuration
    ///
    /// Must be called within a Tokio runtime: the drain loop is spawned here.
    pub fn new(doc: D, registry: Registry<D>) -> Self {
        Self::with_config(doc, registry, EngineConfig::default())
    }

    /// Create an engine with explicit configuration
    pub fn with_config(doc: D, registry: Registry<D>, config: EngineConfig) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        let shared = Arc::new(Shared {
            session: Mutex::new(Session {
                doc,
                history: HistoryStack::new(config.max_history),
            }),
            registry,
            events,
        });

        let (queue, mut rx) = mpsc::unbounded_channel::<PendingInvocation>();
        let loop_shared = Arc::clone(&shared);
        tokio::spawn(async move {
            while let Some(invocation) = rx.recv().await {
                process(&loop_shared, invocation).await;
            }
            debug!("command queue closed; session torn down");
        });

        Engine {
            shared,
            queue,
            sequence: Arc::new(AtomicU64::new(1)),
        }
    }
}

impl<D> Engine<D> {
    /// Dispatch a command; returns its task immediately
    ///
    /// Never fails synchronously: pre-flight problems (unknown command,
    /// closed queue) come back as a rejected task, and with
    /// `skip_if_disabled` a failed dry-run comes back as an already-resolved
    /// no-op task with nothing enqueued and no events emitted.
    pub fn execute(&self, name: impl Into<String>, arg: Value, opts: ExecuteOptions) -> Task {
        let name = name.into();
        let task = match opts.title {
            Some(title) => Task::with_title(title),
            None => Task::with_title(name.as_str()),
        };

        if opts.skip_if_disabled {
            if let Some(reason) = self.message_if_disabled(&name, &arg) {
                debug!(command = %name, %reason, "skipping disabled command");
                task.resolve(Value::Null);
                return task;
            }
        }

        if name != UNDO && name != REDO && self.shared.registry.get(&name).is_none() {
            task.reject(EngineError::UnknownCommand { name });
            return task;
        }

        let sequence = self.sequence.fetch_add(1, Ordering::Relaxed);
        let invocation = PendingInvocation {
            sequence,
            command: name,
            arg,
            task: task.clone(),
        };
        if self.queue.send(invocation).is_err() {
            task.reject(EngineError::QueueClosed);
        }
        task
    }

    /// Dispatch a deserialized command envelope
    pub fn execute_command(&self, command: Command, opts: ExecuteOptions) -> Task {
        self.execute(command.name, command.arg, opts)
    }

    /// Queue the built-in undo pseudo-command
    pub fn undo(&self) -> Task {
        self.execute(UNDO, Value::Null, ExecuteOptions::default())
    }

    /// Queue the built-in redo pseudo-command
    pub fn redo(&self) -> Task {
        self.execute(REDO, Value::Null, ExecuteOptions::default())
    }

    /// Dry-run check: would this command run right now?
    pub fn is_enabled(&self, name: &str, arg: &Value) -> bool {
        self.message_if_disabled(name, arg).is_none()
    }

    /// Dry-run check returning the disable reason, if any
    ///
    /// Runs the handler's validation without a task; no mutation occurs.
    /// For `Undo` / `Redo` the history boundary is consulted instead.
    pub fn message_if_disabled(&self, name: &str, arg: &Value) -> Option<String> {
        let session = self.shared.session();
        let checked: Result<()> = match name {
            UNDO => {
                if session.history.can_undo() {
                    Ok(())
                } else {
                    Err(EngineError::NothingToUndo)
                }
            }
            REDO => {
                if session.history.can_redo() {
                    Ok(())
                } else {
                    Err(EngineError::NothingToRedo)
                }
            }
            name => match self.shared.registry.get(name) {
                Some(handler) => handler.validate(&session.doc, arg),
                None => Err(EngineError::UnknownCommand {
                    name: name.to_string(),
                }),
            },
        };
        checked.err().map(|error| error.to_string())
    }

    /// Subscribe to lifecycle events
    pub fn subscribe(&self) -> broadcast::Receiver<EngineEvent> {
        self.shared.events.subscribe()
    }

    /// Read-only access to the document
    ///
    /// The closure runs under the session lock; mutation stays the exclusive
    /// privilege of dequeued handlers.
    pub fn with_document<R>(&self, f: impl FnOnce(&D) -> R) -> R {
        f(&self.shared.session().doc)
    }

    /// True if an applied step can be reverted
    pub fn can_undo(&self) -> bool {
        self.shared.session().history.can_undo()
    }

    /// True if an undone step can be re-applied
    pub fn can_redo(&self) -> bool {
        self.shared.session().history.can_redo()
    }

    /// Retained history steps, oldest first, for a history panel
    pub fn history_entries(&self) -> Vec<HistoryEntry> {
        self.shared.session().history.entries()
    }
}

/// Run one dequeued invocation to completion
async fn process<D>(shared: &Shared<D>, invocation: PendingInvocation) {
    let PendingInvocation {
        sequence,
        command,
        arg,
        task,
    } = invocation;

    debug!(command = %command, sequence, task_id = task.id(), "invoking command");
    let _ = shared.events.send(EngineEvent::BeforeInvoke {
        command: command.clone(),
        task: task.clone(),
    });

    let builtin = command == UNDO || command == REDO;
    let outcome: Result<Option<UndoStep<D>>> = {
        let mut session = shared.session();
        let Session { doc, history } = &mut *session;
        match command.as_str() {
            UNDO => history.undo(doc).map(|()| None),
            REDO => history.redo(doc).map(|()| None),
            name => match shared.registry.get(name) {
                Some(handler) => handler.execute(doc, arg, &task),
                None => Err(EngineError::UnknownCommand {
                    name: name.to_string(),
                }),
            },
        }
        // lock released before waiting on settlement
    };

    let step = match outcome {
        Ok(step) => {
            if builtin {
                task.resolve(Value::Null);
            }
            step
        }
        Err(error) => {
            task.reject(error);
            None
        }
    };

    // The handler settles the task, synchronously or from spawned work; the
    // queue defers the next entry until then.
    match task.settled().await {
        Ok(_) => {
            if let Some(UndoStep { forward, backward }) = step {
                let mut session = shared.session();
                session.history.record(command.clone(), forward, backward);
                debug!(command = %command, sequence, "recorded history step");
            }
            let _ = shared.events.send(EngineEvent::AfterInvoke { command, task });
        }
        Err(error) => {
            warn!(command = %command, sequence, %error, "command failed");
            let _ = shared.events.send(EngineEvent::AfterError {
                command,
                task,
                error,
            });
        }
    }
}
