//! Single-settlement, progress-reporting task handles
//!
//! A [`Task`] represents one asynchronous unit of work dispatched through the
//! engine: it settles exactly once (resolve or reject), reports fractional
//! progress while pending, and can transfer its outcome into another task so
//! nested operations compose without knowing about each other.
//!
//! Handles are cheap to clone; all clones observe the same underlying status
//! through a watch channel.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use serde_json::Value;
use tokio::sync::watch;

use crate::errors::{EngineError, Result};

static NEXT_TASK_ID: AtomicU64 = AtomicU64::new(1);

/// Full status of a task, broadcast to all watchers
#[derive(Debug, Clone)]
pub enum TaskStatus {
    /// Work in flight; `progress` is in `[0, 1]`
    Pending { progress: f64 },
    /// Terminal: the work produced a value
    Resolved(Value),
    /// Terminal: the work failed
    Rejected(EngineError),
}

impl TaskStatus {
    /// True while the task has not settled
    pub fn is_pending(&self) -> bool {
        matches!(self, TaskStatus::Pending { .. })
    }

    /// Coarse state without the payload
    pub fn state(&self) -> TaskState {
        match self {
            TaskStatus::Pending { .. } => TaskState::Pending,
            TaskStatus::Resolved(_) => TaskState::Resolved,
            TaskStatus::Rejected(_) => TaskState::Rejected,
        }
    }
}

/// Coarse task state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskState {
    Pending,
    Resolved,
    Rejected,
}

#[derive(Debug)]
struct TaskInner {
    id: u64,
    title: Option<String>,
    status: watch::Sender<TaskStatus>,
}

/// Cloneable handle to one asynchronous unit of work
///
/// Exactly one of [`resolve`](Task::resolve) / [`reject`](Task::reject) ever
/// takes effect; later calls of either kind are silent no-ops, so racing
/// completion paths (e.g. a network success racing a stop signal) are safe.
#[derive(Debug, Clone)]
pub struct Task {
    inner: Arc<TaskInner>,
}

impl Task {
    /// Create an untitled pending task with progress 0
    pub fn new() -> Self {
        Self::build(None)
    }

    /// Create a pending task carrying a human-readable title
    pub fn with_title(title: impl Into<String>) -> Self {
        Self::build(Some(title.into()))
    }

    fn build(title: Option<String>) -> Self {
        let (status, _) = watch::channel(TaskStatus::Pending { progress: 0.0 });
        Task {
            inner: Arc::new(TaskInner {
                id: NEXT_TASK_ID.fetch_add(1, Ordering::Relaxed),
                title,
                status,
            }),
        }
    }

    /// Stable per-process task id
    pub fn id(&self) -> u64 {
        self.inner.id
    }

    /// Human-readable title, if one was supplied
    pub fn title(&self) -> Option<&str> {
        self.inner.title.as_deref()
    }

    /// Snapshot of the current status
    pub fn status(&self) -> TaskStatus {
        self.inner.status.borrow().clone()
    }

    /// Coarse state snapshot
    pub fn state(&self) -> TaskState {
        self.inner.status.borrow().state()
    }

    /// Current progress; settled tasks report 1.0
    pub fn progress(&self) -> f64 {
        match &*self.inner.status.borrow() {
            TaskStatus::Pending { progress } => *progress,
            TaskStatus::Resolved(_) | TaskStatus::Rejected(_) => 1.0,
        }
    }

    /// Transition to `Resolved` with a value; no-op if already settled
    pub fn resolve(&self, value: Value) {
        self.inner.status.send_if_modified(move |status| {
            if status.is_pending() {
                *status = TaskStatus::Resolved(value);
                true
            } else {
                false
            }
        });
    }

    /// Transition to `Rejected` with an error; no-op if already settled
    pub fn reject(&self, error: EngineError) {
        self.inner.status.send_if_modified(move |status| {
            if status.is_pending() {
                *status = TaskStatus::Rejected(error);
                true
            } else {
                false
            }
        });
    }

    /// Update progress while pending; clamped to `[0, 1]`, ignored once settled
    pub fn set_progress(&self, progress: f64) {
        let clamped = if progress.is_nan() {
            0.0
        } else {
            progress.clamp(0.0, 1.0)
        };
        self.inner.status.send_if_modified(|status| {
            if let TaskStatus::Pending { progress } = status {
                *progress = clamped;
                true
            } else {
                false
            }
        });
    }

    /// Subscribe to progress updates and settlement
    ///
    /// The receiver observes every status change, starting from the current
    /// one. This is the surface progress UIs attach to.
    pub fn watch(&self) -> watch::Receiver<TaskStatus> {
        self.inner.status.subscribe()
    }

    /// Wait until the task settles and return the outcome
    pub async fn settled(&self) -> Result<Value> {
        let mut rx = self.inner.status.subscribe();
        let status = rx
            .wait_for(|status| !status.is_pending())
            .await
            .map_err(|_| EngineError::Internal {
                message: "task status channel closed while pending".to_string(),
            })?
            .clone();
        match status {
            TaskStatus::Resolved(value) => Ok(value),
            TaskStatus::Rejected(error) => Err(error),
            TaskStatus::Pending { .. } => Err(EngineError::Internal {
                message: "task reported pending after settlement wait".to_string(),
            }),
        }
    }

    /// Mirror this task's lifecycle into `other`
    ///
    /// Progress updates are forwarded, and settlement (resolution or
    /// rejection) propagates unchanged. Must be called within a Tokio runtime.
    pub fn transfer_to(&self, other: &Task) {
        self.transfer_to_with(other, |value| value);
    }

    /// Like [`transfer_to`](Task::transfer_to), remapping the resolved value
    ///
    /// Used to compose nested operations: an inner "save" task feeds an outer
    /// "publish" task without the inner side knowing about the outer one.
    pub fn transfer_to_with<F>(&self, other: &Task, map: F)
    where
        F: FnOnce(Value) -> Value + Send + 'static,
    {
        let mut rx = self.inner.status.subscribe();
        let other = other.clone();
        tokio::spawn(async move {
            loop {
                let status = rx.borrow_and_update().clone();
                match status {
                    TaskStatus::Pending { progress } => other.set_progress(progress),
                    TaskStatus::Resolved(value) => {
                        other.resolve(map(value));
                        break;
                    }
                    TaskStatus::Rejected(error) => {
                        other.reject(error);
                        break;
                    }
                }
                if rx.changed().await.is_err() {
                    break;
                }
            }
        });
    }

    /// Run an async closure and settle a fresh task from its result
    ///
    /// The closure receives a clone of the task so it can report progress.
    /// A returned `Err` rejects the task; a returned value resolves it.
    /// Must be called within a Tokio runtime.
    pub fn wrap<F, Fut>(title: Option<&str>, f: F) -> Task
    where
        F: FnOnce(Task) -> Fut,
        Fut: std::future::Future<Output = Result<Value>> + Send + 'static,
    {
        let task = match title {
            Some(title) => Task::with_title(title),
            None => Task::new(),
        };
        let fut = f(task.clone());
        let settle = task.clone();
        tokio::spawn(async move {
            match fut.await {
                Ok(value) => settle.resolve(value),
                Err(error) => settle.reject(error),
            }
        });
        task
    }
}

impl Default for Task {
    fn default() -> Self {
        Task::new()
    }
}
