// Shared fixture: a counter document with the handlers the engine tests
// exercise. `SetCounter` is the canonical reversible command; `FailingCommand`
// rejects during execution without mutating; `Blocked` never validates;
// `Gated` holds its task open until the test releases it.

#![allow(clippy::unwrap_used)]
#![allow(dead_code)] // each test binary uses a different slice of this fixture

use std::sync::Mutex;

use atelier_engine::{
    CommandHandler, Engine, EngineError, EngineEvent, ExecuteOptions, Registry, Result, Task,
    UndoStep,
};
use serde_json::{json, Value};
use tokio::sync::{broadcast, oneshot};

/// The one shared document of a test session
#[derive(Debug, Default)]
pub struct CounterDoc {
    pub counter: i64,
}

fn value_arg(arg: &Value) -> Result<i64> {
    arg.get("value")
        .and_then(Value::as_i64)
        .ok_or_else(|| EngineError::validation("value argument is required"))
}

/// Reversible command: sets the counter, records set-to-new / set-to-old steps
pub struct SetCounter;

impl CommandHandler<CounterDoc> for SetCounter {
    fn validate(&self, _doc: &CounterDoc, arg: &Value) -> Result<()> {
        value_arg(arg).map(|_| ())
    }

    fn execute(
        &self,
        doc: &mut CounterDoc,
        arg: Value,
        task: &Task,
    ) -> Result<Option<UndoStep<CounterDoc>>> {
        let next = value_arg(&arg)?;
        let prev = doc.counter;
        doc.counter = next;
        task.resolve(json!(next));
        Ok(Some(UndoStep::new(
            move |doc: &mut CounterDoc| {
                doc.counter = next;
                Ok(())
            },
            move |doc: &mut CounterDoc| {
                doc.counter = prev;
                Ok(())
            },
        )))
    }
}

/// Validates fine, then fails during execution without touching the document
pub struct FailingCommand;

impl CommandHandler<CounterDoc> for FailingCommand {
    fn execute(
        &self,
        _doc: &mut CounterDoc,
        _arg: Value,
        _task: &Task,
    ) -> Result<Option<UndoStep<CounterDoc>>> {
        Err(EngineError::execution("simulated downstream failure"))
    }
}

/// Never passes validation; used for the skip-if-disabled no-op path
pub struct Blocked;

impl CommandHandler<CounterDoc> for Blocked {
    fn validate(&self, _doc: &CounterDoc, _arg: &Value) -> Result<()> {
        Err(EngineError::validation("no object selected"))
    }

    fn execute(
        &self,
        doc: &mut CounterDoc,
        _arg: Value,
        task: &Task,
    ) -> Result<Option<UndoStep<CounterDoc>>> {
        // Reaching here means the dry-run was bypassed; make it visible.
        doc.counter = -999;
        task.resolve(Value::Null);
        Ok(None)
    }
}

/// Holds its task open until the paired sender fires
pub struct Gated {
    release: Mutex<Option<oneshot::Receiver<()>>>,
}

impl Gated {
    pub fn new() -> (Self, oneshot::Sender<()>) {
        let (tx, rx) = oneshot::channel();
        (
            Gated {
                release: Mutex::new(Some(rx)),
            },
            tx,
        )
    }
}

impl CommandHandler<CounterDoc> for Gated {
    fn execute(
        &self,
        _doc: &mut CounterDoc,
        _arg: Value,
        task: &Task,
    ) -> Result<Option<UndoStep<CounterDoc>>> {
        let release = self.release.lock().unwrap().take();
        let task = task.clone();
        tokio::spawn(async move {
            if let Some(release) = release {
                let _ = release.await;
            }
            task.resolve(Value::Null);
        });
        Ok(None)
    }
}

/// Registry with the standard fixture handlers
pub fn counter_registry() -> Registry<CounterDoc> {
    Registry::new()
        .register("SetCounter", SetCounter)
        .register("FailingCommand", FailingCommand)
        .register("Blocked", Blocked)
}

/// Engine over a fresh zeroed counter document
pub fn counter_engine() -> Engine<CounterDoc> {
    Engine::new(CounterDoc::default(), counter_registry())
}

/// Wait for the AfterInvoke / AfterError event of a given task
///
/// History recording happens before `AfterInvoke` fires, so assertions on
/// undo state are race-free once this returns.
pub async fn wait_after(rx: &mut broadcast::Receiver<EngineEvent>, task_id: u64) -> EngineEvent {
    loop {
        let event = match rx.recv().await {
            Ok(event) => event,
            // Burst tests can overflow the broadcast buffer; the terminal
            // event of the awaited task is always among the newest.
            Err(broadcast::error::RecvError::Lagged(_)) => continue,
            Err(broadcast::error::RecvError::Closed) => panic!("event channel closed"),
        };
        match &event {
            EngineEvent::AfterInvoke { task, .. } | EngineEvent::AfterError { task, .. }
                if task.id() == task_id =>
            {
                return event;
            }
            _ => {}
        }
    }
}

/// Execute a command, wait for its lifecycle to finish, return the outcome
pub async fn run_and_wait(
    engine: &Engine<CounterDoc>,
    rx: &mut broadcast::Receiver<EngineEvent>,
    name: &str,
    arg: Value,
) -> Result<Value> {
    let task = engine.execute(name, arg, ExecuteOptions::default());
    wait_after(rx, task.id()).await;
    task.settled().await
}

/// Current counter value
pub fn counter(engine: &Engine<CounterDoc>) -> i64 {
    engine.with_document(|doc| doc.counter)
}
