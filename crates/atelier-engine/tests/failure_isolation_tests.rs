// A rejected handler never stops the queue and never touches the document.

#![allow(clippy::unwrap_used)]

mod common;

use atelier_engine::{EngineError, EngineEvent};
use common::{counter, run_and_wait};
use serde_json::{json, Value};

#[tokio::test]
async fn test_failing_command_does_not_stop_the_queue() {
    let engine = common::counter_engine();
    let mut rx = engine.subscribe();

    let err = run_and_wait(&engine, &mut rx, "FailingCommand", Value::Null)
        .await
        .unwrap_err();
    assert_eq!(err, EngineError::execution("simulated downstream failure"));

    let value = run_and_wait(&engine, &mut rx, "SetCounter", json!({ "value": 5 }))
        .await
        .unwrap();
    assert_eq!(value, json!(5));
    assert_eq!(counter(&engine), 5);
}

#[tokio::test]
async fn test_failing_command_leaves_document_and_history_untouched() {
    let engine = common::counter_engine();
    let mut rx = engine.subscribe();

    run_and_wait(&engine, &mut rx, "SetCounter", json!({ "value": 2 }))
        .await
        .unwrap();
    run_and_wait(&engine, &mut rx, "FailingCommand", Value::Null)
        .await
        .unwrap_err();

    assert_eq!(counter(&engine), 2);
    assert_eq!(engine.history_entries().len(), 1);
    // The failure invalidated nothing: undo still reverts the last mutation.
    run_and_wait(&engine, &mut rx, atelier_engine::UNDO, Value::Null)
        .await
        .unwrap();
    assert_eq!(counter(&engine), 0);
}

#[tokio::test]
async fn test_after_error_event_carries_the_rejection() {
    let engine = common::counter_engine();
    let mut rx = engine.subscribe();

    let task = engine.execute(
        "FailingCommand",
        Value::Null,
        atelier_engine::ExecuteOptions::default(),
    );
    let event = common::wait_after(&mut rx, task.id()).await;
    match event {
        EngineEvent::AfterError {
            command,
            task: event_task,
            error,
        } => {
            assert_eq!(command, "FailingCommand");
            assert_eq!(event_task.id(), task.id());
            assert_eq!(error.code(), "ERR_EXECUTION");
        }
        other => panic!("expected AfterError, got {other:?}"),
    }
}

#[tokio::test]
async fn test_interleaved_failures_preserve_fifo_effects() {
    let engine = common::counter_engine();
    let mut rx = engine.subscribe();

    for value in [1, 2] {
        run_and_wait(&engine, &mut rx, "SetCounter", json!({ "value": value }))
            .await
            .unwrap();
    }
    run_and_wait(&engine, &mut rx, "FailingCommand", Value::Null)
        .await
        .unwrap_err();
    run_and_wait(&engine, &mut rx, "SetCounter", json!({ "value": 3 }))
        .await
        .unwrap();

    assert_eq!(counter(&engine), 3);
    assert_eq!(engine.history_entries().len(), 3);
}
