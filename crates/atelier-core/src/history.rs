//! Cursor-indexed undo/redo stack
//!
//! The stack is a linear chain of reversible steps with a cursor counting how
//! many of them are currently applied to the document. Recording while the
//! cursor is not at the tail discards the undone "future" first; redo history
//! is linear, never a tree. Retention is bounded: once the stack exceeds its
//! limit the oldest steps are evicted, permanently losing the ability to undo
//! past that point.
//!
//! The stack is a pure data structure; it knows nothing about how steps are
//! produced. The dispatcher feeds it and routes `Undo`/`Redo` through the same
//! serialized queue as every other mutation.

use std::collections::VecDeque;

use chrono::{DateTime, Utc};

use crate::errors::{EngineError, Result};

/// Default bound on retained history steps
pub const DEFAULT_MAX_HISTORY: usize = 50;

/// A reversible mutation step over a document of type `D`
///
/// Step closures must be self-contained: capable of re-applying / reverting
/// the mutation given only data captured at definition time plus the document
/// itself.
pub type StepFn<D> = Box<dyn FnMut(&mut D) -> Result<()> + Send>;

struct HistoryStep<D> {
    key: String,
    timestamp: DateTime<Utc>,
    forward: StepFn<D>,
    backward: StepFn<D>,
}

/// Listing row for a history panel UI
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryEntry {
    pub key: String,
    pub timestamp: DateTime<Utc>,
}

/// Linear, bounded undo/redo log with an applied-steps cursor
///
/// `cursor` ranges over `0..=len`: `0` is the base state (nothing to undo),
/// `len` is the tail (nothing to redo).
pub struct HistoryStack<D> {
    steps: VecDeque<HistoryStep<D>>,
    cursor: usize,
    max_items: usize,
}

impl<D> HistoryStack<D> {
    /// Create an empty stack retaining at most `max_items` steps
    pub fn new(max_items: usize) -> Self {
        HistoryStack {
            steps: VecDeque::new(),
            cursor: 0,
            max_items,
        }
    }

    /// Record a new reversible step
    ///
    /// Truncates any undone steps beyond the cursor, appends, advances the
    /// cursor, then evicts from the head while over the retention bound.
    /// Eviction keeps the cursor aligned with the retained steps.
    pub fn record(&mut self, key: impl Into<String>, forward: StepFn<D>, backward: StepFn<D>) {
        self.steps.truncate(self.cursor);
        self.steps.push_back(HistoryStep {
            key: key.into(),
            timestamp: Utc::now(),
            forward,
            backward,
        });
        self.cursor += 1;
        while self.steps.len() > self.max_items {
            self.steps.pop_front();
            self.cursor -= 1;
        }
    }

    /// Revert the most recently applied step
    ///
    /// The cursor moves only if the step succeeds, so a failed revert can be
    /// retried and the cursor never points past a state the document is not
    /// actually in.
    pub fn undo(&mut self, doc: &mut D) -> Result<()> {
        if self.cursor == 0 {
            return Err(EngineError::NothingToUndo);
        }
        (self.steps[self.cursor - 1].backward)(doc)?;
        self.cursor -= 1;
        Ok(())
    }

    /// Re-apply the next undone step
    pub fn redo(&mut self, doc: &mut D) -> Result<()> {
        if self.cursor >= self.steps.len() {
            return Err(EngineError::NothingToRedo);
        }
        (self.steps[self.cursor].forward)(doc)?;
        self.cursor += 1;
        Ok(())
    }

    /// True if at least one applied step can be reverted
    pub fn can_undo(&self) -> bool {
        self.cursor > 0
    }

    /// True if at least one undone step can be re-applied
    pub fn can_redo(&self) -> bool {
        self.cursor < self.steps.len()
    }

    /// Number of retained steps (applied and undone)
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// True if no steps are retained
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Cursor position: how many retained steps are currently applied
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Listing of retained steps, oldest first
    pub fn entries(&self) -> Vec<HistoryEntry> {
        self.steps
            .iter()
            .map(|step| HistoryEntry {
                key: step.key.clone(),
                timestamp: step.timestamp,
            })
            .collect()
    }
}
