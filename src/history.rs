//! Linear undo/redo over whole-scene snapshots.
//!
//! Every mutation records the scene as it was *before* the change. Undo swaps
//! the live scene with the newest undo snapshot; redo swaps it back. Recording
//! a new snapshot discards everything that could have been redone.

#[cfg(test)]
#[path = "history_test.rs"]
mod history_test;

use crate::object::DrawingObject;

/// A full copy of the scene's object list.
pub type Snapshot = Vec<DrawingObject>;

/// Undo and redo stacks (most recent last).
#[derive(Debug, Clone, Default)]
pub struct History {
    undo_stack: Vec<Snapshot>,
    redo_stack: Vec<Snapshot>,
    /// Maximum undo depth; `0` keeps everything.
    limit: usize,
}

impl History {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// History that keeps at most `limit` undo snapshots (`0` = unbounded).
    #[must_use]
    pub fn with_limit(limit: usize) -> Self {
        Self { limit, ..Self::default() }
    }

    /// Record the pre-mutation scene and invalidate redo.
    pub fn record(&mut self, before: Snapshot) {
        self.redo_stack.clear();
        self.undo_stack.push(before);
        if self.limit > 0 && self.undo_stack.len() > self.limit {
            let excess = self.undo_stack.len() - self.limit;
            self.undo_stack.drain(..excess);
        }
    }

    /// Pop the newest undo snapshot, parking `current` on the redo stack.
    /// Returns `None` (and parks nothing) when there is nothing to undo.
    pub fn undo(&mut self, current: &[DrawingObject]) -> Option<Snapshot> {
        let previous = self.undo_stack.pop()?;
        self.redo_stack.push(current.to_vec());
        Some(previous)
    }

    /// Pop the newest redo snapshot, parking `current` on the undo stack.
    /// Returns `None` (and parks nothing) when there is nothing to redo.
    pub fn redo(&mut self, current: &[DrawingObject]) -> Option<Snapshot> {
        let next = self.redo_stack.pop()?;
        self.undo_stack.push(current.to_vec());
        Some(next)
    }

    #[must_use]
    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    #[must_use]
    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    #[must_use]
    pub fn undo_depth(&self) -> usize {
        self.undo_stack.len()
    }

    #[must_use]
    pub fn redo_depth(&self) -> usize {
        self.redo_stack.len()
    }

    /// Drop both stacks.
    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
    }
}
