//! # History
//! Two-stack undo/redo over whole-scene snapshots.
//!
//! The undo stack always ends with the *current* state; beneath it sit the
//! states that undo walks back through, bottom-most being the pristine state
//! recorded when the session opened. Undo is therefore possible only while
//! the stack holds more than one entry - the pristine bottom is never popped.
//! The redo stack holds states walked back *from*, newest on top, and is
//! discarded the moment a fresh edit is recorded: redo history diverging from
//! the present is meaningless.
//!
//! Restoring a snapshot into a live surface can fail, and a failed restore
//! must leave history exactly as it was. The timeline therefore never mixes
//! lookup and movement: callers peek the target ([`Timeline::undo_target`] /
//! [`Timeline::redo_target`]), restore it, and only then commit the stack
//! movement ([`Timeline::commit_undo`] / [`Timeline::commit_redo`]).
//!
//! Mind the asymmetry: the undo target is the entry *beneath* the top (the
//! top is the present), while the redo target is the redo top itself. The
//! commit operations encode that so callers cannot get it wrong.

use crate::snapshot::Snapshot;

#[derive(Clone, Debug, Default)]
pub struct Timeline {
    undo: Vec<Snapshot>,
    redo: Vec<Snapshot>,
    limit: Option<std::num::NonZeroUsize>,
}

impl Timeline {
    /// Empty, unbounded timeline. The first `record` becomes the pristine
    /// bottom entry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
    /// Timeline that retains at most `limit` undo entries, discarding the
    /// oldest on overflow. Old states quietly stop being reachable; whether
    /// that trade reads acceptable is the embedder's call.
    #[must_use]
    pub fn with_limit(limit: std::num::NonZeroUsize) -> Self {
        Self {
            limit: Some(limit),
            ..Self::default()
        }
    }

    /// Commit a new current state. Any redo history is invalidated.
    pub fn record(&mut self, snapshot: Snapshot) {
        self.undo.push(snapshot);
        if !self.redo.is_empty() {
            log::trace!("discarding {} redo entries", self.redo.len());
            self.redo.clear();
        }
        if let Some(limit) = self.limit {
            if self.undo.len() > limit.get() {
                // Cap overflow - the oldest state stops being reachable and
                // the entry above it becomes the new pristine bottom.
                self.undo.remove(0);
                log::trace!("history limit {limit} reached, dropped oldest entry");
            }
        }
    }

    /// False while only the pristine state (or nothing) is recorded.
    #[must_use]
    pub fn can_undo(&self) -> bool {
        self.undo.len() > 1
    }
    #[must_use]
    pub fn can_redo(&self) -> bool {
        !self.redo.is_empty()
    }
    /// The present state - top of the undo stack.
    #[must_use]
    pub fn current(&self) -> Option<&Snapshot> {
        self.undo.last()
    }
    /// The state undo would restore: one beneath the present. `None` exactly
    /// when `!can_undo()`.
    #[must_use]
    pub fn undo_target(&self) -> Option<&Snapshot> {
        self.undo.len().checked_sub(2).map(|i| &self.undo[i])
    }
    /// The state redo would restore. `None` exactly when `!can_redo()`.
    #[must_use]
    pub fn redo_target(&self) -> Option<&Snapshot> {
        self.redo.last()
    }

    /// Commit an undo after its target was successfully restored: the
    /// present moves to the redo stack, its predecessor becomes current.
    /// No-op when there is nothing to undo.
    pub fn commit_undo(&mut self) {
        if self.undo.len() > 1 {
            // Unwrap OK - length just checked.
            let present = self.undo.pop().unwrap();
            self.redo.push(present);
            log::trace!("undo committed, {} entries remain", self.undo.len());
        }
    }
    /// Commit a redo after its target was successfully restored: the target
    /// moves back onto the undo stack as the new present. No-op when there
    /// is nothing to redo.
    pub fn commit_redo(&mut self) {
        if let Some(target) = self.redo.pop() {
            self.undo.push(target);
            log::trace!("redo committed, {} redo entries remain", self.redo.len());
        }
    }

    /// Undo entries recorded, current state included.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.undo.len()
    }
    #[must_use]
    pub fn redo_depth(&self) -> usize {
        self.redo.len()
    }
}
