//! # Editor session
//! One open document: a surface, its history, and the drivers that move
//! state between them.
//!
//! Everything that can change the scene funnels through one async mutex.
//! Commit routes ([`Editor::edit`], the background workflows) queue up behind
//! it; undo and redo instead *reject* when it is held, because a user mashing
//! ctrl+Z during a slow restore means "one step back", not "queue five
//! restores". Rejection is an ordinary outcome ([`HistoryStep::Busy`]), not
//! an error.
//!
//! History bookkeeping happens strictly after the surface cooperates: a
//! restore that fails leaves the stacks exactly as they were, and the user
//! keeps the option to retry.

use backdrop_core::history::Timeline;
use backdrop_core::snapshot::Snapshot;

use crate::surface::{ImageLoader, Surface};

pub(crate) struct Shared<S> {
    pub(crate) surface: S,
    pub(crate) timeline: Timeline,
}

pub struct Editor<S, L> {
    pub(crate) shared: tokio::sync::Mutex<Shared<S>>,
    pub(crate) loader: L,
    /// Generation counter for background workflows. See `compose`.
    pub(crate) epoch: std::sync::atomic::AtomicU64,
    /// Background workflows somewhere between entry and completion.
    pub(crate) pending: std::sync::atomic::AtomicUsize,
}

/// Outcome of an undo or redo attempt. Only an actual restore failure is an
/// error; both flavors of "nothing happened" are ordinary values the UI can
/// reflect without apology.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum HistoryStep {
    /// The target state was restored and the stacks moved.
    Applied,
    /// That side of history is empty (or only the pristine state remains).
    NothingToDo,
    /// Another operation holds the editor right now. Steps are rejected
    /// rather than queued - retry when the editor quiets down.
    Busy,
}

/// A snapshot restore failed. History was not touched: the same step can be
/// retried once the surface recovers.
#[derive(Debug, thiserror::Error)]
#[error("failed to restore snapshot: {source}")]
pub struct RestoreError {
    #[source]
    pub source: crate::BoxedError,
}

/// Holds the editor lock for the span of a direct edit and commits it on the
/// way out. Commit lives in `Drop` so a panicking edit closure still leaves
/// the timeline describing whatever state the surface actually ended up in.
struct EditScope<'a, S: Surface> {
    shared: tokio::sync::MutexGuard<'a, Shared<S>>,
}
impl<S: Surface> Drop for EditScope<'_, S> {
    fn drop(&mut self) {
        let Shared { surface, timeline } = &mut *self.shared;
        surface.request_repaint();
        timeline.record(Snapshot::capture(surface.serialize()));
    }
}

impl<S: Surface, L: ImageLoader> Editor<S, L> {
    /// Open a session over a surface. The scene as handed over becomes the
    /// pristine bottom of the undo stack - the state undo can never walk
    /// past.
    #[must_use]
    pub fn open(surface: S, loader: L) -> Self {
        Self::open_inner(surface, loader, Timeline::new())
    }
    /// As [`Editor::open`], but retaining at most `limit` history entries.
    #[must_use]
    pub fn open_with_limit(surface: S, loader: L, limit: std::num::NonZeroUsize) -> Self {
        Self::open_inner(surface, loader, Timeline::with_limit(limit))
    }
    fn open_inner(surface: S, loader: L, mut timeline: Timeline) -> Self {
        timeline.record(Snapshot::capture(surface.serialize()));
        log::debug!("editor session opened");
        Self {
            shared: tokio::sync::Mutex::new(Shared { surface, timeline }),
            loader,
            epoch: std::sync::atomic::AtomicU64::new(0),
            pending: std::sync::atomic::AtomicUsize::new(0),
        }
    }

    /// Run a direct edit against the surface and commit the result to
    /// history. Waits for the editor if something else holds it.
    ///
    /// The commit is unconditional - the closure's edits are what the user
    /// did, whether or not the closure also computed something useful.
    pub async fn edit<F, T>(&self, f: F) -> T
    where
        F: FnOnce(&mut S) -> T,
    {
        let shared = self.shared.lock().await;
        let mut scope = EditScope { shared };
        // Panic safe - EditScope commits in Drop.
        f(&mut scope.shared.surface)
    }

    /// Run a transient mutation that history should never see - live
    /// drag feedback, hover states, a color picker mid-scrub. Repaints but
    /// records nothing: follow up with [`Editor::edit`] when the gesture
    /// lands on a final value.
    pub async fn preview<F, T>(&self, f: F) -> T
    where
        F: FnOnce(&mut S) -> T,
    {
        let mut shared = self.shared.lock().await;
        let result = f(&mut shared.surface);
        shared.surface.request_repaint();
        result
    }

    /// Read against the surface. Mutates nothing, records nothing, repaints
    /// nothing.
    pub async fn inspect<F, T>(&self, f: F) -> T
    where
        F: FnOnce(&S) -> T,
    {
        let shared = self.shared.lock().await;
        f(&shared.surface)
    }

    /// Change the logical canvas size, as a recorded edit.
    pub async fn resize_canvas(&self, width: f32, height: f32) {
        self.edit(|surface| surface.resize(width, height)).await;
    }

    /// Step back one state. See [`HistoryStep`] for the no-op outcomes.
    pub async fn undo(&self) -> Result<HistoryStep, RestoreError> {
        let Ok(mut shared) = self.shared.try_lock() else {
            log::trace!("undo rejected, editor busy");
            return Ok(HistoryStep::Busy);
        };
        let Some(target) = shared.timeline.undo_target().cloned() else {
            return Ok(HistoryStep::NothingToDo);
        };
        let Shared { surface, timeline } = &mut *shared;
        // Restore before touching the stacks. The guard stays held across
        // the await, which is exactly the busy-gate the doc above promises.
        match surface.deserialize(target.doc()).await {
            Ok(()) => {
                timeline.commit_undo();
                surface.request_repaint();
                Ok(HistoryStep::Applied)
            }
            Err(source) => {
                log::error!("undo failed to restore: {source}");
                Err(RestoreError { source })
            }
        }
    }

    /// Step forward one state. Mirror of [`Editor::undo`].
    pub async fn redo(&self) -> Result<HistoryStep, RestoreError> {
        let Ok(mut shared) = self.shared.try_lock() else {
            log::trace!("redo rejected, editor busy");
            return Ok(HistoryStep::Busy);
        };
        let Some(target) = shared.timeline.redo_target().cloned() else {
            return Ok(HistoryStep::NothingToDo);
        };
        let Shared { surface, timeline } = &mut *shared;
        match surface.deserialize(target.doc()).await {
            Ok(()) => {
                timeline.commit_redo();
                surface.request_repaint();
                Ok(HistoryStep::Applied)
            }
            Err(source) => {
                log::error!("redo failed to restore: {source}");
                Err(RestoreError { source })
            }
        }
    }

    #[must_use]
    pub async fn can_undo(&self) -> bool {
        self.shared.lock().await.timeline.can_undo()
    }
    #[must_use]
    pub async fn can_redo(&self) -> bool {
        self.shared.lock().await.timeline.can_redo()
    }
    /// Undo entries recorded, current state included.
    #[must_use]
    pub async fn history_depth(&self) -> usize {
        self.shared.lock().await.timeline.depth()
    }
    #[must_use]
    pub async fn redo_depth(&self) -> usize {
        self.shared.lock().await.timeline.redo_depth()
    }
    /// The most recently committed state.
    #[must_use]
    pub async fn current(&self) -> Option<Snapshot> {
        self.shared.lock().await.timeline.current().cloned()
    }
    /// True while some operation holds the editor state - an undo or redo
    /// arriving now would report [`HistoryStep::Busy`]. Instantaneous, for
    /// UI affordances only; never gate logic on it.
    #[must_use]
    pub fn is_busy(&self) -> bool {
        self.shared.try_lock().is_err()
    }
    /// Background workflows currently somewhere between request and
    /// completion. Drives spinners; returns to zero on every outcome.
    #[must_use]
    pub fn pending_backgrounds(&self) -> usize {
        self.pending.load(std::sync::atomic::Ordering::Relaxed)
    }
}
