// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.
//! Moving a single task between buckets.
//!
//! A transition runs in two phases: [`Board::begin_transition`] applies the
//! move locally right away, then the store is asked to persist the new status
//! and [`Board::rollback_transition`] undoes the move if it refuses.
//! [`Board::apply_transition`] chains both.

use crate::board::Board;
use crate::bucket::{BucketKey, label_of};
use crate::drag::TransitionRequest;
use crate::error::BoardError;
use crate::store::TaskStore;
use crate::task::{Status, Task, TaskPatch};
use serde::Serialize;
use tracing::{debug, info};

#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TransitionOutcome {
    /// Moved to another bucket and the store accepted the new status.
    Committed,
    /// Moved inside its own bucket. In-column order is not persisted.
    Reordered,
    /// The task was not on the board; nothing changed.
    Skipped,
}

/// A move applied locally and not yet confirmed by the store.
#[derive(Debug, Clone)]
#[must_use = "a pending transition must be settled or rolled back"]
pub struct PendingTransition {
    original: Task,
    from: BucketKey,
    from_index: usize,
    to: BucketKey,
}

impl PendingTransition {
    pub fn task_id(&self) -> &str {
        &self.original.id
    }

    pub fn from(&self) -> BucketKey {
        self.from
    }

    pub fn to(&self) -> BucketKey {
        self.to
    }

    pub fn new_status(&self) -> Status {
        label_of(self.to)
    }

    /// Whether the store has anything to persist.
    pub fn changes_status(&self) -> bool {
        self.from != self.to
    }

    pub fn patch(&self) -> TaskPatch {
        TaskPatch::status(self.new_status())
    }
}

impl Board {
    /// Applies `request` locally. Returns `None` when the task is not on the
    /// board.
    pub fn begin_transition(&mut self, request: &TransitionRequest) -> Option<PendingTransition> {
        let (from, from_index, original) = self.tasks.remove(&request.task_id)?;

        let mut moved = original.clone();
        moved.status = label_of(request.destination);
        self.tasks.insert(request.destination, request.index, moved);

        Some(PendingTransition {
            original,
            from,
            from_index,
            to: request.destination,
        })
    }

    /// Undoes a pending transition: the task goes back, unchanged, to its
    /// original bucket and position.
    pub fn rollback_transition(&mut self, pending: PendingTransition) {
        debug!(
            "Rolling back task {} from {} to {}[{}]",
            pending.original.id, pending.to, pending.from, pending.from_index
        );
        self.restore(pending.original, pending.from, pending.from_index);
    }

    /// Moves a task and persists its new status, rolling the move back and
    /// raising an error notice if the store call fails.
    pub async fn apply_transition<S>(
        &mut self,
        store: &S,
        request: &TransitionRequest,
    ) -> Result<TransitionOutcome, BoardError>
    where
        S: TaskStore + ?Sized,
    {
        let Some(pending) = self.begin_transition(request) else {
            debug!("Transition skipped: task {} is not on the board.", request.task_id);
            return Ok(TransitionOutcome::Skipped);
        };

        if !pending.changes_status() {
            debug!("Task {} reordered within {}.", request.task_id, pending.to);
            return Ok(TransitionOutcome::Reordered);
        }

        match store.update_task(pending.task_id(), &pending.patch()).await {
            Ok(()) => {
                info!(
                    "Task {} moved from {} to {}.",
                    pending.task_id(),
                    pending.from,
                    pending.to
                );
                Ok(TransitionOutcome::Committed)
            }
            Err(err) => {
                let title = pending.original.title.clone();
                self.rollback_transition(pending);
                self.notify_error(format!("Could not move \"{title}\": {err}"));
                Err(err.into())
            }
        }
    }

    /// Status dropdown on a task: move it to the end of the matching column.
    /// Picking the status it already has leaves it where it is.
    pub async fn set_status<S>(
        &mut self,
        store: &S,
        task_id: &str,
        status: Status,
    ) -> Result<TransitionOutcome, BoardError>
    where
        S: TaskStore + ?Sized,
    {
        let Some((current, _)) = self.tasks.locate(task_id) else {
            return Err(BoardError::TaskNotFound(task_id.to_string()));
        };
        if current == BucketKey::from(status) {
            debug!("Task {} already has status {}.", task_id, status);
            return Ok(TransitionOutcome::Skipped);
        }
        let request = TransitionRequest::append(task_id, BucketKey::from(status));
        self.apply_transition(store, &request).await
    }
}
