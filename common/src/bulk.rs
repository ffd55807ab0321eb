// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.
//! Bulk status change and bulk delete over the selection.
//!
//! A batch is not atomic. All local changes are applied at once, one store
//! call per task is issued concurrently, and each task whose own call failed
//! is put back as it was. The selection is cleared once every call settled.

use crate::board::Board;
use crate::bucket::BucketKey;
use crate::error::StoreError;
use crate::store::TaskStore;
use crate::task::{ACTION_STATUS_UPDATED, Activity, Status, Task, TaskPatch};
use serde::Serialize;
use tracing::{debug, info, warn};

#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(tag = "kind", content = "status", rename_all = "snake_case")]
pub enum BatchAction {
    SetStatus(Status),
    Delete,
}

#[derive(Debug, Clone)]
struct BatchEntry {
    original: Task,
    from: BucketKey,
    from_index: usize,
    patch: Option<TaskPatch>,
}

/// Local half of a bulk action, waiting for the store results.
#[derive(Debug, Clone)]
#[must_use = "a pending batch must be settled"]
pub struct PendingBatch {
    action: BatchAction,
    entries: Vec<BatchEntry>,
    skipped: Vec<String>,
}

impl PendingBatch {
    pub fn action(&self) -> BatchAction {
        self.action
    }

    pub fn task_ids(&self) -> Vec<String> {
        self.entries.iter().map(|e| e.original.id.clone()).collect()
    }

    /// Store patches of a status batch, in selection order.
    pub fn patches(&self) -> Vec<(String, TaskPatch)> {
        self.entries
            .iter()
            .filter_map(|e| e.patch.clone().map(|patch| (e.original.id.clone(), patch)))
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct BulkFailure {
    pub task_id: String,
    pub reason: String,
}

/// Per-task result of a settled bulk action.
#[derive(Serialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct BulkOutcome {
    pub succeeded: Vec<String>,
    pub failed: Vec<BulkFailure>,
    /// Selected ids that were no longer on the board.
    pub skipped: Vec<String>,
}

impl BulkOutcome {
    pub fn is_complete_success(&self) -> bool {
        self.failed.is_empty()
    }
}

impl Board {
    /// Drops stale selection entries and snapshots the rest in selection order.
    fn snapshot_selection(&mut self) -> (Vec<BatchEntry>, Vec<String>) {
        let skipped = self.selection.prune(&self.tasks);
        if !skipped.is_empty() {
            debug!("Skipping {} stale selected tasks.", skipped.len());
        }

        let entries = self
            .selection
            .ids()
            .iter()
            .filter_map(|id| {
                let (from, from_index) = self.tasks.locate(id)?;
                Some(BatchEntry {
                    original: self.tasks.bucket(from)[from_index].clone(),
                    from,
                    from_index,
                    patch: None,
                })
            })
            .collect();
        (entries, skipped)
    }

    /// Moves every selected task to the bucket of `status`, appending a
    /// status activity to each, as one local update.
    pub fn begin_bulk_status(&mut self, status: Status) -> PendingBatch {
        let (mut entries, skipped) = self.snapshot_selection();
        let destination = BucketKey::from(status);

        for entry in &entries {
            self.tasks.remove(&entry.original.id);
        }
        for entry in &mut entries {
            let mut moved = entry.original.clone();
            moved.status = status;
            moved
                .activities
                .push(Activity::now(ACTION_STATUS_UPDATED, self.user_id()));
            entry.patch = Some(TaskPatch {
                status: Some(status),
                activities: Some(moved.activities.clone()),
                ..TaskPatch::default()
            });
            self.tasks.insert(destination, None, moved);
        }

        PendingBatch {
            action: BatchAction::SetStatus(status),
            entries,
            skipped,
        }
    }

    /// Removes every selected task as one local update.
    pub fn begin_bulk_delete(&mut self) -> PendingBatch {
        let (entries, skipped) = self.snapshot_selection();
        for entry in &entries {
            self.tasks.remove(&entry.original.id);
        }
        PendingBatch {
            action: BatchAction::Delete,
            entries,
            skipped,
        }
    }

    /// Restores every task whose store call failed, clears the selection and
    /// raises one notice for the whole batch.
    ///
    /// `results` holds one entry per task of the batch, in batch order.
    pub fn settle_batch(
        &mut self,
        pending: PendingBatch,
        results: Vec<Result<(), StoreError>>,
    ) -> BulkOutcome {
        let mut outcome = BulkOutcome {
            skipped: pending.skipped,
            ..BulkOutcome::default()
        };
        let total = pending.entries.len();
        let mut results = results.into_iter();
        let mut to_restore = Vec::new();
        let mut vacated = Vec::new();

        for entry in pending.entries {
            let result = results.next().unwrap_or_else(|| {
                Err(StoreError::Backend("no result reported for task".to_string()))
            });
            match result {
                Ok(()) => {
                    vacated.push((entry.from, entry.from_index));
                    outcome.succeeded.push(entry.original.id.clone());
                }
                Err(err) => {
                    warn!("Bulk action failed for task {}: {}", entry.original.id, err);
                    outcome.failed.push(BulkFailure {
                        task_id: entry.original.id.clone(),
                        reason: err.to_string(),
                    });
                    to_restore.push(entry);
                }
            }
        }

        // Slots left by succeeded tasks are gone for good. Restoring in
        // ascending original position, each index shifted down by the vacated
        // slots before it, puts every task back between its old neighbours.
        to_restore.sort_by_key(|entry| (entry.from, entry.from_index));
        for entry in to_restore {
            let shift = vacated
                .iter()
                .filter(|(bucket, index)| *bucket == entry.from && *index < entry.from_index)
                .count();
            self.restore(entry.original, entry.from, entry.from_index - shift);
        }

        self.selection.clear();

        let verb = match pending.action {
            BatchAction::SetStatus(_) => "update",
            BatchAction::Delete => "delete",
        };
        if outcome.failed.is_empty() {
            if total > 0 {
                self.notify_success(format!("{total} task(s) {verb}d."));
            }
        } else {
            self.notify_error(format!(
                "Could not {verb} {} of {} task(s).",
                outcome.failed.len(),
                total
            ));
        }
        outcome
    }

    /// Sets the status of every selected task.
    pub async fn bulk_set_status<S>(&mut self, store: &S, status: Status) -> BulkOutcome
    where
        S: TaskStore + ?Sized,
    {
        let pending = self.begin_bulk_status(status);
        let patches = pending.patches();
        info!(
            "Bulk status change to {} for {} task(s).",
            status,
            patches.len()
        );
        let results = if patches.is_empty() {
            Vec::new()
        } else {
            store.update_many(&patches).await
        };
        self.settle_batch(pending, results)
    }

    /// Deletes every selected task.
    pub async fn bulk_delete<S>(&mut self, store: &S) -> BulkOutcome
    where
        S: TaskStore + ?Sized,
    {
        let pending = self.begin_bulk_delete();
        let task_ids = pending.task_ids();
        info!("Bulk delete of {} task(s).", task_ids.len());
        let results = if task_ids.is_empty() {
            Vec::new()
        } else {
            store.delete_many(&task_ids).await
        };
        self.settle_batch(pending, results)
    }
}
