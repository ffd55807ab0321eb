// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.
//! Status buckets and the label <-> key normalization.
//!
//! A bucket key is derived from a status label by lower-casing it and
//! dropping hyphens (`"IN-PROGRESS"` -> `"inprogress"`). This module is the
//! only place that derivation happens.

use crate::error::BoardError;
use crate::task::{Status, Task};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum BucketKey {
    Todo,
    InProgress,
    Completed,
}

impl BucketKey {
    /// Column order on the board.
    pub const ALL: [BucketKey; 3] = [BucketKey::Todo, BucketKey::InProgress, BucketKey::Completed];

    pub fn as_str(self) -> &'static str {
        match self {
            BucketKey::Todo => "todo",
            BucketKey::InProgress => "inprogress",
            BucketKey::Completed => "completed",
        }
    }

    /// Resolves a droppable id naming a column directly.
    pub fn from_target_id(id: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|key| key.as_str() == id)
    }
}

impl fmt::Display for BucketKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Maps a status label to its bucket. Unknown labels are rejected.
pub fn bucket_key_of(label: &str) -> Result<BucketKey, BoardError> {
    let normalized: String = label
        .trim()
        .chars()
        .filter(|c| *c != '-')
        .flat_map(char::to_lowercase)
        .collect();

    BucketKey::from_target_id(&normalized).ok_or_else(|| BoardError::UnknownStatus(label.to_string()))
}

/// Maps a bucket back to the status shown for its tasks.
pub fn label_of(key: BucketKey) -> Status {
    match key {
        BucketKey::Todo => Status::Todo,
        BucketKey::InProgress => Status::InProgress,
        BucketKey::Completed => Status::Completed,
    }
}

impl From<Status> for BucketKey {
    fn from(status: Status) -> Self {
        match status {
            Status::Todo => BucketKey::Todo,
            Status::InProgress => BucketKey::InProgress,
            Status::Completed => BucketKey::Completed,
        }
    }
}

/// Tasks partitioned by status bucket, each bucket in display order.
///
/// A task id appears in at most one bucket.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct BucketedTasks {
    #[serde(default)]
    todo: Vec<Task>,
    #[serde(default)]
    inprogress: Vec<Task>,
    #[serde(default)]
    completed: Vec<Task>,
}

/// Groups tasks by the bucket of their status, keeping input order.
pub fn partition<I>(tasks: I) -> BucketedTasks
where
    I: IntoIterator<Item = Task>,
{
    let mut buckets = BucketedTasks::default();
    for task in tasks {
        let key = BucketKey::from(task.status);
        buckets.bucket_mut(key).push(task);
    }
    buckets
}

impl BucketedTasks {
    pub fn bucket(&self, key: BucketKey) -> &[Task] {
        match key {
            BucketKey::Todo => &self.todo,
            BucketKey::InProgress => &self.inprogress,
            BucketKey::Completed => &self.completed,
        }
    }

    fn bucket_mut(&mut self, key: BucketKey) -> &mut Vec<Task> {
        match key {
            BucketKey::Todo => &mut self.todo,
            BucketKey::InProgress => &mut self.inprogress,
            BucketKey::Completed => &mut self.completed,
        }
    }

    /// Finds the bucket and position currently holding `task_id`.
    pub fn locate(&self, task_id: &str) -> Option<(BucketKey, usize)> {
        BucketKey::ALL.into_iter().find_map(|key| {
            self.bucket(key)
                .iter()
                .position(|task| task.id == task_id)
                .map(|index| (key, index))
        })
    }

    pub fn get(&self, task_id: &str) -> Option<&Task> {
        self.locate(task_id)
            .map(|(key, index)| &self.bucket(key)[index])
    }

    pub fn contains(&self, task_id: &str) -> bool {
        self.locate(task_id).is_some()
    }

    /// Removes a task, returning where it was.
    pub fn remove(&mut self, task_id: &str) -> Option<(BucketKey, usize, Task)> {
        let (key, index) = self.locate(task_id)?;
        let task = self.bucket_mut(key).remove(index);
        Some((key, index, task))
    }

    /// Inserts into `key` at `index` (clamped), or appends when `None`.
    /// Returns the index the task landed at.
    pub fn insert(&mut self, key: BucketKey, index: Option<usize>, task: Task) -> usize {
        let bucket = self.bucket_mut(key);
        let at = index.map_or(bucket.len(), |i| i.min(bucket.len()));
        bucket.insert(at, task);
        at
    }

    pub fn len(&self) -> usize {
        self.todo.len() + self.inprogress.len() + self.completed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// All tasks, column by column.
    pub fn iter(&self) -> impl Iterator<Item = &Task> {
        BucketKey::ALL
            .into_iter()
            .flat_map(move |key| self.bucket(key).iter())
    }

    pub fn into_tasks(self) -> Vec<Task> {
        let mut tasks = self.todo;
        tasks.extend(self.inprogress);
        tasks.extend(self.completed);
        tasks
    }

    /// True when every task sits in the bucket of its status and no id repeats.
    pub fn is_consistent(&self) -> bool {
        let mut seen = std::collections::HashSet::new();
        BucketKey::ALL.into_iter().all(|key| {
            self.bucket(key)
                .iter()
                .all(|task| BucketKey::from(task.status) == key && seen.insert(task.id.as_str()))
        })
    }
}
