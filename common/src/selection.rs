// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.
use crate::bucket::BucketedTasks;
use serde::Serialize;

/// Selected task ids, in the order they were picked.
///
/// Membership is by id only; task data is always read from the board.
#[derive(Serialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(transparent)]
pub struct Selection {
    ids: Vec<String>,
}

impl Selection {
    /// Flips membership of `task_id`. Returns whether it is now selected.
    pub fn toggle(&mut self, task_id: &str) -> bool {
        match self.ids.iter().position(|id| id == task_id) {
            Some(index) => {
                self.ids.remove(index);
                false
            }
            None => {
                self.ids.push(task_id.to_string());
                true
            }
        }
    }

    pub fn contains(&self, task_id: &str) -> bool {
        self.ids.iter().any(|id| id == task_id)
    }

    pub fn ids(&self) -> &[String] {
        &self.ids
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn clear(&mut self) {
        self.ids.clear();
    }

    /// Drops ids no longer on the board and returns them.
    pub fn prune(&mut self, tasks: &BucketedTasks) -> Vec<String> {
        let (kept, stale): (Vec<String>, Vec<String>) =
            self.ids.drain(..).partition(|id| tasks.contains(id));
        self.ids = kept;
        stale
    }
}
