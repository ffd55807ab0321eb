// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.
//! Task store adapter.
//!
//! The board engine only talks to the document store through [`TaskStore`].
//! Calls are asynchronous, fallible and independent of each other: there is
//! no transaction spanning several calls.

use crate::error::StoreError;
use crate::task::{Activity, NewTask, Task, TaskPatch};
use async_trait::async_trait;
use futures::future::join_all;
use parking_lot::Mutex;
use std::collections::HashSet;

#[async_trait]
pub trait TaskStore: Send + Sync {
    /// All tasks owned by `user_id`, in store order.
    async fn fetch_tasks_for_user(&self, user_id: &str) -> Result<Vec<Task>, StoreError>;

    /// Persists a new task and returns the id the store assigned.
    async fn create_task(
        &self,
        user_id: &str,
        task: &NewTask,
        activities: &[Activity],
    ) -> Result<String, StoreError>;

    async fn update_task(&self, task_id: &str, patch: &TaskPatch) -> Result<(), StoreError>;

    async fn delete_task(&self, task_id: &str) -> Result<(), StoreError>;

    /// Issues every update concurrently. One result per input, same order.
    async fn update_many(&self, patches: &[(String, TaskPatch)]) -> Vec<Result<(), StoreError>> {
        join_all(
            patches
                .iter()
                .map(|(task_id, patch)| self.update_task(task_id, patch)),
        )
        .await
    }

    /// Issues every delete concurrently. One result per input, same order.
    async fn delete_many(&self, task_ids: &[String]) -> Vec<Result<(), StoreError>> {
        join_all(task_ids.iter().map(|task_id| self.delete_task(task_id))).await
    }
}

/// A call received by [`MemoryStore`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreCall {
    Fetch(String),
    Create(String),
    Update(String, TaskPatch),
    Delete(String),
}

#[derive(Debug, Default)]
struct MemoryState {
    tasks: Vec<Task>,
    next_id: u64,
    calls: Vec<StoreCall>,
    failing_updates: HashSet<String>,
    failing_deletes: HashSet<String>,
    unavailable: bool,
}

/// In-process store with call recording and per-task failure injection.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<MemoryState>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store already holding `tasks`.
    pub fn with_tasks(tasks: Vec<Task>) -> Self {
        let store = Self::default();
        store.state.lock().tasks = tasks;
        store
    }

    /// Every later update of `task_id` fails.
    pub fn fail_updates_for(&self, task_id: &str) {
        self.state.lock().failing_updates.insert(task_id.to_string());
    }

    /// Every later delete of `task_id` fails.
    pub fn fail_deletes_for(&self, task_id: &str) {
        self.state.lock().failing_deletes.insert(task_id.to_string());
    }

    /// Makes every call fail until switched back.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.state.lock().unavailable = unavailable;
    }

    pub fn calls(&self) -> Vec<StoreCall> {
        self.state.lock().calls.clone()
    }

    /// Calls other than fetches.
    pub fn write_calls(&self) -> Vec<StoreCall> {
        self.calls()
            .into_iter()
            .filter(|call| !matches!(call, StoreCall::Fetch(_)))
            .collect()
    }

    pub fn get(&self, task_id: &str) -> Option<Task> {
        self.state
            .lock()
            .tasks
            .iter()
            .find(|task| task.id == task_id)
            .cloned()
    }

    pub fn len(&self) -> usize {
        self.state.lock().tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn offline() -> StoreError {
    StoreError::Unavailable("memory store switched off".to_string())
}

#[async_trait]
impl TaskStore for MemoryStore {
    async fn fetch_tasks_for_user(&self, user_id: &str) -> Result<Vec<Task>, StoreError> {
        let mut state = self.state.lock();
        state.calls.push(StoreCall::Fetch(user_id.to_string()));
        if state.unavailable {
            return Err(offline());
        }
        Ok(state
            .tasks
            .iter()
            .filter(|task| task.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn create_task(
        &self,
        user_id: &str,
        task: &NewTask,
        activities: &[Activity],
    ) -> Result<String, StoreError> {
        let mut state = self.state.lock();
        state.calls.push(StoreCall::Create(task.title.clone()));
        if state.unavailable {
            return Err(offline());
        }
        state.next_id += 1;
        let id = format!("task-{}", state.next_id);
        let stored = task
            .clone()
            .into_task(id.clone(), user_id, activities.to_vec());
        state.tasks.push(stored);
        Ok(id)
    }

    async fn update_task(&self, task_id: &str, patch: &TaskPatch) -> Result<(), StoreError> {
        let mut state = self.state.lock();
        state
            .calls
            .push(StoreCall::Update(task_id.to_string(), patch.clone()));
        if state.unavailable {
            return Err(offline());
        }
        if state.failing_updates.contains(task_id) {
            return Err(StoreError::Backend(format!("update of {task_id} rejected")));
        }
        let task = state
            .tasks
            .iter_mut()
            .find(|task| task.id == task_id)
            .ok_or_else(|| StoreError::NotFound(task_id.to_string()))?;
        patch.apply_to(task);
        Ok(())
    }

    async fn delete_task(&self, task_id: &str) -> Result<(), StoreError> {
        let mut state = self.state.lock();
        state.calls.push(StoreCall::Delete(task_id.to_string()));
        if state.unavailable {
            return Err(offline());
        }
        if state.failing_deletes.contains(task_id) {
            return Err(StoreError::Backend(format!("delete of {task_id} rejected")));
        }
        let before = state.tasks.len();
        state.tasks.retain(|task| task.id != task_id);
        if state.tasks.len() == before {
            return Err(StoreError::NotFound(task_id.to_string()));
        }
        Ok(())
    }
}
