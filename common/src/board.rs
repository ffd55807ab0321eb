// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.
//! The board: one user's bucketed tasks, selection and pending notices.
//!
//! `Board` is the single owner of that state. Every mutation goes through its
//! methods, which apply the change locally first and then reconcile with the
//! [`TaskStore`], undoing the local change when the store call fails.

use crate::bucket::{BucketKey, BucketedTasks, partition};
use crate::error::BoardError;
use crate::filter::TaskFilter;
use crate::notice::{Notice, Notices};
use crate::selection::Selection;
use crate::store::TaskStore;
use crate::task::{ACTION_TASK_CREATED, ACTION_TASK_UPDATED, Activity, NewTask, Task, TaskPatch};
use chrono::{NaiveDate, Utc};
use tracing::{debug, error, info};

#[derive(Debug, Clone)]
pub struct Board {
    user_id: String,
    pub(crate) tasks: BucketedTasks,
    pub(crate) selection: Selection,
    notices: Notices,
}

impl Board {
    /// An empty board for `user_id`.
    pub fn new(user_id: impl Into<String>) -> Self {
        Self::with_tasks(user_id, Vec::new())
    }

    pub fn with_tasks(user_id: impl Into<String>, tasks: Vec<Task>) -> Self {
        Self {
            user_id: user_id.into(),
            tasks: partition(tasks),
            selection: Selection::default(),
            notices: Notices::default(),
        }
    }

    /// Fetches the user's tasks and partitions them into buckets.
    pub async fn load<S>(store: &S, user_id: &str) -> Result<Self, BoardError>
    where
        S: TaskStore + ?Sized,
    {
        let tasks = store.fetch_tasks_for_user(user_id).await?;
        info!("Loaded {} tasks for user {}.", tasks.len(), user_id);
        Ok(Self::with_tasks(user_id, tasks))
    }

    /// Re-fetches from the store, replacing the local buckets.
    pub async fn refresh<S>(&mut self, store: &S) -> Result<(), BoardError>
    where
        S: TaskStore + ?Sized,
    {
        match store.fetch_tasks_for_user(&self.user_id).await {
            Ok(tasks) => {
                debug!("Refreshed board of {} with {} tasks.", self.user_id, tasks.len());
                self.tasks = partition(tasks);
                let stale = self.selection.prune(&self.tasks);
                if !stale.is_empty() {
                    debug!("Dropped {} stale selection entries.", stale.len());
                }
                Ok(())
            }
            Err(err) => {
                self.notify_error(format!("Could not load tasks: {err}"));
                Err(err.into())
            }
        }
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn tasks(&self) -> &BucketedTasks {
        &self.tasks
    }

    pub fn task(&self, task_id: &str) -> Option<&Task> {
        self.tasks.get(task_id)
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    /// The buckets restricted to tasks matching `filter`, in board order.
    pub fn view(&self, filter: &TaskFilter, today: NaiveDate) -> BucketedTasks {
        if filter.is_empty() {
            return self.tasks.clone();
        }
        partition(
            self.tasks
                .iter()
                .filter(|task| filter.matches(task, today))
                .cloned(),
        )
    }

    pub fn notices(&self) -> &Notices {
        &self.notices
    }

    pub fn drain_notices(&mut self) -> Vec<Notice> {
        self.notices.drain()
    }

    pub(crate) fn notify_success(&mut self, message: String) {
        info!("{}", message);
        self.notices.push(Notice::success(message));
    }

    pub(crate) fn notify_error(&mut self, message: String) {
        error!("{}", message);
        self.notices.push(Notice::error(message));
    }

    /// Puts `original` back at `bucket[index]`, dropping whatever copy of the
    /// same id currently sits on the board.
    pub(crate) fn restore(&mut self, original: Task, bucket: BucketKey, index: usize) {
        self.tasks.remove(&original.id);
        self.tasks.insert(bucket, Some(index), original);
    }

    /// Validates and persists a new task, then shows it at the top of its
    /// column. The store assigns the id, so nothing is shown before it answers.
    pub async fn create_task<S>(&mut self, store: &S, new_task: NewTask) -> Result<Task, BoardError>
    where
        S: TaskStore + ?Sized,
    {
        new_task.validate(Utc::now().date_naive())?;

        let activities = vec![Activity::now(ACTION_TASK_CREATED, &self.user_id)];
        let id = match store.create_task(&self.user_id, &new_task, &activities).await {
            Ok(id) => id,
            Err(err) => {
                self.notify_error(format!("Could not create task: {err}"));
                return Err(err.into());
            }
        };

        let task = new_task.into_task(id, &self.user_id, activities);
        self.tasks
            .insert(BucketKey::from(task.status), Some(0), task.clone());
        self.notify_success(format!("Task \"{}\" created.", task.title));
        Ok(task)
    }

    /// Edits a task in place. A status change moves it to the end of its new
    /// column. The whole edit, activity entry included, is undone if the
    /// store rejects it.
    pub async fn update_task<S>(
        &mut self,
        store: &S,
        task_id: &str,
        mut patch: TaskPatch,
    ) -> Result<Task, BoardError>
    where
        S: TaskStore + ?Sized,
    {
        patch.validate()?;
        // The log is owned by the board.
        patch.activities = None;

        let (from, from_index) = self
            .tasks
            .locate(task_id)
            .ok_or_else(|| BoardError::TaskNotFound(task_id.to_string()))?;
        if patch.is_empty() {
            return Ok(self.tasks.bucket(from)[from_index].clone());
        }

        let Some((_, _, original)) = self.tasks.remove(task_id) else {
            return Err(BoardError::TaskNotFound(task_id.to_string()));
        };
        let mut updated = original.clone();
        patch.apply_to(&mut updated);
        updated
            .activities
            .push(Activity::now(ACTION_TASK_UPDATED, &self.user_id));

        let to = BucketKey::from(updated.status);
        let index = (to == from).then_some(from_index);
        self.tasks.insert(to, index, updated.clone());

        patch.activities = Some(updated.activities.clone());
        match store.update_task(task_id, &patch).await {
            Ok(()) => {
                info!("Task {} updated.", task_id);
                Ok(updated)
            }
            Err(err) => {
                self.restore(original, from, from_index);
                self.notify_error(format!("Could not update task: {err}"));
                Err(err.into())
            }
        }
    }

    /// Removes a task, putting it back where it was if the store refuses.
    pub async fn delete_task<S>(&mut self, store: &S, task_id: &str) -> Result<(), BoardError>
    where
        S: TaskStore + ?Sized,
    {
        let (from, from_index, original) = self
            .tasks
            .remove(task_id)
            .ok_or_else(|| BoardError::TaskNotFound(task_id.to_string()))?;

        match store.delete_task(task_id).await {
            Ok(()) => {
                if self.selection.contains(task_id) {
                    self.selection.toggle(task_id);
                }
                self.notify_success(format!("Task \"{}\" deleted.", original.title));
                Ok(())
            }
            Err(err) => {
                self.restore(original, from, from_index);
                self.notify_error(format!("Could not delete task: {err}"));
                Err(err.into())
            }
        }
    }

    /// Flips selection of a task. Only tasks on the board can be selected;
    /// deselecting always succeeds.
    pub fn toggle_select(&mut self, task_id: &str) -> Result<bool, BoardError> {
        if !self.selection.contains(task_id) && !self.tasks.contains(task_id) {
            return Err(BoardError::TaskNotFound(task_id.to_string()));
        }
        Ok(self.selection.toggle(task_id))
    }

    pub fn clear_selection(&mut self) {
        self.selection.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::DueFilter;
    use crate::store::{MemoryStore, StoreCall};
    use crate::task::{Category, Status};
    use chrono::Duration;

    fn task(id: &str, status: Status, category: Category) -> Task {
        Task {
            id: id.to_string(),
            title: format!("Task {id}"),
            description: String::new(),
            category,
            due_date: NaiveDate::from_ymd_opt(2030, 1, 1).unwrap(),
            status,
            activities: Vec::new(),
            user_id: "u1".to_string(),
            files: Vec::new(),
        }
    }

    fn new_task(title: &str, status: Status) -> NewTask {
        NewTask {
            title: title.to_string(),
            description: "Details".to_string(),
            category: Category::Work,
            due_date: Utc::now().date_naive() + Duration::days(3),
            status,
            files: Vec::new(),
        }
    }

    fn ids(tasks: &[Task]) -> Vec<&str> {
        tasks.iter().map(|t| t.id.as_str()).collect()
    }

    fn seeded_store() -> MemoryStore {
        MemoryStore::with_tasks(vec![
            task("t1", Status::Todo, Category::Work),
            task("t2", Status::Todo, Category::Personal),
            task("t3", Status::Completed, Category::Work),
            Task {
                user_id: "someone-else".to_string(),
                ..task("t4", Status::Todo, Category::Work)
            },
        ])
    }

    #[tokio::test]
    async fn test_load_partitions_only_own_tasks() {
        let store = seeded_store();
        let board = Board::load(&store, "u1").await.unwrap();

        assert_eq!(ids(board.tasks().bucket(BucketKey::Todo)), ["t1", "t2"]);
        assert_eq!(ids(board.tasks().bucket(BucketKey::Completed)), ["t3"]);
        assert_eq!(board.tasks().len(), 3);
    }

    #[tokio::test]
    async fn test_load_failure_is_a_store_error() {
        let store = seeded_store();
        store.set_unavailable(true);
        let err = Board::load(&store, "u1").await.unwrap_err();
        assert!(!err.is_validation());
    }

    #[tokio::test]
    async fn test_create_task_persists_and_prepends() {
        let store = seeded_store();
        let mut board = Board::load(&store, "u1").await.unwrap();

        let created = board
            .create_task(&store, new_task("Plan sprint", Status::Todo))
            .await
            .unwrap();

        assert_eq!(board.tasks().bucket(BucketKey::Todo)[0].id, created.id);
        assert_eq!(created.activities.len(), 1);
        assert_eq!(created.activities[0].action, ACTION_TASK_CREATED);
        assert_eq!(created.activities[0].performed_by, "u1");
        assert_eq!(store.get(&created.id).unwrap().title, "Plan sprint");
        assert_eq!(board.drain_notices().len(), 1);
    }

    #[tokio::test]
    async fn test_create_task_rejects_invalid_input_without_store_call() {
        let store = seeded_store();
        let mut board = Board::load(&store, "u1").await.unwrap();

        let err = board
            .create_task(&store, new_task("no", Status::Todo))
            .await
            .unwrap_err();
        assert!(err.is_validation());
        assert!(store.write_calls().is_empty());
        assert_eq!(board.tasks().len(), 3);
    }

    #[tokio::test]
    async fn test_update_task_moves_bucket_and_logs_activity() {
        let store = seeded_store();
        let mut board = Board::load(&store, "u1").await.unwrap();

        let patch = TaskPatch {
            title: Some("Renamed task".to_string()),
            status: Some(Status::InProgress),
            ..TaskPatch::default()
        };
        let updated = board.update_task(&store, "t1", patch).await.unwrap();

        assert_eq!(updated.title, "Renamed task");
        assert_eq!(ids(board.tasks().bucket(BucketKey::InProgress)), ["t1"]);
        assert_eq!(ids(board.tasks().bucket(BucketKey::Todo)), ["t2"]);
        assert_eq!(updated.activities.last().unwrap().action, ACTION_TASK_UPDATED);

        let stored = store.get("t1").unwrap();
        assert_eq!(stored.status, Status::InProgress);
        assert_eq!(stored.activities.len(), 1);
    }

    #[tokio::test]
    async fn test_update_task_keeps_position_when_status_unchanged() {
        let store = seeded_store();
        let mut board = Board::load(&store, "u1").await.unwrap();

        let patch = TaskPatch {
            category: Some(Category::Personal),
            ..TaskPatch::default()
        };
        board.update_task(&store, "t1", patch).await.unwrap();
        assert_eq!(ids(board.tasks().bucket(BucketKey::Todo)), ["t1", "t2"]);
    }

    #[tokio::test]
    async fn test_failed_update_restores_task_and_activities() {
        let store = seeded_store();
        store.fail_updates_for("t2");
        let mut board = Board::load(&store, "u1").await.unwrap();
        let before = board.tasks().clone();

        let patch = TaskPatch {
            status: Some(Status::Completed),
            ..TaskPatch::default()
        };
        let err = board.update_task(&store, "t2", patch).await.unwrap_err();

        assert!(!err.is_validation());
        assert_eq!(board.tasks(), &before);
        let notices = board.drain_notices();
        assert_eq!(notices.len(), 1);
        assert_eq!(notices[0].level, crate::notice::NoticeLevel::Error);
    }

    #[tokio::test]
    async fn test_update_unknown_task_is_validation_error() {
        let store = seeded_store();
        let mut board = Board::load(&store, "u1").await.unwrap();
        let err = board
            .update_task(&store, "nope", TaskPatch::status(Status::Completed))
            .await
            .unwrap_err();
        assert_eq!(err, BoardError::TaskNotFound("nope".to_string()));
        assert!(store.write_calls().is_empty());
    }

    #[tokio::test]
    async fn test_delete_task_and_restore_on_failure() {
        let store = seeded_store();
        store.fail_deletes_for("t1");
        let mut board = Board::load(&store, "u1").await.unwrap();

        board.delete_task(&store, "t2").await.unwrap();
        assert_eq!(ids(board.tasks().bucket(BucketKey::Todo)), ["t1"]);
        assert!(store.get("t2").is_none());

        assert!(board.delete_task(&store, "t1").await.is_err());
        assert_eq!(ids(board.tasks().bucket(BucketKey::Todo)), ["t1"]);
        assert_eq!(
            store.write_calls(),
            vec![
                StoreCall::Delete("t2".to_string()),
                StoreCall::Delete("t1".to_string())
            ]
        );
    }

    #[tokio::test]
    async fn test_refresh_prunes_selection() {
        let store = seeded_store();
        let mut board = Board::load(&store, "u1").await.unwrap();
        board.toggle_select("t1").unwrap();
        board.toggle_select("t3").unwrap();

        // Another session removes t3.
        store.delete_task("t3").await.unwrap();
        board.refresh(&store).await.unwrap();

        assert_eq!(board.selection().ids(), ["t1".to_string()]);
        assert!(!board.tasks().contains("t3"));
    }

    #[test]
    fn test_toggle_select_requires_task_on_board() {
        let mut board = Board::with_tasks("u1", vec![task("t1", Status::Todo, Category::Work)]);
        assert!(board.toggle_select("t1").unwrap());
        assert_eq!(
            board.toggle_select("ghost"),
            Err(BoardError::TaskNotFound("ghost".to_string()))
        );
        assert!(!board.toggle_select("t1").unwrap());
        assert!(board.selection().is_empty());
    }

    #[test]
    fn test_view_applies_filter_and_keeps_order() {
        let board = Board::with_tasks(
            "u1",
            vec![
                task("t1", Status::Todo, Category::Work),
                task("t2", Status::Todo, Category::Personal),
                task("t3", Status::Todo, Category::Work),
            ],
        );
        let today = NaiveDate::from_ymd_opt(2030, 1, 1).unwrap();

        let filter = TaskFilter {
            category: Some(Category::Work),
            due: Some(DueFilter::Today),
            search: None,
        };
        let view = board.view(&filter, today);
        assert_eq!(ids(view.bucket(BucketKey::Todo)), ["t1", "t3"]);

        let everything = board.view(&TaskFilter::default(), today);
        assert_eq!(&everything, board.tasks());
    }
}
