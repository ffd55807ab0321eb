// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use sqlx::{Sqlite, SqlitePool, migrate::MigrateDatabase};
use std::future::Future;
use std::path::Path;
use std::time::Duration;
use taskbuddy_common::{
    Activity, Category, FileAttachment, NewTask, Status, StoreError, Task, TaskPatch, TaskStore,
};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

const TASKS_TABLE: &str = r#"
    CREATE TABLE IF NOT EXISTS tasks (
        id TEXT PRIMARY KEY NOT NULL,
        user_id TEXT NOT NULL,
        title TEXT NOT NULL,
        description TEXT NOT NULL DEFAULT '',
        category TEXT NOT NULL,
        due_date DATE NOT NULL,
        status TEXT NOT NULL,
        activities TEXT NOT NULL DEFAULT '[]',
        files TEXT NOT NULL DEFAULT '[]',
        created_at TIMESTAMP NOT NULL
    );
"#;

/// Establishes the database connection pool.
/// If the database does not exist, it creates it, along with its directory.
pub async fn establish_connection_pool(database_url: &str) -> Result<SqlitePool> {
    if !Sqlite::database_exists(database_url).await.unwrap_or(false) {
        if let Some(dir) = database_dir(database_url) {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create database directory {}", dir.display()))?;
        }
        info!("Creating database {}", database_url);
        Sqlite::create_database(database_url)
            .await
            .context("Failed to create database")?;
    } else {
        info!("Database already exists.");
    }

    let pool = SqlitePool::connect(database_url)
        .await
        .context("Failed to connect to database")?;

    ensure_schema(&pool).await?;
    Ok(pool)
}

/// Creates the `tasks` table when missing.
pub async fn ensure_schema(pool: &SqlitePool) -> Result<()> {
    sqlx::query(TASKS_TABLE)
        .execute(pool)
        .await
        .context("Failed to create 'tasks' table")?;
    info!("'tasks' table is ready.");
    Ok(())
}

/// Parent directory of a file-backed SQLite URL.
fn database_dir(database_url: &str) -> Option<&Path> {
    let path = database_url
        .strip_prefix("sqlite://")
        .or_else(|| database_url.strip_prefix("sqlite:"))?;
    let path = path.split('?').next()?;
    if path.is_empty() || path.starts_with(":memory:") {
        return None;
    }
    Path::new(path).parent().filter(|dir| !dir.as_os_str().is_empty())
}

#[derive(sqlx::FromRow, Debug)]
struct TaskRow {
    id: String,
    user_id: String,
    title: String,
    description: String,
    category: String,
    due_date: NaiveDate,
    status: String,
    activities: String,
    files: String,
}

impl TryFrom<TaskRow> for Task {
    type Error = anyhow::Error;

    fn try_from(row: TaskRow) -> Result<Self> {
        let status: Status = row.status.parse()?;
        let category: Category = row.category.parse()?;
        let activities: Vec<Activity> =
            serde_json::from_str(&row.activities).context("Malformed activities column")?;
        let files: Vec<FileAttachment> =
            serde_json::from_str(&row.files).context("Malformed files column")?;
        Ok(Task {
            id: row.id,
            title: row.title,
            description: row.description,
            category,
            due_date: row.due_date,
            status,
            activities,
            user_id: row.user_id,
            files,
        })
    }
}

/// Retrieves the tasks owned by `user_id`, newest first.
/// Rows that no longer parse are skipped.
pub async fn fetch_tasks_for_user_from_db(pool: &SqlitePool, user_id: &str) -> Result<Vec<Task>> {
    let rows = sqlx::query_as::<_, TaskRow>(
        "SELECT id, user_id, title, description, category, due_date, status, activities, files \
         FROM tasks WHERE user_id = ? ORDER BY created_at DESC, rowid DESC;",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await
    .with_context(|| format!("Failed to retrieve tasks of user {user_id} from DB"))?;

    let tasks = rows
        .into_iter()
        .filter_map(|row| {
            let id = row.id.clone();
            match Task::try_from(row) {
                Ok(task) => Some(task),
                Err(e) => {
                    warn!("Skipping task {}: {:#}", id, e);
                    None
                }
            }
        })
        .collect();
    Ok(tasks)
}

/// Inserts a new task and returns its generated id.
pub async fn create_task_in_db(
    pool: &SqlitePool,
    user_id: &str,
    task: &NewTask,
    activities: &[Activity],
) -> Result<String> {
    let id = Uuid::new_v4().to_string();
    let activities = serde_json::to_string(activities).context("Failed to encode activities")?;
    let files = serde_json::to_string(&task.files).context("Failed to encode files")?;

    debug!(
        "Insert values: id={}, user_id={}, title={}, category={}, due_date={}, status={}",
        id,
        user_id,
        task.title,
        task.category.as_str(),
        task.due_date,
        task.status
    );

    sqlx::query(
        "INSERT INTO tasks (id, user_id, title, description, category, due_date, status, activities, files, created_at) \
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(&id)
    .bind(user_id)
    .bind(task.title.trim())
    .bind(&task.description)
    .bind(task.category.as_str())
    .bind(task.due_date)
    .bind(task.status.label())
    .bind(&activities)
    .bind(&files)
    .bind(Utc::now())
    .execute(pool)
    .await
    .context("Failed to insert task into DB")?;

    Ok(id)
}

/// Applies the fields present in `patch`.
/// Returns false if no task with the given ID was found.
pub async fn update_task_in_db(pool: &SqlitePool, task_id: &str, patch: &TaskPatch) -> Result<bool> {
    let activities = patch
        .activities
        .as_ref()
        .map(serde_json::to_string)
        .transpose()
        .context("Failed to encode activities")?;
    let files = patch
        .files
        .as_ref()
        .map(serde_json::to_string)
        .transpose()
        .context("Failed to encode files")?;

    let result = sqlx::query(
        "UPDATE tasks SET \
            title = COALESCE(?, title), \
            description = COALESCE(?, description), \
            category = COALESCE(?, category), \
            due_date = COALESCE(?, due_date), \
            status = COALESCE(?, status), \
            activities = COALESCE(?, activities), \
            files = COALESCE(?, files) \
         WHERE id = ?",
    )
    .bind(patch.title.as_deref().map(str::trim))
    .bind(patch.description.as_deref())
    .bind(patch.category.map(Category::as_str))
    .bind(patch.due_date)
    .bind(patch.status.map(Status::label))
    .bind(activities)
    .bind(files)
    .bind(task_id)
    .execute(pool)
    .await
    .with_context(|| format!("Failed to update task with ID: {task_id}"))?;

    debug!("Updated {} rows for task ID: {}", result.rows_affected(), task_id);
    Ok(result.rows_affected() > 0)
}

/// Deletes a task.
/// Returns false if no task with the given ID was found.
pub async fn delete_task_in_db(pool: &SqlitePool, task_id: &str) -> Result<bool> {
    let result = sqlx::query("DELETE FROM tasks WHERE id = ?")
        .bind(task_id)
        .execute(pool)
        .await
        .with_context(|| format!("Failed to delete task with ID: {task_id}"))?;

    info!("Deleted {} rows for task ID: {}", result.rows_affected(), task_id);
    Ok(result.rows_affected() > 0)
}

/// [`TaskStore`] over the SQLite pool.
#[derive(Debug, Clone)]
pub struct SqliteTaskStore {
    pool: SqlitePool,
    timeout: Option<Duration>,
}

impl SqliteTaskStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            pool,
            timeout: None,
        }
    }

    /// Every store call taking longer than `timeout` fails as unavailable.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    async fn run<T, F>(&self, operation: &str, call: F) -> Result<T, StoreError>
    where
        F: Future<Output = Result<T>> + Send,
    {
        let result = match self.timeout {
            Some(limit) => match tokio::time::timeout(limit, call).await {
                Ok(result) => result,
                Err(_) => {
                    error!("Store call {} timed out after {:?}", operation, limit);
                    return Err(StoreError::Unavailable(format!(
                        "{operation} timed out after {}ms",
                        limit.as_millis()
                    )));
                }
            },
            None => call.await,
        };
        result.map_err(|e| {
            error!("Store call {} failed: {:?}", operation, e);
            StoreError::Backend(format!("{e:#}"))
        })
    }
}

#[async_trait]
impl TaskStore for SqliteTaskStore {
    async fn fetch_tasks_for_user(&self, user_id: &str) -> Result<Vec<Task>, StoreError> {
        self.run("fetch", fetch_tasks_for_user_from_db(&self.pool, user_id))
            .await
    }

    async fn create_task(
        &self,
        user_id: &str,
        task: &NewTask,
        activities: &[Activity],
    ) -> Result<String, StoreError> {
        self.run("create", create_task_in_db(&self.pool, user_id, task, activities))
            .await
    }

    async fn update_task(&self, task_id: &str, patch: &TaskPatch) -> Result<(), StoreError> {
        let found = self
            .run("update", update_task_in_db(&self.pool, task_id, patch))
            .await?;
        if !found {
            return Err(StoreError::NotFound(task_id.to_string()));
        }
        Ok(())
    }

    async fn delete_task(&self, task_id: &str) -> Result<(), StoreError> {
        let found = self
            .run("delete", delete_task_in_db(&self.pool, task_id))
            .await?;
        if !found {
            return Err(StoreError::NotFound(task_id.to_string()));
        }
        Ok(())
    }
}
