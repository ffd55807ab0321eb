// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.
use crate::state::AppState;
use axum::{
    extract::{Json, Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use taskbuddy_common::{
    Activity, Board, BoardError, BucketedTasks, BulkOutcome, DragController, DragMode, NewTask,
    Notice, Selection, Sensor, Status, StoreError, Task, TaskFilter, TaskPatch, TransitionOutcome,
    TransitionRequest,
};
use tracing::{debug, info};

/// Body of every board mutation: its result plus the notices it raised.
#[derive(Serialize, Debug)]
pub struct Mutation<T> {
    pub result: T,
    pub notices: Vec<Notice>,
}

/// Drains the board's notices into the response. On failure the notice
/// repeats the error message, so only the error is returned.
fn respond<T>(board: &mut Board, result: Result<T, BoardError>) -> Result<Json<Mutation<T>>, AppError> {
    let notices = board.drain_notices();
    let result = result?;
    Ok(Json(Mutation { result, notices }))
}

#[derive(Serialize, Debug)]
pub struct BoardView {
    pub buckets: BucketedTasks,
    pub selection: Selection,
}

#[derive(Deserialize, Debug)]
pub struct MovePayload {
    pub task_id: String,
    #[serde(default)]
    pub over_id: Option<String>,
    #[serde(default)]
    pub mode: Option<DragMode>,
}

#[derive(Serialize, Debug)]
pub struct MoveResult {
    /// The resolved move, absent when the drop had no effect.
    pub transition: Option<TransitionRequest>,
    pub outcome: TransitionOutcome,
}

#[derive(Deserialize, Debug)]
pub struct StatusPayload {
    pub status: Status,
}

#[derive(Deserialize, Debug)]
pub struct TogglePayload {
    pub task_id: String,
}

#[derive(Serialize, Debug)]
pub struct ToggleResult {
    pub selected: bool,
    pub selection: Selection,
}

/// Handler for listing a user's tasks as the store has them.
pub async fn list_tasks(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<Vec<Task>>, AppError> {
    let tasks = state.store().fetch_tasks_for_user(&user_id).await?;
    info!("Successfully retrieved {} tasks for user {}.", tasks.len(), user_id);
    Ok(Json(tasks))
}

/// Handler for creating a new task.
pub async fn create_task(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Json(payload): Json<NewTask>,
) -> Result<(StatusCode, Json<Mutation<Task>>), AppError> {
    debug!("Received request to create task {:?} for user {}", payload.title, user_id);
    let board = state.board(&user_id).await?;
    let mut board = board.lock().await;
    let result = board.create_task(state.store(), payload).await;
    let created = respond(&mut board, result)?;
    info!("Task created successfully with ID: {}", created.result.id);
    Ok((StatusCode::CREATED, created))
}

/// Handler for editing a task.
pub async fn update_task(
    State(state): State<AppState>,
    Path((user_id, task_id)): Path<(String, String)>,
    Json(patch): Json<TaskPatch>,
) -> Result<Json<Mutation<Task>>, AppError> {
    debug!("Received request to update task {}", task_id);
    let board = state.board(&user_id).await?;
    let mut board = board.lock().await;
    let result = board.update_task(state.store(), &task_id, patch).await;
    respond(&mut board, result)
}

/// Handler for deleting a task by ID.
pub async fn delete_task(
    State(state): State<AppState>,
    Path((user_id, task_id)): Path<(String, String)>,
) -> Result<StatusCode, AppError> {
    debug!("Attempting to delete task with ID: {}", task_id);
    let board = state.board(&user_id).await?;
    let mut board = board.lock().await;
    let result = board.delete_task(state.store(), &task_id).await;
    respond(&mut board, result)?;
    info!("Task with ID {} deleted successfully.", task_id);
    Ok(StatusCode::NO_CONTENT)
}

/// Handler for the status control of a single task.
pub async fn set_task_status(
    State(state): State<AppState>,
    Path((user_id, task_id)): Path<(String, String)>,
    Json(payload): Json<StatusPayload>,
) -> Result<Json<Mutation<TransitionOutcome>>, AppError> {
    let board = state.board(&user_id).await?;
    let mut board = board.lock().await;
    let result = board.set_status(state.store(), &task_id, payload.status).await;
    respond(&mut board, result)
}

/// Handler for the activity log of a task.
pub async fn task_activities(
    State(state): State<AppState>,
    Path((user_id, task_id)): Path<(String, String)>,
) -> Result<Json<Vec<Activity>>, AppError> {
    let board = state.board(&user_id).await?;
    let board = board.lock().await;
    let task = board
        .task(&task_id)
        .ok_or_else(|| BoardError::TaskNotFound(task_id.clone()))?;
    Ok(Json(task.activities.clone()))
}

/// Handler for the bucketed board, optionally filtered.
pub async fn get_board(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Query(filter): Query<TaskFilter>,
) -> Result<Json<BoardView>, AppError> {
    let board = state.board(&user_id).await?;
    let board = board.lock().await;
    let buckets = board.view(&filter, Utc::now().date_naive());
    debug!("Board of {} shows {} of {} tasks.", user_id, buckets.len(), board.tasks().len());
    Ok(Json(BoardView {
        buckets,
        selection: board.selection().clone(),
    }))
}

/// Handler for re-fetching a board from the store.
pub async fn refresh_board(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<Mutation<BucketedTasks>>, AppError> {
    let board = state.board(&user_id).await?;
    let mut board = board.lock().await;
    let result = board.refresh(state.store()).await;
    let tasks = board.tasks().clone();
    respond(&mut board, result.map(|()| tasks))
}

/// Handler for a drop: resolves the target and applies the transition.
pub async fn move_task(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Json(payload): Json<MovePayload>,
) -> Result<Json<Mutation<MoveResult>>, AppError> {
    let board = state.board(&user_id).await?;
    let mut board = board.lock().await;

    let mut drag = DragController::new(payload.mode.unwrap_or_default());
    drag.on_drag_start(board.tasks(), &payload.task_id, Sensor::Pointer)?;
    let Some(request) = drag.on_drag_end(board.tasks(), payload.over_id.as_deref()) else {
        debug!("Drop of {} had no effect.", payload.task_id);
        return respond(
            &mut board,
            Ok(MoveResult {
                transition: None,
                outcome: TransitionOutcome::Skipped,
            }),
        );
    };

    let result = board
        .apply_transition(state.store(), &request)
        .await
        .map(|outcome| MoveResult {
            transition: Some(request),
            outcome,
        });
    respond(&mut board, result)
}

pub async fn get_selection(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<Selection>, AppError> {
    let board = state.board(&user_id).await?;
    let board = board.lock().await;
    Ok(Json(board.selection().clone()))
}

pub async fn clear_selection(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<StatusCode, AppError> {
    let board = state.board(&user_id).await?;
    board.lock().await.clear_selection();
    Ok(StatusCode::NO_CONTENT)
}

pub async fn toggle_selection(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Json(payload): Json<TogglePayload>,
) -> Result<Json<ToggleResult>, AppError> {
    let board = state.board(&user_id).await?;
    let mut board = board.lock().await;
    let selected = board.toggle_select(&payload.task_id)?;
    Ok(Json(ToggleResult {
        selected,
        selection: board.selection().clone(),
    }))
}

/// Handler for the bulk status change of the selection.
pub async fn bulk_status(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Json(payload): Json<StatusPayload>,
) -> Result<Json<Mutation<BulkOutcome>>, AppError> {
    let board = state.board(&user_id).await?;
    let mut board = board.lock().await;
    let outcome = board.bulk_set_status(state.store(), payload.status).await;
    respond(&mut board, Ok(outcome))
}

/// Handler for the bulk delete of the selection.
pub async fn bulk_delete(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<Mutation<BulkOutcome>>, AppError> {
    let board = state.board(&user_id).await?;
    let mut board = board.lock().await;
    let outcome = board.bulk_delete(state.store()).await;
    respond(&mut board, Ok(outcome))
}

// --- Custom Error Handling ---

/// Our custom error type for the application.
#[derive(Debug)]
pub struct AppError {
    code: StatusCode,
    message: String,
}

impl AppError {
    pub fn new(code: StatusCode, message: &str) -> Self {
        Self {
            code,
            message: message.to_string(),
        }
    }

    pub fn code(&self) -> StatusCode {
        self.code
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Allows converting an `anyhow::Error` into our `AppError`.
impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        // Log the internal error for debugging.
        tracing::error!("Internal server error: {:?}", err);
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "An internal error occurred.")
    }
}

/// Maps board errors: caller mistakes are 4xx, store failures 502.
impl From<BoardError> for AppError {
    fn from(err: BoardError) -> Self {
        let code = match &err {
            BoardError::TaskNotFound(_) => StatusCode::NOT_FOUND,
            BoardError::Store(_) => StatusCode::BAD_GATEWAY,
            _ => StatusCode::BAD_REQUEST,
        };
        Self::new(code, &err.to_string())
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        BoardError::from(err).into()
    }
}

/// Allows Axum to convert our `AppError` into an HTTP `Response`.
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        tracing::error!(
            "Responding with error: status_code={}, message={}",
            self.code.as_u16(),
            self.message
        );
        (
            self.code,
            Json(serde_json::json!({ "error": self.message })),
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use std::sync::Arc;
    use taskbuddy_common::{BucketKey, Category, MemoryStore, NoticeLevel, StoreCall};

    fn task(id: &str, status: Status) -> Task {
        Task {
            id: id.to_string(),
            title: format!("Task {id}"),
            description: String::new(),
            category: Category::Work,
            due_date: NaiveDate::from_ymd_opt(2030, 1, 1).unwrap(),
            status,
            activities: Vec::new(),
            user_id: "u1".to_string(),
            files: Vec::new(),
        }
    }

    fn setup(tasks: Vec<Task>) -> (Arc<MemoryStore>, AppState) {
        let store = Arc::new(MemoryStore::with_tasks(tasks));
        let state = AppState::new(store.clone());
        (store, state)
    }

    fn move_payload(task_id: &str, over_id: Option<&str>) -> Json<MovePayload> {
        Json(MovePayload {
            task_id: task_id.to_string(),
            over_id: over_id.map(str::to_string),
            mode: None,
        })
    }

    #[tokio::test]
    async fn test_create_task_validation_short_title() {
        // Arrange
        let (store, state) = setup(Vec::new());
        let payload = Json(NewTask {
            title: "ab".to_string(),
            description: String::new(),
            category: Category::Work,
            due_date: Utc::now().date_naive(),
            status: Status::Todo,
            files: Vec::new(),
        });

        // Act
        let result = create_task(State(state), Path("u1".to_string()), payload).await;

        // Assert
        let err = result.unwrap_err();
        assert_eq!(err.code, StatusCode::BAD_REQUEST);
        assert!(err.message.contains("title"));
        assert!(store.write_calls().is_empty());
    }

    #[tokio::test]
    async fn test_move_onto_itself_is_skipped() {
        let (store, state) = setup(vec![task("t1", Status::Todo)]);

        let Json(response) = move_task(
            State(state),
            Path("u1".to_string()),
            move_payload("t1", Some("t1")),
        )
        .await
        .unwrap();

        assert!(response.result.transition.is_none());
        assert_eq!(response.result.outcome, TransitionOutcome::Skipped);
        assert!(store.write_calls().is_empty());
    }

    #[tokio::test]
    async fn test_move_unknown_task_is_not_found() {
        let (_, state) = setup(vec![task("t1", Status::Todo)]);

        let err = move_task(
            State(state),
            Path("u1".to_string()),
            move_payload("zz", Some("completed")),
        )
        .await
        .unwrap_err();

        assert_eq!(err.code, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_rejected_move_is_bad_gateway_and_rolled_back() {
        let (store, state) = setup(vec![task("t1", Status::Todo)]);
        store.fail_updates_for("t1");

        let err = move_task(
            State(state.clone()),
            Path("u1".to_string()),
            move_payload("t1", Some("completed")),
        )
        .await
        .unwrap_err();

        assert_eq!(err.code, StatusCode::BAD_GATEWAY);
        let board = state.board("u1").await.unwrap();
        let board = board.lock().await;
        assert_eq!(board.tasks().locate("t1"), Some((BucketKey::Todo, 0)));
        assert!(board.notices().is_empty());
    }

    #[tokio::test]
    async fn test_bulk_status_reports_notices() {
        let (store, state) = setup(vec![task("t1", Status::Todo), task("t2", Status::Todo)]);
        store.fail_updates_for("t2");
        for id in ["t1", "t2"] {
            toggle_selection(
                State(state.clone()),
                Path("u1".to_string()),
                Json(TogglePayload {
                    task_id: id.to_string(),
                }),
            )
            .await
            .unwrap();
        }

        let Json(response) = bulk_status(
            State(state),
            Path("u1".to_string()),
            Json(StatusPayload {
                status: Status::Completed,
            }),
        )
        .await
        .unwrap();

        assert_eq!(response.result.succeeded, ["t1".to_string()]);
        assert_eq!(response.notices.len(), 1);
        assert_eq!(response.notices[0].level, NoticeLevel::Error);
        assert_eq!(
            store.write_calls().len(),
            2,
            "one update per selected task: {:?}",
            store.write_calls()
        );
        assert!(matches!(store.write_calls()[0], StoreCall::Update(_, _)));
    }

    #[test]
    fn test_board_error_status_codes() {
        let not_found: AppError = BoardError::TaskNotFound("t1".to_string()).into();
        assert_eq!(not_found.code(), StatusCode::NOT_FOUND);

        let invalid: AppError = BoardError::UnknownStatus("DONE".to_string()).into();
        assert_eq!(invalid.code(), StatusCode::BAD_REQUEST);

        let store: AppError = StoreError::Unavailable("offline".to_string()).into();
        assert_eq!(store.code(), StatusCode::BAD_GATEWAY);
        assert_eq!(store.message(), "task store unavailable: offline");
    }
}
