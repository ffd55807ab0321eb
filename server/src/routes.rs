// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.
use crate::handlers;
use crate::state::AppState;
use axum::{
    Router,
    routing::{get, patch, post},
};

/// Creates and configures the application router.
pub fn create_router(state: AppState) -> Router {
    let user_routes = Router::new()
        // Raw store listing and task creation
        .route("/tasks", get(handlers::list_tasks).post(handlers::create_task))
        .route(
            "/tasks/{task_id}",
            patch(handlers::update_task).delete(handlers::delete_task),
        )
        .route("/tasks/{task_id}/status", post(handlers::set_task_status))
        .route("/tasks/{task_id}/activities", get(handlers::task_activities))
        // Bucketed board and drag-and-drop
        .route("/board", get(handlers::get_board))
        .route("/board/refresh", post(handlers::refresh_board))
        .route("/board/move", post(handlers::move_task))
        // Selection and bulk actions
        .route(
            "/selection",
            get(handlers::get_selection).delete(handlers::clear_selection),
        )
        .route("/selection/toggle", post(handlers::toggle_selection))
        .route("/selection/status", post(handlers::bulk_status))
        .route("/selection/delete", post(handlers::bulk_delete));

    Router::new()
        .nest("/api/users/{user_id}", user_routes)
        // Adds the shared state to the application
        .with_state(state)
}
