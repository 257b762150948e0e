use crate::handlers;
use crate::state::AppState;
use axum::{
    Router,
    routing::{get, post},
};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::index))
        .route("/tasks", post(handlers::form_create))
        .route("/tasks/:id/toggle", post(handlers::form_toggle))
        .route("/tasks/:id/delete", post(handlers::form_delete))
        .route("/tasks/:id/breakdown", post(handlers::form_breakdown))
        .route(
            "/tasks/:id/subtasks/:subtask_id/toggle",
            post(handlers::form_toggle_subtask),
        )
        .route("/api/tasks", get(handlers::list_tasks).post(handlers::create_task))
        .route("/api/tasks/:id", axum::routing::delete(handlers::delete_task))
        .route("/api/tasks/:id/toggle", post(handlers::toggle_task))
        .route("/api/tasks/:id/breakdown", post(handlers::breakdown_task))
        .route(
            "/api/tasks/:id/subtasks/:subtask_id/toggle",
            post(handlers::toggle_subtask),
        )
        .route("/api/today", get(handlers::get_today))
        .route("/api/progress", get(handlers::get_progress))
        .route("/api/calendar", get(handlers::get_calendar))
        .route("/api/templates", get(handlers::get_templates))
        .with_state(state)
}
