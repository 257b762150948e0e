use crate::actions::{self, find_task};
use crate::calendar::{CalendarPosition, date_key};
use crate::errors::{AppError, TaskError};
use crate::models::{
    BreakdownResponse, CreateTaskForm, CreateTaskRequest, DashboardResponse, Frequency, Task,
    TaskPatch, TodayResponse,
};
use crate::progress::{build_dashboard_at, build_today_at};
use crate::state::AppState;
use crate::templates::TASK_TEMPLATES;
use crate::ui::{Page, Tab, render_index};
use axum::{
    Form, Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{Html, Redirect},
};
use chrono::{Local, NaiveDate, Utc};
use serde::Deserialize;
use tracing::{error, info, warn};

#[derive(Debug, Deserialize, Default)]
pub struct IndexParams {
    pub tab: Option<String>,
    pub text: Option<String>,
}

pub async fn index(State(state): State<AppState>, Query(params): Query<IndexParams>) -> Html<String> {
    let tasks = state.snapshot();
    let page = Page {
        today: today(),
        tasks: &tasks,
        tab: Tab::parse(params.tab.as_deref()),
        prefill: params.text.as_deref().unwrap_or_default(),
        analyzing: state.breakdown.current(),
    };
    Html(render_index(&page))
}

pub async fn list_tasks(State(state): State<AppState>) -> Json<Vec<Task>> {
    Json(state.snapshot())
}

pub async fn get_today(State(state): State<AppState>) -> Json<TodayResponse> {
    Json(build_today_at(today(), &state.snapshot()))
}

pub async fn get_progress(State(state): State<AppState>) -> Json<DashboardResponse> {
    Json(build_dashboard_at(today(), &state.snapshot()))
}

pub async fn get_calendar() -> Json<CalendarPosition> {
    Json(CalendarPosition::at(today()))
}

pub async fn get_templates() -> Json<Vec<&'static str>> {
    Json(TASK_TEMPLATES.to_vec())
}

pub async fn create_task(
    State(state): State<AppState>,
    Json(payload): Json<CreateTaskRequest>,
) -> Result<(StatusCode, Json<Task>), AppError> {
    let frequency = actions::frequency_from_json(payload.frequency.as_ref())?;
    let date = payload.scheduled_date.unwrap_or_else(|| date_key(today()));

    let task = apply_create(&state, &payload.text, &date, frequency).await?;
    Ok((StatusCode::CREATED, Json(task)))
}

pub async fn toggle_task(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Task>, AppError> {
    let task = apply_patch(&state, &id, |task| Ok(actions::toggle_patch(task))).await?;
    Ok(Json(task))
}

pub async fn toggle_subtask(
    State(state): State<AppState>,
    Path((id, subtask_id)): Path<(String, String)>,
) -> Result<Json<Task>, AppError> {
    let task = apply_patch(&state, &id, |task| {
        actions::toggle_subtask_patch(task, &subtask_id)
    })
    .await?;
    Ok(Json(task))
}

pub async fn delete_task(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    apply_delete(&state, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn breakdown_task(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<BreakdownResponse>, AppError> {
    Ok(Json(apply_breakdown(&state, &id).await?))
}

pub async fn form_create(State(state): State<AppState>, Form(form): Form<CreateTaskForm>) -> Redirect {
    let date = if form.scheduled_date.trim().is_empty() {
        date_key(today())
    } else {
        form.scheduled_date.trim().to_string()
    };
    let frequency = actions::parse_frequency(&form.frequency);

    match apply_create(&state, &form.text, &date, frequency).await {
        Ok(_) => Redirect::to("/"),
        Err(err) => {
            warn!("task registration rejected: {}", err.message);
            Redirect::to("/?tab=register")
        }
    }
}

pub async fn form_toggle(State(state): State<AppState>, Path(id): Path<String>) -> Redirect {
    let result = apply_patch(&state, &id, |task| Ok(actions::toggle_patch(task))).await;
    back_home("toggle task", result)
}

pub async fn form_toggle_subtask(
    State(state): State<AppState>,
    Path((id, subtask_id)): Path<(String, String)>,
) -> Redirect {
    let result = apply_patch(&state, &id, |task| {
        actions::toggle_subtask_patch(task, &subtask_id)
    })
    .await;
    back_home("toggle subtask", result)
}

pub async fn form_delete(State(state): State<AppState>, Path(id): Path<String>) -> Redirect {
    back_home("delete task", apply_delete(&state, &id).await)
}

pub async fn form_breakdown(State(state): State<AppState>, Path(id): Path<String>) -> Redirect {
    back_home("break down task", apply_breakdown(&state, &id).await)
}

fn back_home<T>(action: &str, result: Result<T, AppError>) -> Redirect {
    if let Err(err) = result {
        warn!(status = %err.status, "{action} failed: {}", err.message);
    }
    Redirect::to("/")
}

async fn apply_create(
    state: &AppState,
    text: &str,
    scheduled_date: &str,
    frequency: Option<Frequency>,
) -> Result<Task, AppError> {
    let task = actions::new_task(text, scheduled_date, frequency, Utc::now().timestamp_millis())?;

    state.store.write(&task.id, task.clone()).await.map_err(|err| {
        error!(task_id = %task.id, "failed to save task: {err}");
        AppError::from(err)
    })?;

    info!(task_id = %task.id, recurring = task.frequency.is_some(), "task registered");
    Ok(task)
}

async fn apply_patch<F>(state: &AppState, id: &str, build: F) -> Result<Task, AppError>
where
    F: FnOnce(&Task) -> Result<TaskPatch, TaskError>,
{
    let task = find_task(&state.task_map(), id)?;
    let patch = build(&task)?;

    state.store.patch(id, patch).await.map_err(|err| {
        error!(task_id = id, "failed to update task: {err}");
        AppError::from(err)
    })?;

    Ok(find_task(&state.task_map(), id)?)
}

async fn apply_delete(state: &AppState, id: &str) -> Result<(), AppError> {
    find_task(&state.task_map(), id)?;

    state.store.delete(id).await.map_err(|err| {
        error!(task_id = id, "failed to delete task: {err}");
        AppError::from(err)
    })?;

    info!(task_id = id, "task deleted");
    Ok(())
}

async fn apply_breakdown(state: &AppState, id: &str) -> Result<BreakdownResponse, AppError> {
    let task = find_task(&state.task_map(), id)?;
    let Some(_ticket) = state.breakdown.try_begin(id) else {
        return Err(AppError::conflict("another breakdown is already in progress"));
    };

    let Some(analysis) = state.analyzer.analyze(&task.text).await else {
        info!(task_id = id, "no analysis available, task left unchanged");
        return Ok(BreakdownResponse {
            applied: false,
            task,
        });
    };

    // Re-read so sub-task toggles made while waiting are kept.
    let latest = find_task(&state.task_map(), id)?;
    state
        .store
        .patch(id, actions::breakdown_patch(&latest, &analysis))
        .await
        .map_err(|err| {
            error!(task_id = id, "failed to save breakdown: {err}");
            AppError::from(err)
        })?;

    info!(task_id = id, steps = analysis.steps.len(), "breakdown applied");
    Ok(BreakdownResponse {
        applied: true,
        task: find_task(&state.task_map(), id)?,
    })
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}
