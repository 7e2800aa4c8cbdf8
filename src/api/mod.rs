use axum::Json;
use axum::extract::{Path, Query};
use axum::routing::{patch, put};
use axum::{Router, extract::State, http::StatusCode, routing::get};
use chrono::Utc;
use serde::Deserialize;

use crate::error::AppError;
use crate::models::Task;
use crate::services::format_timestamp;
use crate::state::AppState;

#[derive(Deserialize)]
struct NewTaskRequest {
    #[serde(default)]
    title: String,
    #[serde(default)]
    description: String,
}

#[derive(Deserialize)]
struct UpdateTaskRequest {
    title: String,
    description: String,
    is_completed: bool,
}

#[derive(Deserialize)]
struct SearchParams {
    #[serde(default)]
    q: String,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/tasks", get(list_tasks).post(create_task))
        .route("/tasks/search", get(search_tasks))
        .route("/tasks/{id}", put(update_task).delete(delete_task))
        .route("/tasks/{id}/toggle", patch(toggle_task))
        .with_state(state)
}

async fn health(State(state): State<AppState>) -> Result<StatusCode, AppError> {
    sqlx::query("select 1").execute(&state.db).await?;
    Ok(StatusCode::OK)
}

async fn list_tasks(State(state): State<AppState>) -> Json<Vec<Task>> {
    let service = state.service.lock().await;
    Json(service.current_tasks().to_vec())
}

async fn create_task(
    State(state): State<AppState>,
    Json(req): Json<NewTaskRequest>,
) -> Result<Json<Task>, AppError> {
    let mut task = Task::new(format_timestamp(Utc::now()));
    task.title = req.title;
    task.description = req.description;

    let mut service = state.service.lock().await;
    service.create(task.clone()).await?;
    Ok(Json(task))
}

/// Overwrites the mutable fields of an existing task. An unknown id is a
/// silent no-op, so the response is 204 either way.
async fn update_task(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<UpdateTaskRequest>,
) -> Result<StatusCode, AppError> {
    let mut service = state.service.lock().await;
    let existing = service.current_tasks().iter().find(|t| t.id == id).cloned();
    if let Some(existing) = existing {
        let task = Task {
            id,
            title: req.title,
            description: req.description,
            is_completed: req.is_completed,
            created_at: existing.created_at,
        };
        service.update(task).await?;
    }
    Ok(StatusCode::NO_CONTENT)
}

async fn toggle_task(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    let mut service = state.service.lock().await;
    let existing = service.current_tasks().iter().find(|t| t.id == id).cloned();
    if let Some(mut task) = existing {
        task.is_completed = !task.is_completed;
        service.update(task).await?;
    }
    Ok(StatusCode::NO_CONTENT)
}

async fn delete_task(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    let mut service = state.service.lock().await;
    let existing = service.current_tasks().iter().find(|t| t.id == id).cloned();
    if let Some(task) = existing {
        service.delete(&task).await?;
    }
    Ok(StatusCode::NO_CONTENT)
}

async fn search_tasks(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Json<Vec<Task>> {
    let service = state.service.lock().await;
    Json(service.search(&params.q))
}
