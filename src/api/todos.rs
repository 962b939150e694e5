//! Todo API.
//!
//! - POST `/todo` - create (CSRF + credential, refreshes the credential)
//! - GET `/todo` - list (no authentication)
//! - GET `/todo/{id}` - read one (credential only, no refresh)
//! - PUT `/todo/{id}` - update (CSRF + credential, refreshes the credential)
//! - DELETE `/todo/{id}` - delete (CSRF + credential, refreshes the credential)

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tracing::info;

use super::error::{ApiError, ResultExt};
use crate::auth::{AuthService, CsrfJwtRefresh, JwtOnly};
use crate::db::Database;
use crate::impl_has_auth_service;

#[derive(Clone)]
pub struct TodosState {
    pub db: Database,
    pub auth: Arc<AuthService>,
}

impl_has_auth_service!(TodosState);

pub fn router(state: TodosState) -> Router {
    Router::new()
        .route("/todo", get(list_todos).post(create_todo))
        .route(
            "/todo/{id}",
            get(get_todo).put(update_todo).delete(delete_todo),
        )
        .with_state(state)
}

#[derive(Deserialize)]
struct TodoBody {
    title: String,
    #[serde(default)]
    description: String,
}

async fn create_todo(
    State(state): State<TodosState>,
    CsrfJwtRefresh(cookie): CsrfJwtRefresh,
    Json(payload): Json<TodoBody>,
) -> Result<impl IntoResponse, ApiError> {
    info!("start: create_todo");

    let todo = state
        .db
        .todos()
        .create(&payload.title, &payload.description)
        .await
        .op_failed("Create task failed")?;

    Ok((StatusCode::CREATED, cookie, Json(todo)))
}

// Listing is deliberately public.
async fn list_todos(State(state): State<TodosState>) -> Result<impl IntoResponse, ApiError> {
    info!("start: list_todos");

    let todos = state
        .db
        .todos()
        .list()
        .await
        .db_err("Failed to list todos")?;

    Ok(Json(todos))
}

async fn get_todo(
    State(state): State<TodosState>,
    JwtOnly(subject): JwtOnly,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    info!(subject = %subject, "start: get_todo");

    let todo = state
        .db
        .todos()
        .get(&id)
        .await
        .db_err("Failed to get todo")?
        .ok_or_else(|| ApiError::not_found(format!("Task of ID:{} doesn't exist", id)))?;

    Ok(Json(todo))
}

async fn update_todo(
    State(state): State<TodosState>,
    CsrfJwtRefresh(cookie): CsrfJwtRefresh,
    Path(id): Path<String>,
    Json(payload): Json<TodoBody>,
) -> Result<impl IntoResponse, ApiError> {
    info!("start: update_todo");

    let todo = state
        .db
        .todos()
        .update(&id, &payload.title, &payload.description)
        .await
        .op_failed("Update task failed")?
        .ok_or_else(|| ApiError::not_found("Update task failed"))?;

    Ok((cookie, Json(todo)))
}

async fn delete_todo(
    State(state): State<TodosState>,
    CsrfJwtRefresh(cookie): CsrfJwtRefresh,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    info!("start: delete_todo");

    let deleted = state
        .db
        .todos()
        .delete(&id)
        .await
        .op_failed("Delete task failed")?;

    if !deleted {
        return Err(ApiError::not_found("Delete task failed"));
    }

    Ok((cookie, Json(json!({ "message": "Successfully deleted" }))))
}
