use crate::todo::api::TodoState;
use crate::todo::{NewTodo, Todo, TodoPatch, TodoService, TodoServiceError};
use crate::web::api::ErrorResponse;
use axum::{
    Json, Router,
    extract::{Path, State, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;

const TASK_MISSING: &str = "Task must be given.";
const TASK_EMPTY: &str = "Task must not be empty.";
const IS_DONE_MISSING: &str = "Is Done must be given.";
const IS_DONE_NOT_ALLOWED: &str = "isDone must be one of the following values: 0, 1";

/// JSON representation of a Todo for API responses.
#[derive(Debug, Serialize, Deserialize, ToSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TodoJson {
    /// Unique identifier assigned on creation
    pub id: i32,
    /// What needs to be done
    pub task: String,
    /// 1 when the todo is done, 0 otherwise
    pub is_done: i32,
    /// Soft-deletion timestamp, always null for todos returned by the API
    pub deleted_at: Option<DateTime<Utc>>,
}

impl From<Todo> for TodoJson {
    fn from(todo: Todo) -> Self {
        Self {
            id: todo.id(),
            task: todo.task().to_string(),
            is_done: todo.is_done(),
            deleted_at: todo.deleted_at(),
        }
    }
}

/// Request body for creating a todo.
#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateTodoRequest {
    /// Non-empty task description
    #[serde(default)]
    pub task: Option<String>,
    /// Either 0 or 1
    #[serde(default)]
    pub is_done: Option<i64>,
}

/// Request body for updating a todo. Omitted fields keep their current value.
#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTodoRequest {
    /// Non-empty task description
    #[serde(default)]
    pub task: Option<String>,
    /// Either 0 or 1
    #[serde(default)]
    pub is_done: Option<i64>,
}

/// Input that failed request validation, with one message per violated rule.
#[derive(Debug, PartialEq, thiserror::Error)]
#[error("Validation failed: {}", .messages.join("; "))]
pub struct ValidationError {
    pub messages: Vec<String>,
}

fn validate_is_done(is_done: i64, messages: &mut Vec<String>) -> Option<i32> {
    match is_done {
        0 | 1 => Some(is_done as i32),
        _ => {
            messages.push(IS_DONE_NOT_ALLOWED.to_string());
            None
        }
    }
}

impl CreateTodoRequest {
    /// Checks the request and converts it into service input.
    pub fn validate(self) -> Result<NewTodo, ValidationError> {
        let mut messages = Vec::new();

        let task = match self.task {
            Some(task) if !task.is_empty() => Some(task),
            _ => {
                messages.push(TASK_MISSING.to_string());
                None
            }
        };

        let is_done = match self.is_done {
            Some(is_done) => validate_is_done(is_done, &mut messages),
            None => {
                messages.push(IS_DONE_MISSING.to_string());
                None
            }
        };

        match (task, is_done) {
            (Some(task), Some(is_done)) => Ok(NewTodo { task, is_done }),
            _ => Err(ValidationError { messages }),
        }
    }
}

impl UpdateTodoRequest {
    /// Checks the fields that are present and converts the request into a patch.
    pub fn validate(self) -> Result<TodoPatch, ValidationError> {
        let mut messages = Vec::new();

        if self.task.as_deref() == Some("") {
            messages.push(TASK_EMPTY.to_string());
        }
        let is_done = self
            .is_done
            .and_then(|is_done| validate_is_done(is_done, &mut messages));

        if messages.is_empty() {
            Ok(TodoPatch {
                task: self.task,
                is_done,
            })
        } else {
            Err(ValidationError { messages })
        }
    }
}

/// Error type for todo API handlers.
#[derive(Debug, thiserror::Error)]
pub enum TodoApiError {
    /// The request body was well-formed JSON but broke a validation rule.
    #[error(transparent)]
    Validation(#[from] ValidationError),
    /// The request body could not be read as the expected JSON.
    #[error("Invalid request body: {0}")]
    InvalidBody(#[from] JsonRejection),
    /// The path segment cannot name any todo, e.g. `abc` or an out-of-range number.
    #[error("Todo with ID {0} not found")]
    UnknownId(String),
    /// The lifecycle service failed.
    #[error(transparent)]
    Service(#[from] TodoServiceError),
}

/// Parses a todo ID from the URL path. Anything that is not an `i32` cannot match a
/// stored todo, so it is reported the same way as an absent one.
fn parse_id(raw: &str) -> Result<i32, TodoApiError> {
    raw.parse().map_err(|_| TodoApiError::UnknownId(raw.to_string()))
}

impl IntoResponse for TodoApiError {
    fn into_response(self) -> Response {
        let (status_code, body) = match self {
            TodoApiError::Validation(err) => (
                StatusCode::BAD_REQUEST,
                ErrorResponse::new("VALIDATION_FAILED", "Request validation failed")
                    .with_details(err.messages),
            ),
            TodoApiError::InvalidBody(rejection) => (
                rejection.status(),
                ErrorResponse::new("INVALID_BODY", rejection.body_text()),
            ),
            TodoApiError::UnknownId(raw) => {
                tracing::warn!(id = %raw, "todo not found for unparsable ID");
                (
                    StatusCode::NOT_FOUND,
                    ErrorResponse::new("NOT_FOUND", format!("Todo with ID {} not found", raw)),
                )
            }
            TodoApiError::Service(TodoServiceError::NotFound { id, reason }) => {
                tracing::warn!(id, reason = %reason, "todo not found");
                (
                    StatusCode::NOT_FOUND,
                    ErrorResponse::new("NOT_FOUND", format!("Todo with ID {} not found", id)),
                )
            }
            TodoApiError::Service(TodoServiceError::Persistence(err)) => {
                tracing::error!("Todo persistence failed: {}", err);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorResponse::new(
                        "INTERNAL_SERVER_ERROR",
                        "An unexpected error occurred while processing your request. Please try again later.",
                    ),
                )
            }
        };

        (status_code, Json(body)).into_response()
    }
}

/// Handler for GET /api/v1/todos - Returns all live todos.
#[tracing::instrument(skip(state))]
#[utoipa::path(
    get,
    path = "/api/v1/todos",
    responses(
        (status = 200, description = "Successfully retrieved todos", body = Vec<TodoJson>),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "Todos"
)]
pub async fn list_todos_handler(
    State(state): State<Arc<TodoState>>,
) -> Result<Json<Vec<TodoJson>>, TodoApiError> {
    let service = TodoService::new(state.store.as_ref());
    let todos = service.list().await?;
    Ok(Json(todos.into_iter().map(TodoJson::from).collect()))
}

/// Handler for POST /api/v1/todos - Creates a todo.
#[tracing::instrument(skip(state, payload))]
#[utoipa::path(
    post,
    path = "/api/v1/todos",
    request_body = CreateTodoRequest,
    responses(
        (status = 201, description = "Todo created", body = TodoJson),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "Todos"
)]
pub async fn create_todo_handler(
    State(state): State<Arc<TodoState>>,
    payload: Result<Json<CreateTodoRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<TodoJson>), TodoApiError> {
    let Json(request) = payload?;
    let new_todo = request.validate()?;

    let service = TodoService::new(state.store.as_ref());
    let todo = service.create(new_todo).await?;
    tracing::info!(id = todo.id(), "created todo");

    Ok((StatusCode::CREATED, Json(TodoJson::from(todo))))
}

/// Handler for GET /api/v1/todos/{id} - Returns a single live todo.
#[tracing::instrument(skip(state))]
#[utoipa::path(
    get,
    path = "/api/v1/todos/{id}",
    params(("id" = i32, Path, description = "Todo ID")),
    responses(
        (status = 200, description = "Successfully retrieved todo", body = TodoJson),
        (status = 404, description = "Todo not found", body = ErrorResponse)
    ),
    tag = "Todos"
)]
pub async fn get_todo_handler(
    State(state): State<Arc<TodoState>>,
    Path(id): Path<String>,
) -> Result<Json<TodoJson>, TodoApiError> {
    let id = parse_id(&id)?;
    let service = TodoService::new(state.store.as_ref());
    let todo = service.get_or_fail(id).await?;
    Ok(Json(TodoJson::from(todo)))
}

/// Handler for PUT/PATCH /api/v1/todos/{id} - Merges the given fields into a todo.
#[tracing::instrument(skip(state, payload))]
#[utoipa::path(
    put,
    path = "/api/v1/todos/{id}",
    params(("id" = i32, Path, description = "Todo ID")),
    request_body = UpdateTodoRequest,
    responses(
        (status = 200, description = "Todo updated", body = TodoJson),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 404, description = "Todo not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "Todos"
)]
pub async fn update_todo_handler(
    State(state): State<Arc<TodoState>>,
    Path(id): Path<String>,
    payload: Result<Json<UpdateTodoRequest>, JsonRejection>,
) -> Result<Json<TodoJson>, TodoApiError> {
    let id = parse_id(&id)?;
    let Json(request) = payload?;
    let patch = request.validate()?;

    let service = TodoService::new(state.store.as_ref());
    let todo = service.update(id, patch).await?;
    tracing::info!(id, is_done = todo.is_done(), "updated todo");

    Ok(Json(TodoJson::from(todo)))
}

/// Handler for DELETE /api/v1/todos/{id} - Soft-deletes a todo.
#[tracing::instrument(skip(state))]
#[utoipa::path(
    delete,
    path = "/api/v1/todos/{id}",
    params(("id" = i32, Path, description = "Todo ID")),
    responses(
        (status = 204, description = "Todo deleted"),
        (status = 404, description = "Todo not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "Todos"
)]
pub async fn delete_todo_handler(
    State(state): State<Arc<TodoState>>,
    Path(id): Path<String>,
) -> Result<StatusCode, TodoApiError> {
    let id = parse_id(&id)?;
    let service = TodoService::new(state.store.as_ref());
    service.delete_by_id(id).await?;
    tracing::info!(id, "deleted todo");
    Ok(StatusCode::NO_CONTENT)
}

/// Creates and returns the todos API router.
pub fn create_api_router(state: Arc<TodoState>) -> Router {
    Router::new()
        .route("/todos", get(list_todos_handler).post(create_todo_handler))
        .route(
            "/todos/{id}",
            get(get_todo_handler)
                .put(update_todo_handler)
                .patch(update_todo_handler)
                .delete(delete_todo_handler),
        )
        .with_state(state)
}
