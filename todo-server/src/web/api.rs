use crate::todo::api::TodoState;
use crate::todo::api::v1::{CreateTodoRequest, TodoJson, UpdateTodoRequest};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::{OpenApi, ToSchema};

/// JSON response for API errors
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    /// Machine-readable error code
    pub error: String,
    /// Human-readable description
    pub message: String,
    /// Individual validation failures, if any
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub details: Vec<String>,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            message: message.into(),
            details: Vec::new(),
        }
    }

    pub fn with_details(mut self, details: Vec<String>) -> Self {
        self.details = details;
        self
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::todo::api::v1::list_todos_handler,
        crate::todo::api::v1::create_todo_handler,
        crate::todo::api::v1::get_todo_handler,
        crate::todo::api::v1::update_todo_handler,
        crate::todo::api::v1::delete_todo_handler,
    ),
    components(schemas(TodoJson, CreateTodoRequest, UpdateTodoRequest, ErrorResponse)),
    tags((name = "Todos", description = "Todo management endpoints"))
)]
pub struct ApiDoc;

/// Serves the generated OpenAPI document.
#[tracing::instrument]
pub async fn openapi_handler() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

/// Creates the API routes for JSON API endpoints.
pub fn create_api_router(todo_state: Arc<TodoState>) -> Router {
    let todos_router = crate::todo::api::v1::create_api_router(todo_state);
    Router::new()
        .nest("/api/v1", todos_router)
        .route("/api-docs/openapi.json", axum::routing::get(openapi_handler))
}
