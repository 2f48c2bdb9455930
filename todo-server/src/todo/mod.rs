use crate::entities::todo;
use chrono::{DateTime, Utc};
use sea_orm::DbErr;

pub mod api;
pub mod store;

pub use store::{SeaOrmTodoStore, TodoStore};

/// A todo item as seen by the rest of the application.
#[derive(Debug, PartialEq, Clone, Eq, Default)]
pub struct Todo {
    id: i32,
    task: String,
    is_done: i32,
    deleted_at: Option<DateTime<Utc>>,
}

/// Optional field values used to construct a [`Todo`].
///
/// Fields left as `None` fall back to the defaults of [`Todo::default`]. The id is
/// normally omitted for new records and assigned by the store.
#[derive(Debug, Default, Clone)]
pub struct TodoFields {
    pub id: Option<i32>,
    pub task: Option<String>,
    pub is_done: Option<i32>,
}

/// Validated input for creating a todo.
#[derive(Debug, PartialEq, Clone, Eq)]
pub struct NewTodo {
    pub task: String,
    pub is_done: i32,
}

/// Validated partial input for updating a todo. Absent fields are left untouched.
#[derive(Debug, PartialEq, Clone, Eq, Default)]
pub struct TodoPatch {
    pub task: Option<String>,
    pub is_done: Option<i32>,
}

impl Todo {
    pub fn new(fields: TodoFields) -> Self {
        let defaults = Self::default();
        Self {
            id: fields.id.unwrap_or(defaults.id),
            task: fields.task.unwrap_or(defaults.task),
            is_done: fields.is_done.unwrap_or(defaults.is_done),
            deleted_at: defaults.deleted_at,
        }
    }

    /// Returns the ID of the todo. Zero until the store has assigned one.
    pub fn id(&self) -> i32 {
        self.id
    }

    /// Returns the task description.
    pub fn task(&self) -> &str {
        &self.task
    }

    /// Returns the done flag, either 0 or 1.
    pub fn is_done(&self) -> i32 {
        self.is_done
    }

    /// Returns when the todo was soft-deleted, if it was.
    pub fn deleted_at(&self) -> Option<DateTime<Utc>> {
        self.deleted_at
    }

    /// Returns a copy of this todo with every field present in `patch` overwritten.
    /// The id and deletion timestamp are always kept.
    pub fn merge(&self, patch: &TodoPatch) -> Todo {
        Todo {
            id: self.id,
            task: patch.task.clone().unwrap_or_else(|| self.task.clone()),
            is_done: patch.is_done.unwrap_or(self.is_done),
            deleted_at: self.deleted_at,
        }
    }
}

impl From<NewTodo> for TodoFields {
    fn from(input: NewTodo) -> Self {
        TodoFields {
            id: None,
            task: Some(input.task),
            is_done: Some(input.is_done),
        }
    }
}

impl From<todo::Model> for Todo {
    fn from(model: todo::Model) -> Self {
        Todo {
            id: model.id,
            task: model.task,
            is_done: model.is_done,
            deleted_at: model.deleted_at,
        }
    }
}

/// Error type for TodoService operations.
#[derive(Debug, thiserror::Error)]
pub enum TodoServiceError {
    /// No live todo has the requested ID.
    #[error("Todo with ID {id} not found")]
    NotFound { id: i32, reason: String },
    /// The store failed for a reason other than absence.
    #[error("Database error: {0}")]
    Persistence(#[from] DbErr),
}

/// Orchestrates todo lifecycle operations against a [`TodoStore`].
pub struct TodoService<'a, S: TodoStore + ?Sized> {
    store: &'a S,
}

impl<'a, S: TodoStore + ?Sized> TodoService<'a, S> {
    pub fn new(store: &'a S) -> Self {
        TodoService { store }
    }

    /// Retrieves all live todos in store order.
    #[tracing::instrument(skip(self))]
    pub async fn list(&self) -> Result<Vec<Todo>, TodoServiceError> {
        Ok(self.store.list().await?)
    }

    /// Retrieves the live todo with the given ID.
    ///
    /// # Errors
    ///
    /// Returns [`TodoServiceError::NotFound`] when the store has no live record for
    /// `id`, whether it reports that as an empty result or as
    /// [`DbErr::RecordNotFound`].
    #[tracing::instrument(skip(self))]
    pub async fn get_or_fail(&self, id: i32) -> Result<Todo, TodoServiceError> {
        match self.store.find_by_id(id).await {
            Ok(Some(todo)) => Ok(todo),
            Ok(None) => Err(TodoServiceError::NotFound {
                id,
                reason: format!("no live todo matches ID {}", id),
            }),
            Err(DbErr::RecordNotFound(reason)) => Err(TodoServiceError::NotFound { id, reason }),
            Err(err) => Err(TodoServiceError::Persistence(err)),
        }
    }

    /// Creates a todo from validated input and returns it with its assigned ID.
    #[tracing::instrument(skip(self, input))]
    pub async fn create(&self, input: NewTodo) -> Result<Todo, TodoServiceError> {
        let todo = Todo::new(TodoFields::from(input));
        Ok(self.store.create(todo).await?)
    }

    /// Applies `patch` to the live todo with the given ID and saves the result.
    #[tracing::instrument(skip(self, patch))]
    pub async fn update(&self, id: i32, patch: TodoPatch) -> Result<Todo, TodoServiceError> {
        let todo = self.get_or_fail(id).await?;
        let merged = todo.merge(&patch);
        Ok(self.store.save(merged).await?)
    }

    /// Soft-deletes the live todo with the given ID.
    #[tracing::instrument(skip(self))]
    pub async fn delete_by_id(&self, id: i32) -> Result<(), TodoServiceError> {
        self.get_or_fail(id).await?;
        self.store.soft_delete(id).await?;
        Ok(())
    }
}
