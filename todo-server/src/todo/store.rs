//! Persistence boundary for todos.
//!
//! [`TodoStore`] is the interface the lifecycle service talks to; [`SeaOrmTodoStore`]
//! implements it over a SeaORM connection. Every read and write made through the
//! store only sees live rows, i.e. rows whose `deleted_at` is unset.

use crate::entities::todo;
use crate::todo::Todo;
use async_trait::async_trait;
use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::*;

/// Generic persistence operations for todos.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TodoStore: Send + Sync {
    /// Returns every live todo, ordered by ID.
    async fn list(&self) -> Result<Vec<Todo>, DbErr>;

    /// Looks up a live todo, returning `None` when there is none with `id`.
    async fn find_by_id(&self, id: i32) -> Result<Option<Todo>, DbErr>;

    /// Inserts a new todo. The store assigns the ID, so `todo.id()` is ignored.
    async fn create(&self, todo: Todo) -> Result<Todo, DbErr>;

    /// Writes the task and done flag of an existing live todo.
    ///
    /// Fails with [`DbErr::RecordNotUpdated`] when no live row has `todo.id()`.
    async fn save(&self, todo: Todo) -> Result<Todo, DbErr>;

    /// Marks a live todo as deleted.
    async fn soft_delete(&self, id: i32) -> Result<(), DbErr>;
}

/// [`TodoStore`] backed by the `todos` table.
#[derive(Clone, Debug)]
pub struct SeaOrmTodoStore {
    db: DatabaseConnection,
}

impl SeaOrmTodoStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    fn live() -> Select<todo::Entity> {
        todo::Entity::find().filter(todo::Column::DeletedAt.is_null())
    }
}

#[async_trait]
impl TodoStore for SeaOrmTodoStore {
    #[tracing::instrument(skip(self))]
    async fn list(&self) -> Result<Vec<Todo>, DbErr> {
        let todos = Self::live()
            .order_by_asc(todo::Column::Id)
            .all(&self.db)
            .await?
            .into_iter()
            .map(Todo::from)
            .collect();
        Ok(todos)
    }

    #[tracing::instrument(skip(self))]
    async fn find_by_id(&self, id: i32) -> Result<Option<Todo>, DbErr> {
        let model = Self::live()
            .filter(todo::Column::Id.eq(id))
            .one(&self.db)
            .await?;
        Ok(model.map(Todo::from))
    }

    #[tracing::instrument(skip(self, todo))]
    async fn create(&self, todo: Todo) -> Result<Todo, DbErr> {
        let active_model = todo::ActiveModel {
            task: ActiveValue::Set(todo.task().to_string()),
            is_done: ActiveValue::Set(todo.is_done()),
            ..Default::default()
        };
        let created_model = active_model.insert(&self.db).await?;
        Ok(Todo::from(created_model))
    }

    #[tracing::instrument(skip(self, todo), fields(id = todo.id()))]
    async fn save(&self, todo: Todo) -> Result<Todo, DbErr> {
        let active_model = todo::ActiveModel {
            id: ActiveValue::Unchanged(todo.id()),
            task: ActiveValue::Set(todo.task().to_string()),
            is_done: ActiveValue::Set(todo.is_done()),
            deleted_at: ActiveValue::NotSet,
        };
        let updated_model = todo::Entity::update(active_model)
            .filter(todo::Column::DeletedAt.is_null())
            .exec(&self.db)
            .await?;
        Ok(Todo::from(updated_model))
    }

    #[tracing::instrument(skip(self))]
    async fn soft_delete(&self, id: i32) -> Result<(), DbErr> {
        let result = todo::Entity::update_many()
            .col_expr(todo::Column::DeletedAt, Expr::value(Utc::now()))
            .filter(todo::Column::Id.eq(id))
            .filter(todo::Column::DeletedAt.is_null())
            .exec(&self.db)
            .await?;
        tracing::debug!(id, rows_affected = result.rows_affected, "soft-deleted todo");
        Ok(())
    }
}
