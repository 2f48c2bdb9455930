#![cfg(feature = "postgres-tests")]

use migration::MigratorTrait;
use sea_orm::{ActiveModelTrait, ActiveValue, Database, DatabaseConnection, DbErr, EntityTrait};
use testcontainers_modules::testcontainers::runners::AsyncRunner;
use testcontainers_modules::{postgres, testcontainers};
use todo_server::entities::todo;
use todo_server::todo::{SeaOrmTodoStore, Todo, TodoFields, TodoStore};

struct TestContext {
    #[allow(dead_code)] // container is kept to ensure it's not dropped
    container: testcontainers::ContainerAsync<postgres::Postgres>,
    db: DatabaseConnection,
    store: SeaOrmTodoStore,
}

async fn setup_container() -> anyhow::Result<testcontainers::ContainerAsync<postgres::Postgres>> {
    let container = postgres::Postgres::default().start().await?;
    Ok(container)
}

async fn setup_db(
    container: &testcontainers::ContainerAsync<postgres::Postgres>,
) -> anyhow::Result<DatabaseConnection> {
    let host = container.get_host().await?;
    let port = container.get_host_port_ipv4(5432).await?;
    let db_url = format!("postgres://postgres:postgres@{}:{}/postgres", host, port);
    let db = Database::connect(&db_url).await?;
    migration::Migrator::up(&db, None).await?;
    Ok(db)
}

async fn setup() -> anyhow::Result<TestContext> {
    // Allow multiple calls to init for tests.
    let _ = tracing_subscriber::fmt()
        .with_env_filter("debug")
        .with_test_writer()
        .try_init();
    let container = setup_container().await?;
    let db = setup_db(&container).await?;
    let store = SeaOrmTodoStore::new(db.clone());
    Ok(TestContext {
        container,
        db,
        store,
    })
}

fn new_todo(task: &str, is_done: i32) -> Todo {
    Todo::new(TodoFields {
        task: Some(task.to_string()),
        is_done: Some(is_done),
        ..Default::default()
    })
}

#[tokio::test]
async fn can_create_and_find_todo_on_postgres() -> anyhow::Result<()> {
    let context = setup().await?;

    let created = context.store.create(new_todo("on postgres", 0)).await?;
    let found = context.store.find_by_id(created.id()).await?;

    assert!(created.id() > 0);
    assert_eq!(found, Some(created));
    Ok(())
}

#[tokio::test]
async fn can_save_todo_on_postgres() -> anyhow::Result<()> {
    let context = setup().await?;
    let created = context.store.create(new_todo("before", 0)).await?;

    let changed = Todo::new(TodoFields {
        id: Some(created.id()),
        task: Some("after".to_string()),
        is_done: Some(1),
    });
    let saved = context.store.save(changed).await?;

    assert_eq!(saved.id(), created.id());
    assert_eq!(saved.task(), "after");
    assert_eq!(saved.is_done(), 1);
    assert_eq!(context.store.find_by_id(created.id()).await?, Some(saved));
    Ok(())
}

#[tokio::test]
async fn can_soft_delete_todo_on_postgres() -> anyhow::Result<()> {
    let context = setup().await?;
    let kept = context.store.create(new_todo("kept", 0)).await?;
    let removed = context.store.create(new_todo("removed", 1)).await?;

    context.store.soft_delete(removed.id()).await?;

    assert_eq!(context.store.find_by_id(removed.id()).await?, None);
    assert_eq!(context.store.list().await?, vec![kept]);

    let row = todo::Entity::find_by_id(removed.id())
        .one(&context.db)
        .await?
        .expect("soft-deleted row should remain");
    assert!(row.deleted_at.is_some());

    let result = context.store.save(removed).await;
    assert!(matches!(result, Err(DbErr::RecordNotUpdated)));
    Ok(())
}

#[tokio::test]
async fn rejects_out_of_range_done_flag_on_postgres() -> anyhow::Result<()> {
    let context = setup().await?;

    let result = todo::ActiveModel {
        task: ActiveValue::Set("invalid".to_string()),
        is_done: ActiveValue::Set(2),
        ..Default::default()
    }
    .insert(&context.db)
    .await;

    assert!(result.is_err());
    Ok(())
}
