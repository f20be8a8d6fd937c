use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use sqlx::Row;

use todobot_core::domain::todo::{Todo, TodoId};
use todobot_core::errors::ApplicationError;
use todobot_core::todos::TodoRepository;

use super::RepositoryError;
use crate::DbPool;

pub struct SqlTodoRepository {
    pool: DbPool,
}

impl SqlTodoRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn format_timestamp(value: &DateTime<Utc>) -> String {
    value.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

fn parse_timestamp(column: &str, raw: &str) -> Result<DateTime<Utc>, RepositoryError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| RepositoryError::Decode(format!("{column}: {e}")))
}

fn row_to_todo(row: &sqlx::sqlite::SqliteRow) -> Result<Todo, RepositoryError> {
    let id: String = row.try_get("id").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let name: String = row.try_get("name").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let created_at: String =
        row.try_get("created_at").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let updated_at: String =
        row.try_get("updated_at").map_err(|e| RepositoryError::Decode(e.to_string()))?;

    Ok(Todo {
        id: TodoId(id),
        name,
        created_at: parse_timestamp("created_at", &created_at)?,
        updated_at: parse_timestamp("updated_at", &updated_at)?,
    })
}

#[async_trait]
impl TodoRepository for SqlTodoRepository {
    async fn create(&self, name: &str) -> Result<Todo, ApplicationError> {
        let todo = Todo::new(name);

        sqlx::query("INSERT INTO todo (id, name, created_at, updated_at) VALUES (?, ?, ?, ?)")
            .bind(todo.id.as_str())
            .bind(&todo.name)
            .bind(format_timestamp(&todo.created_at))
            .bind(format_timestamp(&todo.updated_at))
            .execute(&self.pool)
            .await
            .map_err(RepositoryError::from)?;

        Ok(todo)
    }

    async fn list_all(&self) -> Result<Vec<Todo>, ApplicationError> {
        let rows =
            sqlx::query("SELECT id, name, created_at, updated_at FROM todo ORDER BY rowid ASC")
                .fetch_all(&self.pool)
                .await
                .map_err(RepositoryError::from)?;

        let todos = rows.iter().map(row_to_todo).collect::<Result<Vec<_>, _>>()?;
        Ok(todos)
    }

    async fn delete_by_id(&self, id: &TodoId) -> Result<(), ApplicationError> {
        let result = sqlx::query("DELETE FROM todo WHERE id = ?")
            .bind(id.as_str())
            .execute(&self.pool)
            .await
            .map_err(RepositoryError::from)?;

        tracing::debug!(
            event_name = "store.todo.deleted",
            todo_id = %id,
            rows_affected = result.rows_affected(),
            "todo delete executed"
        );
        Ok(())
    }
}

/// Stand-in used when the store connection never came up. Every call fails
/// with the original connection error so handlers log it and move on.
pub struct UnavailableTodoRepository {
    reason: String,
}

impl UnavailableTodoRepository {
    pub fn new(reason: impl Into<String>) -> Self {
        Self { reason: reason.into() }
    }

    fn error(&self) -> ApplicationError {
        ApplicationError::Persistence(format!("todo store is unavailable: {}", self.reason))
    }
}

#[async_trait]
impl TodoRepository for UnavailableTodoRepository {
    async fn create(&self, _name: &str) -> Result<Todo, ApplicationError> {
        Err(self.error())
    }

    async fn list_all(&self) -> Result<Vec<Todo>, ApplicationError> {
        Err(self.error())
    }

    async fn delete_by_id(&self, _id: &TodoId) -> Result<(), ApplicationError> {
        Err(self.error())
    }
}

#[cfg(test)]
mod tests {
    use todobot_core::domain::todo::TodoId;
    use todobot_core::errors::ApplicationError;
    use todobot_core::todos::TodoRepository;

    use super::{SqlTodoRepository, UnavailableTodoRepository};
    use crate::{connect_with_settings, migrations};

    async fn repository() -> SqlTodoRepository {
        let pool = connect_with_settings("sqlite::memory:", 1, 5).await.expect("pool");
        migrations::run_pending(&pool).await.expect("migrations");
        SqlTodoRepository::new(pool)
    }

    #[tokio::test]
    async fn sql_repo_lists_in_insertion_order() {
        let repo = repository().await;

        let first = repo.create("first").await.expect("create first");
        let second = repo.create("second").await.expect("create second");
        let third = repo.create("third").await.expect("create third");

        let listed = repo.list_all().await.expect("list");
        assert_eq!(listed, vec![first, second, third]);
    }

    #[tokio::test]
    async fn sql_repo_preserves_timestamps_exactly() {
        let repo = repository().await;

        let created = repo.create("Water plants").await.expect("create");
        let listed = repo.list_all().await.expect("list");

        assert_eq!(listed[0].created_at, created.created_at);
        assert_eq!(listed[0].updated_at, created.updated_at);
    }

    #[tokio::test]
    async fn sql_repo_deletes_by_exact_id_only() {
        let repo = repository().await;
        let todo = repo.create("Pay rent").await.expect("create");

        let prefix = TodoId(todo.id.as_str()[..8].to_owned());
        repo.delete_by_id(&prefix).await.expect("delete prefix");
        assert_eq!(repo.list_all().await.expect("list").len(), 1);

        repo.delete_by_id(&todo.id).await.expect("delete exact");
        assert!(repo.list_all().await.expect("list").is_empty());
    }

    #[tokio::test]
    async fn unavailable_repo_fails_every_call_with_reason() {
        let repo = UnavailableTodoRepository::new("connection refused");

        let error = repo.list_all().await.expect_err("list should fail");
        assert!(matches!(
            error,
            ApplicationError::Persistence(ref message) if message.contains("connection refused")
        ));
        assert!(repo.create("x").await.is_err());
        assert!(repo.delete_by_id(&TodoId::from("x")).await.is_err());
    }
}
