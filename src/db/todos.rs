//! Todo storage.

use serde::Serialize;
use sqlx::sqlite::SqlitePool;

#[derive(Clone)]
pub struct TodoStore {
    pool: SqlitePool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct Todo {
    pub id: String,
    pub title: String,
    pub description: String,
}

impl TodoStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Create a new todo with a random UUID.
    pub async fn create(&self, title: &str, description: &str) -> Result<Todo, sqlx::Error> {
        let id = uuid::Uuid::new_v4().to_string();

        sqlx::query("INSERT INTO todos (id, title, description) VALUES (?, ?, ?)")
            .bind(&id)
            .bind(title)
            .bind(description)
            .execute(&self.pool)
            .await?;

        Ok(Todo {
            id,
            title: title.to_string(),
            description: description.to_string(),
        })
    }

    /// List all todos, oldest first.
    pub async fn list(&self) -> Result<Vec<Todo>, sqlx::Error> {
        sqlx::query_as("SELECT id, title, description FROM todos ORDER BY created_at ASC, rowid ASC")
            .fetch_all(&self.pool)
            .await
    }

    pub async fn get(&self, id: &str) -> Result<Option<Todo>, sqlx::Error> {
        sqlx::query_as("SELECT id, title, description FROM todos WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
    }

    /// Update a todo. Returns the updated todo, or None if it does not exist.
    pub async fn update(
        &self,
        id: &str,
        title: &str,
        description: &str,
    ) -> Result<Option<Todo>, sqlx::Error> {
        let result = sqlx::query("UPDATE todos SET title = ?, description = ? WHERE id = ?")
            .bind(title)
            .bind(description)
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }

        Ok(Some(Todo {
            id: id.to_string(),
            title: title.to_string(),
            description: description.to_string(),
        }))
    }

    /// Delete a todo. Returns true if it existed.
    pub async fn delete(&self, id: &str) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM todos WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
