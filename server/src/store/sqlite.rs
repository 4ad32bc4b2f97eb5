//! SQLite backend.
//!
//! ```sql
//! CREATE TABLE todos (
//!   id           TEXT PRIMARY KEY,   -- UUID, hyphenated
//!   title        TEXT NOT NULL,
//!   description  TEXT,
//!   due_date     TEXT,               -- yyyy-mm-dd
//!   created_at   INTEGER NOT NULL,   -- unix millis
//!   is_completed INTEGER NOT NULL DEFAULT 0
//! )
//! ```
//!
//! `created_at` is kept as integer milliseconds so `ORDER BY` sorts
//! chronologically regardless of text formatting.

use std::time::Duration;

use async_trait::async_trait;
use chrono::DateTime;
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};
use sqlx::{QueryBuilder, Sqlite};
use todo_core::{Todo, TodoUpdate};
use uuid::Uuid;

use super::{Predicate, StoreError, TodoQuery, TodoStore};

const COLUMNS: &str = "id, title, description, due_date, created_at, is_completed";

#[derive(Debug, sqlx::FromRow)]
struct TodoRow {
    id: String,
    title: String,
    description: Option<String>,
    due_date: Option<String>,
    created_at: i64,
    is_completed: bool,
}

impl TryFrom<TodoRow> for Todo {
    type Error = StoreError;

    fn try_from(row: TodoRow) -> Result<Self, Self::Error> {
        let id = Uuid::parse_str(&row.id).map_err(|e| StoreError::Corrupt {
            id: row.id.clone(),
            reason: e.to_string(),
        })?;
        let created_at =
            DateTime::from_timestamp_millis(row.created_at).ok_or_else(|| StoreError::Corrupt {
                id: row.id.clone(),
                reason: format!("created_at out of range: {}", row.created_at),
            })?;
        Ok(Todo {
            id,
            title: row.title,
            description: row.description,
            due_date: row.due_date,
            created_at,
            is_completed: row.is_completed,
        })
    }
}

#[derive(Debug, Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Connect and create the `todos` table if needed.
    ///
    /// An in-memory database lives only as long as its connection, so those
    /// URLs get a single connection that is never recycled.
    pub async fn connect(url: &str) -> Result<Self, StoreError> {
        let in_memory = url.contains(":memory:") || url.contains("mode=memory");
        let options = SqlitePoolOptions::new().acquire_timeout(Duration::from_secs(10));
        let options = if in_memory {
            options
                .max_connections(1)
                .min_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            options.max_connections(5)
        };
        let pool = options.connect(url).await?;
        tracing::debug!(url, in_memory, "connected to sqlite");

        let store = Self { pool };
        store.init_schema().await?;
        Ok(store)
    }

    async fn init_schema(&self) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS todos (
                id TEXT PRIMARY KEY,
                title TEXT NOT NULL,
                description TEXT,
                due_date TEXT,
                created_at INTEGER NOT NULL,
                is_completed INTEGER NOT NULL DEFAULT 0
            )
            "#,
        )
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

#[async_trait]
impl TodoStore for SqliteStore {
    async fn find_many(&self, query: &TodoQuery) -> Result<Vec<Todo>, StoreError> {
        let mut builder = QueryBuilder::<Sqlite>::new(format!("SELECT {COLUMNS} FROM todos"));
        match &query.predicate {
            Some(Predicate::IsCompleted(flag)) => {
                builder.push(" WHERE is_completed = ").push_bind(*flag);
            }
            Some(Predicate::DueBefore(date)) => {
                builder.push(" WHERE due_date < ").push_bind(date.clone());
            }
            None => {}
        }
        // rowid breaks ties so equal keys keep insertion order
        match query.order_by {
            Some(order_by) => {
                builder
                    .push(" ORDER BY ")
                    .push(order_by.column())
                    .push(" ASC, rowid ASC");
            }
            None => {
                builder.push(" ORDER BY rowid ASC");
            }
        }

        let rows: Vec<TodoRow> = builder.build_query_as().fetch_all(&self.pool).await?;
        rows.into_iter().map(Todo::try_from).collect()
    }

    async fn find_unique(&self, id: Uuid) -> Result<Option<Todo>, StoreError> {
        let row: Option<TodoRow> =
            sqlx::query_as(&format!("SELECT {COLUMNS} FROM todos WHERE id = ?"))
                .bind(id.to_string())
                .fetch_optional(&self.pool)
                .await?;
        row.map(Todo::try_from).transpose()
    }

    async fn create(&self, todo: Todo) -> Result<Todo, StoreError> {
        let result: Result<TodoRow, sqlx::Error> = sqlx::query_as(&format!(
            "INSERT INTO todos ({COLUMNS}) VALUES (?, ?, ?, ?, ?, ?) RETURNING {COLUMNS}"
        ))
        .bind(todo.id.to_string())
        .bind(&todo.title)
        .bind(&todo.description)
        .bind(&todo.due_date)
        .bind(todo.created_at.timestamp_millis())
        .bind(todo.is_completed)
        .fetch_one(&self.pool)
        .await;

        match result {
            Ok(row) => Todo::try_from(row),
            Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
                Err(StoreError::Duplicate(todo.id))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn update(&self, id: Uuid, changes: &TodoUpdate) -> Result<Todo, StoreError> {
        let mut builder = QueryBuilder::<Sqlite>::new("UPDATE todos SET ");
        let touched = {
            let mut assignments = builder.separated(", ");
            let mut touched = false;
            if let Some(title) = &changes.title {
                assignments.push("title = ").push_bind_unseparated(title.clone());
                touched = true;
            }
            if let Some(description) = &changes.description {
                assignments
                    .push("description = ")
                    .push_bind_unseparated(description.clone());
                touched = true;
            }
            if let Some(due_date) = &changes.due_date {
                assignments
                    .push("due_date = ")
                    .push_bind_unseparated(due_date.clone());
                touched = true;
            }
            if let Some(is_completed) = changes.is_completed {
                assignments
                    .push("is_completed = ")
                    .push_bind_unseparated(is_completed);
                touched = true;
            }
            touched
        };

        if !touched {
            return self.find_unique(id).await?.ok_or(StoreError::NotFound(id));
        }

        builder
            .push(" WHERE id = ")
            .push_bind(id.to_string())
            .push(format!(" RETURNING {COLUMNS}"));
        let row: Option<TodoRow> = builder.build_query_as().fetch_optional(&self.pool).await?;
        row.ok_or(StoreError::NotFound(id))?.try_into()
    }

    async fn delete(&self, id: Uuid) -> Result<Todo, StoreError> {
        let row: Option<TodoRow> =
            sqlx::query_as(&format!("DELETE FROM todos WHERE id = ? RETURNING {COLUMNS}"))
                .bind(id.to_string())
                .fetch_optional(&self.pool)
                .await?;
        row.ok_or(StoreError::NotFound(id))?.try_into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::OrderBy;
    use chrono::{Duration, SubsecRound, TimeZone, Utc};

    async fn store() -> SqliteStore {
        SqliteStore::connect("sqlite::memory:").await.unwrap()
    }

    fn todo(title: &str, due_date: Option<&str>, minutes: i64) -> Todo {
        Todo {
            id: Uuid::new_v4(),
            title: title.to_string(),
            description: Some(format!("about {title}")),
            due_date: due_date.map(str::to_string),
            created_at: Utc.with_ymd_and_hms(2025, 4, 18, 0, 0, 0).unwrap()
                + Duration::minutes(minutes),
            is_completed: false,
        }
    }

    fn titles(todos: &[Todo]) -> Vec<&str> {
        todos.iter().map(|t| t.title.as_str()).collect()
    }

    #[tokio::test]
    async fn create_then_find_roundtrips() {
        let store = store().await;
        let mut input = todo("a", Some("2025-04-20"), 0);
        input.created_at = Utc::now().trunc_subsecs(3);
        let created = store.create(input.clone()).await.unwrap();
        assert_eq!(created, input);
        let found = store.find_unique(input.id).await.unwrap();
        assert_eq!(found, Some(input));
    }

    #[tokio::test]
    async fn find_unique_missing_is_none() {
        let store = store().await;
        assert!(store.find_unique(Uuid::new_v4()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn duplicate_id_is_rejected() {
        let store = store().await;
        let input = todo("a", None, 0);
        store.create(input.clone()).await.unwrap();
        let err = store.create(input).await.unwrap_err();
        assert!(matches!(err, StoreError::Duplicate(_)));
    }

    #[tokio::test]
    async fn find_many_filters_and_orders() {
        let store = store().await;
        let mut done = todo("b", Some("2025-04-22"), 2);
        done.is_completed = true;
        store.create(done).await.unwrap();
        store.create(todo("c", None, 0)).await.unwrap();
        store.create(todo("a", Some("2025-04-19"), 1)).await.unwrap();

        let all = store.find_many(&TodoQuery::default()).await.unwrap();
        assert_eq!(titles(&all), vec!["b", "c", "a"]);

        let query = TodoQuery {
            predicate: Some(Predicate::IsCompleted(false)),
            order_by: Some(OrderBy::Title),
        };
        assert_eq!(titles(&store.find_many(&query).await.unwrap()), vec!["a", "c"]);

        let query = TodoQuery {
            predicate: Some(Predicate::DueBefore("2025-04-20".to_string())),
            order_by: None,
        };
        assert_eq!(titles(&store.find_many(&query).await.unwrap()), vec!["a"]);

        let query = TodoQuery {
            predicate: None,
            order_by: Some(OrderBy::DueDate),
        };
        assert_eq!(
            titles(&store.find_many(&query).await.unwrap()),
            vec!["c", "a", "b"]
        );

        let query = TodoQuery {
            predicate: None,
            order_by: Some(OrderBy::CreatedAt),
        };
        assert_eq!(
            titles(&store.find_many(&query).await.unwrap()),
            vec!["c", "a", "b"]
        );
    }

    #[tokio::test]
    async fn update_writes_only_present_fields() {
        let store = store().await;
        let created = store.create(todo("a", Some("2025-04-20"), 0)).await.unwrap();
        let changes = TodoUpdate {
            title: Some("renamed".to_string()),
            due_date: Some(None),
            ..Default::default()
        };
        let updated = store.update(created.id, &changes).await.unwrap();
        assert_eq!(updated.title, "renamed");
        assert!(updated.due_date.is_none());
        assert_eq!(updated.description, created.description);
        assert_eq!(updated.created_at, created.created_at);
    }

    #[tokio::test]
    async fn empty_update_returns_current_record() {
        let store = store().await;
        let created = store.create(todo("a", None, 0)).await.unwrap();
        let same = store.update(created.id, &TodoUpdate::default()).await.unwrap();
        assert_eq!(same, created);
        let err = store
            .update(Uuid::new_v4(), &TodoUpdate::default())
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));
    }

    #[tokio::test]
    async fn delete_returns_snapshot_then_not_found() {
        let store = store().await;
        let created = store.create(todo("a", None, 0)).await.unwrap();
        assert_eq!(store.delete(created.id).await.unwrap(), created);
        let err = store.delete(created.id).await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));
    }
}
