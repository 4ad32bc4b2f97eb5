//! Persistence capability for todo records.
//!
//! The service talks to storage only through [`TodoStore`]. A list request
//! is described by a [`TodoQuery`], an optional predicate plus an optional
//! ascending order, which each backend translates into its own terms.

mod memory;
mod sqlite;

use std::cmp::Ordering;
use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use todo_core::{Todo, TodoUpdate};
use uuid::Uuid;

use crate::config::{ConfigError, ServerConfig, StorageMode};

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Todo not found: {0}")]
    NotFound(Uuid),

    #[error("Todo already exists: {0}")]
    Duplicate(Uuid),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Corrupt row '{id}': {reason}")]
    Corrupt { id: String, reason: String },

    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Row selector applied by `find_many`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Predicate {
    IsCompleted(bool),
    /// `dueDate < date`, compared as `yyyy-mm-dd` strings. Records without
    /// a due date never match.
    DueBefore(String),
}

impl Predicate {
    pub fn matches(&self, todo: &Todo) -> bool {
        match self {
            Predicate::IsCompleted(flag) => todo.is_completed == *flag,
            Predicate::DueBefore(date) => todo
                .due_date
                .as_deref()
                .is_some_and(|due| due < date.as_str()),
        }
    }
}

/// Ascending sort key applied by `find_many`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderBy {
    Title,
    /// Records without a due date sort first.
    DueDate,
    CreatedAt,
}

impl OrderBy {
    pub fn compare(&self, a: &Todo, b: &Todo) -> Ordering {
        match self {
            OrderBy::Title => a.title.cmp(&b.title),
            OrderBy::DueDate => a.due_date.cmp(&b.due_date),
            OrderBy::CreatedAt => a.created_at.cmp(&b.created_at),
        }
    }

    fn column(&self) -> &'static str {
        match self {
            OrderBy::Title => "title",
            OrderBy::DueDate => "due_date",
            OrderBy::CreatedAt => "created_at",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TodoQuery {
    pub predicate: Option<Predicate>,
    pub order_by: Option<OrderBy>,
}

#[async_trait]
pub trait TodoStore: Send + Sync {
    /// Records matching the query. Without an ordering the backend's natural
    /// order is returned.
    async fn find_many(&self, query: &TodoQuery) -> Result<Vec<Todo>, StoreError>;

    async fn find_unique(&self, id: Uuid) -> Result<Option<Todo>, StoreError>;

    async fn create(&self, todo: Todo) -> Result<Todo, StoreError>;

    /// Write every field present in `changes` and return the stored result.
    /// Fails with `NotFound` if the id is absent.
    async fn update(&self, id: Uuid, changes: &TodoUpdate) -> Result<Todo, StoreError>;

    /// Remove the record and return it as it was. Fails with `NotFound` if
    /// the id is absent.
    async fn delete(&self, id: Uuid) -> Result<Todo, StoreError>;
}

/// Open the backend selected by `config`.
pub async fn open_store(config: &ServerConfig) -> Result<Arc<dyn TodoStore>, StoreError> {
    match config.storage_mode {
        StorageMode::Memory => Ok(Arc::new(MemoryStore::new())),
        StorageMode::Sqlite => {
            Ok(Arc::new(SqliteStore::connect(config.sqlite_url()?).await?))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn todo(title: &str, due_date: Option<&str>) -> Todo {
        Todo {
            id: Uuid::new_v4(),
            title: title.to_string(),
            description: None,
            due_date: due_date.map(str::to_string),
            created_at: Utc.with_ymd_and_hms(2025, 4, 18, 0, 0, 0).unwrap(),
            is_completed: false,
        }
    }

    #[test]
    fn due_before_is_strict_and_skips_missing_dates() {
        let predicate = Predicate::DueBefore("2025-04-20".to_string());
        assert!(predicate.matches(&todo("a", Some("2025-04-19"))));
        assert!(!predicate.matches(&todo("b", Some("2025-04-20"))));
        assert!(!predicate.matches(&todo("c", Some("2025-05-01"))));
        assert!(!predicate.matches(&todo("d", None)));
    }

    #[test]
    fn is_completed_matches_flag() {
        let mut done = todo("a", None);
        done.is_completed = true;
        assert!(Predicate::IsCompleted(true).matches(&done));
        assert!(!Predicate::IsCompleted(false).matches(&done));
    }

    #[test]
    fn due_date_order_puts_missing_first() {
        let none = todo("a", None);
        let early = todo("b", Some("2025-01-01"));
        assert_eq!(OrderBy::DueDate.compare(&none, &early), Ordering::Less);
        assert_eq!(OrderBy::DueDate.compare(&early, &none), Ordering::Greater);
    }

    #[tokio::test]
    async fn sqlite_mode_requires_a_url() {
        let config = ServerConfig {
            storage_mode: StorageMode::Sqlite,
            database_url: None,
            ..ServerConfig::default()
        };
        let result = open_store(&config).await;
        assert!(matches!(
            result,
            Err(StoreError::Config(ConfigError::MissingDatabaseUrl))
        ));
    }
}
