//! Todo service: turns list requests and writes into store calls.
//!
//! Every mutation reads the target first so a missing id always comes back
//! as `Ok(None)`, whatever the backend would do on its own.

use std::sync::Arc;

use chrono::{Local, NaiveDate, SubsecRound, Utc};
use todo_core::{merge, NewTodo, Todo, TodoFilter, TodoPatch, TodoSort, TodoUpdate};
use uuid::Uuid;

use crate::store::{OrderBy, Predicate, StoreError, TodoQuery, TodoStore};

/// Source of "today" for the overdue filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Clock {
    /// The local calendar date at call time.
    #[default]
    Local,
    Fixed(NaiveDate),
}

impl Clock {
    pub fn today(&self) -> NaiveDate {
        match self {
            Clock::Local => Local::now().date_naive(),
            Clock::Fixed(date) => *date,
        }
    }
}

pub struct TodoService {
    store: Arc<dyn TodoStore>,
    clock: Clock,
}

impl TodoService {
    pub fn new(store: Arc<dyn TodoStore>) -> Self {
        Self::with_clock(store, Clock::Local)
    }

    pub fn with_clock(store: Arc<dyn TodoStore>, clock: Clock) -> Self {
        Self { store, clock }
    }

    /// Translate a sort/filter pair into a store query.
    pub fn query_for(&self, sort: TodoSort, filter: TodoFilter) -> TodoQuery {
        let predicate = match filter {
            TodoFilter::All => None,
            TodoFilter::Completed => Some(Predicate::IsCompleted(true)),
            TodoFilter::Incomplete => Some(Predicate::IsCompleted(false)),
            TodoFilter::Overdue => Some(Predicate::DueBefore(
                self.clock.today().format("%Y-%m-%d").to_string(),
            )),
        };
        let order_by = match sort {
            TodoSort::Unsorted => None,
            TodoSort::Title => Some(OrderBy::Title),
            TodoSort::DueDate => Some(OrderBy::DueDate),
            TodoSort::CreatedAt => Some(OrderBy::CreatedAt),
        };
        TodoQuery {
            predicate,
            order_by,
        }
    }

    pub async fn list_todos(
        &self,
        sort: TodoSort,
        filter: TodoFilter,
    ) -> Result<Vec<Todo>, StoreError> {
        let query = self.query_for(sort, filter);
        let todos = self.store.find_many(&query).await?;
        tracing::debug!(?sort, ?filter, count = todos.len(), "listed todos");
        Ok(todos)
    }

    pub async fn get_todo_by_id(&self, id: Uuid) -> Result<Option<Todo>, StoreError> {
        self.store.find_unique(id).await
    }

    /// Assigns `id` and `createdAt`; the record starts incomplete.
    pub async fn add_todo(&self, fields: NewTodo) -> Result<Todo, StoreError> {
        // millisecond precision so every backend returns the same value
        let created_at = Utc::now().trunc_subsecs(3);
        let todo = self
            .store
            .create(Todo::new(Uuid::new_v4(), fields, created_at))
            .await?;
        tracing::info!(id = %todo.id, "created todo");
        Ok(todo)
    }

    /// Write every field present in `changes` over the stored record.
    pub async fn update_todo(
        &self,
        id: Uuid,
        changes: TodoUpdate,
    ) -> Result<Option<Todo>, StoreError> {
        if self.store.find_unique(id).await?.is_none() {
            return Ok(None);
        }
        let updated = self.write(id, &changes).await?;
        if updated.is_some() {
            tracing::info!(%id, "updated todo");
        }
        Ok(updated)
    }

    /// Merge the non-null fields of `patch` onto the stored record.
    pub async fn patch_todo(&self, id: Uuid, patch: TodoPatch) -> Result<Option<Todo>, StoreError> {
        let Some(existing) = self.store.find_unique(id).await? else {
            return Ok(None);
        };
        if patch.is_empty() {
            return Ok(Some(existing));
        }
        let merged = merge(&existing, &patch);
        let patched = self.write(id, &TodoUpdate::replacing(&merged)).await?;
        if patched.is_some() {
            tracing::info!(%id, "patched todo");
        }
        Ok(patched)
    }

    /// Returns the record as it was before deletion.
    pub async fn delete_todo(&self, id: Uuid) -> Result<Option<Todo>, StoreError> {
        if self.store.find_unique(id).await?.is_none() {
            return Ok(None);
        }
        match self.store.delete(id).await {
            Ok(deleted) => {
                tracing::info!(%id, "deleted todo");
                Ok(Some(deleted))
            }
            Err(StoreError::NotFound(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// A record deleted between the read and the write reports not-found.
    async fn write(&self, id: Uuid, changes: &TodoUpdate) -> Result<Option<Todo>, StoreError> {
        match self.store.update(id, changes).await {
            Ok(todo) => Ok(Some(todo)),
            Err(StoreError::NotFound(_)) => {
                tracing::debug!(%id, "todo vanished before write");
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }
}
