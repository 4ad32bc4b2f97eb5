use std::sync::Arc;

use async_trait::async_trait;
use todo_core::{Todo, TodoUpdate};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{StoreError, TodoQuery, TodoStore};

/// Process-local store. Records keep insertion order, which is the natural
/// order returned by unordered queries.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    todos: Arc<RwLock<Vec<Todo>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TodoStore for MemoryStore {
    async fn find_many(&self, query: &TodoQuery) -> Result<Vec<Todo>, StoreError> {
        let todos = self.todos.read().await;
        let mut found: Vec<Todo> = todos
            .iter()
            .filter(|todo| query.predicate.as_ref().is_none_or(|p| p.matches(todo)))
            .cloned()
            .collect();
        if let Some(order_by) = query.order_by {
            found.sort_by(|a, b| order_by.compare(a, b));
        }
        Ok(found)
    }

    async fn find_unique(&self, id: Uuid) -> Result<Option<Todo>, StoreError> {
        let todos = self.todos.read().await;
        Ok(todos.iter().find(|todo| todo.id == id).cloned())
    }

    async fn create(&self, todo: Todo) -> Result<Todo, StoreError> {
        let mut todos = self.todos.write().await;
        if todos.iter().any(|existing| existing.id == todo.id) {
            return Err(StoreError::Duplicate(todo.id));
        }
        todos.push(todo.clone());
        Ok(todo)
    }

    async fn update(&self, id: Uuid, changes: &TodoUpdate) -> Result<Todo, StoreError> {
        let mut todos = self.todos.write().await;
        let todo = todos
            .iter_mut()
            .find(|todo| todo.id == id)
            .ok_or(StoreError::NotFound(id))?;
        *todo = changes.apply(todo);
        Ok(todo.clone())
    }

    async fn delete(&self, id: Uuid) -> Result<Todo, StoreError> {
        let mut todos = self.todos.write().await;
        let index = todos
            .iter()
            .position(|todo| todo.id == id)
            .ok_or(StoreError::NotFound(id))?;
        Ok(todos.remove(index))
    }
}
