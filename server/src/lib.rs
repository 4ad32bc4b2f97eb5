//! HTTP server for the todo list.
//!
//! Routes map one-to-one onto `TodoService` operations:
//!
//! | Method | Path          | Success                     | Missing id |
//! |--------|---------------|-----------------------------|------------|
//! | GET    | `/todos`      | 200, array                  |            |
//! | GET    | `/todos/{id}` | 200, record                 | 404 `{error}` |
//! | POST   | `/todos`      | 201, created record         |            |
//! | PUT    | `/todos/{id}` | 200, updated record         | 404 `{message}` |
//! | PATCH  | `/todos/{id}` | 200, patched record         | 404 `{message}` |
//! | DELETE | `/todos/{id}` | 200, `{message}`            | 404 `{message}` |

pub mod config;
pub mod error;
pub mod service;
pub mod store;

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde_json::{json, Value};
use todo_core::{Message, NewTodo, Todo, TodoFilter, TodoPatch, TodoSort, TodoUpdate};
use tokio::{net::TcpListener, signal};
use tower_http::trace::TraceLayer;
use uuid::Uuid;

pub use config::{ConfigError, ServerConfig, StorageMode};
pub use error::AppError;
pub use service::{Clock, TodoService};
pub use store::{open_store, MemoryStore, SqliteStore, StoreError, TodoStore};

#[derive(Clone)]
pub struct AppState {
    pub service: Arc<TodoService>,
}

/// Free-text list parameters; anything unrecognized is ignored.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct ListParams {
    pub sort: String,
    pub filter: String,
}

impl ListParams {
    /// Pick `sort` and `filter` out of raw query pairs. A repeated key keeps
    /// its first value.
    pub fn from_pairs(pairs: Vec<(String, String)>) -> Self {
        let mut sort = None;
        let mut filter = None;
        for (key, value) in pairs {
            match key.as_str() {
                "sort" => {
                    sort.get_or_insert(value);
                }
                "filter" => {
                    filter.get_or_insert(value);
                }
                _ => {}
            }
        }
        Self {
            sort: sort.unwrap_or_default(),
            filter: filter.unwrap_or_default(),
        }
    }
}

pub fn app(service: TodoService) -> Router {
    let state = AppState {
        service: Arc::new(service),
    };
    Router::new()
        .route("/health", get(health))
        .route("/todos", get(list_todos).post(create_todo))
        .route(
            "/todos/{id}",
            get(get_todo)
                .put(update_todo)
                .patch(patch_todo)
                .delete(delete_todo),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serve until Ctrl-C or SIGTERM.
pub async fn run(listener: TcpListener, service: TodoService) -> Result<(), std::io::Error> {
    axum::serve(listener, app(service))
        .with_graceful_shutdown(shutdown_signal())
        .await
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(error) = signal::ctrl_c().await {
            tracing::warn!(%error, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(error) => {
                tracing::warn!(%error, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => tracing::info!("received Ctrl+C, shutting down"),
        () = terminate => tracing::info!("received SIGTERM, shutting down"),
    }
}

/// An id that is not a UUID cannot name any stored record.
fn parse_id(raw: &str) -> Option<Uuid> {
    Uuid::parse_str(raw).ok()
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

async fn list_todos(
    State(state): State<AppState>,
    Query(pairs): Query<Vec<(String, String)>>,
) -> Result<Json<Vec<Todo>>, AppError> {
    let params = ListParams::from_pairs(pairs);
    let sort = TodoSort::from(params.sort.as_str());
    let filter = TodoFilter::from(params.filter.as_str());
    let todos = state.service.list_todos(sort, filter).await?;
    Ok(Json(todos))
}

async fn get_todo(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Todo>, AppError> {
    let id = parse_id(&id).ok_or(AppError::NotFound)?;
    state
        .service
        .get_todo_by_id(id)
        .await?
        .map(Json)
        .ok_or(AppError::NotFound)
}

async fn create_todo(
    State(state): State<AppState>,
    Json(input): Json<NewTodo>,
) -> Result<(StatusCode, Json<Todo>), AppError> {
    input.validate()?;
    let todo = state.service.add_todo(input).await?;
    Ok((StatusCode::CREATED, Json(todo)))
}

async fn update_todo(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(input): Json<TodoUpdate>,
) -> Result<Json<Todo>, AppError> {
    let id = parse_id(&id).ok_or(AppError::TodoNotFound)?;
    input.validate()?;
    state
        .service
        .update_todo(id, input)
        .await?
        .map(Json)
        .ok_or(AppError::TodoNotFound)
}

async fn patch_todo(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(input): Json<TodoPatch>,
) -> Result<Json<Todo>, AppError> {
    let id = parse_id(&id).ok_or(AppError::TodoNotFound)?;
    input.validate()?;
    state
        .service
        .patch_todo(id, input)
        .await?
        .map(Json)
        .ok_or(AppError::TodoNotFound)
}

async fn delete_todo(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Message>, AppError> {
    let id = parse_id(&id).ok_or(AppError::TodoNotFound)?;
    state
        .service
        .delete_todo(id)
        .await?
        .ok_or(AppError::TodoNotFound)?;
    Ok(Json(Message {
        message: "Todo deleted successfully".to_string(),
    }))
}
