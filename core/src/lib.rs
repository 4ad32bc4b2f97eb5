//! Domain types and API client core for the todo service.
//!
//! # Overview
//! Defines the `Todo` record and the payloads that create, replace, and
//! patch it, shared by the server and by anything that talks to it. The
//! `TodoClient` builds `HttpRequest` values and parses `HttpResponse` values
//! without touching the network (host-does-IO pattern).
//!
//! # Design
//! - `merge` is a pure function over a record and a `TodoPatch`, so patch
//!   semantics are testable without a store.
//! - `TodoFilter` and `TodoSort` parse from free text and never fail;
//!   unrecognized input maps to the no-op variant.
//! - `TodoClient` is stateless and holds only `base_url`.

pub mod client;
pub mod error;
pub mod http;
pub mod types;
pub mod validation;

pub use client::TodoClient;
pub use error::ApiError;
pub use http::{HttpMethod, HttpRequest, HttpResponse};
pub use types::{merge, Message, NewTodo, Todo, TodoFilter, TodoPatch, TodoSort, TodoUpdate};
pub use validation::ValidationError;
