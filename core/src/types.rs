//! Domain types for the todo API.
//!
//! # Design
//! The server and the client share these types so the wire schema has a
//! single definition. Keys are camelCase on the wire.
//!
//! Writes come in three shapes. `NewTodo` carries only the caller-supplied
//! fields of a create. `TodoUpdate` is the PUT body: every key is optional,
//! and for the nullable fields an explicit `null` clears the value.
//! `TodoPatch` is the PATCH body: `null` and an absent key are the same
//! thing, so a patch can only set values, never clear them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

/// A single todo record as stored and returned by the API.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Todo {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    /// Calendar date in `yyyy-mm-dd` form. Compared as a string.
    pub due_date: Option<String>,
    pub created_at: DateTime<Utc>,
    pub is_completed: bool,
}

impl Todo {
    /// Build a fresh record from create input. New todos always start
    /// incomplete.
    pub fn new(id: Uuid, fields: NewTodo, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            title: fields.title,
            description: fields.description,
            due_date: fields.due_date,
            created_at,
            is_completed: false,
        }
    }
}

/// Request payload for creating a new todo.
///
/// `id`, `createdAt` and `isCompleted` are assigned by the server; if a
/// caller sends them they are ignored.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct NewTodo {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<String>,
}

/// Request payload for a full update (PUT).
///
/// Absent keys leave the stored value untouched. `description` and `dueDate`
/// distinguish "absent" (`None`) from "explicitly null" (`Some(None)`), the
/// latter clearing the field. A null `title` is treated as absent.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TodoUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(
        default,
        deserialize_with = "present",
        skip_serializing_if = "Option::is_none"
    )]
    pub description: Option<Option<String>>,
    #[serde(
        default,
        deserialize_with = "present",
        skip_serializing_if = "Option::is_none"
    )]
    pub due_date: Option<Option<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_completed: Option<bool>,
}

impl TodoUpdate {
    /// An update that rewrites every mutable field of `todo`.
    pub fn replacing(todo: &Todo) -> Self {
        Self {
            title: Some(todo.title.clone()),
            description: Some(todo.description.clone()),
            due_date: Some(todo.due_date.clone()),
            is_completed: Some(todo.is_completed),
        }
    }

    /// Return `todo` with every field present in this update written over it.
    /// `id` and `createdAt` are never touched.
    pub fn apply(&self, todo: &Todo) -> Todo {
        let mut next = todo.clone();
        if let Some(title) = &self.title {
            next.title = title.clone();
        }
        if let Some(description) = &self.description {
            next.description = description.clone();
        }
        if let Some(due_date) = &self.due_date {
            next.due_date = due_date.clone();
        }
        if let Some(is_completed) = self.is_completed {
            next.is_completed = is_completed;
        }
        next
    }
}

/// Request payload for a partial update (PATCH).
///
/// `null` deserializes to `None` exactly like an absent key, so it can never
/// clear a stored value. Falsy but real values (`false`, `""`) are kept.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TodoPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_completed: Option<bool>,
}

impl TodoPatch {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.due_date.is_none()
            && self.is_completed.is_none()
    }
}

/// Merge `patch` onto `existing`, keeping every field the patch leaves out.
pub fn merge(existing: &Todo, patch: &TodoPatch) -> Todo {
    Todo {
        id: existing.id,
        title: patch.title.clone().unwrap_or_else(|| existing.title.clone()),
        description: patch
            .description
            .clone()
            .or_else(|| existing.description.clone()),
        due_date: patch.due_date.clone().or_else(|| existing.due_date.clone()),
        created_at: existing.created_at,
        is_completed: patch.is_completed.unwrap_or(existing.is_completed),
    }
}

/// Deserialize a key that is present in the input, wrapping even `null` in
/// `Some` so callers can tell it apart from a missing key.
fn present<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Subset selector for list queries. Unrecognized input selects everything.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TodoFilter {
    #[default]
    All,
    Completed,
    Incomplete,
    /// Due strictly before today.
    Overdue,
}

impl TodoFilter {
    pub fn as_str(&self) -> &'static str {
        match self {
            TodoFilter::All => "",
            TodoFilter::Completed => "completed",
            TodoFilter::Incomplete => "incomplete",
            TodoFilter::Overdue => "overdue",
        }
    }
}

impl From<&str> for TodoFilter {
    fn from(value: &str) -> Self {
        match value {
            "completed" => TodoFilter::Completed,
            "incomplete" => TodoFilter::Incomplete,
            "overdue" => TodoFilter::Overdue,
            _ => TodoFilter::All,
        }
    }
}

/// Ordering key for list queries, always ascending. Unrecognized input
/// leaves the store's natural order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TodoSort {
    #[default]
    Unsorted,
    Title,
    DueDate,
    CreatedAt,
}

impl TodoSort {
    pub fn as_str(&self) -> &'static str {
        match self {
            TodoSort::Unsorted => "",
            TodoSort::Title => "title",
            TodoSort::DueDate => "dueDate",
            TodoSort::CreatedAt => "createdAt",
        }
    }
}

impl From<&str> for TodoSort {
    fn from(value: &str) -> Self {
        match value {
            "title" => TodoSort::Title,
            "dueDate" => TodoSort::DueDate,
            "createdAt" => TodoSort::CreatedAt,
            _ => TodoSort::Unsorted,
        }
    }
}

/// Confirmation body returned by a successful delete.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Message {
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rstest::rstest;

    fn sample() -> Todo {
        Todo {
            id: Uuid::nil(),
            title: "A".to_string(),
            description: Some("d".to_string()),
            due_date: Some("2025-04-20".to_string()),
            created_at: Utc.with_ymd_and_hms(2025, 4, 18, 9, 30, 0).unwrap(),
            is_completed: false,
        }
    }

    #[test]
    fn todo_serializes_with_camel_case_keys() {
        let json = serde_json::to_value(sample()).unwrap();
        assert_eq!(json["id"], "00000000-0000-0000-0000-000000000000");
        assert_eq!(json["title"], "A");
        assert_eq!(json["dueDate"], "2025-04-20");
        assert_eq!(json["isCompleted"], false);
        assert_eq!(json["createdAt"], "2025-04-18T09:30:00Z");
    }

    #[test]
    fn todo_serializes_absent_optionals_as_null() {
        let mut todo = sample();
        todo.description = None;
        todo.due_date = None;
        let json = serde_json::to_value(todo).unwrap();
        assert!(json["description"].is_null());
        assert!(json["dueDate"].is_null());
    }

    #[test]
    fn new_todo_ignores_server_assigned_fields() {
        let input: NewTodo = serde_json::from_str(
            r#"{"title":"x","id":"abc","createdAt":"never","isCompleted":true}"#,
        )
        .unwrap();
        assert_eq!(input.title, "x");
        assert!(input.description.is_none());
    }

    #[test]
    fn new_todo_rejects_missing_title() {
        let result: Result<NewTodo, _> = serde_json::from_str(r#"{"description":"d"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn todo_new_always_starts_incomplete() {
        let fields = NewTodo {
            title: "t".to_string(),
            ..Default::default()
        };
        let todo = Todo::new(Uuid::nil(), fields, Utc::now());
        assert!(!todo.is_completed);
    }

    #[test]
    fn update_distinguishes_null_from_absent() {
        let input: TodoUpdate =
            serde_json::from_str(r#"{"description":null,"title":"t"}"#).unwrap();
        assert_eq!(input.title.as_deref(), Some("t"));
        assert_eq!(input.description, Some(None));
        assert_eq!(input.due_date, None);
    }

    #[test]
    fn update_with_null_title_is_treated_as_absent() {
        let input: TodoUpdate = serde_json::from_str(r#"{"title":null}"#).unwrap();
        assert!(input.title.is_none());
    }

    #[test]
    fn update_apply_clears_nullable_fields() {
        let update = TodoUpdate {
            description: Some(None),
            ..Default::default()
        };
        let next = update.apply(&sample());
        assert!(next.description.is_none());
        assert_eq!(next.due_date.as_deref(), Some("2025-04-20"));
        assert_eq!(next.title, "A");
    }

    #[test]
    fn update_serializes_explicit_null() {
        let update = TodoUpdate {
            due_date: Some(None),
            ..Default::default()
        };
        let json = serde_json::to_value(update).unwrap();
        assert!(json.get("dueDate").unwrap().is_null());
        assert!(json.get("title").is_none());
    }

    #[test]
    fn replacing_update_reproduces_the_record() {
        let todo = sample();
        let mut other = sample();
        other.title = "Z".to_string();
        other.is_completed = true;
        other.description = None;
        assert_eq!(TodoUpdate::replacing(&todo).apply(&other), todo);
    }

    #[test]
    fn patch_null_never_changes_a_field() {
        let patch: TodoPatch =
            serde_json::from_str(r#"{"description":null,"dueDate":null,"isCompleted":null}"#)
                .unwrap();
        assert!(patch.is_empty());
        assert_eq!(merge(&sample(), &patch), sample());
    }

    #[test]
    fn patch_false_and_empty_string_are_applied() {
        let mut existing = sample();
        existing.is_completed = true;
        let patch: TodoPatch =
            serde_json::from_str(r#"{"isCompleted":false,"description":""}"#).unwrap();
        let merged = merge(&existing, &patch);
        assert!(!merged.is_completed);
        assert_eq!(merged.description.as_deref(), Some(""));
        assert_eq!(merged.title, "A");
    }

    #[test]
    fn merge_keeps_identity_fields() {
        let existing = sample();
        let patch = TodoPatch {
            title: Some("B".to_string()),
            is_completed: Some(true),
            ..Default::default()
        };
        let merged = merge(&existing, &patch);
        assert_eq!(merged.id, existing.id);
        assert_eq!(merged.created_at, existing.created_at);
        assert_eq!(merged.title, "B");
        assert!(merged.is_completed);
    }

    #[rstest]
    #[case("", TodoFilter::All)]
    #[case("completed", TodoFilter::Completed)]
    #[case("incomplete", TodoFilter::Incomplete)]
    #[case("overdue", TodoFilter::Overdue)]
    #[case("Completed", TodoFilter::All)]
    #[case("archived", TodoFilter::All)]
    fn filter_from_str(#[case] input: &str, #[case] expected: TodoFilter) {
        assert_eq!(TodoFilter::from(input), expected);
    }

    #[rstest]
    #[case("", TodoSort::Unsorted)]
    #[case("title", TodoSort::Title)]
    #[case("dueDate", TodoSort::DueDate)]
    #[case("createdAt", TodoSort::CreatedAt)]
    #[case("due_date", TodoSort::Unsorted)]
    #[case("priority", TodoSort::Unsorted)]
    fn sort_from_str(#[case] input: &str, #[case] expected: TodoSort) {
        assert_eq!(TodoSort::from(input), expected);
    }
}
