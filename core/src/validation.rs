//! Input checks applied to create and update payloads before they reach the
//! store.
//!
//! A title must contain something other than whitespace. A due date, when
//! given and non-empty, must be a real calendar date written as `yyyy-mm-dd`
//! so that string comparison matches date order.

use chrono::NaiveDate;
use thiserror::Error;

use crate::types::{NewTodo, TodoPatch, TodoUpdate};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Title is required")]
    MissingTitle,

    #[error("Due date must be formatted as yyyy-mm-dd")]
    InvalidDueDate(String),
}

fn check_title(title: &str) -> Result<(), ValidationError> {
    if title.trim().is_empty() {
        return Err(ValidationError::MissingTitle);
    }
    Ok(())
}

fn check_due_date(due_date: &str) -> Result<(), ValidationError> {
    if due_date.is_empty() {
        return Ok(());
    }
    let well_formed = due_date.len() == 10
        && NaiveDate::parse_from_str(due_date, "%Y-%m-%d").is_ok();
    if !well_formed {
        return Err(ValidationError::InvalidDueDate(due_date.to_string()));
    }
    Ok(())
}

impl NewTodo {
    pub fn validate(&self) -> Result<(), ValidationError> {
        check_title(&self.title)?;
        if let Some(due_date) = &self.due_date {
            check_due_date(due_date)?;
        }
        Ok(())
    }
}

impl TodoUpdate {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if let Some(title) = &self.title {
            check_title(title)?;
        }
        if let Some(Some(due_date)) = &self.due_date {
            check_due_date(due_date)?;
        }
        Ok(())
    }
}

impl TodoPatch {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if let Some(title) = &self.title {
            check_title(title)?;
        }
        if let Some(due_date) = &self.due_date {
            check_due_date(due_date)?;
        }
        Ok(())
    }
}
