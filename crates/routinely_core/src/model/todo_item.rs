//! To-do item domain model.
//!
//! # Responsibility
//! - Define the concrete dated item stored in a user's to-do collection.
//! - Provide the completion-flag mutation helper.
//!
//! # Invariants
//! - `id` is stable, unique within one user's collection, and never reused
//!   after delete.
//! - After creation only `is_done` is mutable; title and due date are fixed.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Validation errors for persisted to-do items.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TodoValidationError {
    /// Item id is blank.
    BlankId,
    /// Item title is blank after trimming.
    BlankTitle,
}

impl Display for TodoValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BlankId => write!(f, "todo item id must not be blank"),
            Self::BlankTitle => write!(f, "todo item title must not be blank"),
        }
    }
}

impl Error for TodoValidationError {}

/// One concrete dated entry in a user's to-do list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TodoItem {
    /// Stable document key within the owning user's collection.
    pub id: String,
    /// Display title.
    pub title: String,
    /// Absolute due instant, epoch seconds.
    pub due_date: i64,
    /// Creation instant, epoch seconds.
    pub created_time: i64,
    /// Completion flag; the only field mutable after creation.
    pub is_done: bool,
}

impl TodoItem {
    /// Creates an item with a freshly generated id and `is_done = false`.
    pub fn new(title: impl Into<String>, due_date: i64, created_time: i64) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            title: title.into(),
            due_date,
            created_time,
            is_done: false,
        }
    }

    /// Sets the completion state.
    pub fn set_done(&mut self, state: bool) {
        self.is_done = state;
    }

    /// Checks item invariants before persistence.
    pub fn validate(&self) -> Result<(), TodoValidationError> {
        if self.id.trim().is_empty() {
            return Err(TodoValidationError::BlankId);
        }
        if self.title.trim().is_empty() {
            return Err(TodoValidationError::BlankTitle);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{TodoItem, TodoValidationError};

    #[test]
    fn new_items_start_incomplete_with_generated_id() {
        let item = TodoItem::new("buy milk", 1_700_000_000, 1_699_990_000);
        assert!(!item.is_done);
        assert!(!item.id.is_empty());
        assert_eq!(item.title, "buy milk");
    }

    #[test]
    fn generated_ids_are_unique() {
        let first = TodoItem::new("a", 0, 0);
        let second = TodoItem::new("a", 0, 0);
        assert_ne!(first.id, second.id);
    }

    #[test]
    fn set_done_flips_only_the_flag() {
        let mut item = TodoItem::new("buy milk", 10, 5);
        item.set_done(true);
        assert!(item.is_done);
        assert_eq!(item.due_date, 10);
        assert_eq!(item.created_time, 5);
    }

    #[test]
    fn blank_title_fails_validation() {
        let item = TodoItem::new("  ", 0, 0);
        assert_eq!(item.validate(), Err(TodoValidationError::BlankTitle));
    }

    #[test]
    fn wire_shape_matches_store_field_names() {
        let item = TodoItem::new("buy milk", 1_700_000_000, 1_699_990_000);
        let json = serde_json::to_string(&item).unwrap();
        assert!(json.contains("\"dueDate\""));
        assert!(json.contains("\"createdTime\""));
        assert!(json.contains("\"isDone\""));
    }
}
