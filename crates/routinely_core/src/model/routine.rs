//! Routine catalog domain model.
//!
//! # Responsibility
//! - Define routine templates, their per-day task entries, and purchases.
//! - Validate task offsets against day boundaries.
//!
//! # Invariants
//! - `RoutineTask.time` is an offset within one day (`0 ≤ time < 86400`)
//!   and must never be treated as an absolute timestamp.
//! - Task order inside a routine is insertion order from the source
//!   collection and is preserved end to end.
//! - A purchase is uniquely identified by the `(user_id, routine_id)` pair.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Seconds in one calendar day; upper bound (exclusive) for task offsets.
pub const SECONDS_PER_DAY: i64 = 86_400;

/// Validation errors for routine templates and their tasks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoutineValidationError {
    /// Task name is blank after trimming.
    BlankTaskName,
    /// Task time lies outside the `[0, 86400)` day window.
    TaskTimeOutOfRange { task_name: String, time: i64 },
}

impl Display for RoutineValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BlankTaskName => write!(f, "routine task name must not be blank"),
            Self::TaskTimeOutOfRange { task_name, time } => write!(
                f,
                "routine task `{task_name}` time {time} is outside [0, {SECONDS_PER_DAY})"
            ),
        }
    }
}

impl Error for RoutineValidationError {}

/// One templated task inside a routine.
///
/// `time` is the scheduled offset from local midnight, in seconds. The
/// template never carries a calendar date; materialization re-bases the
/// offset onto a caller-chosen day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoutineTask {
    /// Seconds from local midnight.
    pub time: i64,
    /// Display name; becomes the to-do item title on materialization.
    pub task_name: String,
    /// Free-form description shown in routine detail views.
    pub description: String,
}

impl RoutineTask {
    /// Checks task invariants before persistence or materialization.
    pub fn validate(&self) -> Result<(), RoutineValidationError> {
        if self.task_name.trim().is_empty() {
            return Err(RoutineValidationError::BlankTaskName);
        }
        if self.time < 0 || self.time >= SECONDS_PER_DAY {
            return Err(RoutineValidationError::TaskTimeOutOfRange {
                task_name: self.task_name.clone(),
                time: self.time,
            });
        }
        Ok(())
    }
}

/// A named routine template: an ordered list of time-of-day tasks.
///
/// Immutable once fetched; materialization only reads it. The `id` is the
/// document key in the backing collection and is not part of the encoded
/// document body, so it decodes to an empty string and is filled in by the
/// repository after the row key is known.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Routine {
    /// Document key of the routine; assigned by the catalog repository.
    #[serde(default)]
    pub id: String,
    /// Name of the celebrity the routine belongs to.
    pub celebrity_name: String,
    /// URL of the routine cover photo.
    pub photo: String,
    /// Marketing description of the routine.
    pub description: String,
    /// Ordered task templates; order is significant for display.
    pub tasks: Vec<RoutineTask>,
}

impl Routine {
    /// Validates every task in template order; fails on the first bad task.
    pub fn validate(&self) -> Result<(), RoutineValidationError> {
        for task in &self.tasks {
            task.validate()?;
        }
        Ok(())
    }
}

/// One purchase of a routine by a user.
///
/// The `(user_id, routine_id)` pair is the uniqueness key. Purchases are
/// created once and never mutated or deleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Purchase {
    pub user_id: String,
    pub routine_id: String,
    /// Purchase instant, epoch seconds.
    pub purchase_date: i64,
}
