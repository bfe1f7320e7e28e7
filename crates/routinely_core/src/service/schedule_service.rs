//! Routine materialization: turning templates into dated to-do items.
//!
//! # Responsibility
//! - Re-base routine task offsets onto a caller-chosen calendar day.
//! - Persist one to-do item per template task, surfacing partial failures.
//!
//! # Invariants
//! - Materialization only reads the routine template, never mutates it.
//! - Item persistence is per-task, not transactional; a failed task never
//!   rolls back items already written.
//! - Due timestamps always fall inside the chosen day's local bounds.

use crate::model::routine::Routine;
use crate::model::todo_item::TodoItem;
use crate::repo::todo_repo::TodoRepository;
use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use log::{info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// One template task that could not be persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailedTask {
    /// Position of the task in the routine's template order.
    pub index: usize,
    pub task_name: String,
    pub reason: String,
}

/// Errors from materializing a routine onto a date.
#[derive(Debug)]
pub enum MaterializeError {
    /// The chosen calendar day has no resolvable instant in the timezone.
    InvalidDate(NaiveDate),
    /// Some tasks persisted and some did not; retries are the caller's call.
    Partial {
        created: Vec<TodoItem>,
        failed: Vec<FailedTask>,
    },
}

impl Display for MaterializeError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidDate(date) => {
                write!(f, "date {date} has no valid local instant")
            }
            Self::Partial { created, failed } => {
                let indices = failed
                    .iter()
                    .map(|task| task.index.to_string())
                    .collect::<Vec<_>>()
                    .join(", ");
                write!(
                    f,
                    "materialized {} task(s), failed {} at indices [{indices}]",
                    created.len(),
                    failed.len()
                )
            }
        }
    }
}

impl Error for MaterializeError {}

/// Returns the first instant of `date` in `tz`.
///
/// DST transitions can remove local midnight; in that case the earliest
/// existing wall-clock instant of the day is used.
pub fn day_start<Tz: TimeZone>(date: NaiveDate, tz: &Tz) -> Option<DateTime<Tz>> {
    for hour in 0..24 {
        let naive = date.and_hms_opt(hour, 0, 0)?;
        if let Some(resolved) = tz.from_local_datetime(&naive).earliest() {
            return Some(resolved);
        }
    }
    None
}

/// Returns the half-open `[start, end)` epoch-second bounds of `date` in `tz`.
pub fn day_bounds<Tz: TimeZone>(date: NaiveDate, tz: &Tz) -> Option<(i64, i64)> {
    let start = day_start(date, tz)?;
    let end = day_start(date.succ_opt()?, tz)?;
    Some((start.timestamp(), end.timestamp()))
}

/// Computes the absolute due timestamp for a task offset on `date` in `tz`.
///
/// The offset is added to the day's first instant as plain seconds, matching
/// how the due times are later compared against day bounds.
pub fn due_timestamp<Tz: TimeZone>(offset_secs: i64, date: NaiveDate, tz: &Tz) -> Option<i64> {
    Some(day_start(date, tz)?.timestamp() + offset_secs)
}

/// Materialization service over one user's to-do collection.
pub struct ScheduleService<R: TodoRepository> {
    repo: R,
    user_id: String,
}

impl<R: TodoRepository> ScheduleService<R> {
    /// Creates a service for the given user over a repository implementation.
    pub fn new(repo: R, user_id: impl Into<String>) -> Self {
        Self {
            repo,
            user_id: user_id.into(),
        }
    }

    /// Copies every task of `routine` onto `date` as concrete to-do items.
    ///
    /// # Contract
    /// - One item per template task, in template order.
    /// - Each item gets a fresh id, `created_time = now`, `is_done = false`.
    /// - An empty task list yields `Ok(vec![])`.
    /// - Past dates are accepted; copying an old routine may be intentional.
    ///
    /// # Errors
    /// - `MaterializeError::Partial` when some per-item writes fail; the
    ///   report names each failed task index and the items that did persist.
    pub fn materialize<Tz: TimeZone>(
        &self,
        routine: &Routine,
        date: NaiveDate,
        tz: &Tz,
    ) -> Result<Vec<TodoItem>, MaterializeError> {
        let created_time = Utc::now().timestamp();

        let mut created = Vec::new();
        let mut failed = Vec::new();

        for (index, task) in routine.tasks.iter().enumerate() {
            let Some(due_date) = due_timestamp(task.time, date, tz) else {
                return Err(MaterializeError::InvalidDate(date));
            };
            let item = TodoItem::new(task.task_name.clone(), due_date, created_time);
            match self.repo.create_item(&self.user_id, &item) {
                Ok(()) => created.push(item),
                Err(err) => failed.push(FailedTask {
                    index,
                    task_name: task.task_name.clone(),
                    reason: err.to_string(),
                }),
            }
        }

        if failed.is_empty() {
            info!(
                "event=routine_materialized module=schedule status=ok routine_id={} date={date} count={}",
                routine.id,
                created.len()
            );
            Ok(created)
        } else {
            warn!(
                "event=routine_materialized module=schedule status=partial routine_id={} date={date} created={} failed={}",
                routine.id,
                created.len(),
                failed.len()
            );
            Err(MaterializeError::Partial { created, failed })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{day_bounds, day_start, due_timestamp};
    use chrono::{FixedOffset, NaiveDate, Utc};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
    }

    #[test]
    fn utc_day_bounds_are_midnight_to_midnight() {
        let (start, end) = day_bounds(date(2024, 3, 10), &Utc).expect("bounds");
        assert_eq!(start, 1_710_028_800);
        assert_eq!(end, start + 86_400);
    }

    #[test]
    fn due_timestamp_rebases_offset_onto_requested_day() {
        let morning = due_timestamp(21_600, date(2024, 3, 10), &Utc).expect("due");
        let evening = due_timestamp(72_000, date(2024, 3, 10), &Utc).expect("due");
        assert_eq!(morning, 1_710_028_800 + 21_600);
        assert_eq!(evening, 1_710_028_800 + 72_000);
    }

    #[test]
    fn same_offset_on_different_days_shifts_by_whole_days() {
        let first = due_timestamp(45_000, date(2024, 3, 10), &Utc).expect("due");
        let second = due_timestamp(45_000, date(2024, 3, 17), &Utc).expect("due");
        assert_eq!(second - first, 7 * 86_400);
    }

    #[test]
    fn fixed_offset_zone_shifts_day_start() {
        let tz = FixedOffset::east_opt(2 * 3600).expect("offset");
        let utc_start = day_start(date(2024, 3, 10), &Utc).expect("utc").timestamp();
        let local_start = day_start(date(2024, 3, 10), &tz).expect("local").timestamp();
        assert_eq!(utc_start - local_start, 2 * 3600);
    }

    #[test]
    fn boundary_offsets_stay_inside_the_day() {
        let (start, end) = day_bounds(date(2024, 3, 10), &Utc).expect("bounds");
        let first = due_timestamp(0, date(2024, 3, 10), &Utc).expect("due");
        let last = due_timestamp(86_399, date(2024, 3, 10), &Utc).expect("due");
        assert_eq!(first, start);
        assert_eq!(last, end - 1);
    }
}
