//! Live to-do list service: snapshots, mutations, and projections.
//!
//! # Responsibility
//! - Own the authoritative ordered view of one user's to-do items.
//! - Deliver full-set snapshots to subscribers after every accepted mutation.
//! - Validate direct item creation before any write happens.
//!
//! # Invariants
//! - Snapshots are ordered ascending by due timestamp, ties broken by id.
//! - Mutations touch subscribers only after the store acknowledged the write;
//!   there is no optimistic local apply to roll back.
//! - A permanent snapshot re-read failure terminates every subscription with
//!   one `ListEvent::Closed` and drains the subscriber set.

use crate::model::todo_item::TodoItem;
use crate::repo::todo_repo::{TodoRepoError, TodoRepository};
use crate::service::schedule_service::day_bounds;
use chrono::{NaiveDate, TimeZone, Utc};
use log::error;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::mpsc::{channel, Receiver, Sender};

/// Grace window for backdated direct item creation, in seconds.
const DUE_DATE_LEEWAY_SECS: i64 = 86_400;

/// Validation errors for direct item creation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// `title` is blank after trimming.
    EmptyTitle,
    /// `dueDate` is more than one day before the current time.
    DueDateTooOld {
        due_date: i64,
        earliest_allowed: i64,
    },
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyTitle => write!(f, "title must not be blank after trimming"),
            Self::DueDateTooOld {
                due_date,
                earliest_allowed,
            } => write!(
                f,
                "dueDate {due_date} is more than one day in the past (earliest allowed {earliest_allowed})"
            ),
        }
    }
}

impl Error for ValidationError {}

/// Errors from list mutations and snapshot reads.
#[derive(Debug)]
pub enum ListServiceError {
    /// Creation input failed validation; nothing was written.
    Validation(ValidationError),
    /// The store rejected a toggle write; in-memory state was left untouched.
    WriteConflict { id: String, source: TodoRepoError },
    /// Other repository failure.
    Repo(TodoRepoError),
}

impl Display for ListServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::WriteConflict { id, source } => {
                write!(f, "write conflict on todo item {id}: {source}")
            }
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ListServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::WriteConflict { source, .. } => Some(source),
            Self::Repo(err) => Some(err),
        }
    }
}

impl From<ValidationError> for ListServiceError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<TodoRepoError> for ListServiceError {
    fn from(value: TodoRepoError) -> Self {
        Self::Repo(value)
    }
}

/// One delivery on a live subscription.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListEvent {
    /// Full ordered view of the user's items at one point in time.
    Snapshot(Vec<TodoItem>),
    /// Terminal event: the subscription will deliver nothing further.
    Closed { reason: String },
}

/// Handle for one live subscription; cancel via `unsubscribe(id)`.
///
/// Dropping the receiver also detaches the subscriber on the next delivery,
/// but explicit cancellation is the supported lifecycle.
pub struct ListSubscription {
    pub id: u64,
    pub events: Receiver<ListEvent>,
}

struct Subscriber {
    id: u64,
    sender: Sender<ListEvent>,
}

/// Checks direct-creation input against the validation rules.
///
/// Pure; `now` is passed in so callers and tests control the clock.
pub fn validate_new_item(title: &str, due_date: i64, now: i64) -> Result<(), ValidationError> {
    if title.trim().is_empty() {
        return Err(ValidationError::EmptyTitle);
    }
    let earliest_allowed = now - DUE_DATE_LEEWAY_SECS;
    if due_date < earliest_allowed {
        return Err(ValidationError::DueDateTooOld {
            due_date,
            earliest_allowed,
        });
    }
    Ok(())
}

/// Pure projection: items due on `date` within its local-day bounds.
///
/// `None` date is the identity projection. The input is never mutated.
pub fn filter_by_date<Tz: TimeZone>(
    items: &[TodoItem],
    date: Option<NaiveDate>,
    tz: &Tz,
) -> Vec<TodoItem> {
    let Some(date) = date else {
        return items.to_vec();
    };
    let Some((start, end)) = day_bounds(date, tz) else {
        return Vec::new();
    };

    items
        .iter()
        .filter(|item| item.due_date >= start && item.due_date < end)
        .cloned()
        .collect()
}

/// Live list service for one user's to-do collection.
///
/// Single cooperative owner per user session: mutation APIs take `&mut self`
/// and there is no internal locking. Each accepted mutation re-reads the
/// store and fans the fresh snapshot out to every live subscriber before the
/// call returns.
pub struct TodoListService<R: TodoRepository> {
    repo: R,
    user_id: String,
    subscribers: Vec<Subscriber>,
    next_subscription_id: u64,
}

impl<R: TodoRepository> TodoListService<R> {
    /// Creates a service for the given user over a repository implementation.
    pub fn new(repo: R, user_id: impl Into<String>) -> Self {
        Self {
            repo,
            user_id: user_id.into(),
            subscribers: Vec::new(),
            next_subscription_id: 0,
        }
    }

    /// Registers a subscriber and delivers the initial full snapshot.
    ///
    /// # Errors
    /// - `Repo` when the initial read fails; nothing is registered then.
    pub fn subscribe(&mut self) -> Result<ListSubscription, ListServiceError> {
        let items = self.repo.list_items(&self.user_id)?;

        let id = self.next_subscription_id;
        self.next_subscription_id += 1;

        let (sender, receiver) = channel();
        // The receiver is held by the caller, so this first send cannot fail.
        let _ = sender.send(ListEvent::Snapshot(items));
        self.subscribers.push(Subscriber { id, sender });

        Ok(ListSubscription {
            id,
            events: receiver,
        })
    }

    /// Cancels one subscription; returns whether it was still registered.
    pub fn unsubscribe(&mut self, subscription_id: u64) -> bool {
        let before = self.subscribers.len();
        self.subscribers
            .retain(|subscriber| subscriber.id != subscription_id);
        self.subscribers.len() != before
    }

    /// Number of currently registered subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }

    /// Validates and creates one item, then notifies subscribers.
    ///
    /// # Errors
    /// - `Validation` with the offending field named; no write is attempted.
    /// - `Repo` when the store rejects the insert.
    pub fn create_item(
        &mut self,
        title: &str,
        due_date: i64,
    ) -> Result<TodoItem, ListServiceError> {
        let now = Utc::now().timestamp();
        validate_new_item(title, due_date, now)?;

        let item = TodoItem::new(title.trim(), due_date, now);
        self.repo.create_item(&self.user_id, &item)?;
        self.deliver_snapshots();

        Ok(item)
    }

    /// Flips the completion flag and writes the whole item back.
    ///
    /// Write-then-mirror: the flipped copy reaches subscribers (and the
    /// returned value) only after the store acknowledged the update, so the
    /// live view never diverges from durable state.
    ///
    /// # Errors
    /// - `WriteConflict` when the store rejects the update.
    pub fn toggle_done(&mut self, item: &TodoItem) -> Result<TodoItem, ListServiceError> {
        let mut updated = item.clone();
        updated.set_done(!item.is_done);

        self.repo
            .update_item(&self.user_id, &updated)
            .map_err(|source| ListServiceError::WriteConflict {
                id: item.id.clone(),
                source,
            })?;
        self.deliver_snapshots();

        Ok(updated)
    }

    /// Deletes one item; removal reaches subscribers via the next snapshot.
    ///
    /// Deleting an id that does not exist is a no-op, not an error.
    pub fn delete_item(&mut self, id: &str) -> Result<(), ListServiceError> {
        self.repo.delete_item(&self.user_id, id)?;
        self.deliver_snapshots();

        Ok(())
    }

    /// Direct ordered read for callers that do not hold a subscription.
    pub fn snapshot(&self) -> Result<Vec<TodoItem>, ListServiceError> {
        Ok(self.repo.list_items(&self.user_id)?)
    }

    /// Re-reads the store and notifies subscribers.
    ///
    /// Hook for writes that bypass this service, such as routine
    /// materialization landing in the same collection.
    pub fn refresh(&mut self) {
        self.deliver_snapshots();
    }

    fn deliver_snapshots(&mut self) {
        if self.subscribers.is_empty() {
            return;
        }

        match self.repo.list_items(&self.user_id) {
            Ok(items) => {
                self.subscribers.retain(|subscriber| {
                    subscriber
                        .sender
                        .send(ListEvent::Snapshot(items.clone()))
                        .is_ok()
                });
            }
            Err(err) => {
                error!(
                    "event=snapshot_read module=list status=error user_id={} error={err}",
                    self.user_id
                );
                let reason = err.to_string();
                for subscriber in self.subscribers.drain(..) {
                    let _ = subscriber.sender.send(ListEvent::Closed {
                        reason: reason.clone(),
                    });
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{filter_by_date, validate_new_item, ValidationError};
    use crate::model::todo_item::TodoItem;
    use chrono::Utc;

    fn item(id: &str, due_date: i64) -> TodoItem {
        TodoItem {
            id: id.to_string(),
            title: format!("item {id}"),
            due_date,
            created_time: 0,
            is_done: false,
        }
    }

    #[test]
    fn blank_title_names_the_title_field() {
        let err = validate_new_item("   ", 1_000, 1_000).unwrap_err();
        assert_eq!(err, ValidationError::EmptyTitle);
        assert!(err.to_string().contains("title"));
    }

    #[test]
    fn due_date_leeway_is_exactly_one_day() {
        let now = 1_700_000_000;
        assert!(validate_new_item("ok", now - 86_400, now).is_ok());
        let err = validate_new_item("ok", now - 86_401, now).unwrap_err();
        assert!(matches!(err, ValidationError::DueDateTooOld { .. }));
        assert!(err.to_string().contains("dueDate"));
    }

    #[test]
    fn filter_without_date_is_identity() {
        let items = vec![item("a", 10), item("b", 20)];
        let filtered = filter_by_date(&items, None, &Utc);
        assert_eq!(filtered, items);
    }

    #[test]
    fn filter_keeps_day_interval_half_open() {
        let date = chrono::NaiveDate::from_ymd_opt(2024, 3, 10).unwrap();
        let start = 1_710_028_800;
        let items = vec![
            item("before", start - 1),
            item("first", start),
            item("last", start + 86_399),
            item("next", start + 86_400),
        ];

        let filtered = filter_by_date(&items, Some(date), &Utc);
        let ids: Vec<&str> = filtered.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, ["first", "last"]);
    }

    #[test]
    fn filter_does_not_mutate_input() {
        let date = chrono::NaiveDate::from_ymd_opt(2024, 3, 10).unwrap();
        let items = vec![item("a", 0), item("b", 1_710_030_000)];
        let snapshot = items.clone();
        let _ = filter_by_date(&items, Some(date), &Utc);
        assert_eq!(items, snapshot);
    }
}
