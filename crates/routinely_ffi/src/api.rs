//! FFI use-case API for Flutter-facing calls.
//!
//! # Responsibility
//! - Expose stable, use-case-level functions to Dart via FRB.
//! - Keep error semantics simple for early-stage UI integration.
//!
//! # Invariants
//! - Exported functions must not panic across FFI boundary.
//! - Failures degrade to `ok=false` / message envelopes, never exceptions.

use chrono::{FixedOffset, NaiveDate};
use routinely_core::db::open_db;
use routinely_core::{
    core_version as core_version_inner, filter_by_date, init_logging as init_logging_inner,
    ping as ping_inner, CatalogRepository, CatalogService, MaterializeError, ScheduleService,
    SqliteCatalogRepository, SqliteTodoRepository, TodoItem, TodoListService, TodoRepository,
};
use std::path::PathBuf;
use std::sync::OnceLock;

const ENTRY_DB_FILE_NAME: &str = "routinely_entry.sqlite3";
const ENTRY_DATE_FORMAT: &str = "%Y-%m-%d";
static ENTRY_DB_PATH: OnceLock<PathBuf> = OnceLock::new();

/// Minimal health-check API for FRB smoke integration.
///
/// # FFI contract
/// - Sync call, non-blocking.
/// - UI-thread safe for current implementation.
/// - Never throws; always returns a UTF-8 string.
#[flutter_rust_bridge::frb(sync)]
pub fn ping() -> String {
    ping_inner().to_owned()
}

/// Expose core crate version through FFI.
///
/// # FFI contract
/// - Sync call, non-blocking.
/// - UI-thread safe for current implementation.
/// - Never throws; always returns a UTF-8 string.
#[flutter_rust_bridge::frb(sync)]
pub fn core_version() -> String {
    core_version_inner().to_owned()
}

/// Initializes Rust core logging once per process.
///
/// Input semantics:
/// - `level`: one of `trace|debug|info|warn|error` (case-insensitive).
/// - `log_dir`: absolute directory path where rolling logs are written.
///
/// # FFI contract
/// - Sync call; may perform small file-system setup work.
/// - Safe to call repeatedly with the same `level + log_dir` (idempotent).
/// - Reconfiguration attempts with different level or directory return error.
/// - Never panics; returns empty string on success and error message on failure.
#[flutter_rust_bridge::frb(sync)]
pub fn init_logging(level: String, log_dir: String) -> String {
    match init_logging_inner(level.as_str(), log_dir.as_str()) {
        Ok(()) => String::new(),
        Err(err) => err,
    }
}

/// Task row inside a routine returned to the UI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryRoutineTask {
    /// Seconds from local midnight.
    pub time: i64,
    pub task_name: String,
    pub description: String,
}

/// Routine card data for the celebrity routine list screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryRoutine {
    pub id: String,
    pub celebrity_name: String,
    pub photo: String,
    pub description: String,
    pub tasks: Vec<EntryRoutineTask>,
}

/// Routine catalog response envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryRoutineListResponse {
    /// Successfully decoded routines (empty on failure).
    pub routines: Vec<EntryRoutine>,
    /// Number of malformed records skipped during decode.
    pub skipped: u32,
    /// Human-readable response message for diagnostics.
    pub message: String,
}

/// Purchased-routine-id response envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryPurchaseListResponse {
    /// Purchased routine ids, sorted for stable display.
    pub routine_ids: Vec<String>,
    /// Human-readable response message for diagnostics.
    pub message: String,
}

/// To-do item row returned to the UI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryTodoItem {
    pub id: String,
    pub title: String,
    /// Absolute due instant, epoch seconds.
    pub due_date: i64,
    /// Creation instant, epoch seconds.
    pub created_time: i64,
    pub is_done: bool,
}

/// To-do list response envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryTodoListResponse {
    /// Items ordered ascending by due date, ties by id (empty on failure).
    pub items: Vec<EntryTodoItem>,
    /// Human-readable response message for diagnostics.
    pub message: String,
}

/// Generic action response envelope for command flows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryActionResponse {
    /// Whether operation succeeded.
    pub ok: bool,
    /// Optional id of the affected record.
    pub item_id: Option<String>,
    /// Human-readable response message for diagnostics/UI.
    pub message: String,
}

impl EntryActionResponse {
    fn success(message: impl Into<String>, item_id: impl Into<String>) -> Self {
        Self {
            ok: true,
            item_id: Some(item_id.into()),
            message: message.into(),
        }
    }

    fn failure(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            item_id: None,
            message: message.into(),
        }
    }
}

/// Routine materialization response envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryMaterializeResponse {
    /// Whether every template task was persisted.
    pub ok: bool,
    /// Items that were persisted (also populated on partial failure).
    pub created: Vec<EntryTodoItem>,
    /// Template positions of tasks whose write failed.
    pub failed_indices: Vec<u32>,
    /// Human-readable response message for diagnostics/UI.
    pub message: String,
}

/// Fetches the routine catalog for the celebrity routine screens.
///
/// # FFI contract
/// - Sync call, DB-backed execution.
/// - Never panics.
/// - Malformed records are skipped and counted, not fatal.
#[flutter_rust_bridge::frb(sync)]
pub fn entry_list_routines() -> EntryRoutineListResponse {
    let conn = match open_db(resolve_entry_db_path()) {
        Ok(conn) => conn,
        Err(err) => {
            return EntryRoutineListResponse {
                routines: Vec::new(),
                skipped: 0,
                message: format!("entry_list_routines failed: {err}"),
            };
        }
    };

    match SqliteCatalogRepository::new(&conn).list_routines() {
        Ok(catalog) => {
            let routines = catalog
                .routines
                .into_iter()
                .map(to_entry_routine)
                .collect::<Vec<_>>();
            let message = if routines.is_empty() {
                "No routines.".to_string()
            } else {
                format!("Found {} routine(s).", routines.len())
            };
            EntryRoutineListResponse {
                skipped: catalog.warnings.len() as u32,
                routines,
                message,
            }
        }
        Err(err) => EntryRoutineListResponse {
            routines: Vec::new(),
            skipped: 0,
            message: format!("entry_list_routines failed: {err}"),
        },
    }
}

/// Fetches the purchased routine ids for a user.
///
/// # FFI contract
/// - Sync call, DB-backed execution.
/// - Never panics.
/// - Empty id list plus message on failure.
#[flutter_rust_bridge::frb(sync)]
pub fn entry_list_purchases(user_id: String) -> EntryPurchaseListResponse {
    let conn = match open_db(resolve_entry_db_path()) {
        Ok(conn) => conn,
        Err(err) => {
            return EntryPurchaseListResponse {
                routine_ids: Vec::new(),
                message: format!("entry_list_purchases failed: {err}"),
            };
        }
    };

    let service = CatalogService::new(SqliteCatalogRepository::new(&conn), user_id);
    match service.purchased_ids() {
        Ok(ids) => {
            let mut routine_ids = ids.into_iter().collect::<Vec<_>>();
            routine_ids.sort();
            EntryPurchaseListResponse {
                message: format!("Found {} purchase(s).", routine_ids.len()),
                routine_ids,
            }
        }
        Err(err) => EntryPurchaseListResponse {
            routine_ids: Vec::new(),
            message: format!("entry_list_purchases failed: {err}"),
        },
    }
}

/// Purchases a routine for a user; repeat purchases return the original record.
///
/// # FFI contract
/// - Sync call, DB-backed execution.
/// - Never panics.
/// - Idempotent per `(user, routine)` pair.
#[flutter_rust_bridge::frb(sync)]
pub fn entry_purchase_routine(user_id: String, routine_id: String) -> EntryActionResponse {
    let conn = match open_db(resolve_entry_db_path()) {
        Ok(conn) => conn,
        Err(err) => return EntryActionResponse::failure(format!("entry DB open failed: {err}")),
    };

    let service = CatalogService::new(SqliteCatalogRepository::new(&conn), user_id);
    match service.purchase(&routine_id) {
        Ok(purchase) => EntryActionResponse::success("Routine purchased.", purchase.routine_id),
        Err(err) => EntryActionResponse::failure(format!("entry_purchase_routine failed: {err}")),
    }
}

/// Copies a routine's tasks onto one calendar day as concrete to-do items.
///
/// Input semantics:
/// - `date`: target calendar day, `YYYY-MM-DD`.
/// - `utc_offset_secs`: the acting user's UTC offset in seconds.
///
/// # FFI contract
/// - Sync call, DB-backed execution.
/// - Never panics.
/// - Partial persistence is reported via `failed_indices`, not rolled back.
#[flutter_rust_bridge::frb(sync)]
pub fn entry_materialize_routine(
    user_id: String,
    routine_id: String,
    date: String,
    utc_offset_secs: i32,
) -> EntryMaterializeResponse {
    let parsed_date = match NaiveDate::parse_from_str(date.trim(), ENTRY_DATE_FORMAT) {
        Ok(parsed) => parsed,
        Err(err) => return materialize_failure(format!("invalid date `{date}`: {err}")),
    };
    let tz = match entry_timezone(utc_offset_secs) {
        Ok(tz) => tz,
        Err(message) => return materialize_failure(message),
    };

    let conn = match open_db(resolve_entry_db_path()) {
        Ok(conn) => conn,
        Err(err) => return materialize_failure(format!("entry DB open failed: {err}")),
    };

    let routine = match SqliteCatalogRepository::new(&conn).get_routine(&routine_id) {
        Ok(Some(routine)) => routine,
        Ok(None) => return materialize_failure(format!("routine not found: {routine_id}")),
        Err(err) => return materialize_failure(format!("routine fetch failed: {err}")),
    };

    let service = ScheduleService::new(SqliteTodoRepository::new(&conn), user_id);
    match service.materialize(&routine, parsed_date, &tz) {
        Ok(created) => EntryMaterializeResponse {
            ok: true,
            message: format!("Created {} task(s).", created.len()),
            created: created.into_iter().map(to_entry_todo_item).collect(),
            failed_indices: Vec::new(),
        },
        Err(MaterializeError::Partial { created, failed }) => EntryMaterializeResponse {
            ok: false,
            message: format!(
                "Created {} task(s); {} write(s) failed.",
                created.len(),
                failed.len()
            ),
            created: created.into_iter().map(to_entry_todo_item).collect(),
            failed_indices: failed.iter().map(|task| task.index as u32).collect(),
        },
        Err(err) => materialize_failure(format!("entry_materialize_routine failed: {err}")),
    }
}

/// Creates one to-do item from direct user input.
///
/// # FFI contract
/// - Sync call, DB-backed execution.
/// - Never panics.
/// - Validation failures name the offending field in the message.
#[flutter_rust_bridge::frb(sync)]
pub fn entry_create_todo(user_id: String, title: String, due_date: i64) -> EntryActionResponse {
    let conn = match open_db(resolve_entry_db_path()) {
        Ok(conn) => conn,
        Err(err) => return EntryActionResponse::failure(format!("entry DB open failed: {err}")),
    };

    let mut service = TodoListService::new(SqliteTodoRepository::new(&conn), user_id);
    match service.create_item(&title, due_date) {
        Ok(item) => EntryActionResponse::success("Task created.", item.id),
        Err(err) => EntryActionResponse::failure(format!("entry_create_todo failed: {err}")),
    }
}

/// Flips the completion flag of one to-do item.
///
/// # FFI contract
/// - Sync call, DB-backed execution.
/// - Never panics.
/// - The flag changes only after the store acknowledged the write.
#[flutter_rust_bridge::frb(sync)]
pub fn entry_toggle_todo(user_id: String, item_id: String) -> EntryActionResponse {
    let conn = match open_db(resolve_entry_db_path()) {
        Ok(conn) => conn,
        Err(err) => return EntryActionResponse::failure(format!("entry DB open failed: {err}")),
    };

    let item = match SqliteTodoRepository::new(&conn).get_item(&user_id, &item_id) {
        Ok(Some(item)) => item,
        Ok(None) => {
            return EntryActionResponse::failure(format!("todo item not found: {item_id}"));
        }
        Err(err) => return EntryActionResponse::failure(format!("todo fetch failed: {err}")),
    };

    let mut service = TodoListService::new(SqliteTodoRepository::new(&conn), user_id);
    match service.toggle_done(&item) {
        Ok(updated) => EntryActionResponse::success(
            if updated.is_done {
                "Task completed."
            } else {
                "Task reopened."
            },
            updated.id,
        ),
        Err(err) => EntryActionResponse::failure(format!("entry_toggle_todo failed: {err}")),
    }
}

/// Deletes one to-do item; deleting a missing id succeeds as a no-op.
///
/// # FFI contract
/// - Sync call, DB-backed execution.
/// - Never panics.
#[flutter_rust_bridge::frb(sync)]
pub fn entry_delete_todo(user_id: String, item_id: String) -> EntryActionResponse {
    let conn = match open_db(resolve_entry_db_path()) {
        Ok(conn) => conn,
        Err(err) => return EntryActionResponse::failure(format!("entry DB open failed: {err}")),
    };

    let mut service = TodoListService::new(SqliteTodoRepository::new(&conn), user_id);
    match service.delete_item(&item_id) {
        Ok(()) => EntryActionResponse::success("Task deleted.", item_id),
        Err(err) => EntryActionResponse::failure(format!("entry_delete_todo failed: {err}")),
    }
}

/// Lists a user's to-do items, optionally projected to one calendar day.
///
/// Input semantics:
/// - `date`: optional target day, `YYYY-MM-DD`; absent means all items.
/// - `utc_offset_secs`: the acting user's UTC offset in seconds.
///
/// # FFI contract
/// - Sync call, DB-backed execution.
/// - Never panics.
/// - Items are ordered ascending by due date, ties by id.
#[flutter_rust_bridge::frb(sync)]
pub fn entry_list_todos(
    user_id: String,
    date: Option<String>,
    utc_offset_secs: i32,
) -> EntryTodoListResponse {
    let parsed_date = match date {
        Some(raw) => match NaiveDate::parse_from_str(raw.trim(), ENTRY_DATE_FORMAT) {
            Ok(parsed) => Some(parsed),
            Err(err) => {
                return EntryTodoListResponse {
                    items: Vec::new(),
                    message: format!("invalid date `{raw}`: {err}"),
                };
            }
        },
        None => None,
    };
    let tz = match entry_timezone(utc_offset_secs) {
        Ok(tz) => tz,
        Err(message) => {
            return EntryTodoListResponse {
                items: Vec::new(),
                message,
            };
        }
    };

    let conn = match open_db(resolve_entry_db_path()) {
        Ok(conn) => conn,
        Err(err) => {
            return EntryTodoListResponse {
                items: Vec::new(),
                message: format!("entry_list_todos failed: {err}"),
            };
        }
    };

    let service = TodoListService::new(SqliteTodoRepository::new(&conn), user_id);
    match service.snapshot() {
        Ok(items) => {
            let projected = filter_by_date(&items, parsed_date, &tz);
            let message = if projected.is_empty() {
                "No tasks.".to_string()
            } else {
                format!("Found {} task(s).", projected.len())
            };
            EntryTodoListResponse {
                items: projected.into_iter().map(to_entry_todo_item).collect(),
                message,
            }
        }
        Err(err) => EntryTodoListResponse {
            items: Vec::new(),
            message: format!("entry_list_todos failed: {err}"),
        },
    }
}

fn resolve_entry_db_path() -> PathBuf {
    ENTRY_DB_PATH
        .get_or_init(|| {
            if let Ok(raw) = std::env::var("ROUTINELY_DB_PATH") {
                let trimmed = raw.trim();
                if !trimmed.is_empty() {
                    return PathBuf::from(trimmed);
                }
            }
            std::env::temp_dir().join(ENTRY_DB_FILE_NAME)
        })
        .clone()
}

fn entry_timezone(utc_offset_secs: i32) -> Result<FixedOffset, String> {
    FixedOffset::east_opt(utc_offset_secs)
        .ok_or_else(|| format!("utc_offset_secs {utc_offset_secs} is out of range"))
}

fn materialize_failure(message: String) -> EntryMaterializeResponse {
    EntryMaterializeResponse {
        ok: false,
        created: Vec::new(),
        failed_indices: Vec::new(),
        message,
    }
}

fn to_entry_todo_item(item: TodoItem) -> EntryTodoItem {
    EntryTodoItem {
        id: item.id,
        title: item.title,
        due_date: item.due_date,
        created_time: item.created_time,
        is_done: item.is_done,
    }
}

fn to_entry_routine(routine: routinely_core::Routine) -> EntryRoutine {
    EntryRoutine {
        id: routine.id,
        celebrity_name: routine.celebrity_name,
        photo: routine.photo,
        description: routine.description,
        tasks: routine
            .tasks
            .into_iter()
            .map(|task| EntryRoutineTask {
                time: task.time,
                task_name: task.task_name,
                description: task.description,
            })
            .collect(),
    }
}
