//! Routine catalog repository: routines and purchases.
//!
//! # Responsibility
//! - Provide read access to the routine collection, skipping individually
//!   malformed records instead of failing the whole fetch.
//! - Record purchases as idempotent upserts keyed by `(user_id, routine_id)`.
//!
//! # Invariants
//! - A malformed routine record yields one `DecodeWarning` and never
//!   suppresses healthy records.
//! - `record_purchase` never creates a second row for the same pair and
//!   always returns the logical stored state.
//! - Task order inside the embedded `tasks` column is preserved verbatim.

use crate::db::DbError;
use crate::model::routine::{Purchase, Routine, RoutineTask, RoutineValidationError};
use rusqlite::{params, Connection, OptionalExtension};
use std::collections::HashSet;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type CatalogResult<T> = Result<T, CatalogError>;

/// Errors from catalog reads and purchase writes.
#[derive(Debug)]
pub enum CatalogError {
    /// The backing store could not be reached or read.
    Unavailable(DbError),
    /// A purchase write was rejected by the store.
    PurchaseWriteFailed {
        user_id: String,
        routine_id: String,
        source: DbError,
    },
    /// The addressed routine does not exist.
    RoutineNotFound(String),
    /// A single-routine fetch hit a record that cannot be decoded.
    MalformedRoutine { routine_id: String, reason: String },
    /// Task payload failed routine validation.
    InvalidTask(RoutineValidationError),
}

impl Display for CatalogError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unavailable(err) => write!(f, "catalog unavailable: {err}"),
            Self::PurchaseWriteFailed {
                user_id,
                routine_id,
                source,
            } => write!(
                f,
                "purchase write failed for user {user_id} routine {routine_id}: {source}"
            ),
            Self::RoutineNotFound(routine_id) => write!(f, "routine not found: {routine_id}"),
            Self::MalformedRoutine { routine_id, reason } => {
                write!(f, "routine {routine_id} is malformed: {reason}")
            }
            Self::InvalidTask(err) => write!(f, "{err}"),
        }
    }
}

impl Error for CatalogError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Unavailable(err) => Some(err),
            Self::PurchaseWriteFailed { source, .. } => Some(source),
            Self::InvalidTask(err) => Some(err),
            Self::RoutineNotFound(_) | Self::MalformedRoutine { .. } => None,
        }
    }
}

impl From<DbError> for CatalogError {
    fn from(value: DbError) -> Self {
        Self::Unavailable(value)
    }
}

impl From<rusqlite::Error> for CatalogError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Unavailable(DbError::Sqlite(value))
    }
}

impl From<RoutineValidationError> for CatalogError {
    fn from(value: RoutineValidationError) -> Self {
        Self::InvalidTask(value)
    }
}

/// Non-fatal report for one skipped routine record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodeWarning {
    pub routine_id: String,
    pub reason: String,
}

impl Display for DecodeWarning {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "skipped routine {}: {}", self.routine_id, self.reason)
    }
}

/// Full-catalog fetch result: decoded routines plus skip reports.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutineCatalog {
    /// Successfully decoded routines, ordered by routine id.
    pub routines: Vec<Routine>,
    /// One entry per record skipped during decode.
    pub warnings: Vec<DecodeWarning>,
}

/// Repository contract for routine catalog access.
pub trait CatalogRepository {
    fn list_routines(&self) -> CatalogResult<RoutineCatalog>;
    fn get_routine(&self, routine_id: &str) -> CatalogResult<Option<Routine>>;
    fn append_task(&self, routine_id: &str, task: &RoutineTask) -> CatalogResult<()>;
    fn list_purchases(&self, user_id: &str) -> CatalogResult<HashSet<String>>;
    fn record_purchase(&self, purchase: &Purchase) -> CatalogResult<Purchase>;
}

/// SQLite-backed catalog repository.
pub struct SqliteCatalogRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteCatalogRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl CatalogRepository for SqliteCatalogRepository<'_> {
    fn list_routines(&self) -> CatalogResult<RoutineCatalog> {
        let mut stmt = self.conn.prepare(
            "SELECT id, celebrity_name, photo, description, tasks
             FROM routines
             ORDER BY id ASC;",
        )?;

        let mut rows = stmt.query([])?;
        let mut routines = Vec::new();
        let mut warnings = Vec::new();

        while let Some(row) = rows.next()? {
            let routine_id: String = row.get("id")?;
            let tasks_json: String = row.get("tasks")?;

            match decode_tasks(&tasks_json) {
                Ok(tasks) => routines.push(Routine {
                    id: routine_id,
                    celebrity_name: row.get("celebrity_name")?,
                    photo: row.get("photo")?,
                    description: row.get("description")?,
                    tasks,
                }),
                Err(reason) => warnings.push(DecodeWarning { routine_id, reason }),
            }
        }

        Ok(RoutineCatalog { routines, warnings })
    }

    fn get_routine(&self, routine_id: &str) -> CatalogResult<Option<Routine>> {
        let row = self
            .conn
            .query_row(
                "SELECT celebrity_name, photo, description, tasks
                 FROM routines
                 WHERE id = ?1;",
                [routine_id],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, String>(3)?,
                    ))
                },
            )
            .optional()?;

        let Some((celebrity_name, photo, description, tasks_json)) = row else {
            return Ok(None);
        };

        let tasks =
            decode_tasks(&tasks_json).map_err(|reason| CatalogError::MalformedRoutine {
                routine_id: routine_id.to_string(),
                reason,
            })?;

        Ok(Some(Routine {
            id: routine_id.to_string(),
            celebrity_name,
            photo,
            description,
            tasks,
        }))
    }

    fn append_task(&self, routine_id: &str, task: &RoutineTask) -> CatalogResult<()> {
        task.validate()?;

        let mut routine = self
            .get_routine(routine_id)?
            .ok_or_else(|| CatalogError::RoutineNotFound(routine_id.to_string()))?;
        routine.tasks.push(task.clone());

        let tasks_json = serde_json::to_string(&routine.tasks).map_err(|err| {
            CatalogError::MalformedRoutine {
                routine_id: routine_id.to_string(),
                reason: format!("task list encode failed: {err}"),
            }
        })?;

        let changed = self.conn.execute(
            "UPDATE routines SET tasks = ?1 WHERE id = ?2;",
            params![tasks_json, routine_id],
        )?;
        if changed == 0 {
            return Err(CatalogError::RoutineNotFound(routine_id.to_string()));
        }

        Ok(())
    }

    fn list_purchases(&self, user_id: &str) -> CatalogResult<HashSet<String>> {
        let mut stmt = self
            .conn
            .prepare("SELECT routine_id FROM purchases WHERE user_id = ?1;")?;

        let mut rows = stmt.query([user_id])?;
        let mut routine_ids = HashSet::new();
        while let Some(row) = rows.next()? {
            routine_ids.insert(row.get::<_, String>(0)?);
        }

        Ok(routine_ids)
    }

    fn record_purchase(&self, purchase: &Purchase) -> CatalogResult<Purchase> {
        self.conn
            .execute(
                "INSERT INTO purchases (user_id, routine_id, purchase_date)
                 VALUES (?1, ?2, ?3)
                 ON CONFLICT (user_id, routine_id) DO NOTHING;",
                params![
                    purchase.user_id,
                    purchase.routine_id,
                    purchase.purchase_date
                ],
            )
            .map_err(|err| CatalogError::PurchaseWriteFailed {
                user_id: purchase.user_id.clone(),
                routine_id: purchase.routine_id.clone(),
                source: DbError::Sqlite(err),
            })?;

        // Read back so re-purchases return the original stored record.
        let stored = self
            .conn
            .query_row(
                "SELECT purchase_date FROM purchases
                 WHERE user_id = ?1 AND routine_id = ?2;",
                params![purchase.user_id, purchase.routine_id],
                |row| row.get::<_, i64>(0),
            )
            .map_err(|err| CatalogError::PurchaseWriteFailed {
                user_id: purchase.user_id.clone(),
                routine_id: purchase.routine_id.clone(),
                source: DbError::Sqlite(err),
            })?;

        Ok(Purchase {
            user_id: purchase.user_id.clone(),
            routine_id: purchase.routine_id.clone(),
            purchase_date: stored,
        })
    }
}

/// Inserts or replaces a routine row; used by seeding and demo flows.
pub fn upsert_routine(conn: &Connection, routine: &Routine) -> CatalogResult<()> {
    routine.validate()?;
    let tasks_json =
        serde_json::to_string(&routine.tasks).map_err(|err| CatalogError::MalformedRoutine {
            routine_id: routine.id.clone(),
            reason: format!("task list encode failed: {err}"),
        })?;

    conn.execute(
        "INSERT INTO routines (id, celebrity_name, photo, description, tasks)
         VALUES (?1, ?2, ?3, ?4, ?5)
         ON CONFLICT (id) DO UPDATE SET
            celebrity_name = excluded.celebrity_name,
            photo = excluded.photo,
            description = excluded.description,
            tasks = excluded.tasks;",
        params![
            routine.id,
            routine.celebrity_name,
            routine.photo,
            routine.description,
            tasks_json
        ],
    )?;

    Ok(())
}

fn decode_tasks(tasks_json: &str) -> Result<Vec<RoutineTask>, String> {
    let tasks: Vec<RoutineTask> =
        serde_json::from_str(tasks_json).map_err(|err| format!("task list decode failed: {err}"))?;
    for task in &tasks {
        task.validate().map_err(|err| err.to_string())?;
    }
    Ok(tasks)
}
