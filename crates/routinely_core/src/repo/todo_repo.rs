//! To-do item repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Provide per-user CRUD over the to-do item collection.
//! - Keep snapshot ordering (`due_date ASC, id ASC`) inside the query layer.
//!
//! # Invariants
//! - Write paths must call `TodoItem::validate()` before SQL mutations.
//! - Read paths must reject invalid persisted state instead of masking it.
//! - `delete_item` on a missing id is a no-op, not an error.

use crate::db::DbError;
use crate::model::todo_item::{TodoItem, TodoValidationError};
use rusqlite::{params, Connection, ErrorCode, Row};
use std::error::Error;
use std::fmt::{Display, Formatter};

const TODO_SELECT_SQL: &str = "SELECT
    id,
    title,
    due_date,
    created_time,
    is_done
FROM todo_items";

pub type TodoRepoResult<T> = Result<T, TodoRepoError>;

/// Generic repository error for to-do item persistence and queries.
#[derive(Debug)]
pub enum TodoRepoError {
    Validation(TodoValidationError),
    Db(DbError),
    /// Create collided with an existing id in the same user collection.
    DuplicateId(String),
    /// Addressed item does not exist.
    NotFound(String),
    InvalidData(String),
}

impl Display for TodoRepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::DuplicateId(id) => write!(f, "todo item id already exists: {id}"),
            Self::NotFound(id) => write!(f, "todo item not found: {id}"),
            Self::InvalidData(message) => write!(f, "invalid persisted todo data: {message}"),
        }
    }
}

impl Error for TodoRepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            Self::DuplicateId(_) | Self::NotFound(_) | Self::InvalidData(_) => None,
        }
    }
}

impl From<TodoValidationError> for TodoRepoError {
    fn from(value: TodoValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for TodoRepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for TodoRepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Repository interface for one user's to-do collection.
pub trait TodoRepository {
    fn create_item(&self, user_id: &str, item: &TodoItem) -> TodoRepoResult<()>;
    fn update_item(&self, user_id: &str, item: &TodoItem) -> TodoRepoResult<()>;
    fn get_item(&self, user_id: &str, id: &str) -> TodoRepoResult<Option<TodoItem>>;
    fn list_items(&self, user_id: &str) -> TodoRepoResult<Vec<TodoItem>>;
    fn delete_item(&self, user_id: &str, id: &str) -> TodoRepoResult<()>;
}

/// SQLite-backed to-do repository.
pub struct SqliteTodoRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteTodoRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl TodoRepository for SqliteTodoRepository<'_> {
    fn create_item(&self, user_id: &str, item: &TodoItem) -> TodoRepoResult<()> {
        item.validate()?;

        let inserted = self.conn.execute(
            "INSERT INTO todo_items (
                user_id,
                id,
                title,
                due_date,
                created_time,
                is_done
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6);",
            params![
                user_id,
                item.id,
                item.title,
                item.due_date,
                item.created_time,
                bool_to_int(item.is_done),
            ],
        );

        match inserted {
            Ok(_) => Ok(()),
            Err(rusqlite::Error::SqliteFailure(err, _))
                if err.code == ErrorCode::ConstraintViolation =>
            {
                Err(TodoRepoError::DuplicateId(item.id.clone()))
            }
            Err(err) => Err(err.into()),
        }
    }

    fn update_item(&self, user_id: &str, item: &TodoItem) -> TodoRepoResult<()> {
        item.validate()?;

        let changed = self.conn.execute(
            "UPDATE todo_items
             SET
                title = ?1,
                due_date = ?2,
                created_time = ?3,
                is_done = ?4
             WHERE user_id = ?5 AND id = ?6;",
            params![
                item.title,
                item.due_date,
                item.created_time,
                bool_to_int(item.is_done),
                user_id,
                item.id,
            ],
        )?;

        if changed == 0 {
            return Err(TodoRepoError::NotFound(item.id.clone()));
        }

        Ok(())
    }

    fn get_item(&self, user_id: &str, id: &str) -> TodoRepoResult<Option<TodoItem>> {
        let mut stmt = self.conn.prepare(&format!(
            "{TODO_SELECT_SQL}
             WHERE user_id = ?1 AND id = ?2;"
        ))?;

        let mut rows = stmt.query(params![user_id, id])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_todo_row(row)?));
        }

        Ok(None)
    }

    fn list_items(&self, user_id: &str) -> TodoRepoResult<Vec<TodoItem>> {
        let mut stmt = self.conn.prepare(&format!(
            "{TODO_SELECT_SQL}
             WHERE user_id = ?1
             ORDER BY due_date ASC, id ASC;"
        ))?;

        let mut rows = stmt.query([user_id])?;
        let mut items = Vec::new();
        while let Some(row) = rows.next()? {
            items.push(parse_todo_row(row)?);
        }

        Ok(items)
    }

    fn delete_item(&self, user_id: &str, id: &str) -> TodoRepoResult<()> {
        self.conn.execute(
            "DELETE FROM todo_items WHERE user_id = ?1 AND id = ?2;",
            params![user_id, id],
        )?;

        Ok(())
    }
}

fn parse_todo_row(row: &Row<'_>) -> TodoRepoResult<TodoItem> {
    let is_done = match row.get::<_, i64>("is_done")? {
        0 => false,
        1 => true,
        other => {
            return Err(TodoRepoError::InvalidData(format!(
                "invalid is_done value `{other}` in todo_items.is_done"
            )));
        }
    };

    let item = TodoItem {
        id: row.get("id")?,
        title: row.get("title")?,
        due_date: row.get("due_date")?,
        created_time: row.get("created_time")?,
        is_done,
    };
    item.validate()?;
    Ok(item)
}

fn bool_to_int(value: bool) -> i64 {
    if value {
        1
    } else {
        0
    }
}
