//! Read-only access to user profile documents.

use crate::db::DbResult;
use crate::model::user::UserProfile;
use rusqlite::{Connection, OptionalExtension};

/// Repository interface for profile reads; core has no profile write surface.
pub trait ProfileRepository {
    fn get_user(&self, user_id: &str) -> DbResult<Option<UserProfile>>;
}

/// SQLite-backed profile repository.
pub struct SqliteProfileRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteProfileRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl ProfileRepository for SqliteProfileRepository<'_> {
    fn get_user(&self, user_id: &str) -> DbResult<Option<UserProfile>> {
        let profile = self
            .conn
            .query_row(
                "SELECT id, name, email, joined FROM users WHERE id = ?1;",
                [user_id],
                |row| {
                    Ok(UserProfile {
                        id: row.get(0)?,
                        name: row.get(1)?,
                        email: row.get(2)?,
                        joined: row.get(3)?,
                    })
                },
            )
            .optional()?;

        Ok(profile)
    }
}
