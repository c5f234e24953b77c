//! Staff user operations.

use rusqlite::{params, OptionalExtension, Row};

use super::{Database, DbResult};
use crate::models::User;

fn user_from_row(row: &Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get(0)?,
        email: row.get(1)?,
        full_name: row.get(2)?,
        role: row.get(3)?,
        created_at: row.get(4)?,
    })
}

impl Database {
    /// Insert a staff user.
    pub fn insert_user(&self, user: &User) -> DbResult<()> {
        self.conn.execute(
            "INSERT INTO users (id, email, full_name, role, created_at) VALUES (?1, ?2, ?3, ?4, ?5)",
            params![user.id, user.email, user.full_name, user.role, user.created_at],
        )?;
        Ok(())
    }

    /// Get a user by ID.
    pub fn get_user(&self, id: &str) -> DbResult<Option<User>> {
        self.conn
            .query_row(
                "SELECT id, email, full_name, role, created_at FROM users WHERE id = ?",
                [id],
                user_from_row,
            )
            .optional()
            .map_err(Into::into)
    }

    /// List all users ordered by name.
    pub fn list_users(&self) -> DbResult<Vec<User>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, email, full_name, role, created_at FROM users ORDER BY full_name")?;
        let rows = stmt.query_map([], user_from_row)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }
}
