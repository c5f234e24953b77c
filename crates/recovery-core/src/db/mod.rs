//! SQLite database layer.

mod alerts;
mod alumni;
mod clients;
mod notes;
mod schema;
mod shifts;
mod source;
mod sub_records;
mod users;

pub use schema::*;
pub use source::SqliteDataSource;

use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use rusqlite::Connection;
use std::path::Path;
use thiserror::Error;

use crate::models::{
    AlertPriority, AlertStatus, AlertType, AlumniStatus, ClientStatus, EmploymentStatus, Gender,
    NoteCategory, ProgramType, ShiftType, SobrietyStatus, UserRole,
};
use crate::store::{is_missing_table_error, StoreError};

/// Database errors.
#[derive(Error, Debug)]
pub enum DbError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type DbResult<T> = Result<T, DbError>;

impl From<DbError> for StoreError {
    fn from(e: DbError) -> Self {
        match e {
            DbError::Sqlite(err) => {
                let message = err.to_string();
                if is_missing_table_error(None, &message) {
                    let table = message
                        .rsplit(':')
                        .next()
                        .map(str::trim)
                        .unwrap_or_default()
                        .to_string();
                    StoreError::TableMissing(table)
                } else {
                    StoreError::Backend(message)
                }
            }
            DbError::Json(err) => StoreError::Json(err),
        }
    }
}

/// Database connection wrapper.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open database at path, creating if needed.
    pub fn open<P: AsRef<Path>>(path: P) -> DbResult<Self> {
        let conn = Connection::open(path)?;
        let db = Self { conn };
        db.initialize()?;
        Ok(db)
    }

    /// Create in-memory database (for testing).
    pub fn open_in_memory() -> DbResult<Self> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        db.initialize()?;
        Ok(db)
    }

    /// Initialize schema.
    fn initialize(&self) -> DbResult<()> {
        self.conn.execute_batch(SCHEMA)?;
        Ok(())
    }

    /// Get raw connection (for advanced queries).
    pub fn conn(&self) -> &Connection {
        &self.conn
    }
}

/// Store a domain enum as its canonical text value.
macro_rules! sql_text_enum {
    ($($ty:ty),* $(,)?) => {
        $(
            impl ToSql for $ty {
                fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
                    Ok(ToSqlOutput::from(self.as_str()))
                }
            }

            impl FromSql for $ty {
                fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
                    let text = value.as_str()?;
                    <$ty>::from_db_value(text).ok_or_else(|| {
                        FromSqlError::Other(
                            format!("unknown {} value: {}", stringify!($ty), text).into(),
                        )
                    })
                }
            }
        )*
    };
}

sql_text_enum!(
    AlertPriority,
    AlertStatus,
    AlertType,
    AlumniStatus,
    ClientStatus,
    EmploymentStatus,
    Gender,
    NoteCategory,
    ProgramType,
    ShiftType,
    SobrietyStatus,
    UserRole,
);
