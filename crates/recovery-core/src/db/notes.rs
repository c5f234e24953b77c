//! Progress note and sobriety check-in operations (append-only).

use rusqlite::{params, Row};

use super::{Database, DbResult};
use crate::models::{ProgressNote, SobrietyCheckIn};

fn note_from_row(row: &Row<'_>) -> rusqlite::Result<ProgressNote> {
    Ok(ProgressNote {
        id: row.get(0)?,
        client_id: row.get(1)?,
        author_id: row.get(2)?,
        category: row.get(3)?,
        content: row.get(4)?,
        created_at: row.get(5)?,
    })
}

fn check_in_from_row(row: &Row<'_>) -> rusqlite::Result<SobrietyCheckIn> {
    Ok(SobrietyCheckIn {
        id: row.get(0)?,
        client_id: row.get(1)?,
        date: row.get(2)?,
        status: row.get(3)?,
        notes: row.get(4)?,
        created_at: row.get(5)?,
    })
}

impl Database {
    /// Insert a progress note.
    pub fn insert_progress_note(&self, note: &ProgressNote) -> DbResult<()> {
        self.conn.execute(
            r#"
            INSERT INTO progress_notes (id, client_id, author_id, category, content, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
            params![
                note.id,
                note.client_id,
                note.author_id,
                note.category,
                note.content,
                note.created_at,
            ],
        )?;
        Ok(())
    }

    /// List a client's progress notes, newest first.
    pub fn list_progress_notes(&self, client_id: &str) -> DbResult<Vec<ProgressNote>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT id, client_id, author_id, category, content, created_at
            FROM progress_notes
            WHERE client_id = ?
            ORDER BY created_at DESC, rowid DESC
            "#,
        )?;
        let rows = stmt.query_map([client_id], note_from_row)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    /// Delete a progress note.
    pub fn delete_progress_note(&self, id: &str) -> DbResult<bool> {
        let rows_affected = self
            .conn
            .execute("DELETE FROM progress_notes WHERE id = ?", [id])?;
        Ok(rows_affected > 0)
    }

    /// Insert a sobriety check-in.
    pub fn insert_sobriety_check_in(&self, check_in: &SobrietyCheckIn) -> DbResult<()> {
        self.conn.execute(
            r#"
            INSERT INTO sobriety_tracking (id, client_id, date, status, notes, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
            params![
                check_in.id,
                check_in.client_id,
                check_in.date,
                check_in.status,
                check_in.notes,
                check_in.created_at,
            ],
        )?;
        Ok(())
    }

    /// List a client's check-ins, most recent date first.
    pub fn list_sobriety_check_ins(&self, client_id: &str) -> DbResult<Vec<SobrietyCheckIn>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT id, client_id, date, status, notes, created_at
            FROM sobriety_tracking
            WHERE client_id = ?
            ORDER BY date DESC, created_at DESC
            "#,
        )?;
        let rows = stmt.query_map([client_id], check_in_from_row)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }
}
