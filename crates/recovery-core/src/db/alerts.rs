//! Alert database operations.

use rusqlite::{params, OptionalExtension, Row};

use super::{Database, DbResult};
use crate::models::Alert;

const ALERT_COLUMNS: &str = r#"
    id, client_id, title, description, alert_type, priority, status, due_date,
    assigned_to, snooze_until, resolved_by, resolved_at, version, created_at,
    updated_at
"#;

fn alert_from_row(row: &Row<'_>) -> rusqlite::Result<Alert> {
    Ok(Alert {
        id: row.get(0)?,
        client_id: row.get(1)?,
        title: row.get(2)?,
        description: row.get(3)?,
        alert_type: row.get(4)?,
        priority: row.get(5)?,
        status: row.get(6)?,
        due_date: row.get(7)?,
        assigned_to: row.get(8)?,
        snooze_until: row.get(9)?,
        resolved_by: row.get(10)?,
        resolved_at: row.get(11)?,
        version: row.get(12)?,
        created_at: row.get(13)?,
        updated_at: row.get(14)?,
    })
}

impl Database {
    /// Insert a new alert.
    pub fn insert_alert(&self, alert: &Alert) -> DbResult<()> {
        self.conn.execute(
            &format!(
                "INSERT INTO alerts ({}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)",
                ALERT_COLUMNS
            ),
            params![
                alert.id,
                alert.client_id,
                alert.title,
                alert.description,
                alert.alert_type,
                alert.priority,
                alert.status,
                alert.due_date,
                alert.assigned_to,
                alert.snooze_until,
                alert.resolved_by,
                alert.resolved_at,
                alert.version,
                alert.created_at,
                alert.updated_at,
            ],
        )?;
        Ok(())
    }

    /// Overwrite an alert if its stored version is still `previous_version`.
    pub fn write_alert(&self, alert: &Alert, previous_version: u64) -> DbResult<bool> {
        let rows_affected = self.conn.execute(
            r#"
            UPDATE alerts SET
                client_id = ?2,
                title = ?3,
                description = ?4,
                alert_type = ?5,
                priority = ?6,
                status = ?7,
                due_date = ?8,
                assigned_to = ?9,
                snooze_until = ?10,
                resolved_by = ?11,
                resolved_at = ?12,
                version = ?13,
                updated_at = ?14
            WHERE id = ?1 AND version = ?15
            "#,
            params![
                alert.id,
                alert.client_id,
                alert.title,
                alert.description,
                alert.alert_type,
                alert.priority,
                alert.status,
                alert.due_date,
                alert.assigned_to,
                alert.snooze_until,
                alert.resolved_by,
                alert.resolved_at,
                alert.version,
                alert.updated_at,
                previous_version,
            ],
        )?;
        Ok(rows_affected > 0)
    }

    /// Get an alert by ID.
    pub fn get_alert(&self, id: &str) -> DbResult<Option<Alert>> {
        self.conn
            .query_row(
                &format!("SELECT {} FROM alerts WHERE id = ?", ALERT_COLUMNS),
                [id],
                alert_from_row,
            )
            .optional()
            .map_err(Into::into)
    }

    /// List all alerts in insertion order.
    pub fn list_alerts(&self) -> DbResult<Vec<Alert>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM alerts ORDER BY created_at, rowid",
            ALERT_COLUMNS
        ))?;
        let rows = stmt.query_map([], alert_from_row)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    /// Delete an alert.
    pub fn delete_alert(&self, id: &str) -> DbResult<bool> {
        let rows_affected = self
            .conn
            .execute("DELETE FROM alerts WHERE id = ?", [id])?;
        Ok(rows_affected > 0)
    }
}
