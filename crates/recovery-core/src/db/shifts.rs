//! Staff schedule database operations.

use rusqlite::{params, OptionalExtension, Row};

use super::{Database, DbResult};
use crate::models::StaffShift;

const SHIFT_COLUMNS: &str = r#"
    id, staff_id, date, start_time, end_time, role, shift_type, notes, version,
    created_at, updated_at
"#;

fn shift_from_row(row: &Row<'_>) -> rusqlite::Result<StaffShift> {
    Ok(StaffShift {
        id: row.get(0)?,
        staff_id: row.get(1)?,
        date: row.get(2)?,
        start_time: row.get(3)?,
        end_time: row.get(4)?,
        role: row.get(5)?,
        shift_type: row.get(6)?,
        notes: row.get(7)?,
        version: row.get(8)?,
        created_at: row.get(9)?,
        updated_at: row.get(10)?,
    })
}

impl Database {
    /// Insert a new shift.
    pub fn insert_shift(&self, shift: &StaffShift) -> DbResult<()> {
        self.conn.execute(
            &format!(
                "INSERT INTO staff_schedules ({}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
                SHIFT_COLUMNS
            ),
            params![
                shift.id,
                shift.staff_id,
                shift.date,
                shift.start_time,
                shift.end_time,
                shift.role,
                shift.shift_type,
                shift.notes,
                shift.version,
                shift.created_at,
                shift.updated_at,
            ],
        )?;
        Ok(())
    }

    /// Overwrite a shift if its stored version is still `previous_version`.
    pub fn write_shift(&self, shift: &StaffShift, previous_version: u64) -> DbResult<bool> {
        let rows_affected = self.conn.execute(
            r#"
            UPDATE staff_schedules SET
                staff_id = ?2,
                date = ?3,
                start_time = ?4,
                end_time = ?5,
                role = ?6,
                shift_type = ?7,
                notes = ?8,
                version = ?9,
                updated_at = ?10
            WHERE id = ?1 AND version = ?11
            "#,
            params![
                shift.id,
                shift.staff_id,
                shift.date,
                shift.start_time,
                shift.end_time,
                shift.role,
                shift.shift_type,
                shift.notes,
                shift.version,
                shift.updated_at,
                previous_version,
            ],
        )?;
        Ok(rows_affected > 0)
    }

    /// Get a shift by ID.
    pub fn get_shift(&self, id: &str) -> DbResult<Option<StaffShift>> {
        self.conn
            .query_row(
                &format!("SELECT {} FROM staff_schedules WHERE id = ?", SHIFT_COLUMNS),
                [id],
                shift_from_row,
            )
            .optional()
            .map_err(Into::into)
    }

    /// List all shifts in insertion order.
    pub fn list_shifts(&self) -> DbResult<Vec<StaffShift>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM staff_schedules ORDER BY created_at, rowid",
            SHIFT_COLUMNS
        ))?;
        let rows = stmt.query_map([], shift_from_row)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    /// Delete a shift.
    pub fn delete_shift(&self, id: &str) -> DbResult<bool> {
        let rows_affected = self
            .conn
            .execute("DELETE FROM staff_schedules WHERE id = ?", [id])?;
        Ok(rows_affected > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{NewShift, ShiftType};
    use chrono::{NaiveDate, NaiveTime};

    fn shift_on(day: u32, shift_type: ShiftType) -> StaffShift {
        StaffShift::from_new(NewShift {
            staff_id: "user-2".into(),
            date: NaiveDate::from_ymd_opt(2024, 6, day).unwrap(),
            start_time: NaiveTime::from_hms_opt(23, 0, 0).unwrap(),
            end_time: NaiveTime::from_hms_opt(7, 0, 0).unwrap(),
            role: "Counselor".into(),
            shift_type,
            notes: None,
        })
    }

    #[test]
    fn test_insert_and_get() {
        let db = Database::open_in_memory().unwrap();
        let shift = shift_on(3, ShiftType::Night);
        db.insert_shift(&shift).unwrap();

        let retrieved = db.get_shift(&shift.id).unwrap().unwrap();
        assert_eq!(retrieved, shift);
        assert_eq!(retrieved.duration_minutes(), 8 * 60);
    }
}
