//! Alumni database operations.

use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::{params, OptionalExtension, Row};

use super::{Database, DbError, DbResult};
use crate::models::{
    Alumni, AlumniNote, AlumniStatus, EmergencyContact, EmploymentStatus, ProgramType,
    SobrietyStatus,
};

const ALUMNI_COLUMNS: &str = r#"
    id, client_id, first_name, last_name, email, phone, graduation_date,
    program_type, program_details, status, employment_status, sobriety_status,
    sobriety_days, emergency_contact, last_contact_date, notes, version,
    created_at, updated_at
"#;

impl Database {
    /// Insert a new alumni record.
    pub fn insert_alumni(&self, alumni: &Alumni) -> DbResult<()> {
        let notes_json = serde_json::to_string(&alumni.notes)?;
        let contact_json = alumni
            .emergency_contact
            .as_ref()
            .map(serde_json::to_string)
            .transpose()?;

        self.conn.execute(
            &format!(
                "INSERT INTO alumni ({}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18, ?19)",
                ALUMNI_COLUMNS
            ),
            params![
                alumni.id,
                alumni.client_id,
                alumni.first_name,
                alumni.last_name,
                alumni.email,
                alumni.phone,
                alumni.graduation_date,
                alumni.program_type,
                alumni.program_details,
                alumni.status,
                alumni.employment_status,
                alumni.sobriety_status,
                alumni.sobriety_days,
                contact_json,
                alumni.last_contact_date,
                notes_json,
                alumni.version,
                alumni.created_at,
                alumni.updated_at,
            ],
        )?;
        Ok(())
    }

    /// Overwrite an alumni record if its stored version is still `previous_version`.
    pub fn write_alumni(&self, alumni: &Alumni, previous_version: u64) -> DbResult<bool> {
        let notes_json = serde_json::to_string(&alumni.notes)?;
        let contact_json = alumni
            .emergency_contact
            .as_ref()
            .map(serde_json::to_string)
            .transpose()?;

        let rows_affected = self.conn.execute(
            r#"
            UPDATE alumni SET
                first_name = ?2,
                last_name = ?3,
                email = ?4,
                phone = ?5,
                graduation_date = ?6,
                program_type = ?7,
                program_details = ?8,
                status = ?9,
                employment_status = ?10,
                sobriety_status = ?11,
                sobriety_days = ?12,
                emergency_contact = ?13,
                last_contact_date = ?14,
                notes = ?15,
                version = ?16,
                updated_at = ?17
            WHERE id = ?1 AND version = ?18
            "#,
            params![
                alumni.id,
                alumni.first_name,
                alumni.last_name,
                alumni.email,
                alumni.phone,
                alumni.graduation_date,
                alumni.program_type,
                alumni.program_details,
                alumni.status,
                alumni.employment_status,
                alumni.sobriety_status,
                alumni.sobriety_days,
                contact_json,
                alumni.last_contact_date,
                notes_json,
                alumni.version,
                alumni.updated_at,
                previous_version,
            ],
        )?;
        Ok(rows_affected > 0)
    }

    /// Get an alumni record by ID.
    pub fn get_alumni(&self, id: &str) -> DbResult<Option<Alumni>> {
        self.conn
            .query_row(
                &format!("SELECT {} FROM alumni WHERE id = ?", ALUMNI_COLUMNS),
                [id],
                AlumniRow::from_row,
            )
            .optional()?
            .map(|row| row.try_into())
            .transpose()
    }

    /// Get the alumni record created for a client, if any.
    pub fn get_alumni_by_client(&self, client_id: &str) -> DbResult<Option<Alumni>> {
        self.conn
            .query_row(
                &format!("SELECT {} FROM alumni WHERE client_id = ?", ALUMNI_COLUMNS),
                [client_id],
                AlumniRow::from_row,
            )
            .optional()?
            .map(|row| row.try_into())
            .transpose()
    }

    /// List all alumni in insertion order.
    pub fn list_alumni(&self) -> DbResult<Vec<Alumni>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM alumni ORDER BY created_at, rowid",
            ALUMNI_COLUMNS
        ))?;
        let rows = stmt.query_map([], AlumniRow::from_row)?;

        let mut alumni = Vec::new();
        for row in rows {
            alumni.push(row?.try_into()?);
        }
        Ok(alumni)
    }

    /// Delete an alumni record.
    pub fn delete_alumni(&self, id: &str) -> DbResult<bool> {
        let rows_affected = self
            .conn
            .execute("DELETE FROM alumni WHERE id = ?", [id])?;
        Ok(rows_affected > 0)
    }
}

/// Intermediate row struct for the JSON columns.
struct AlumniRow {
    id: String,
    client_id: String,
    first_name: String,
    last_name: String,
    email: Option<String>,
    phone: Option<String>,
    graduation_date: NaiveDate,
    program_type: Option<ProgramType>,
    program_details: Option<String>,
    status: AlumniStatus,
    employment_status: EmploymentStatus,
    sobriety_status: SobrietyStatus,
    sobriety_days: Option<u32>,
    emergency_contact: Option<String>,
    last_contact_date: Option<NaiveDate>,
    notes: String,
    version: u64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl AlumniRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(AlumniRow {
            id: row.get(0)?,
            client_id: row.get(1)?,
            first_name: row.get(2)?,
            last_name: row.get(3)?,
            email: row.get(4)?,
            phone: row.get(5)?,
            graduation_date: row.get(6)?,
            program_type: row.get(7)?,
            program_details: row.get(8)?,
            status: row.get(9)?,
            employment_status: row.get(10)?,
            sobriety_status: row.get(11)?,
            sobriety_days: row.get(12)?,
            emergency_contact: row.get(13)?,
            last_contact_date: row.get(14)?,
            notes: row.get(15)?,
            version: row.get(16)?,
            created_at: row.get(17)?,
            updated_at: row.get(18)?,
        })
    }
}

impl TryFrom<AlumniRow> for Alumni {
    type Error = DbError;

    fn try_from(row: AlumniRow) -> Result<Self, Self::Error> {
        let notes: Vec<AlumniNote> = serde_json::from_str(&row.notes)?;
        let emergency_contact: Option<EmergencyContact> = row
            .emergency_contact
            .as_deref()
            .map(serde_json::from_str)
            .transpose()?;

        Ok(Alumni {
            id: row.id,
            client_id: row.client_id,
            first_name: row.first_name,
            last_name: row.last_name,
            email: row.email,
            phone: row.phone,
            graduation_date: row.graduation_date,
            program_type: row.program_type,
            program_details: row.program_details,
            status: row.status,
            employment_status: row.employment_status,
            sobriety_status: row.sobriety_status,
            sobriety_days: row.sobriety_days,
            emergency_contact,
            last_contact_date: row.last_contact_date,
            notes,
            version: row.version,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Client, NewAlumni, NewClient, Record};

    fn setup_db() -> (Database, Client) {
        let db = Database::open_in_memory().unwrap();
        let client = Client::from_new(NewClient::new("Emily", "Davis"));
        db.insert_client(&client).unwrap();
        (db, client)
    }

    fn new_alumni(client: &Client) -> Alumni {
        Alumni::from_new(NewAlumni {
            client_id: client.id.clone(),
            first_name: client.first_name.clone(),
            last_name: client.last_name.clone(),
            email: None,
            phone: None,
            graduation_date: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            program_type: None,
            program_details: None,
            status: AlumniStatus::Active,
            employment_status: EmploymentStatus::Employed,
            sobriety_status: SobrietyStatus::Sober,
            sobriety_days: Some(120),
            emergency_contact: Some(EmergencyContact {
                name: "Robert Davis".into(),
                relationship: Some("Father".into()),
                phone: None,
            }),
            last_contact_date: None,
        })
    }

    #[test]
    fn test_json_columns_round_trip() {
        let (db, client) = setup_db();
        let mut alumni = new_alumni(&client);
        alumni
            .notes
            .push(AlumniNote::new("Checked in by phone".into(), Some("Sarah".into())));

        db.insert_alumni(&alumni).unwrap();

        let retrieved = db.get_alumni(&alumni.id).unwrap().unwrap();
        assert_eq!(retrieved, alumni);
        assert_eq!(
            db.get_alumni_by_client(&client.id).unwrap().map(|a| a.id),
            Some(alumni.id)
        );
    }

    #[test]
    fn test_one_alumni_per_client() {
        let (db, client) = setup_db();
        db.insert_alumni(&new_alumni(&client)).unwrap();
        assert!(db.insert_alumni(&new_alumni(&client)).is_err());
    }

    #[test]
    fn test_clearing_sobriety_days() {
        let (db, client) = setup_db();
        let mut alumni = new_alumni(&client);
        db.insert_alumni(&alumni).unwrap();

        alumni.status = AlumniStatus::LostContact;
        alumni.sobriety_days = None;
        alumni.touch();
        assert!(db.write_alumni(&alumni, 1).unwrap());

        let retrieved = db.get_alumni(&alumni.id).unwrap().unwrap();
        assert_eq!(retrieved.status, AlumniStatus::LostContact);
        assert_eq!(retrieved.sobriety_days, None);
    }

    #[test]
    fn test_removed_with_client() {
        let (db, client) = setup_db();
        let alumni = new_alumni(&client);
        db.insert_alumni(&alumni).unwrap();

        db.delete_client(&client.id, Utc::now()).unwrap();
        assert!(db.get_alumni(&alumni.id).unwrap().is_none());
    }
}
