//! Client database operations.

use rusqlite::{params, OptionalExtension, Row};

use super::{Database, DbResult};
use crate::models::{Client, SubRecordKind};

const CLIENT_COLUMNS: &str = r#"
    id, first_name, last_name, date_of_birth, gender, email, phone, address,
    status, program_type, admission_date, discharge_date, assigned_counselor,
    notes, version, created_at, updated_at
"#;

fn client_from_row(row: &Row<'_>) -> rusqlite::Result<Client> {
    Ok(Client {
        id: row.get(0)?,
        first_name: row.get(1)?,
        last_name: row.get(2)?,
        date_of_birth: row.get(3)?,
        gender: row.get(4)?,
        email: row.get(5)?,
        phone: row.get(6)?,
        address: row.get(7)?,
        status: row.get(8)?,
        program_type: row.get(9)?,
        admission_date: row.get(10)?,
        discharge_date: row.get(11)?,
        assigned_counselor: row.get(12)?,
        notes: row.get(13)?,
        version: row.get(14)?,
        created_at: row.get(15)?,
        updated_at: row.get(16)?,
    })
}

impl Database {
    /// Insert a new client.
    pub fn insert_client(&self, client: &Client) -> DbResult<()> {
        self.conn.execute(
            &format!(
                "INSERT INTO clients ({}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17)",
                CLIENT_COLUMNS
            ),
            params![
                client.id,
                client.first_name,
                client.last_name,
                client.date_of_birth,
                client.gender,
                client.email,
                client.phone,
                client.address,
                client.status,
                client.program_type,
                client.admission_date,
                client.discharge_date,
                client.assigned_counselor,
                client.notes,
                client.version,
                client.created_at,
                client.updated_at,
            ],
        )?;
        Ok(())
    }

    /// Overwrite a client if its stored version is still `previous_version`.
    ///
    /// Returns false when the row is gone or was written concurrently.
    pub fn write_client(&self, client: &Client, previous_version: u64) -> DbResult<bool> {
        let rows_affected = self.conn.execute(
            r#"
            UPDATE clients SET
                first_name = ?2,
                last_name = ?3,
                date_of_birth = ?4,
                gender = ?5,
                email = ?6,
                phone = ?7,
                address = ?8,
                status = ?9,
                program_type = ?10,
                admission_date = ?11,
                discharge_date = ?12,
                assigned_counselor = ?13,
                notes = ?14,
                version = ?15,
                updated_at = ?16
            WHERE id = ?1 AND version = ?17
            "#,
            params![
                client.id,
                client.first_name,
                client.last_name,
                client.date_of_birth,
                client.gender,
                client.email,
                client.phone,
                client.address,
                client.status,
                client.program_type,
                client.admission_date,
                client.discharge_date,
                client.assigned_counselor,
                client.notes,
                client.version,
                client.updated_at,
                previous_version,
            ],
        )?;
        Ok(rows_affected > 0)
    }

    /// Get a client by ID.
    pub fn get_client(&self, id: &str) -> DbResult<Option<Client>> {
        self.conn
            .query_row(
                &format!("SELECT {} FROM clients WHERE id = ?", CLIENT_COLUMNS),
                [id],
                client_from_row,
            )
            .optional()
            .map_err(Into::into)
    }

    /// List all clients in insertion order.
    pub fn list_clients(&self) -> DbResult<Vec<Client>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM clients ORDER BY created_at, rowid",
            CLIENT_COLUMNS
        ))?;
        let rows = stmt.query_map([], client_from_row)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    /// Delete a client and everything it owns.
    ///
    /// Alerts referencing the client survive with `client_id` cleared.
    pub fn delete_client(&self, id: &str, now: chrono::DateTime<chrono::Utc>) -> DbResult<bool> {
        let tx = self.conn.unchecked_transaction()?;
        tx.execute(
            r#"
            UPDATE alerts SET client_id = NULL, version = version + 1, updated_at = ?2
            WHERE client_id = ?1
            "#,
            params![id, now],
        )?;
        for kind in SubRecordKind::ALL {
            tx.execute(
                &format!("DELETE FROM {} WHERE client_id = ?", kind.table()),
                [id],
            )?;
        }
        // alumni, notes and check-ins go through ON DELETE CASCADE
        let rows_affected = tx.execute("DELETE FROM clients WHERE id = ?", [id])?;
        tx.commit()?;
        Ok(rows_affected > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ClientStatus, NewClient, ProgramType, Record};

    fn setup_db() -> Database {
        Database::open_in_memory().unwrap()
    }

    #[test]
    fn test_insert_and_get() {
        let db = setup_db();

        let mut data = NewClient::new("John", "Smith");
        data.status = ClientStatus::OnLeave;
        data.program_type = Some(ProgramType::SoberLiving);
        data.admission_date = chrono::NaiveDate::from_ymd_opt(2024, 1, 15);
        let client = Client::from_new(data);

        db.insert_client(&client).unwrap();

        let retrieved = db.get_client(&client.id).unwrap().unwrap();
        assert_eq!(retrieved, client);
    }

    #[test]
    fn test_write_checks_version() {
        let db = setup_db();
        let mut client = Client::from_new(NewClient::new("John", "Smith"));
        db.insert_client(&client).unwrap();

        client.notes = Some("updated".into());
        client.touch();
        assert!(db.write_client(&client, 1).unwrap());

        // stale writer still thinks version 1 is current
        client.notes = Some("stale".into());
        assert!(!db.write_client(&client, 1).unwrap());

        let stored = db.get_client(&client.id).unwrap().unwrap();
        assert_eq!(stored.notes.as_deref(), Some("updated"));
        assert_eq!(stored.version, 2);
    }

    #[test]
    fn test_delete_client() {
        let db = setup_db();
        let client = Client::from_new(NewClient::new("John", "Smith"));
        db.insert_client(&client).unwrap();

        assert!(db.delete_client(&client.id, chrono::Utc::now()).unwrap());
        assert!(db.get_client(&client.id).unwrap().is_none());
        assert!(!db.delete_client(&client.id, chrono::Utc::now()).unwrap());
    }
}
