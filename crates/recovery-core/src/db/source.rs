//! [`DataSource`] over the local SQLite database.

use std::path::Path;
use std::sync::Mutex;

use chrono::{DateTime, Utc};

use super::{Database, DbError, DbResult};
use crate::models::{
    advance_timestamp, Alert, AlertPatch, Alumni, AlumniPatch, Client, ClientPatch, NewAlert,
    NewAlumni, NewClient, NewProgressNote, NewShift, NewSobrietyCheckIn, ProgressNote, Record,
    ShiftPatch, SobrietyCheckIn, StaffShift, SubRecordKind, User,
};
use crate::store::{
    check_blob_version, merge_patch, seed, DataSource, StoreError, StoreResult, VersionedBlob,
};

/// SQLite-backed store. One connection, serialized behind a mutex.
pub struct SqliteDataSource {
    db: Mutex<Database>,
}

impl SqliteDataSource {
    /// Open (or create) the database file at `path`.
    pub fn open<P: AsRef<Path>>(path: P) -> StoreResult<Self> {
        let db = Database::open(path.as_ref())?;
        tracing::info!(path = %path.as_ref().display(), "Opened SQLite data source");
        Ok(Self::from_database(db))
    }

    /// In-memory database, mostly for tests.
    pub fn open_in_memory() -> StoreResult<Self> {
        Ok(Self::from_database(Database::open_in_memory()?))
    }

    pub fn from_database(db: Database) -> Self {
        Self { db: Mutex::new(db) }
    }

    /// Load the mock data set into an empty database.
    ///
    /// Does nothing when any client already exists.
    pub fn seed_mock_data(&self) -> StoreResult<bool> {
        let db = self.db.lock()?;
        if !db.list_clients()?.is_empty() {
            return Ok(false);
        }

        let tx = db.conn().unchecked_transaction().map_err(DbError::from)?;
        for user in seed::users() {
            db.insert_user(&user)?;
        }
        for client in seed::clients() {
            db.insert_client(&client)?;
        }
        for alumni in seed::alumni() {
            db.insert_alumni(&alumni)?;
        }
        for alert in seed::alerts() {
            db.insert_alert(&alert)?;
        }
        for shift in seed::shifts() {
            db.insert_shift(&shift)?;
        }
        for note in seed::progress_notes() {
            db.insert_progress_note(&note)?;
        }
        for check_in in seed::sobriety_check_ins() {
            db.insert_sobriety_check_in(&check_in)?;
        }
        tx.commit().map_err(DbError::from)?;

        tracing::info!("Seeded SQLite data source with mock data");
        Ok(true)
    }

    fn with_db<T>(&self, f: impl FnOnce(&Database) -> DbResult<T>) -> StoreResult<T> {
        let db = self.db.lock()?;
        Ok(f(&db)?)
    }

    fn require_client(db: &Database, client_id: &str) -> StoreResult<()> {
        match db.get_client(client_id)? {
            Some(_) => Ok(()),
            None => Err(StoreError::InvalidReference {
                entity: "client",
                id: client_id.to_string(),
            }),
        }
    }
}

/// Read, merge, then write back guarded by the version that was read.
fn update_versioned<T, P, G, W>(
    db: &Database,
    id: &str,
    patch: &P,
    get: G,
    write: W,
) -> StoreResult<Option<T>>
where
    T: Record,
    P: crate::models::Patch<T>,
    G: FnOnce(&Database, &str) -> DbResult<Option<T>>,
    W: FnOnce(&Database, &T, u64) -> DbResult<bool>,
{
    let Some(current) = get(db, id)? else {
        return Ok(None);
    };
    let merged = merge_patch(&current, patch)?;
    if !write(db, &merged, current.version())? {
        return Err(StoreError::Conflict {
            entity: T::ENTITY,
            id: id.to_string(),
        });
    }
    Ok(Some(merged))
}

impl DataSource for SqliteDataSource {
    fn backend_name(&self) -> &'static str {
        "sqlite"
    }

    fn get_users(&self) -> StoreResult<Vec<User>> {
        self.with_db(|db| db.list_users())
    }

    fn get_user_by_id(&self, id: &str) -> StoreResult<Option<User>> {
        self.with_db(|db| db.get_user(id))
    }

    fn get_clients(&self) -> StoreResult<Vec<Client>> {
        self.with_db(|db| db.list_clients())
    }

    fn get_client_by_id(&self, id: &str) -> StoreResult<Option<Client>> {
        self.with_db(|db| db.get_client(id))
    }

    fn create_client(&self, data: NewClient) -> StoreResult<Client> {
        let client = Client::from_new(data);
        self.with_db(|db| db.insert_client(&client))?;
        tracing::debug!(client_id = %client.id, "Created client");
        Ok(client)
    }

    fn update_client(&self, id: &str, patch: &ClientPatch) -> StoreResult<Option<Client>> {
        let db = self.db.lock()?;
        update_versioned(&db, id, patch, Database::get_client, Database::write_client)
    }

    fn delete_client(&self, id: &str) -> StoreResult<bool> {
        let deleted = self.with_db(|db| db.delete_client(id, Utc::now()))?;
        if deleted {
            tracing::debug!(client_id = %id, "Deleted client");
        }
        Ok(deleted)
    }

    fn get_alumni(&self) -> StoreResult<Vec<Alumni>> {
        self.with_db(|db| db.list_alumni())
    }

    fn get_alumni_by_id(&self, id: &str) -> StoreResult<Option<Alumni>> {
        self.with_db(|db| db.get_alumni(id))
    }

    fn get_alumni_by_client(&self, client_id: &str) -> StoreResult<Option<Alumni>> {
        self.with_db(|db| db.get_alumni_by_client(client_id))
    }

    fn create_alumni(&self, data: NewAlumni) -> StoreResult<Alumni> {
        let db = self.db.lock()?;
        Self::require_client(&db, &data.client_id)?;
        if db.get_alumni_by_client(&data.client_id)?.is_some() {
            return Err(StoreError::Duplicate {
                entity: "alumni",
                detail: format!("client {} already has an alumni record", data.client_id),
            });
        }
        let alumni = Alumni::from_new(data);
        db.insert_alumni(&alumni)?;
        Ok(alumni)
    }

    fn update_alumni(&self, id: &str, patch: &AlumniPatch) -> StoreResult<Option<Alumni>> {
        let db = self.db.lock()?;
        update_versioned(&db, id, patch, Database::get_alumni, Database::write_alumni)
    }

    fn delete_alumni(&self, id: &str) -> StoreResult<bool> {
        self.with_db(|db| db.delete_alumni(id))
    }

    fn get_alerts(&self) -> StoreResult<Vec<Alert>> {
        self.with_db(|db| db.list_alerts())
    }

    fn get_alert_by_id(&self, id: &str) -> StoreResult<Option<Alert>> {
        self.with_db(|db| db.get_alert(id))
    }

    fn create_alert(&self, data: NewAlert) -> StoreResult<Alert> {
        let db = self.db.lock()?;
        if let Some(client_id) = &data.client_id {
            Self::require_client(&db, client_id)?;
        }
        let alert = Alert::from_new(data);
        db.insert_alert(&alert)?;
        Ok(alert)
    }

    fn update_alert(&self, id: &str, patch: &AlertPatch) -> StoreResult<Option<Alert>> {
        let db = self.db.lock()?;
        update_versioned(&db, id, patch, Database::get_alert, Database::write_alert)
    }

    fn delete_alert(&self, id: &str) -> StoreResult<bool> {
        self.with_db(|db| db.delete_alert(id))
    }

    fn get_shifts(&self) -> StoreResult<Vec<StaffShift>> {
        self.with_db(|db| db.list_shifts())
    }

    fn get_shift_by_id(&self, id: &str) -> StoreResult<Option<StaffShift>> {
        self.with_db(|db| db.get_shift(id))
    }

    fn create_shift(&self, data: NewShift) -> StoreResult<StaffShift> {
        let shift = StaffShift::from_new(data);
        self.with_db(|db| db.insert_shift(&shift))?;
        Ok(shift)
    }

    fn update_shift(&self, id: &str, patch: &ShiftPatch) -> StoreResult<Option<StaffShift>> {
        let db = self.db.lock()?;
        update_versioned(&db, id, patch, Database::get_shift, Database::write_shift)
    }

    fn delete_shift(&self, id: &str) -> StoreResult<bool> {
        self.with_db(|db| db.delete_shift(id))
    }

    fn get_progress_notes(&self, client_id: &str) -> StoreResult<Vec<ProgressNote>> {
        self.with_db(|db| db.list_progress_notes(client_id))
    }

    fn create_progress_note(&self, data: NewProgressNote) -> StoreResult<ProgressNote> {
        let db = self.db.lock()?;
        Self::require_client(&db, &data.client_id)?;
        let note = ProgressNote::from_new(data);
        db.insert_progress_note(&note)?;
        Ok(note)
    }

    fn delete_progress_note(&self, id: &str) -> StoreResult<bool> {
        self.with_db(|db| db.delete_progress_note(id))
    }

    fn get_sobriety_check_ins(&self, client_id: &str) -> StoreResult<Vec<SobrietyCheckIn>> {
        self.with_db(|db| db.list_sobriety_check_ins(client_id))
    }

    fn create_sobriety_check_in(&self, data: NewSobrietyCheckIn) -> StoreResult<SobrietyCheckIn> {
        let db = self.db.lock()?;
        Self::require_client(&db, &data.client_id)?;
        let check_in = SobrietyCheckIn::from_new(data);
        db.insert_sobriety_check_in(&check_in)?;
        Ok(check_in)
    }

    fn load_sub_record(
        &self,
        kind: SubRecordKind,
        client_id: &str,
    ) -> StoreResult<Option<VersionedBlob>> {
        self.with_db(|db| db.get_sub_record(kind, client_id))
    }

    fn save_sub_record(
        &self,
        kind: SubRecordKind,
        client_id: &str,
        data: serde_json::Value,
        expected_version: Option<u64>,
    ) -> StoreResult<VersionedBlob> {
        let db = self.db.lock()?;
        let stored = db.get_sub_record(kind, client_id)?;
        check_blob_version(
            kind,
            client_id,
            stored.as_ref().map(|b| b.version),
            expected_version,
        )?;

        let blob = VersionedBlob {
            client_id: client_id.to_string(),
            data,
            version: stored.as_ref().map_or(1, |b| b.version + 1),
            updated_at: advance_timestamp(
                stored
                    .as_ref()
                    .map_or(DateTime::<Utc>::MIN_UTC, |b| b.updated_at),
            ),
        };
        match &stored {
            None => db.insert_sub_record(kind, &blob)?,
            Some(previous) => {
                if !db.write_sub_record(kind, &blob, previous.version)? {
                    return Err(StoreError::Conflict {
                        entity: kind.table(),
                        id: client_id.to_string(),
                    });
                }
            }
        }
        tracing::debug!(
            kind = kind.as_str(),
            client_id = %client_id,
            version = blob.version,
            "Saved sub-record"
        );
        Ok(blob)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AlertPriority, AlertStatus, AlertType, ClientStatus, SobrietyStatus};
    use crate::store::{graduate_client, snooze_alert};
    use chrono::NaiveDate;
    use serde_json::json;

    fn seeded() -> SqliteDataSource {
        let source = SqliteDataSource::open_in_memory().unwrap();
        assert!(source.seed_mock_data().unwrap());
        source
    }

    #[test]
    fn test_seed_is_idempotent() {
        let source = seeded();
        assert!(!source.seed_mock_data().unwrap());
        assert_eq!(source.get_clients().unwrap().len(), seed::clients().len());
        assert_eq!(source.get_users().unwrap().len(), seed::users().len());
    }

    #[test]
    fn test_update_rejects_stale_version() {
        let source = seeded();
        let client = source.get_client_by_id("client-1").unwrap().unwrap();

        let patch = ClientPatch {
            status: Some(ClientStatus::Inactive),
            expected_version: Some(client.version),
            ..Default::default()
        };
        let updated = source.update_client("client-1", &patch).unwrap().unwrap();
        assert_eq!(updated.version, client.version + 1);

        let err = source.update_client("client-1", &patch).unwrap_err();
        assert!(err.is_conflict());
    }

    #[test]
    fn test_graduation_creates_single_alumni() {
        let source = seeded();
        let graduated = NaiveDate::from_ymd_opt(2024, 9, 1).unwrap();

        let alumni = graduate_client(&source, "client-1", graduated)
            .unwrap()
            .unwrap();
        assert_eq!(alumni.client_id, "client-1");
        assert_eq!(alumni.sobriety_status, SobrietyStatus::Sober);

        let client = source.get_client_by_id("client-1").unwrap().unwrap();
        assert_eq!(client.status, ClientStatus::Graduated);

        let again = graduate_client(&source, "client-1", graduated).unwrap_err();
        assert!(matches!(again, StoreError::Duplicate { .. }));
    }

    #[test]
    fn test_alert_requires_existing_client() {
        let source = seeded();
        let err = source
            .create_alert(NewAlert {
                client_id: Some("ghost".into()),
                title: "Orphan".into(),
                description: None,
                alert_type: AlertType::Custom,
                priority: AlertPriority::Low,
                due_date: None,
                assigned_to: None,
            })
            .unwrap_err();
        assert!(matches!(err, StoreError::InvalidReference { .. }));
    }

    #[test]
    fn test_snooze_persists() {
        let source = seeded();
        let alert = snooze_alert(&source, "alert-1", 2).unwrap().unwrap();
        assert_eq!(alert.status, AlertStatus::Snoozed);

        let stored = source.get_alert_by_id("alert-1").unwrap().unwrap();
        assert_eq!(stored, alert);
    }

    #[test]
    fn test_sub_record_versions() {
        let source = seeded();
        let kind = SubRecordKind::Insurance;

        let first = source
            .save_sub_record(kind, "client-2", json!({"verifications": []}), None)
            .unwrap();
        assert_eq!(first.version, 1);

        let second = source
            .save_sub_record(kind, "client-2", json!({"verifications": [1]}), Some(1))
            .unwrap();
        assert_eq!(second.version, 2);
        assert!(second.updated_at > first.updated_at);

        let stale = source
            .save_sub_record(kind, "client-2", json!({}), Some(1))
            .unwrap_err();
        assert!(stale.is_conflict());
    }

    #[test]
    fn test_delete_client_cascades() {
        let source = seeded();
        source
            .save_sub_record(SubRecordKind::Medical, "client-1", json!({}), None)
            .unwrap();

        assert!(source.delete_client("client-1").unwrap());
        assert!(source.get_progress_notes("client-1").unwrap().is_empty());
        assert!(source.get_sobriety_check_ins("client-1").unwrap().is_empty());
        assert!(source
            .load_sub_record(SubRecordKind::Medical, "client-1")
            .unwrap()
            .is_none());
        assert!(source
            .get_alerts()
            .unwrap()
            .iter()
            .all(|a| a.client_id.as_deref() != Some("client-1")));
    }
}
