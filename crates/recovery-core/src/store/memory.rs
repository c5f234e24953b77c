//! In-memory data source.
//!
//! Collections are plain `Vec`s behind `RwLock`s so iteration order matches
//! insertion order, the way the seeded mock arrays read.

use std::collections::HashMap;
use std::sync::RwLock;

use chrono::{DateTime, Utc};

use super::{
    check_blob_version, merge_patch, seed, DataSource, StoreError, StoreResult, VersionedBlob,
};
use crate::models::{
    Alert, AlertPatch, Alumni, AlumniPatch, Client, ClientPatch, NewAlert, NewAlumni, NewClient,
    NewProgressNote, NewShift, NewSobrietyCheckIn, Patch, ProgressNote, Record, ShiftPatch,
    SobrietyCheckIn, StaffShift, SubRecordKind, User,
};

/// Process-local store.
#[derive(Default)]
pub struct InMemoryDataSource {
    users: RwLock<Vec<User>>,
    clients: RwLock<Vec<Client>>,
    alumni: RwLock<Vec<Alumni>>,
    alerts: RwLock<Vec<Alert>>,
    shifts: RwLock<Vec<StaffShift>>,
    notes: RwLock<Vec<ProgressNote>>,
    check_ins: RwLock<Vec<SobrietyCheckIn>>,
    sub_records: RwLock<HashMap<(SubRecordKind, String), VersionedBlob>>,
}

impl InMemoryDataSource {
    /// Empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-filled with the mock data set.
    pub fn seeded() -> Self {
        let store = Self {
            users: RwLock::new(seed::users()),
            clients: RwLock::new(seed::clients()),
            alumni: RwLock::new(seed::alumni()),
            alerts: RwLock::new(seed::alerts()),
            shifts: RwLock::new(seed::shifts()),
            notes: RwLock::new(seed::progress_notes()),
            check_ins: RwLock::new(seed::sobriety_check_ins()),
            sub_records: RwLock::new(HashMap::new()),
        };
        tracing::debug!("Seeded in-memory data source");
        store
    }
}

fn find<T: Record>(rows: &RwLock<Vec<T>>, id: &str) -> StoreResult<Option<T>> {
    Ok(rows.read()?.iter().find(|r| r.id() == id).cloned())
}

fn update<T: Record, P: Patch<T>>(
    rows: &RwLock<Vec<T>>,
    id: &str,
    patch: &P,
) -> StoreResult<Option<T>> {
    let mut rows = rows.write()?;
    let Some(slot) = rows.iter_mut().find(|r| r.id() == id) else {
        return Ok(None);
    };
    let merged = merge_patch(slot, patch)?;
    *slot = merged.clone();
    Ok(Some(merged))
}

fn remove<T, F>(rows: &RwLock<Vec<T>>, matches: F) -> StoreResult<bool>
where
    F: Fn(&T) -> bool,
{
    let mut rows = rows.write()?;
    let before = rows.len();
    rows.retain(|r| !matches(r));
    Ok(rows.len() < before)
}

impl InMemoryDataSource {
    fn client_exists(&self, client_id: &str) -> StoreResult<bool> {
        Ok(self.clients.read()?.iter().any(|c| c.id == client_id))
    }

    fn require_client(&self, client_id: &str) -> StoreResult<()> {
        if self.client_exists(client_id)? {
            Ok(())
        } else {
            Err(StoreError::InvalidReference {
                entity: "client",
                id: client_id.to_string(),
            })
        }
    }
}

impl DataSource for InMemoryDataSource {
    fn backend_name(&self) -> &'static str {
        "memory"
    }

    fn get_users(&self) -> StoreResult<Vec<User>> {
        Ok(self.users.read()?.clone())
    }

    fn get_user_by_id(&self, id: &str) -> StoreResult<Option<User>> {
        Ok(self.users.read()?.iter().find(|u| u.id == id).cloned())
    }

    fn get_clients(&self) -> StoreResult<Vec<Client>> {
        Ok(self.clients.read()?.clone())
    }

    fn get_client_by_id(&self, id: &str) -> StoreResult<Option<Client>> {
        find(&self.clients, id)
    }

    fn create_client(&self, data: NewClient) -> StoreResult<Client> {
        let client = Client::from_new(data);
        self.clients.write()?.push(client.clone());
        tracing::debug!(client_id = %client.id, "Created client");
        Ok(client)
    }

    fn update_client(&self, id: &str, patch: &ClientPatch) -> StoreResult<Option<Client>> {
        update(&self.clients, id, patch)
    }

    fn delete_client(&self, id: &str) -> StoreResult<bool> {
        if !remove(&self.clients, |c: &Client| c.id == id)? {
            return Ok(false);
        }
        remove(&self.alumni, |a: &Alumni| a.client_id == id)?;
        remove(&self.notes, |n: &ProgressNote| n.client_id == id)?;
        remove(&self.check_ins, |c: &SobrietyCheckIn| c.client_id == id)?;
        self.sub_records
            .write()?
            .retain(|(_, client_id), _| client_id != id);

        for alert in self.alerts.write()?.iter_mut() {
            if alert.client_id.as_deref() == Some(id) {
                alert.client_id = None;
                alert.touch();
            }
        }
        tracing::debug!(client_id = %id, "Deleted client");
        Ok(true)
    }

    fn get_alumni(&self) -> StoreResult<Vec<Alumni>> {
        Ok(self.alumni.read()?.clone())
    }

    fn get_alumni_by_id(&self, id: &str) -> StoreResult<Option<Alumni>> {
        find(&self.alumni, id)
    }

    fn get_alumni_by_client(&self, client_id: &str) -> StoreResult<Option<Alumni>> {
        Ok(self
            .alumni
            .read()?
            .iter()
            .find(|a| a.client_id == client_id)
            .cloned())
    }

    fn create_alumni(&self, data: NewAlumni) -> StoreResult<Alumni> {
        self.require_client(&data.client_id)?;
        let mut rows = self.alumni.write()?;
        if rows.iter().any(|a| a.client_id == data.client_id) {
            return Err(StoreError::Duplicate {
                entity: "alumni",
                detail: format!("client {} already has an alumni record", data.client_id),
            });
        }
        let alumni = Alumni::from_new(data);
        rows.push(alumni.clone());
        Ok(alumni)
    }

    fn update_alumni(&self, id: &str, patch: &AlumniPatch) -> StoreResult<Option<Alumni>> {
        update(&self.alumni, id, patch)
    }

    fn delete_alumni(&self, id: &str) -> StoreResult<bool> {
        remove(&self.alumni, |a: &Alumni| a.id == id)
    }

    fn get_alerts(&self) -> StoreResult<Vec<Alert>> {
        Ok(self.alerts.read()?.clone())
    }

    fn get_alert_by_id(&self, id: &str) -> StoreResult<Option<Alert>> {
        find(&self.alerts, id)
    }

    fn create_alert(&self, data: NewAlert) -> StoreResult<Alert> {
        if let Some(client_id) = &data.client_id {
            self.require_client(client_id)?;
        }
        let alert = Alert::from_new(data);
        self.alerts.write()?.push(alert.clone());
        Ok(alert)
    }

    fn update_alert(&self, id: &str, patch: &AlertPatch) -> StoreResult<Option<Alert>> {
        update(&self.alerts, id, patch)
    }

    fn delete_alert(&self, id: &str) -> StoreResult<bool> {
        remove(&self.alerts, |a: &Alert| a.id == id)
    }

    fn get_shifts(&self) -> StoreResult<Vec<StaffShift>> {
        Ok(self.shifts.read()?.clone())
    }

    fn get_shift_by_id(&self, id: &str) -> StoreResult<Option<StaffShift>> {
        find(&self.shifts, id)
    }

    fn create_shift(&self, data: NewShift) -> StoreResult<StaffShift> {
        let shift = StaffShift::from_new(data);
        self.shifts.write()?.push(shift.clone());
        Ok(shift)
    }

    fn update_shift(&self, id: &str, patch: &ShiftPatch) -> StoreResult<Option<StaffShift>> {
        update(&self.shifts, id, patch)
    }

    fn delete_shift(&self, id: &str) -> StoreResult<bool> {
        remove(&self.shifts, |s: &StaffShift| s.id == id)
    }

    fn get_progress_notes(&self, client_id: &str) -> StoreResult<Vec<ProgressNote>> {
        let mut notes: Vec<ProgressNote> = self
            .notes
            .read()?
            .iter()
            .filter(|n| n.client_id == client_id)
            .cloned()
            .collect();
        notes.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(notes)
    }

    fn create_progress_note(&self, data: NewProgressNote) -> StoreResult<ProgressNote> {
        self.require_client(&data.client_id)?;
        let note = ProgressNote::from_new(data);
        self.notes.write()?.push(note.clone());
        Ok(note)
    }

    fn delete_progress_note(&self, id: &str) -> StoreResult<bool> {
        remove(&self.notes, |n: &ProgressNote| n.id == id)
    }

    fn get_sobriety_check_ins(&self, client_id: &str) -> StoreResult<Vec<SobrietyCheckIn>> {
        let mut check_ins: Vec<SobrietyCheckIn> = self
            .check_ins
            .read()?
            .iter()
            .filter(|c| c.client_id == client_id)
            .cloned()
            .collect();
        check_ins.sort_by(|a, b| b.date.cmp(&a.date));
        Ok(check_ins)
    }

    fn create_sobriety_check_in(&self, data: NewSobrietyCheckIn) -> StoreResult<SobrietyCheckIn> {
        self.require_client(&data.client_id)?;
        let check_in = SobrietyCheckIn::from_new(data);
        self.check_ins.write()?.push(check_in.clone());
        Ok(check_in)
    }

    fn load_sub_record(
        &self,
        kind: SubRecordKind,
        client_id: &str,
    ) -> StoreResult<Option<VersionedBlob>> {
        Ok(self
            .sub_records
            .read()?
            .get(&(kind, client_id.to_string()))
            .cloned())
    }

    fn save_sub_record(
        &self,
        kind: SubRecordKind,
        client_id: &str,
        data: serde_json::Value,
        expected_version: Option<u64>,
    ) -> StoreResult<VersionedBlob> {
        let mut docs = self.sub_records.write()?;
        let key = (kind, client_id.to_string());
        let stored = docs.get(&key);
        check_blob_version(kind, client_id, stored.map(|b| b.version), expected_version)?;

        let blob = VersionedBlob {
            client_id: client_id.to_string(),
            data,
            version: stored.map_or(1, |b| b.version + 1),
            updated_at: crate::models::advance_timestamp(
                stored.map_or(DateTime::<Utc>::MIN_UTC, |b| b.updated_at),
            ),
        };
        docs.insert(key, blob.clone());
        Ok(blob)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AlertPriority, AlertStatus, AlertType, ClientStatus};
    use crate::store::{reactivate_alert, resolve_alert, snooze_alert};
    use chrono::Duration;

    fn make_alert(store: &InMemoryDataSource, client_id: Option<String>) -> Alert {
        store
            .create_alert(NewAlert {
                client_id,
                title: "Court date reminder".into(),
                description: None,
                alert_type: AlertType::Legal,
                priority: AlertPriority::Urgent,
                due_date: None,
                assigned_to: None,
            })
            .unwrap()
    }

    #[test]
    fn test_create_and_get_client() {
        let store = InMemoryDataSource::new();
        let mut data = NewClient::new("Alex", "Kim");
        data.status = ClientStatus::Active;
        data.email = Some("alex@example.com".into());

        let created = store.create_client(data).unwrap();
        let fetched = store.get_client_by_id(&created.id).unwrap().unwrap();
        assert_eq!(fetched, created);
        assert_eq!(fetched.email.as_deref(), Some("alex@example.com"));
        assert_eq!(store.get_clients().unwrap().len(), 1);
    }

    #[test]
    fn test_update_merges_and_advances() {
        let store = InMemoryDataSource::new();
        let created = store.create_client(NewClient::new("Alex", "Kim")).unwrap();

        let patch = ClientPatch {
            status: Some(ClientStatus::Active),
            ..Default::default()
        };
        let updated = store.update_client(&created.id, &patch).unwrap().unwrap();

        assert_eq!(updated.status, ClientStatus::Active);
        assert_eq!(updated.first_name, created.first_name);
        assert_eq!(updated.version, created.version + 1);
        assert!(updated.updated_at > created.updated_at);
        assert_eq!(updated.created_at, created.created_at);
    }

    #[test]
    fn test_missing_records_are_not_errors() {
        let store = InMemoryDataSource::new();
        assert!(store.get_client_by_id("nope").unwrap().is_none());
        assert!(store
            .update_client("nope", &ClientPatch::default())
            .unwrap()
            .is_none());
        assert!(!store.delete_client("nope").unwrap());
        assert!(resolve_alert(&store, "nope", "staff-1").unwrap().is_none());
    }

    #[test]
    fn test_stale_version_is_rejected() {
        let store = InMemoryDataSource::new();
        let created = store.create_client(NewClient::new("Alex", "Kim")).unwrap();

        let first = ClientPatch {
            notes: Some(Some("first".into())),
            expected_version: Some(created.version),
            ..Default::default()
        };
        store.update_client(&created.id, &first).unwrap();

        let stale = ClientPatch {
            notes: Some(Some("second".into())),
            expected_version: Some(created.version),
            ..Default::default()
        };
        let err = store.update_client(&created.id, &stale).unwrap_err();
        assert!(err.is_conflict());

        let current = store.get_client_by_id(&created.id).unwrap().unwrap();
        assert_eq!(current.notes.as_deref(), Some("first"));
    }

    #[test]
    fn test_alert_lifecycle() {
        let store = InMemoryDataSource::new();
        let alert = make_alert(&store, None);

        let before = Utc::now();
        let snoozed = snooze_alert(&store, &alert.id, 2).unwrap().unwrap();
        assert_eq!(snoozed.status, AlertStatus::Snoozed);
        let until = snoozed.snooze_until.unwrap();
        assert!(until >= before + Duration::days(2));
        assert!(until <= Utc::now() + Duration::days(2));

        let active = reactivate_alert(&store, &alert.id).unwrap().unwrap();
        assert_eq!(active.status, AlertStatus::Active);
        assert_eq!(active.snooze_until, None);

        let resolved = resolve_alert(&store, &alert.id, "staff-1").unwrap().unwrap();
        assert_eq!(resolved.status, AlertStatus::Resolved);
        assert_eq!(resolved.resolved_by.as_deref(), Some("staff-1"));
        assert!(resolved.resolved_at.is_some());

        let err = snooze_alert(&store, &alert.id, 1).unwrap_err();
        assert!(matches!(err, StoreError::InvalidTransition(_)));
    }

    #[test]
    fn test_delete_client_cascades() {
        let store = InMemoryDataSource::new();
        let client = store.create_client(NewClient::new("Alex", "Kim")).unwrap();
        let alert = make_alert(&store, Some(client.id.clone()));
        store
            .save_sub_record(
                SubRecordKind::Medical,
                &client.id,
                serde_json::json!({"client_id": client.id}),
                None,
            )
            .unwrap();

        assert!(store.delete_client(&client.id).unwrap());

        let orphan = store.get_alert_by_id(&alert.id).unwrap().unwrap();
        assert_eq!(orphan.client_id, None);
        assert!(store
            .load_sub_record(SubRecordKind::Medical, &client.id)
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_alert_requires_existing_client() {
        let store = InMemoryDataSource::new();
        let err = store
            .create_alert(NewAlert {
                client_id: Some("ghost".into()),
                title: "x".into(),
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
    fn test_sub_record_versions() {
        let store = InMemoryDataSource::new();
        let kind = SubRecordKind::Legal;
        let v1 = store
            .save_sub_record(kind, "c1", serde_json::json!({"a": 1}), None)
            .unwrap();
        assert_eq!(v1.version, 1);

        let v2 = store
            .save_sub_record(kind, "c1", serde_json::json!({"a": 2}), Some(1))
            .unwrap();
        assert_eq!(v2.version, 2);
        assert!(v2.updated_at > v1.updated_at);

        let stale = store.save_sub_record(kind, "c1", serde_json::json!({"a": 3}), Some(1));
        assert!(stale.unwrap_err().is_conflict());
    }

    #[test]
    fn test_seeded_store_has_data() {
        let store = InMemoryDataSource::seeded();
        assert!(!store.get_clients().unwrap().is_empty());
        assert!(!store.get_alerts().unwrap().is_empty());
        assert!(!store.get_users().unwrap().is_empty());
    }
}
