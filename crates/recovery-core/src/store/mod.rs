//! Data-access layer.
//!
//! Every backend implements [`DataSource`], so callers never know whether
//! records live in memory, in SQLite, or in a remote Supabase project. The
//! backend is chosen once at startup (see [`crate::config::connect`]).
//!
//! Contract shared by all entities:
//!
//! - `get_x()` returns the full collection
//! - `get_x_by_id(id)` returns `Ok(None)` when absent
//! - `create_x(data)` assigns id, version 1 and timestamps
//! - `update_x(id, patch)` merges only the patched fields, bumps the version,
//!   advances `updated_at`, and returns `Ok(None)` when absent
//! - `delete_x(id)` returns whether a record was removed

mod memory;
pub mod seed;

pub use memory::InMemoryDataSource;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::{
    Alert, AlertPatch, Alumni, AlumniPatch, AlumniStatus, ChangeError, Client, ClientPatch,
    ClientStatus, EmploymentStatus, NewAlert, NewAlumni, NewClient, NewProgressNote, NewShift,
    NewSobrietyCheckIn, Patch, ProgressNote, Record, ShiftPatch, SobrietyCheckIn, SobrietyStatus,
    StaffShift, SubRecordKind, TransitionError, User,
};

/// Data-access errors.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("table `{0}` does not exist")]
    TableMissing(String),

    #[error("{entity} {id} was modified concurrently (expected version {expected}, found {found})")]
    VersionConflict {
        entity: &'static str,
        id: String,
        expected: u64,
        found: u64,
    },

    #[error("{entity} {id} was modified concurrently")]
    Conflict { entity: &'static str, id: String },

    #[error("duplicate {entity}: {detail}")]
    Duplicate { entity: &'static str, detail: String },

    #[error("referenced {entity} {id} does not exist")]
    InvalidReference { entity: &'static str, id: String },

    #[error("invalid alert transition: {0}")]
    InvalidTransition(#[from] TransitionError),

    #[error("sub-record change rejected: {0}")]
    Change(#[from] ChangeError),

    #[error("remote error: {0}")]
    Remote(String),

    #[error("backend error: {0}")]
    Backend(String),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

impl StoreError {
    pub fn is_table_missing(&self) -> bool {
        matches!(self, StoreError::TableMissing(_))
    }

    pub fn is_conflict(&self) -> bool {
        matches!(
            self,
            StoreError::VersionConflict { .. } | StoreError::Conflict { .. }
        )
    }
}

impl<T> From<std::sync::PoisonError<T>> for StoreError {
    fn from(e: std::sync::PoisonError<T>) -> Self {
        StoreError::Backend(format!("Lock poisoned: {}", e))
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Recognize "table does not exist" errors from SQLite, Postgres and PostgREST.
pub fn is_missing_table_error(code: Option<&str>, message: &str) -> bool {
    if matches!(code, Some("42P01") | Some("PGRST205")) {
        return true;
    }
    let message = message.to_ascii_lowercase();
    message.contains("no such table")
        || message.contains("could not find the table")
        || (message.contains("relation") && message.contains("does not exist"))
}

/// A stored sub-record document with its concurrency token.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VersionedBlob {
    pub client_id: String,
    pub data: serde_json::Value,
    pub version: u64,
    pub updated_at: DateTime<Utc>,
}

/// Merge `patch` over `current`, checking the caller's expected version.
pub fn merge_patch<T: Record, P: Patch<T>>(current: &T, patch: &P) -> StoreResult<T> {
    if let Some(expected) = patch.expected_version() {
        if expected != current.version() {
            return Err(StoreError::VersionConflict {
                entity: T::ENTITY,
                id: current.id().to_string(),
                expected,
                found: current.version(),
            });
        }
    }
    let mut merged = current.clone();
    patch.apply_to(&mut merged);
    merged.touch();
    Ok(merged)
}

/// Check a sub-record write against the stored version.
///
/// `expected == None` means the caller believes no document exists yet.
pub(crate) fn check_blob_version(
    kind: SubRecordKind,
    client_id: &str,
    stored: Option<u64>,
    expected: Option<u64>,
) -> StoreResult<()> {
    match (stored, expected) {
        (None, None) => Ok(()),
        (Some(found), Some(expected)) if found == expected => Ok(()),
        (Some(found), expected) => Err(StoreError::VersionConflict {
            entity: kind.table(),
            id: client_id.to_string(),
            expected: expected.unwrap_or(0),
            found,
        }),
        (None, Some(expected)) => Err(StoreError::VersionConflict {
            entity: kind.table(),
            id: client_id.to_string(),
            expected,
            found: 0,
        }),
    }
}

/// Capability interface over a storage backend.
pub trait DataSource: Send + Sync {
    /// Short backend name for logs.
    fn backend_name(&self) -> &'static str;

    // Users
    fn get_users(&self) -> StoreResult<Vec<User>>;
    fn get_user_by_id(&self, id: &str) -> StoreResult<Option<User>>;

    // Clients
    fn get_clients(&self) -> StoreResult<Vec<Client>>;
    fn get_client_by_id(&self, id: &str) -> StoreResult<Option<Client>>;
    fn create_client(&self, data: NewClient) -> StoreResult<Client>;
    fn update_client(&self, id: &str, patch: &ClientPatch) -> StoreResult<Option<Client>>;
    /// Removes the client with its alumni row, notes, check-ins and
    /// sub-records; alerts keep their row with `client_id` cleared.
    fn delete_client(&self, id: &str) -> StoreResult<bool>;

    // Alumni
    fn get_alumni(&self) -> StoreResult<Vec<Alumni>>;
    fn get_alumni_by_id(&self, id: &str) -> StoreResult<Option<Alumni>>;
    fn get_alumni_by_client(&self, client_id: &str) -> StoreResult<Option<Alumni>>;
    fn create_alumni(&self, data: NewAlumni) -> StoreResult<Alumni>;
    fn update_alumni(&self, id: &str, patch: &AlumniPatch) -> StoreResult<Option<Alumni>>;
    fn delete_alumni(&self, id: &str) -> StoreResult<bool>;

    // Alerts
    fn get_alerts(&self) -> StoreResult<Vec<Alert>>;
    fn get_alert_by_id(&self, id: &str) -> StoreResult<Option<Alert>>;
    fn create_alert(&self, data: NewAlert) -> StoreResult<Alert>;
    fn update_alert(&self, id: &str, patch: &AlertPatch) -> StoreResult<Option<Alert>>;
    fn delete_alert(&self, id: &str) -> StoreResult<bool>;

    // Staff schedules
    fn get_shifts(&self) -> StoreResult<Vec<StaffShift>>;
    fn get_shift_by_id(&self, id: &str) -> StoreResult<Option<StaffShift>>;
    fn create_shift(&self, data: NewShift) -> StoreResult<StaffShift>;
    fn update_shift(&self, id: &str, patch: &ShiftPatch) -> StoreResult<Option<StaffShift>>;
    fn delete_shift(&self, id: &str) -> StoreResult<bool>;

    // Progress notes
    fn get_progress_notes(&self, client_id: &str) -> StoreResult<Vec<ProgressNote>>;
    fn create_progress_note(&self, data: NewProgressNote) -> StoreResult<ProgressNote>;
    fn delete_progress_note(&self, id: &str) -> StoreResult<bool>;

    // Sobriety tracking
    fn get_sobriety_check_ins(&self, client_id: &str) -> StoreResult<Vec<SobrietyCheckIn>>;
    fn create_sobriety_check_in(&self, data: NewSobrietyCheckIn) -> StoreResult<SobrietyCheckIn>;

    // Sub-records
    fn load_sub_record(
        &self,
        kind: SubRecordKind,
        client_id: &str,
    ) -> StoreResult<Option<VersionedBlob>>;

    /// Write a sub-record document. `expected_version` must match the stored
    /// version, or be `None` when no document exists yet.
    fn save_sub_record(
        &self,
        kind: SubRecordKind,
        client_id: &str,
        data: serde_json::Value,
        expected_version: Option<u64>,
    ) -> StoreResult<VersionedBlob>;
}

// =========================================================================
// Alert lifecycle
// =========================================================================

/// Resolve an alert, recording who resolved it.
pub fn resolve_alert(
    source: &dyn DataSource,
    id: &str,
    resolved_by: &str,
) -> StoreResult<Option<Alert>> {
    transition_alert(source, id, |alert| alert.resolve(resolved_by, Utc::now()))
}

/// Snooze an alert for `days` days from now.
pub fn snooze_alert(source: &dyn DataSource, id: &str, days: i64) -> StoreResult<Option<Alert>> {
    transition_alert(source, id, |alert| alert.snooze(days, Utc::now()))
}

/// Return an alert to active.
pub fn reactivate_alert(source: &dyn DataSource, id: &str) -> StoreResult<Option<Alert>> {
    transition_alert(source, id, |alert| {
        alert.reactivate();
        Ok(())
    })
}

fn transition_alert<F>(
    source: &dyn DataSource,
    id: &str,
    transition: F,
) -> StoreResult<Option<Alert>>
where
    F: FnOnce(&mut Alert) -> Result<(), TransitionError>,
{
    let Some(mut alert) = source.get_alert_by_id(id)? else {
        return Ok(None);
    };
    transition(&mut alert)?;
    let updated = source.update_alert(id, &alert.lifecycle_patch())?;
    if let Some(alert) = &updated {
        tracing::info!(alert_id = %alert.id, status = alert.status.as_str(), "Alert transitioned");
    }
    Ok(updated)
}

// =========================================================================
// Graduation
// =========================================================================

/// Mark a client graduated and create its alumni record.
///
/// Fails with `Duplicate` if the client already has one. Either both writes
/// land or neither does, so a failed graduation can simply be retried.
pub fn graduate_client(
    source: &dyn DataSource,
    client_id: &str,
    graduation_date: NaiveDate,
) -> StoreResult<Option<Alumni>> {
    let Some(client) = source.get_client_by_id(client_id)? else {
        return Ok(None);
    };
    if source.get_alumni_by_client(client_id)?.is_some() {
        return Err(StoreError::Duplicate {
            entity: "alumni",
            detail: format!("client {} already has an alumni record", client_id),
        });
    }

    // alumni row first: a failed insert leaves the client untouched
    let alumni = source.create_alumni(NewAlumni {
        client_id: client.id.clone(),
        first_name: client.first_name.clone(),
        last_name: client.last_name.clone(),
        email: client.email.clone(),
        phone: client.phone.clone(),
        graduation_date,
        program_type: client.program_type,
        program_details: None,
        status: AlumniStatus::Active,
        employment_status: EmploymentStatus::Unknown,
        sobriety_status: SobrietyStatus::Sober,
        sobriety_days: None,
        emergency_contact: None,
        last_contact_date: Some(graduation_date),
    })?;

    let patch = ClientPatch {
        status: Some(ClientStatus::Graduated),
        discharge_date: Some(Some(client.discharge_date.unwrap_or(graduation_date))),
        expected_version: Some(client.version),
        ..Default::default()
    };
    // undo the alumni row if the client was changed or removed meanwhile
    let graduated = source.update_client(client_id, &patch);
    if !matches!(graduated, Ok(Some(_))) {
        if let Err(cleanup) = source.delete_alumni(&alumni.id) {
            tracing::warn!(
                client_id = %client_id,
                alumni_id = %alumni.id,
                error = %cleanup,
                "Failed to roll back alumni record"
            );
        }
        return graduated.map(|_| None);
    }
    tracing::info!(client_id = %client_id, alumni_id = %alumni.id, "Client graduated");
    Ok(Some(alumni))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{Database, SqliteDataSource};

    fn source_with_trigger(client: &Client, trigger: &str) -> SqliteDataSource {
        let db = Database::open_in_memory().unwrap();
        db.insert_client(client).unwrap();
        db.conn().execute_batch(trigger).unwrap();
        SqliteDataSource::from_database(db)
    }

    #[test]
    fn test_failed_alumni_insert_leaves_client_enrolled() {
        let client = Client::from_new(NewClient::new("Noah", "Kim"));
        let source = source_with_trigger(
            &client,
            "CREATE TRIGGER reject_alumni BEFORE INSERT ON alumni
             BEGIN SELECT RAISE(ABORT, 'alumni insert rejected'); END;",
        );

        let date = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
        let err = graduate_client(&source, &client.id, date).unwrap_err();
        assert!(matches!(err, StoreError::Backend(ref m) if m.contains("alumni insert rejected")));

        let stored = source.get_client_by_id(&client.id).unwrap().unwrap();
        assert_eq!(stored.status, client.status);
        assert_eq!(stored.discharge_date, None);
        assert_eq!(stored.version, client.version);
    }

    #[test]
    fn test_failed_status_update_removes_alumni() {
        let client = Client::from_new(NewClient::new("Noah", "Kim"));
        let source = source_with_trigger(
            &client,
            "CREATE TRIGGER reject_client_update BEFORE UPDATE ON clients
             BEGIN SELECT RAISE(ABORT, 'client update rejected'); END;",
        );

        let date = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
        assert!(graduate_client(&source, &client.id, date).is_err());
        assert_eq!(source.get_alumni_by_client(&client.id).unwrap(), None);
        assert!(source.get_alumni().unwrap().is_empty());

        // nothing left behind, so a retry is not reported as a duplicate
        let err = graduate_client(&source, &client.id, date).unwrap_err();
        assert!(matches!(err, StoreError::Backend(ref m) if m.contains("client update rejected")));
    }

    #[test]
    fn test_missing_table_recognition() {
        assert!(is_missing_table_error(None, "no such table: medical_info"));
        assert!(is_missing_table_error(
            None,
            "relation \"public.legal_info\" does not exist"
        ));
        assert!(is_missing_table_error(Some("42P01"), "anything"));
        assert!(is_missing_table_error(
            Some("PGRST205"),
            "Could not find the table 'public.insurance_info' in the schema cache"
        ));
        assert!(!is_missing_table_error(Some("23505"), "duplicate key value"));
        assert!(!is_missing_table_error(None, "connection refused"));
    }

    #[test]
    fn test_check_blob_version() {
        let kind = SubRecordKind::Medical;
        assert!(check_blob_version(kind, "c", None, None).is_ok());
        assert!(check_blob_version(kind, "c", Some(3), Some(3)).is_ok());
        assert!(check_blob_version(kind, "c", Some(3), Some(2))
            .unwrap_err()
            .is_conflict());
        assert!(check_blob_version(kind, "c", Some(1), None)
            .unwrap_err()
            .is_conflict());
        assert!(check_blob_version(kind, "c", None, Some(1))
            .unwrap_err()
            .is_conflict());
    }
}
