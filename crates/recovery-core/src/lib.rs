//! Recovery Core Library
//!
//! Case management for a substance-abuse recovery center: clients, alumni,
//! staff schedules, alerts, and per-client medical / legal / insurance
//! sub-records.
//!
//! # Architecture
//!
//! ```text
//!     Screens (forms, list views, sub-record editors)
//!                          │
//!                  dyn DataSource   ◄── chosen once by config::connect
//!                          │
//!        ┌─────────────────┼──────────────────┐
//!        ▼                 ▼                  ▼
//!   InMemoryDataSource  SqliteDataSource  SupabaseClient
//!   (seeded mock data)  (local file)      (PostgREST + auth)
//! ```
//!
//! Every record carries a version; updates with a stale version are rejected
//! instead of silently overwriting a colleague's edit.
//!
//! # Modules
//!
//! - [`models`]: Domain types (Client, Alumni, Alert, StaffShift, sub-records)
//! - [`store`]: The `DataSource` contract, in-memory backend and seed data
//! - [`db`]: SQLite backend
//! - [`supabase`]: Remote backend, session handling and cookie storage
//! - [`editor`]: Staged sub-record editing with mock fallback
//! - [`views`]: Filters, sorting and dashboard aggregates
//! - [`forms`]: Field-level validation of raw form input
//! - [`config`] / [`logging`]: Startup configuration and tracing

pub mod config;
pub mod db;
pub mod editor;
pub mod forms;
pub mod logging;
pub mod models;
pub mod store;
pub mod supabase;
pub mod views;

// Re-export commonly used types
pub use config::{connect, AppConfig, ConfigError, DataSourceKind};
pub use db::{Database, SqliteDataSource};
pub use editor::{InsuranceEditor, LegalEditor, MedicalEditor, SubRecordEditor};
pub use models::{
    Alert, AlertPriority, AlertStatus, AlertType, Alumni, AlumniStatus, Client, ClientStatus,
    InsuranceRecord, LegalRecord, MedicalRecord, ProgramType, StaffShift, SubRecordKind, User,
};
pub use store::{DataSource, InMemoryDataSource, StoreError, StoreResult};
pub use supabase::{SupabaseClient, SupabaseConfig};

// UniFFI setup - using proc macros
uniffi::setup_scaffolding!();

use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::models::SubRecord;

// =========================================================================
// FFI Error Type
// =========================================================================

#[derive(Debug, thiserror::Error, uniffi::Error)]
pub enum RecoveryError {
    #[error("Storage error: {0}")]
    StorageError(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Table unavailable: {0}")]
    TableMissing(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Field errors as a JSON document.
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl From<StoreError> for RecoveryError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::TableMissing(table) => RecoveryError::TableMissing(table),
            e if e.is_conflict() => RecoveryError::Conflict(e.to_string()),
            e @ (StoreError::Duplicate { .. }
            | StoreError::InvalidReference { .. }
            | StoreError::InvalidTransition(_)
            | StoreError::Change(_)) => RecoveryError::InvalidInput(e.to_string()),
            StoreError::Json(e) => RecoveryError::SerializationError(e.to_string()),
            e => RecoveryError::StorageError(e.to_string()),
        }
    }
}

impl From<serde_json::Error> for RecoveryError {
    fn from(e: serde_json::Error) -> Self {
        RecoveryError::SerializationError(e.to_string())
    }
}

impl From<ConfigError> for RecoveryError {
    fn from(e: ConfigError) -> Self {
        RecoveryError::ConfigError(e.to_string())
    }
}

impl From<forms::ValidationErrors> for RecoveryError {
    fn from(e: forms::ValidationErrors) -> Self {
        match serde_json::to_string(&e) {
            Ok(json) => RecoveryError::Validation(json),
            Err(_) => RecoveryError::Validation(e.to_string()),
        }
    }
}

fn to_json<T: Serialize + ?Sized>(value: &T) -> Result<String, RecoveryError> {
    Ok(serde_json::to_string(value)?)
}

fn from_json<T: DeserializeOwned>(json: &str) -> Result<T, RecoveryError> {
    Ok(serde_json::from_str(json)?)
}

fn parse_date(value: &str) -> Result<NaiveDate, RecoveryError> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
        .map_err(|e| RecoveryError::InvalidInput(format!("invalid date '{}': {}", value, e)))
}

fn parse_kind(value: &str) -> Result<SubRecordKind, RecoveryError> {
    SubRecordKind::parse(value)
        .ok_or_else(|| RecoveryError::InvalidInput(format!("unknown sub-record kind '{}'", value)))
}

// =========================================================================
// Factory Functions (exported to FFI)
// =========================================================================

/// Create an in-memory store, optionally seeded with the mock data set.
#[uniffi::export]
pub fn open_in_memory(seed: bool) -> Arc<RecoveryCore> {
    let source = if seed {
        InMemoryDataSource::seeded()
    } else {
        InMemoryDataSource::new()
    };
    Arc::new(RecoveryCore::new(Arc::new(source)))
}

/// Open or create a SQLite database at the given path.
#[uniffi::export]
pub fn open_database(path: String, seed: bool) -> Result<Arc<RecoveryCore>, RecoveryError> {
    let source = SqliteDataSource::open(&path)?;
    if seed {
        source.seed_mock_data()?;
    }
    Ok(Arc::new(RecoveryCore::new(Arc::new(source))))
}

/// Read `.env` / process environment, install logging and connect the
/// configured backend.
#[uniffi::export]
pub fn open_from_env() -> Result<Arc<RecoveryCore>, RecoveryError> {
    let config = AppConfig::from_env()?;
    logging::init(&config.log_filter);
    let source = connect(&config)?;
    Ok(Arc::new(RecoveryCore::new(source)))
}

// =========================================================================
// Main API Object
// =========================================================================

/// Thread-safe handle on the selected backend for FFI.
///
/// Records cross the boundary as JSON in the same shape the models
/// serialize to; absent records are `null`.
#[derive(uniffi::Object)]
pub struct RecoveryCore {
    source: Arc<dyn DataSource>,
}

impl RecoveryCore {
    pub fn new(source: Arc<dyn DataSource>) -> Self {
        Self { source }
    }

    pub fn source(&self) -> &dyn DataSource {
        &*self.source
    }
}

#[uniffi::export]
impl RecoveryCore {
    pub fn backend_name(&self) -> String {
        self.source.backend_name().to_string()
    }

    // =========================================================================
    // Users
    // =========================================================================

    pub fn get_users(&self) -> Result<String, RecoveryError> {
        to_json(&self.source.get_users()?)
    }

    pub fn get_user(&self, id: String) -> Result<String, RecoveryError> {
        to_json(&self.source.get_user_by_id(&id)?)
    }

    // =========================================================================
    // Clients
    // =========================================================================

    pub fn get_clients(&self) -> Result<String, RecoveryError> {
        to_json(&self.source.get_clients()?)
    }

    pub fn get_client(&self, id: String) -> Result<String, RecoveryError> {
        to_json(&self.source.get_client_by_id(&id)?)
    }

    /// Create from a `NewClient` JSON document.
    pub fn create_client(&self, data_json: String) -> Result<String, RecoveryError> {
        let data: models::NewClient = from_json(&data_json)?;
        to_json(&self.source.create_client(data)?)
    }

    /// Validate a raw intake form and create the client.
    pub fn submit_client_form(&self, form_json: String) -> Result<String, RecoveryError> {
        let form: forms::ClientForm = from_json(&form_json)?;
        let data = form.validate()?;
        to_json(&self.source.create_client(data)?)
    }

    pub fn update_client(&self, id: String, patch_json: String) -> Result<String, RecoveryError> {
        let patch: models::ClientPatch = from_json(&patch_json)?;
        to_json(&self.source.update_client(&id, &patch)?)
    }

    pub fn delete_client(&self, id: String) -> Result<bool, RecoveryError> {
        Ok(self.source.delete_client(&id)?)
    }

    /// Graduate a client; `graduation_date` is `YYYY-MM-DD`.
    pub fn graduate_client(
        &self,
        client_id: String,
        graduation_date: String,
    ) -> Result<String, RecoveryError> {
        let date = parse_date(&graduation_date)?;
        to_json(&store::graduate_client(self.source(), &client_id, date)?)
    }

    // =========================================================================
    // Alumni
    // =========================================================================

    pub fn get_alumni(&self) -> Result<String, RecoveryError> {
        to_json(&self.source.get_alumni()?)
    }

    pub fn get_alumni_by_id(&self, id: String) -> Result<String, RecoveryError> {
        to_json(&self.source.get_alumni_by_id(&id)?)
    }

    pub fn get_alumni_by_client(&self, client_id: String) -> Result<String, RecoveryError> {
        to_json(&self.source.get_alumni_by_client(&client_id)?)
    }

    pub fn create_alumni(&self, data_json: String) -> Result<String, RecoveryError> {
        let data: models::NewAlumni = from_json(&data_json)?;
        to_json(&self.source.create_alumni(data)?)
    }

    pub fn update_alumni(&self, id: String, patch_json: String) -> Result<String, RecoveryError> {
        let patch: models::AlumniPatch = from_json(&patch_json)?;
        to_json(&self.source.update_alumni(&id, &patch)?)
    }

    /// Validate the alumni edit form and apply it against `expected_version`.
    pub fn submit_alumni_form(
        &self,
        id: String,
        form_json: String,
        expected_version: u64,
    ) -> Result<String, RecoveryError> {
        let form: forms::AlumniEditForm = from_json(&form_json)?;
        let patch = form.validate(expected_version)?;
        to_json(&self.source.update_alumni(&id, &patch)?)
    }

    pub fn delete_alumni(&self, id: String) -> Result<bool, RecoveryError> {
        Ok(self.source.delete_alumni(&id)?)
    }

    // =========================================================================
    // Alerts
    // =========================================================================

    pub fn get_alerts(&self) -> Result<String, RecoveryError> {
        to_json(&self.source.get_alerts()?)
    }

    pub fn get_alert(&self, id: String) -> Result<String, RecoveryError> {
        to_json(&self.source.get_alert_by_id(&id)?)
    }

    pub fn create_alert(&self, data_json: String) -> Result<String, RecoveryError> {
        let data: models::NewAlert = from_json(&data_json)?;
        to_json(&self.source.create_alert(data)?)
    }

    pub fn submit_alert_form(&self, form_json: String) -> Result<String, RecoveryError> {
        let form: forms::AlertForm = from_json(&form_json)?;
        let data = form.validate()?;
        to_json(&self.source.create_alert(data)?)
    }

    pub fn update_alert(&self, id: String, patch_json: String) -> Result<String, RecoveryError> {
        let patch: models::AlertPatch = from_json(&patch_json)?;
        to_json(&self.source.update_alert(&id, &patch)?)
    }

    pub fn delete_alert(&self, id: String) -> Result<bool, RecoveryError> {
        Ok(self.source.delete_alert(&id)?)
    }

    pub fn resolve_alert(&self, id: String, resolved_by: String) -> Result<String, RecoveryError> {
        to_json(&store::resolve_alert(self.source(), &id, &resolved_by)?)
    }

    pub fn snooze_alert(&self, id: String, days: i64) -> Result<String, RecoveryError> {
        to_json(&store::snooze_alert(self.source(), &id, days)?)
    }

    pub fn reactivate_alert(&self, id: String) -> Result<String, RecoveryError> {
        to_json(&store::reactivate_alert(self.source(), &id)?)
    }

    // =========================================================================
    // Staff Schedules
    // =========================================================================

    pub fn get_shifts(&self) -> Result<String, RecoveryError> {
        to_json(&self.source.get_shifts()?)
    }

    pub fn get_shift(&self, id: String) -> Result<String, RecoveryError> {
        to_json(&self.source.get_shift_by_id(&id)?)
    }

    pub fn create_shift(&self, data_json: String) -> Result<String, RecoveryError> {
        let data: models::NewShift = from_json(&data_json)?;
        to_json(&self.source.create_shift(data)?)
    }

    pub fn submit_shift_form(&self, form_json: String) -> Result<String, RecoveryError> {
        let form: forms::ShiftForm = from_json(&form_json)?;
        let data = form.validate()?;
        to_json(&self.source.create_shift(data)?)
    }

    pub fn update_shift(&self, id: String, patch_json: String) -> Result<String, RecoveryError> {
        let patch: models::ShiftPatch = from_json(&patch_json)?;
        to_json(&self.source.update_shift(&id, &patch)?)
    }

    pub fn delete_shift(&self, id: String) -> Result<bool, RecoveryError> {
        Ok(self.source.delete_shift(&id)?)
    }

    // =========================================================================
    // Progress Notes / Sobriety
    // =========================================================================

    pub fn get_progress_notes(&self, client_id: String) -> Result<String, RecoveryError> {
        to_json(&self.source.get_progress_notes(&client_id)?)
    }

    pub fn create_progress_note(&self, data_json: String) -> Result<String, RecoveryError> {
        let data: models::NewProgressNote = from_json(&data_json)?;
        to_json(&self.source.create_progress_note(data)?)
    }

    pub fn delete_progress_note(&self, id: String) -> Result<bool, RecoveryError> {
        Ok(self.source.delete_progress_note(&id)?)
    }

    pub fn get_sobriety_check_ins(&self, client_id: String) -> Result<String, RecoveryError> {
        to_json(&self.source.get_sobriety_check_ins(&client_id)?)
    }

    pub fn create_sobriety_check_in(&self, data_json: String) -> Result<String, RecoveryError> {
        let data: models::NewSobrietyCheckIn = from_json(&data_json)?;
        to_json(&self.source.create_sobriety_check_in(data)?)
    }

    /// Current consecutive sober days for a client.
    pub fn sobriety_streak(&self, client_id: String) -> Result<u32, RecoveryError> {
        let check_ins = self.source.get_sobriety_check_ins(&client_id)?;
        Ok(models::sobriety_streak(&check_ins))
    }

    // =========================================================================
    // Sub-records
    // =========================================================================

    /// Load a client's medical, legal or insurance record.
    pub fn load_sub_record(
        &self,
        kind: String,
        client_id: String,
    ) -> Result<SubRecordSnapshot, RecoveryError> {
        match parse_kind(&kind)? {
            SubRecordKind::Medical => load_snapshot::<MedicalRecord>(self.source(), &client_id),
            SubRecordKind::Legal => load_snapshot::<LegalRecord>(self.source(), &client_id),
            SubRecordKind::Insurance => load_snapshot::<InsuranceRecord>(self.source(), &client_id),
        }
    }

    /// Apply a JSON array of item changes and save.
    pub fn save_sub_record_changes(
        &self,
        kind: String,
        client_id: String,
        changes_json: String,
    ) -> Result<SubRecordSnapshot, RecoveryError> {
        let source = self.source();
        match parse_kind(&kind)? {
            SubRecordKind::Medical => {
                save_changes::<MedicalRecord>(source, &client_id, &changes_json)
            }
            SubRecordKind::Legal => save_changes::<LegalRecord>(source, &client_id, &changes_json),
            SubRecordKind::Insurance => {
                save_changes::<InsuranceRecord>(source, &client_id, &changes_json)
            }
        }
    }

    // =========================================================================
    // List Views
    // =========================================================================

    /// Clients matching a `ClientFilter`, ordered by `sort` ("name" or
    /// "admission_date").
    pub fn filter_clients(
        &self,
        filter_json: String,
        sort: Option<String>,
    ) -> Result<String, RecoveryError> {
        let filter: views::ClientFilter = from_json(&filter_json)?;
        let clients = self.source.get_clients()?;
        let mut visible: Vec<Client> = views::Filter::apply(&filter, &clients)
            .into_iter()
            .cloned()
            .collect();
        if let Some(sort) = sort {
            let order: views::ClientSort = serde_json::from_value(serde_json::Value::String(sort))?;
            views::sort_clients(&mut visible, order);
        }
        to_json(&visible)
    }

    pub fn filter_alumni(&self, filter_json: String) -> Result<String, RecoveryError> {
        let filter: views::AlumniFilter = from_json(&filter_json)?;
        let alumni = self.source.get_alumni()?;
        to_json(&views::Filter::apply(&filter, &alumni))
    }

    /// Alerts matching an `AlertFilter`, ordered by `sort` ("due_date" or
    /// "priority").
    pub fn filter_alerts(
        &self,
        filter_json: String,
        sort: Option<String>,
    ) -> Result<String, RecoveryError> {
        let filter: views::AlertFilter = from_json(&filter_json)?;
        let alerts = self.source.get_alerts()?;
        let mut visible: Vec<Alert> = views::Filter::apply(&filter, &alerts)
            .into_iter()
            .cloned()
            .collect();
        if let Some(sort) = sort {
            let order: views::AlertSort = serde_json::from_value(serde_json::Value::String(sort))?;
            views::sort_alerts(&mut visible, order);
        }
        to_json(&visible)
    }

    pub fn filter_shifts(&self, filter_json: String) -> Result<String, RecoveryError> {
        let filter: views::ShiftFilter = from_json(&filter_json)?;
        let shifts = self.source.get_shifts()?;
        to_json(&views::Filter::apply(&filter, &shifts))
    }

    pub fn client_stats(&self) -> Result<String, RecoveryError> {
        to_json(&views::ClientStats::compute(&self.source.get_clients()?))
    }

    pub fn alert_stats(&self) -> Result<String, RecoveryError> {
        to_json(&views::AlertStats::compute(&self.source.get_alerts()?, Utc::now()))
    }

    pub fn alumni_stats(&self) -> Result<String, RecoveryError> {
        to_json(&views::AlumniStats::compute(&self.source.get_alumni()?))
    }
}

// =========================================================================
// FFI Types
// =========================================================================

/// FFI-safe sub-record state.
#[derive(Debug, Clone, uniffi::Record)]
pub struct SubRecordSnapshot {
    pub kind: String,
    pub client_id: String,
    pub data_json: String,
    /// `None` until the first save.
    pub version: Option<u64>,
    /// The backing table is unavailable and the predefined snapshot is shown.
    pub using_mock_data: bool,
}

fn snapshot<R: SubRecord>(editor: &SubRecordEditor<R>) -> Result<SubRecordSnapshot, RecoveryError> {
    Ok(SubRecordSnapshot {
        kind: R::KIND.as_str().to_string(),
        client_id: editor.client_id().to_string(),
        data_json: to_json(editor.record())?,
        version: editor.version(),
        using_mock_data: editor.using_mock_data(),
    })
}

fn load_snapshot<R: SubRecord>(
    source: &dyn DataSource,
    client_id: &str,
) -> Result<SubRecordSnapshot, RecoveryError> {
    let editor = SubRecordEditor::<R>::load(source, client_id)?;
    snapshot(&editor)
}

fn save_changes<R: SubRecord>(
    source: &dyn DataSource,
    client_id: &str,
    changes_json: &str,
) -> Result<SubRecordSnapshot, RecoveryError> {
    let changes: Vec<R::Change> = from_json(changes_json)?;
    let mut editor = SubRecordEditor::<R>::load(source, client_id)?;
    for change in changes {
        editor.stage(change).map_err(StoreError::from)?;
    }
    editor.save(source)?;
    snapshot(&editor)
}
