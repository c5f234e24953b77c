//! PostgREST-backed [`DataSource`].

use chrono::{DateTime, Utc};
use reqwest::blocking::RequestBuilder;
use reqwest::Method;
use secrecy::ExposeSecret;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use super::SupabaseClient;
use crate::models::{
    advance_timestamp, Alert, AlertPatch, Alumni, AlumniPatch, Client, ClientPatch, NewAlert,
    NewAlumni, NewClient, NewProgressNote, NewShift, NewSobrietyCheckIn, Patch, ProgressNote,
    Record, ShiftPatch, SobrietyCheckIn, StaffShift, SubRecordKind, User,
};
use crate::store::{
    check_blob_version, is_missing_table_error, merge_patch, DataSource, StoreError, StoreResult,
    VersionedBlob,
};

/// Error body returned by PostgREST.
#[derive(Debug, Default, Deserialize)]
struct PostgrestError {
    code: Option<String>,
    message: Option<String>,
    details: Option<String>,
}

/// Map a failed PostgREST response onto the data-access error contract.
pub(crate) fn classify_error(status: u16, table: &str, body: &str) -> StoreError {
    let parsed: PostgrestError = serde_json::from_str(body).unwrap_or_default();
    let message = parsed.message.unwrap_or_else(|| body.to_string());
    let code = parsed.code.as_deref();

    if is_missing_table_error(code, &message) {
        return StoreError::TableMissing(table.to_string());
    }
    match code {
        Some("23505") => StoreError::Duplicate {
            entity: "row",
            detail: format!("{}: {}", table, message),
        },
        Some("23503") => StoreError::InvalidReference {
            entity: "client",
            id: parsed.details.unwrap_or(message),
        },
        _ => StoreError::Remote(format!("{} {}: {}", table, status, message)),
    }
}

fn eq(value: &str) -> String {
    format!("eq.{}", value)
}

impl SupabaseClient {
    fn request(
        &self,
        method: Method,
        table: &str,
        filters: &[(&str, String)],
    ) -> StoreResult<RequestBuilder> {
        let mut url = self
            .config
            .endpoint(&format!("rest/v1/{}", table))
            .map_err(|e| StoreError::Remote(e.to_string()))?;
        {
            let mut query = url.query_pairs_mut();
            query.append_pair("select", "*");
            for (column, filter) in filters {
                query.append_pair(column, filter);
            }
        }
        Ok(self
            .http
            .request(method, url)
            .header("apikey", self.config.anon_key.expose_secret())
            .bearer_auth(self.bearer()))
    }

    fn execute<T: DeserializeOwned>(&self, table: &str, request: RequestBuilder) -> StoreResult<T> {
        let response = request.send().map_err(|e| {
            tracing::warn!(table, error = %e, "Supabase request failed");
            StoreError::Remote(e.to_string())
        })?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            let err = classify_error(status.as_u16(), table, &body);
            if !err.is_table_missing() {
                tracing::warn!(
                    table,
                    status = status.as_u16(),
                    error = %err,
                    "Supabase returned an error"
                );
            }
            return Err(err);
        }
        response
            .json()
            .map_err(|e| StoreError::Remote(format!("invalid response from {}: {}", table, e)))
    }

    fn select<T: DeserializeOwned>(
        &self,
        table: &str,
        filters: &[(&str, String)],
    ) -> StoreResult<Vec<T>> {
        tracing::debug!(table, "select");
        let request = self.request(Method::GET, table, filters)?;
        self.execute(table, request)
    }

    fn select_one<T: DeserializeOwned>(
        &self,
        table: &str,
        column: &str,
        value: &str,
    ) -> StoreResult<Option<T>> {
        Ok(self
            .select(table, &[(column, eq(value))])?
            .into_iter()
            .next())
    }

    fn insert<T: Serialize + DeserializeOwned>(&self, table: &str, row: &T) -> StoreResult<T> {
        tracing::debug!(table, "insert");
        let request = self
            .request(Method::POST, table, &[])?
            .header("Prefer", "return=representation")
            .json(row);
        let rows: Vec<T> = self.execute(table, request)?;
        rows.into_iter()
            .next()
            .ok_or_else(|| StoreError::Remote(format!("insert into {} returned no row", table)))
    }

    /// PATCH rows matching `filters`, returning the rows written.
    fn patch_where<B: Serialize, T: DeserializeOwned>(
        &self,
        table: &str,
        filters: &[(&str, String)],
        body: &B,
    ) -> StoreResult<Vec<T>> {
        tracing::debug!(table, "update");
        let request = self
            .request(Method::PATCH, table, filters)?
            .header("Prefer", "return=representation")
            .json(body);
        self.execute(table, request)
    }

    fn delete_where(&self, table: &str, filters: &[(&str, String)]) -> StoreResult<usize> {
        tracing::debug!(table, "delete");
        let request = self
            .request(Method::DELETE, table, filters)?
            .header("Prefer", "return=representation");
        let rows: Vec<serde_json::Value> = self.execute(table, request)?;
        Ok(rows.len())
    }

    /// Read, merge, then PATCH guarded by the version that was read.
    fn update_versioned<T, P>(&self, table: &str, id: &str, patch: &P) -> StoreResult<Option<T>>
    where
        T: Record + Serialize + DeserializeOwned,
        P: Patch<T>,
    {
        let Some(current) = self.select_one::<T>(table, "id", id)? else {
            return Ok(None);
        };
        let merged = merge_patch(&current, patch)?;
        let written: Vec<T> = self.patch_where(
            table,
            &[("id", eq(id)), ("version", eq(&current.version().to_string()))],
            &merged,
        )?;
        match written.into_iter().next() {
            Some(row) => Ok(Some(row)),
            None => Err(StoreError::Conflict {
                entity: T::ENTITY,
                id: id.to_string(),
            }),
        }
    }

    fn require_client(&self, client_id: &str) -> StoreResult<()> {
        match self.select_one::<Client>("clients", "id", client_id)? {
            Some(_) => Ok(()),
            None => Err(StoreError::InvalidReference {
                entity: "client",
                id: client_id.to_string(),
            }),
        }
    }
}

impl DataSource for SupabaseClient {
    fn backend_name(&self) -> &'static str {
        "supabase"
    }

    fn get_users(&self) -> StoreResult<Vec<User>> {
        self.select("users", &[("order", "full_name".to_string())])
    }

    fn get_user_by_id(&self, id: &str) -> StoreResult<Option<User>> {
        self.select_one("users", "id", id)
    }

    fn get_clients(&self) -> StoreResult<Vec<Client>> {
        self.select("clients", &[("order", "created_at".to_string())])
    }

    fn get_client_by_id(&self, id: &str) -> StoreResult<Option<Client>> {
        self.select_one("clients", "id", id)
    }

    fn create_client(&self, data: NewClient) -> StoreResult<Client> {
        self.insert("clients", &Client::from_new(data))
    }

    fn update_client(&self, id: &str, patch: &ClientPatch) -> StoreResult<Option<Client>> {
        self.update_versioned("clients", id, patch)
    }

    fn delete_client(&self, id: &str) -> StoreResult<bool> {
        if self.get_client_by_id(id)?.is_none() {
            return Ok(false);
        }

        let orphaned: Vec<Alert> = self.select("alerts", &[("client_id", eq(id))])?;
        for alert in orphaned {
            let patch = AlertPatch {
                client_id: Some(None),
                ..Default::default()
            };
            self.update_alert(&alert.id, &patch)?;
        }
        for kind in SubRecordKind::ALL {
            match self.delete_where(kind.table(), &[("client_id", eq(id))]) {
                Ok(_) => {}
                Err(e) if e.is_table_missing() => {}
                Err(e) => return Err(e),
            }
        }
        for table in ["alumni", "progress_notes", "sobriety_tracking"] {
            self.delete_where(table, &[("client_id", eq(id))])?;
        }
        Ok(self.delete_where("clients", &[("id", eq(id))])? > 0)
    }

    fn get_alumni(&self) -> StoreResult<Vec<Alumni>> {
        self.select("alumni", &[("order", "created_at".to_string())])
    }

    fn get_alumni_by_id(&self, id: &str) -> StoreResult<Option<Alumni>> {
        self.select_one("alumni", "id", id)
    }

    fn get_alumni_by_client(&self, client_id: &str) -> StoreResult<Option<Alumni>> {
        self.select_one("alumni", "client_id", client_id)
    }

    fn create_alumni(&self, data: NewAlumni) -> StoreResult<Alumni> {
        self.require_client(&data.client_id)?;
        if self.get_alumni_by_client(&data.client_id)?.is_some() {
            return Err(StoreError::Duplicate {
                entity: "alumni",
                detail: format!("client {} already has an alumni record", data.client_id),
            });
        }
        self.insert("alumni", &Alumni::from_new(data))
    }

    fn update_alumni(&self, id: &str, patch: &AlumniPatch) -> StoreResult<Option<Alumni>> {
        self.update_versioned("alumni", id, patch)
    }

    fn delete_alumni(&self, id: &str) -> StoreResult<bool> {
        Ok(self.delete_where("alumni", &[("id", eq(id))])? > 0)
    }

    fn get_alerts(&self) -> StoreResult<Vec<Alert>> {
        self.select("alerts", &[("order", "created_at".to_string())])
    }

    fn get_alert_by_id(&self, id: &str) -> StoreResult<Option<Alert>> {
        self.select_one("alerts", "id", id)
    }

    fn create_alert(&self, data: NewAlert) -> StoreResult<Alert> {
        if let Some(client_id) = &data.client_id {
            self.require_client(client_id)?;
        }
        self.insert("alerts", &Alert::from_new(data))
    }

    fn update_alert(&self, id: &str, patch: &AlertPatch) -> StoreResult<Option<Alert>> {
        self.update_versioned("alerts", id, patch)
    }

    fn delete_alert(&self, id: &str) -> StoreResult<bool> {
        Ok(self.delete_where("alerts", &[("id", eq(id))])? > 0)
    }

    fn get_shifts(&self) -> StoreResult<Vec<StaffShift>> {
        self.select("staff_schedules", &[("order", "created_at".to_string())])
    }

    fn get_shift_by_id(&self, id: &str) -> StoreResult<Option<StaffShift>> {
        self.select_one("staff_schedules", "id", id)
    }

    fn create_shift(&self, data: NewShift) -> StoreResult<StaffShift> {
        self.insert("staff_schedules", &StaffShift::from_new(data))
    }

    fn update_shift(&self, id: &str, patch: &ShiftPatch) -> StoreResult<Option<StaffShift>> {
        self.update_versioned("staff_schedules", id, patch)
    }

    fn delete_shift(&self, id: &str) -> StoreResult<bool> {
        Ok(self.delete_where("staff_schedules", &[("id", eq(id))])? > 0)
    }

    fn get_progress_notes(&self, client_id: &str) -> StoreResult<Vec<ProgressNote>> {
        self.select(
            "progress_notes",
            &[
                ("client_id", eq(client_id)),
                ("order", "created_at.desc".to_string()),
            ],
        )
    }

    fn create_progress_note(&self, data: NewProgressNote) -> StoreResult<ProgressNote> {
        self.require_client(&data.client_id)?;
        self.insert("progress_notes", &ProgressNote::from_new(data))
    }

    fn delete_progress_note(&self, id: &str) -> StoreResult<bool> {
        Ok(self.delete_where("progress_notes", &[("id", eq(id))])? > 0)
    }

    fn get_sobriety_check_ins(&self, client_id: &str) -> StoreResult<Vec<SobrietyCheckIn>> {
        self.select(
            "sobriety_tracking",
            &[
                ("client_id", eq(client_id)),
                ("order", "date.desc".to_string()),
            ],
        )
    }

    fn create_sobriety_check_in(&self, data: NewSobrietyCheckIn) -> StoreResult<SobrietyCheckIn> {
        self.require_client(&data.client_id)?;
        self.insert("sobriety_tracking", &SobrietyCheckIn::from_new(data))
    }

    fn load_sub_record(
        &self,
        kind: SubRecordKind,
        client_id: &str,
    ) -> StoreResult<Option<VersionedBlob>> {
        self.select_one(kind.table(), "client_id", client_id)
    }

    fn save_sub_record(
        &self,
        kind: SubRecordKind,
        client_id: &str,
        data: serde_json::Value,
        expected_version: Option<u64>,
    ) -> StoreResult<VersionedBlob> {
        let stored = self.load_sub_record(kind, client_id)?;
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
        let conflict = || StoreError::Conflict {
            entity: kind.table(),
            id: client_id.to_string(),
        };

        match stored {
            None => match self.insert(kind.table(), &blob) {
                // someone else created the document first
                Err(StoreError::Duplicate { .. }) => Err(conflict()),
                other => other,
            },
            Some(previous) => {
                let written: Vec<VersionedBlob> = self.patch_where(
                    kind.table(),
                    &[
                        ("client_id", eq(client_id)),
                        ("version", eq(&previous.version.to_string())),
                    ],
                    &blob,
                )?;
                written.into_iter().next().ok_or_else(conflict)
            }
        }
    }
}
