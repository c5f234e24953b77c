//! Versioned sub-record documents (medical, legal, insurance).

use chrono::{DateTime, Utc};
use rusqlite::{params, OptionalExtension};

use super::{Database, DbError, DbResult};
use crate::models::SubRecordKind;
use crate::store::VersionedBlob;

impl Database {
    /// Load the document for a client, if one was ever saved.
    pub fn get_sub_record(
        &self,
        kind: SubRecordKind,
        client_id: &str,
    ) -> DbResult<Option<VersionedBlob>> {
        self.conn
            .query_row(
                &format!(
                    "SELECT client_id, data, version, updated_at FROM {} WHERE client_id = ?",
                    kind.table()
                ),
                [client_id],
                |row| {
                    Ok(BlobRow {
                        client_id: row.get(0)?,
                        data: row.get(1)?,
                        version: row.get(2)?,
                        updated_at: row.get(3)?,
                    })
                },
            )
            .optional()?
            .map(|row| row.try_into())
            .transpose()
    }

    /// Insert the first document for a client.
    pub fn insert_sub_record(&self, kind: SubRecordKind, blob: &VersionedBlob) -> DbResult<()> {
        let data_json = serde_json::to_string(&blob.data)?;
        self.conn.execute(
            &format!(
                "INSERT INTO {} (client_id, data, version, updated_at) VALUES (?1, ?2, ?3, ?4)",
                kind.table()
            ),
            params![blob.client_id, data_json, blob.version, blob.updated_at],
        )?;
        Ok(())
    }

    /// Replace a document if its stored version is still `previous_version`.
    pub fn write_sub_record(
        &self,
        kind: SubRecordKind,
        blob: &VersionedBlob,
        previous_version: u64,
    ) -> DbResult<bool> {
        let data_json = serde_json::to_string(&blob.data)?;
        let rows_affected = self.conn.execute(
            &format!(
                "UPDATE {} SET data = ?2, version = ?3, updated_at = ?4 WHERE client_id = ?1 AND version = ?5",
                kind.table()
            ),
            params![
                blob.client_id,
                data_json,
                blob.version,
                blob.updated_at,
                previous_version,
            ],
        )?;
        Ok(rows_affected > 0)
    }
}

struct BlobRow {
    client_id: String,
    data: String,
    version: u64,
    updated_at: DateTime<Utc>,
}

impl TryFrom<BlobRow> for VersionedBlob {
    type Error = DbError;

    fn try_from(row: BlobRow) -> Result<Self, Self::Error> {
        Ok(VersionedBlob {
            client_id: row.client_id,
            data: serde_json::from_str(&row.data)?,
            version: row.version,
            updated_at: row.updated_at,
        })
    }
}
