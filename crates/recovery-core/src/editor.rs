//! Staged editing of per-client sub-records.
//!
//! An editor holds a local copy of one [`SubRecord`] plus the list of item
//! changes made since the last load or save. Saving reloads the stored
//! document, replays those changes on top, and writes it back with the
//! loaded version as the concurrency token, so two staff members editing
//! different medications on the same client do not overwrite each other.

use crate::models::{ChangeError, InsuranceRecord, LegalRecord, MedicalRecord, SubRecord};
use crate::store::{DataSource, StoreError, StoreResult};

pub type MedicalEditor = SubRecordEditor<MedicalRecord>;
pub type LegalEditor = SubRecordEditor<LegalRecord>;
pub type InsuranceEditor = SubRecordEditor<InsuranceRecord>;

pub struct SubRecordEditor<R: SubRecord> {
    client_id: String,
    /// Last loaded or saved state.
    base: R,
    /// `base` with staged changes applied.
    record: R,
    version: Option<u64>,
    staged: Vec<R::Change>,
    using_mock_data: bool,
}

impl<R: SubRecord> SubRecordEditor<R> {
    /// Load the client's document.
    ///
    /// A missing backing table falls back to the mock snapshot; an absent
    /// document starts empty.
    pub fn load(source: &dyn DataSource, client_id: &str) -> StoreResult<Self> {
        let (record, version, using_mock_data) = match source.load_sub_record(R::KIND, client_id) {
            Ok(Some(blob)) => (serde_json::from_value(blob.data)?, Some(blob.version), false),
            Ok(None) => (R::empty(client_id), None, false),
            Err(e) if e.is_table_missing() => {
                tracing::warn!(
                    kind = R::KIND.as_str(),
                    client_id = %client_id,
                    error = %e,
                    "Sub-record table unavailable, using mock data"
                );
                (R::mock(client_id), None, true)
            }
            Err(e) => return Err(e),
        };

        Ok(Self {
            client_id: client_id.to_string(),
            base: record.clone(),
            record,
            version,
            staged: Vec::new(),
            using_mock_data,
        })
    }

    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    /// Current local state, including staged changes.
    pub fn record(&self) -> &R {
        &self.record
    }

    /// Stored version this editor is based on; `None` before the first save.
    pub fn version(&self) -> Option<u64> {
        self.version
    }

    pub fn using_mock_data(&self) -> bool {
        self.using_mock_data
    }

    pub fn staged(&self) -> &[R::Change] {
        &self.staged
    }

    pub fn is_dirty(&self) -> bool {
        !self.staged.is_empty()
    }

    /// Apply `change` locally and queue it for the next save.
    pub fn stage(&mut self, change: R::Change) -> Result<(), ChangeError> {
        self.record.apply(&change)?;
        self.staged.push(change);
        Ok(())
    }

    /// Drop staged changes.
    pub fn discard(&mut self) {
        self.record = self.base.clone();
        self.staged.clear();
    }

    /// Write staged changes.
    ///
    /// Fails with a conflict if a staged change no longer applies to the
    /// stored document or the document changed between reload and write.
    pub fn save(&mut self, source: &dyn DataSource) -> StoreResult<&R> {
        if self.using_mock_data {
            tracing::info!(
                kind = R::KIND.as_str(),
                client_id = %self.client_id,
                "Mock data in use, changes kept locally"
            );
            self.commit_local(self.record.clone(), self.version);
            return Ok(&self.record);
        }
        if self.staged.is_empty() {
            return Ok(&self.record);
        }

        let stored = source.load_sub_record(R::KIND, &self.client_id)?;
        let version = stored.as_ref().map(|b| b.version);
        let mut latest = match stored {
            Some(blob) => serde_json::from_value(blob.data)?,
            None => R::empty(&self.client_id),
        };
        for change in &self.staged {
            if let Err(e) = latest.apply(change) {
                tracing::warn!(
                    kind = R::KIND.as_str(),
                    client_id = %self.client_id,
                    error = %e,
                    "Staged change no longer applies"
                );
                return Err(StoreError::Conflict {
                    entity: R::KIND.table(),
                    id: self.client_id.clone(),
                });
            }
        }

        let blob = source.save_sub_record(
            R::KIND,
            &self.client_id,
            serde_json::to_value(&latest)?,
            version,
        )?;
        tracing::debug!(
            kind = R::KIND.as_str(),
            client_id = %self.client_id,
            version = blob.version,
            changes = self.staged.len(),
            "Saved sub-record changes"
        );
        self.commit_local(latest, Some(blob.version));
        Ok(&self.record)
    }

    fn commit_local(&mut self, record: R, version: Option<u64>) {
        self.base = record.clone();
        self.record = record;
        self.version = version;
        self.staged.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{Database, SqliteDataSource};
    use crate::models::{Change, LegalChange, LegalStatus, MedicalChange, Medication};
    use crate::store::InMemoryDataSource;

    fn medication(id: &str, name: &str) -> Medication {
        Medication {
            id: id.into(),
            name: name.into(),
            dosage: "50mg".into(),
            frequency: "daily".into(),
            prescriber: None,
            start_date: None,
            end_date: None,
            notes: None,
        }
    }

    #[test]
    fn test_absent_document_starts_empty() {
        let source = InMemoryDataSource::seeded();
        let editor = MedicalEditor::load(&source, "client-1").unwrap();
        assert!(!editor.using_mock_data());
        assert_eq!(editor.version(), None);
        assert_eq!(editor.record(), &MedicalRecord::empty("client-1"));
    }

    #[test]
    fn test_missing_table_uses_mock() {
        let db = Database::open_in_memory().unwrap();
        db.conn().execute_batch("DROP TABLE medical_info").unwrap();
        let source = SqliteDataSource::from_database(db);

        let mut editor = MedicalEditor::load(&source, "client-1").unwrap();
        assert!(editor.using_mock_data());
        assert_eq!(editor.record(), &MedicalRecord::mock("client-1"));

        // saves stay local while the table is missing
        editor
            .stage(MedicalChange::Medication(Change::Add(medication("m-new", "Acamprosate"))))
            .unwrap();
        editor.save(&source).unwrap();
        assert!(!editor.is_dirty());
        assert!(editor.record().medications.iter().any(|m| m.id == "m-new"));
    }

    #[test]
    fn test_stage_discard_save() {
        let source = InMemoryDataSource::seeded();
        let mut editor = LegalEditor::load(&source, "client-2").unwrap();

        editor.stage(LegalChange::SetStatus(LegalStatus::Probation)).unwrap();
        assert!(editor.is_dirty());
        editor.discard();
        assert_eq!(editor.record().status, LegalStatus::None);

        editor.stage(LegalChange::SetStatus(LegalStatus::DrugCourt)).unwrap();
        editor.save(&source).unwrap();
        assert_eq!(editor.version(), Some(1));

        let reloaded = LegalEditor::load(&source, "client-2").unwrap();
        assert_eq!(reloaded.record().status, LegalStatus::DrugCourt);
    }

    #[test]
    fn test_concurrent_edits_to_different_items_merge() {
        let source = InMemoryDataSource::seeded();
        let mut first = MedicalEditor::load(&source, "client-1").unwrap();
        let mut second = MedicalEditor::load(&source, "client-1").unwrap();

        first
            .stage(MedicalChange::Medication(Change::Add(medication("m1", "Naltrexone"))))
            .unwrap();
        second
            .stage(MedicalChange::Medication(Change::Add(medication("m2", "Buprenorphine"))))
            .unwrap();
        first.save(&source).unwrap();
        second.save(&source).unwrap();

        let merged = MedicalEditor::load(&source, "client-1").unwrap();
        let ids: Vec<_> = merged.record().medications.iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, vec!["m1", "m2"]);
        assert_eq!(merged.version(), Some(2));
    }

    #[test]
    fn test_replay_failure_is_conflict() {
        let source = InMemoryDataSource::seeded();
        let mut setup = MedicalEditor::load(&source, "client-1").unwrap();
        setup
            .stage(MedicalChange::Medication(Change::Add(medication("m1", "Naltrexone"))))
            .unwrap();
        setup.save(&source).unwrap();

        let mut remover = MedicalEditor::load(&source, "client-1").unwrap();
        let mut editor = MedicalEditor::load(&source, "client-1").unwrap();

        remover
            .stage(MedicalChange::Medication(Change::Remove("m1".into())))
            .unwrap();
        remover.save(&source).unwrap();

        editor
            .stage(MedicalChange::Medication(Change::Update(medication("m1", "Naltrexone ER"))))
            .unwrap();
        let err = editor.save(&source).unwrap_err();
        assert!(err.is_conflict());
        assert!(editor.is_dirty());
    }

    #[test]
    fn test_invalid_stage_is_rejected_locally() {
        let source = InMemoryDataSource::new();
        let mut editor = MedicalEditor::load(&source, "client-1").unwrap();
        let err = editor
            .stage(MedicalChange::Medication(Change::Remove("nope".into())))
            .unwrap_err();
        assert!(matches!(err, ChangeError::Missing { .. }));
        assert!(!editor.is_dirty());
    }
}
