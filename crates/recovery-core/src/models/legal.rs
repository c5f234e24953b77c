//! Legal sub-record: status, court dates, documents and notes.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::{impl_item, Change, ChangeError, SubRecord, SubRecordKind};

/// Canonical legal status. Free-text values are not accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LegalStatus {
    #[default]
    None,
    Probation,
    Parole,
    PendingCharges,
    CourtOrdered,
    DrugCourt,
}

impl LegalStatus {
    pub const ALL: [LegalStatus; 6] = [
        Self::None,
        Self::Probation,
        Self::Parole,
        Self::PendingCharges,
        Self::CourtOrdered,
        Self::DrugCourt,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Probation => "probation",
            Self::Parole => "parole",
            Self::PendingCharges => "pending_charges",
            Self::CourtOrdered => "court_ordered",
            Self::DrugCourt => "drug_court",
        }
    }

    pub fn from_db_value(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.as_str() == value)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CourtDate {
    pub id: String,
    pub date: NaiveDate,
    pub court: String,
    pub purpose: String,
    pub outcome: Option<String>,
}

impl_item!(CourtDate, "court_dates");

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LegalDocument {
    pub id: String,
    pub title: String,
    pub document_type: String,
    pub uploaded_at: DateTime<Utc>,
    pub url: Option<String>,
}

impl_item!(LegalDocument, "documents");

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LegalNote {
    pub id: String,
    pub date: DateTime<Utc>,
    pub author: Option<String>,
    pub content: String,
}

impl_item!(LegalNote, "legal_notes");

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LegalRecord {
    pub client_id: String,
    #[serde(default)]
    pub status: LegalStatus,
    #[serde(default)]
    pub probation_officer: Option<String>,
    #[serde(default)]
    pub case_number: Option<String>,
    #[serde(default)]
    pub court_dates: Vec<CourtDate>,
    #[serde(default)]
    pub documents: Vec<LegalDocument>,
    #[serde(default)]
    pub notes: Vec<LegalNote>,
}

impl LegalRecord {
    /// Court dates on or after `today`, soonest first.
    pub fn upcoming_court_dates(&self, today: NaiveDate) -> Vec<&CourtDate> {
        let mut upcoming: Vec<&CourtDate> =
            self.court_dates.iter().filter(|c| c.date >= today).collect();
        upcoming.sort_by_key(|c| c.date);
        upcoming
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "collection", content = "change", rename_all = "snake_case")]
pub enum LegalChange {
    SetStatus(LegalStatus),
    SetProbationOfficer(Option<String>),
    SetCaseNumber(Option<String>),
    CourtDate(Change<CourtDate>),
    Document(Change<LegalDocument>),
    Note(Change<LegalNote>),
}

impl SubRecord for LegalRecord {
    type Change = LegalChange;

    const KIND: SubRecordKind = SubRecordKind::Legal;

    fn empty(client_id: &str) -> Self {
        Self {
            client_id: client_id.to_string(),
            status: LegalStatus::None,
            probation_officer: None,
            case_number: None,
            court_dates: Vec::new(),
            documents: Vec::new(),
            notes: Vec::new(),
        }
    }

    fn mock(client_id: &str) -> Self {
        crate::store::seed::mock_legal(client_id)
    }

    fn apply(&mut self, change: &LegalChange) -> Result<(), ChangeError> {
        match change {
            LegalChange::SetStatus(status) => self.status = *status,
            LegalChange::SetProbationOfficer(officer) => self.probation_officer = officer.clone(),
            LegalChange::SetCaseNumber(number) => self.case_number = number.clone(),
            LegalChange::CourtDate(c) => c.apply(&mut self.court_dates)?,
            LegalChange::Document(c) => c.apply(&mut self.documents)?,
            LegalChange::Note(c) => c.apply(&mut self.notes)?,
        }
        Ok(())
    }
}
