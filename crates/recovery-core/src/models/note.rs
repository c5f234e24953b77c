//! Progress notes and sobriety check-ins.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::SobrietyStatus;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoteCategory {
    General,
    Session,
    Medical,
    Behavioral,
    Incident,
    Discharge,
}

impl NoteCategory {
    pub const ALL: [NoteCategory; 6] = [
        Self::General,
        Self::Session,
        Self::Medical,
        Self::Behavioral,
        Self::Incident,
        Self::Discharge,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::General => "general",
            Self::Session => "session",
            Self::Medical => "medical",
            Self::Behavioral => "behavioral",
            Self::Incident => "incident",
            Self::Discharge => "discharge",
        }
    }

    pub fn from_db_value(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.as_str() == value)
    }
}

/// A clinical progress note on a client.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProgressNote {
    pub id: String,
    pub client_id: String,
    pub author_id: String,
    pub category: NoteCategory,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewProgressNote {
    pub client_id: String,
    pub author_id: String,
    pub category: NoteCategory,
    pub content: String,
}

impl ProgressNote {
    pub fn from_new(data: NewProgressNote) -> Self {
        Self {
            id: super::new_id(),
            client_id: data.client_id,
            author_id: data.author_id,
            category: data.category,
            content: data.content,
            created_at: Utc::now(),
        }
    }
}

/// A daily sobriety check-in.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SobrietyCheckIn {
    pub id: String,
    pub client_id: String,
    pub date: NaiveDate,
    pub status: SobrietyStatus,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewSobrietyCheckIn {
    pub client_id: String,
    pub date: NaiveDate,
    pub status: SobrietyStatus,
    #[serde(default)]
    pub notes: Option<String>,
}

impl SobrietyCheckIn {
    pub fn from_new(data: NewSobrietyCheckIn) -> Self {
        Self {
            id: super::new_id(),
            client_id: data.client_id,
            date: data.date,
            status: data.status,
            notes: data.notes,
            created_at: Utc::now(),
        }
    }
}

/// Consecutive sober days ending at the most recent check-in.
///
/// A gap of more than one day, or any non-sober check-in, ends the streak.
pub fn sobriety_streak(check_ins: &[SobrietyCheckIn]) -> u32 {
    // a day counts as sober only if every check-in on it was sober
    let mut days: BTreeMap<NaiveDate, bool> = BTreeMap::new();
    for check_in in check_ins {
        let sober = days.entry(check_in.date).or_insert(true);
        *sober &= check_in.status == SobrietyStatus::Sober;
    }

    let mut streak = 0;
    let mut expected: Option<NaiveDate> = None;
    for (date, sober) in days.iter().rev() {
        if !sober || expected.is_some_and(|day| day != *date) {
            break;
        }
        streak += 1;
        expected = date.pred_opt();
    }
    streak
}
