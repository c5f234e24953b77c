//! Alumni models: post-graduation tracking for clients.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::{double_option, impl_record, set_if, Patch, ProgramType};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum AlumniStatus {
    Active,
    Inactive,
    #[serde(rename = "Lost Contact")]
    LostContact,
    Relapsed,
}

impl AlumniStatus {
    pub const ALL: [AlumniStatus; 4] = [
        Self::Active,
        Self::Inactive,
        Self::LostContact,
        Self::Relapsed,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Active => "Active",
            Self::Inactive => "Inactive",
            Self::LostContact => "Lost Contact",
            Self::Relapsed => "Relapsed",
        }
    }

    pub fn from_db_value(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.as_str() == value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmploymentStatus {
    Employed,
    Unemployed,
    Student,
    Retired,
    Disabled,
    Unknown,
}

impl EmploymentStatus {
    pub const ALL: [EmploymentStatus; 6] = [
        Self::Employed,
        Self::Unemployed,
        Self::Student,
        Self::Retired,
        Self::Disabled,
        Self::Unknown,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Employed => "employed",
            Self::Unemployed => "unemployed",
            Self::Student => "student",
            Self::Retired => "retired",
            Self::Disabled => "disabled",
            Self::Unknown => "unknown",
        }
    }

    pub fn from_db_value(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.as_str() == value)
    }
}

/// Canonical sobriety status, shared by alumni records and check-ins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SobrietyStatus {
    Sober,
    Relapsed,
    Unknown,
}

impl SobrietyStatus {
    pub const ALL: [SobrietyStatus; 3] = [Self::Sober, Self::Relapsed, Self::Unknown];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Sober => "sober",
            Self::Relapsed => "relapsed",
            Self::Unknown => "unknown",
        }
    }

    pub fn from_db_value(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.as_str() == value)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EmergencyContact {
    pub name: String,
    pub relationship: Option<String>,
    pub phone: Option<String>,
}

/// A dated alumni note. Notes are only ever prepended, never edited.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AlumniNote {
    pub id: String,
    pub date: DateTime<Utc>,
    pub author: Option<String>,
    pub content: String,
}

impl AlumniNote {
    pub fn new(content: String, author: Option<String>) -> Self {
        Self {
            id: super::new_id(),
            date: Utc::now(),
            author,
            content,
        }
    }
}

/// Alumni record; at most one per client.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Alumni {
    pub id: String,
    pub client_id: String,
    pub first_name: String,
    pub last_name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub graduation_date: NaiveDate,
    pub program_type: Option<ProgramType>,
    pub program_details: Option<String>,
    pub status: AlumniStatus,
    pub employment_status: EmploymentStatus,
    pub sobriety_status: SobrietyStatus,
    /// Days sober at last contact; `None` when unknown
    pub sobriety_days: Option<u32>,
    pub emergency_contact: Option<EmergencyContact>,
    pub last_contact_date: Option<NaiveDate>,
    /// Newest first
    pub notes: Vec<AlumniNote>,
    pub version: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl_record!(Alumni, "alumni");

impl Alumni {
    pub fn from_new(data: NewAlumni) -> Self {
        let now = Utc::now();
        Self {
            id: super::new_id(),
            client_id: data.client_id,
            first_name: data.first_name,
            last_name: data.last_name,
            email: data.email,
            phone: data.phone,
            graduation_date: data.graduation_date,
            program_type: data.program_type,
            program_details: data.program_details,
            status: data.status,
            employment_status: data.employment_status,
            sobriety_status: data.sobriety_status,
            sobriety_days: data.sobriety_days,
            emergency_contact: data.emergency_contact,
            last_contact_date: data.last_contact_date,
            notes: Vec::new(),
            version: 1,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// Data for a new alumni record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewAlumni {
    pub client_id: String,
    pub first_name: String,
    pub last_name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    pub graduation_date: NaiveDate,
    #[serde(default)]
    pub program_type: Option<ProgramType>,
    #[serde(default)]
    pub program_details: Option<String>,
    pub status: AlumniStatus,
    pub employment_status: EmploymentStatus,
    pub sobriety_status: SobrietyStatus,
    #[serde(default)]
    pub sobriety_days: Option<u32>,
    #[serde(default)]
    pub emergency_contact: Option<EmergencyContact>,
    #[serde(default)]
    pub last_contact_date: Option<NaiveDate>,
}

/// A note to prepend as part of an alumni edit.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NoteEntry {
    pub content: String,
    #[serde(default)]
    pub author: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AlumniPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(with = "double_option", skip_serializing_if = "Option::is_none")]
    pub email: Option<Option<String>>,
    #[serde(with = "double_option", skip_serializing_if = "Option::is_none")]
    pub phone: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub graduation_date: Option<NaiveDate>,
    #[serde(with = "double_option", skip_serializing_if = "Option::is_none")]
    pub program_type: Option<Option<ProgramType>>,
    #[serde(with = "double_option", skip_serializing_if = "Option::is_none")]
    pub program_details: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<AlumniStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub employment_status: Option<EmploymentStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sobriety_status: Option<SobrietyStatus>,
    #[serde(with = "double_option", skip_serializing_if = "Option::is_none")]
    pub sobriety_days: Option<Option<u32>>,
    #[serde(with = "double_option", skip_serializing_if = "Option::is_none")]
    pub emergency_contact: Option<Option<EmergencyContact>>,
    #[serde(with = "double_option", skip_serializing_if = "Option::is_none")]
    pub last_contact_date: Option<Option<NaiveDate>>,
    /// Prepended to `notes`; existing notes are untouched
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<NoteEntry>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expected_version: Option<u64>,
}

impl Patch<Alumni> for AlumniPatch {
    fn expected_version(&self) -> Option<u64> {
        self.expected_version
    }

    fn apply_to(&self, a: &mut Alumni) {
        set_if(&mut a.first_name, &self.first_name);
        set_if(&mut a.last_name, &self.last_name);
        set_if(&mut a.email, &self.email);
        set_if(&mut a.phone, &self.phone);
        set_if(&mut a.graduation_date, &self.graduation_date);
        set_if(&mut a.program_type, &self.program_type);
        set_if(&mut a.program_details, &self.program_details);
        set_if(&mut a.status, &self.status);
        set_if(&mut a.employment_status, &self.employment_status);
        set_if(&mut a.sobriety_status, &self.sobriety_status);
        set_if(&mut a.sobriety_days, &self.sobriety_days);
        set_if(&mut a.emergency_contact, &self.emergency_contact);
        set_if(&mut a.last_contact_date, &self.last_contact_date);
        if let Some(entry) = &self.note {
            a.notes
                .insert(0, AlumniNote::new(entry.content.clone(), entry.author.clone()));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_alumni() -> Alumni {
        Alumni::from_new(NewAlumni {
            client_id: "client-1".into(),
            first_name: "Sam".into(),
            last_name: "Rivera".into(),
            email: None,
            phone: None,
            graduation_date: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            program_type: Some(ProgramType::Residential),
            program_details: None,
            status: AlumniStatus::Active,
            employment_status: EmploymentStatus::Employed,
            sobriety_status: SobrietyStatus::Sober,
            sobriety_days: Some(120),
            emergency_contact: None,
            last_contact_date: None,
        })
    }

    #[test]
    fn test_notes_are_prepended() {
        let mut alumni = make_alumni();
        let first = AlumniPatch {
            note: Some(NoteEntry {
                content: "Called, doing well".into(),
                author: Some("staff-1".into()),
            }),
            ..Default::default()
        };
        first.apply_to(&mut alumni);
        let original_note = alumni.notes[0].clone();

        let second = AlumniPatch {
            note: Some(NoteEntry {
                content: "Attended reunion".into(),
                author: None,
            }),
            ..Default::default()
        };
        second.apply_to(&mut alumni);

        assert_eq!(alumni.notes.len(), 2);
        assert_eq!(alumni.notes[0].content, "Attended reunion");
        assert_eq!(alumni.notes[1], original_note);
    }

    #[test]
    fn test_sobriety_days_can_be_cleared() {
        let mut alumni = make_alumni();
        let patch = AlumniPatch {
            status: Some(AlumniStatus::LostContact),
            sobriety_days: Some(None),
            ..Default::default()
        };
        patch.apply_to(&mut alumni);
        assert_eq!(alumni.status, AlumniStatus::LostContact);
        assert_eq!(alumni.sobriety_days, None);
    }
}
