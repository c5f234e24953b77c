//! Client models.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::{double_option, impl_record, set_if, Patch};

/// Program status of a client. Any status may be set at any time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ClientStatus {
    Active,
    Inactive,
    Pending,
    Discharged,
    Graduated,
    #[serde(rename = "On Leave")]
    OnLeave,
}

impl ClientStatus {
    pub const ALL: [ClientStatus; 6] = [
        Self::Active,
        Self::Inactive,
        Self::Pending,
        Self::Discharged,
        Self::Graduated,
        Self::OnLeave,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Active => "Active",
            Self::Inactive => "Inactive",
            Self::Pending => "Pending",
            Self::Discharged => "Discharged",
            Self::Graduated => "Graduated",
            Self::OnLeave => "On Leave",
        }
    }

    pub fn from_db_value(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.as_str() == value)
    }
}

/// Treatment program a client is enrolled in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProgramType {
    Residential,
    Outpatient,
    IntensiveOutpatient,
    PartialHospitalization,
    SoberLiving,
    Detox,
}

impl ProgramType {
    pub const ALL: [ProgramType; 6] = [
        Self::Residential,
        Self::Outpatient,
        Self::IntensiveOutpatient,
        Self::PartialHospitalization,
        Self::SoberLiving,
        Self::Detox,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Residential => "residential",
            Self::Outpatient => "outpatient",
            Self::IntensiveOutpatient => "intensive_outpatient",
            Self::PartialHospitalization => "partial_hospitalization",
            Self::SoberLiving => "sober_living",
            Self::Detox => "detox",
        }
    }

    pub fn from_db_value(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.as_str() == value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Gender {
    Male,
    Female,
    NonBinary,
    Other,
    PreferNotToSay,
}

impl Gender {
    pub const ALL: [Gender; 5] = [
        Self::Male,
        Self::Female,
        Self::NonBinary,
        Self::Other,
        Self::PreferNotToSay,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Male => "male",
            Self::Female => "female",
            Self::NonBinary => "non_binary",
            Self::Other => "other",
            Self::PreferNotToSay => "prefer_not_to_say",
        }
    }

    pub fn from_db_value(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|g| g.as_str() == value)
    }
}

/// A program participant.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Client {
    /// UUID, immutable once created
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    pub date_of_birth: Option<NaiveDate>,
    pub gender: Option<Gender>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub status: ClientStatus,
    pub program_type: Option<ProgramType>,
    pub admission_date: Option<NaiveDate>,
    pub discharge_date: Option<NaiveDate>,
    /// Staff user id of the primary counselor
    pub assigned_counselor: Option<String>,
    pub notes: Option<String>,
    /// Optimistic-concurrency token
    pub version: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl_record!(Client, "client");

impl Client {
    /// Build a stored client from intake data.
    pub fn from_new(data: NewClient) -> Self {
        let now = Utc::now();
        Self {
            id: super::new_id(),
            first_name: data.first_name,
            last_name: data.last_name,
            date_of_birth: data.date_of_birth,
            gender: data.gender,
            email: data.email,
            phone: data.phone,
            address: data.address,
            status: data.status,
            program_type: data.program_type,
            admission_date: data.admission_date,
            discharge_date: data.discharge_date,
            assigned_counselor: data.assigned_counselor,
            notes: data.notes,
            version: 1,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    /// Days in program, up to discharge or `today`.
    pub fn days_in_program(&self, today: NaiveDate) -> Option<i64> {
        let start = self.admission_date?;
        let end = self.discharge_date.unwrap_or(today);
        Some((end - start).num_days().max(0))
    }
}

/// Intake data for a new client.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewClient {
    pub first_name: String,
    pub last_name: String,
    #[serde(default)]
    pub date_of_birth: Option<NaiveDate>,
    #[serde(default)]
    pub gender: Option<Gender>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    pub status: ClientStatus,
    #[serde(default)]
    pub program_type: Option<ProgramType>,
    #[serde(default)]
    pub admission_date: Option<NaiveDate>,
    #[serde(default)]
    pub discharge_date: Option<NaiveDate>,
    #[serde(default)]
    pub assigned_counselor: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

impl NewClient {
    pub fn new(first_name: impl Into<String>, last_name: impl Into<String>) -> Self {
        Self {
            first_name: first_name.into(),
            last_name: last_name.into(),
            date_of_birth: None,
            gender: None,
            email: None,
            phone: None,
            address: None,
            status: ClientStatus::Pending,
            program_type: None,
            admission_date: None,
            discharge_date: None,
            assigned_counselor: None,
            notes: None,
        }
    }
}

/// Partial update for a client. `Some(None)` clears a nullable field.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ClientPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(with = "double_option", skip_serializing_if = "Option::is_none")]
    pub date_of_birth: Option<Option<NaiveDate>>,
    #[serde(with = "double_option", skip_serializing_if = "Option::is_none")]
    pub gender: Option<Option<Gender>>,
    #[serde(with = "double_option", skip_serializing_if = "Option::is_none")]
    pub email: Option<Option<String>>,
    #[serde(with = "double_option", skip_serializing_if = "Option::is_none")]
    pub phone: Option<Option<String>>,
    #[serde(with = "double_option", skip_serializing_if = "Option::is_none")]
    pub address: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<ClientStatus>,
    #[serde(with = "double_option", skip_serializing_if = "Option::is_none")]
    pub program_type: Option<Option<ProgramType>>,
    #[serde(with = "double_option", skip_serializing_if = "Option::is_none")]
    pub admission_date: Option<Option<NaiveDate>>,
    #[serde(with = "double_option", skip_serializing_if = "Option::is_none")]
    pub discharge_date: Option<Option<NaiveDate>>,
    #[serde(with = "double_option", skip_serializing_if = "Option::is_none")]
    pub assigned_counselor: Option<Option<String>>,
    #[serde(with = "double_option", skip_serializing_if = "Option::is_none")]
    pub notes: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expected_version: Option<u64>,
}

impl Patch<Client> for ClientPatch {
    fn expected_version(&self) -> Option<u64> {
        self.expected_version
    }

    fn apply_to(&self, c: &mut Client) {
        set_if(&mut c.first_name, &self.first_name);
        set_if(&mut c.last_name, &self.last_name);
        set_if(&mut c.date_of_birth, &self.date_of_birth);
        set_if(&mut c.gender, &self.gender);
        set_if(&mut c.email, &self.email);
        set_if(&mut c.phone, &self.phone);
        set_if(&mut c.address, &self.address);
        set_if(&mut c.status, &self.status);
        set_if(&mut c.program_type, &self.program_type);
        set_if(&mut c.admission_date, &self.admission_date);
        set_if(&mut c.discharge_date, &self.discharge_date);
        set_if(&mut c.assigned_counselor, &self.assigned_counselor);
        set_if(&mut c.notes, &self.notes);
    }
}
