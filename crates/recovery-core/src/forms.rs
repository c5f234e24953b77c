//! Raw form input validated into typed create / update payloads.
//!
//! Forms hold strings exactly as entered. `validate` collects every field
//! error at once; submission is blocked while any remain.

use std::fmt;
use std::sync::LazyLock;

use chrono::{NaiveDate, NaiveTime};
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::models::{
    AlertPatch, AlertPriority, AlertType, AlumniPatch, AlumniStatus, ClientPatch, ClientStatus,
    EmergencyContact, EmploymentStatus, Gender, NewAlert, NewClient, NewShift, NoteEntry,
    ProgramType, ShiftType, SobrietyStatus,
};

static EMAIL_RE: LazyLock<Result<Regex, regex::Error>> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$"));
static PHONE_RE: LazyLock<Result<Regex, regex::Error>> =
    LazyLock::new(|| Regex::new(r"^\+?[0-9().\-\s]{7,20}$"));

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

/// All field errors of one submission.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationErrors {
    pub errors: Vec<FieldError>,
}

impl ValidationErrors {
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// First message for `field`, for inline display.
    pub fn for_field(&self, field: &str) -> Option<&str> {
        self.errors
            .iter()
            .find(|e| e.field == field)
            .map(|e| e.message.as_str())
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let fields: Vec<String> = self
            .errors
            .iter()
            .map(|e| format!("{}: {}", e.field, e.message))
            .collect();
        write!(f, "invalid form: {}", fields.join("; "))
    }
}

impl std::error::Error for ValidationErrors {}

#[derive(Default)]
struct Checker {
    errors: Vec<FieldError>,
}

impl Checker {
    fn fail(&mut self, field: &str, message: impl Into<String>) {
        self.errors.push(FieldError {
            field: field.to_string(),
            message: message.into(),
        });
    }

    fn required(&mut self, field: &str, value: &str) -> Option<String> {
        let value = value.trim();
        if value.is_empty() {
            self.fail(field, "is required");
            None
        } else {
            Some(value.to_string())
        }
    }

    fn date(&mut self, field: &str, value: &str) -> Option<NaiveDate> {
        let value = value.trim();
        if value.is_empty() {
            return None;
        }
        match NaiveDate::parse_from_str(value, "%Y-%m-%d") {
            Ok(date) => Some(date),
            Err(_) => {
                self.fail(field, "must be a date (YYYY-MM-DD)");
                None
            }
        }
    }

    fn required_date(&mut self, field: &str, value: &str) -> Option<NaiveDate> {
        if value.trim().is_empty() {
            self.fail(field, "is required");
            return None;
        }
        self.date(field, value)
    }

    fn time(&mut self, field: &str, value: &str) -> Option<NaiveTime> {
        let value = value.trim();
        if value.is_empty() {
            self.fail(field, "is required");
            return None;
        }
        match NaiveTime::parse_from_str(value, "%H:%M") {
            Ok(time) => Some(time),
            Err(_) => {
                self.fail(field, "must be a time (HH:MM)");
                None
            }
        }
    }

    /// Optional enum field; blank is `None`.
    fn choice<T>(&mut self, field: &str, value: &str, parse: fn(&str) -> Option<T>) -> Option<T> {
        let value = value.trim();
        if value.is_empty() {
            return None;
        }
        let parsed = parse(value);
        if parsed.is_none() {
            self.fail(field, format!("unknown value '{}'", value));
        }
        parsed
    }

    fn required_choice<T>(
        &mut self,
        field: &str,
        value: &str,
        parse: fn(&str) -> Option<T>,
    ) -> Option<T> {
        if value.trim().is_empty() {
            self.fail(field, "is required");
            return None;
        }
        self.choice(field, value, parse)
    }

    fn pattern(
        &mut self,
        field: &str,
        value: &str,
        re: &Result<Regex, regex::Error>,
        message: &str,
    ) -> Option<String> {
        let value = optional(value)?;
        match re {
            Ok(re) if re.is_match(&value) => Some(value),
            Ok(_) => {
                self.fail(field, message);
                None
            }
            Err(e) => {
                tracing::error!(error = %e, "Invalid validation pattern");
                Some(value)
            }
        }
    }

    fn email(&mut self, field: &str, value: &str) -> Option<String> {
        self.pattern(field, value, &EMAIL_RE, "must be a valid email address")
    }

    fn phone(&mut self, field: &str, value: &str) -> Option<String> {
        self.pattern(field, value, &PHONE_RE, "must be a valid phone number")
    }

    fn finish(self) -> Result<(), ValidationErrors> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(ValidationErrors {
                errors: self.errors,
            })
        }
    }
}

/// Trimmed text, `None` when blank.
fn optional(value: &str) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}

// =========================================================================
// Clients
// =========================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientForm {
    pub first_name: String,
    pub last_name: String,
    pub date_of_birth: String,
    pub gender: String,
    pub email: String,
    pub phone: String,
    pub address: String,
    pub status: String,
    pub program_type: String,
    pub admission_date: String,
    pub discharge_date: String,
    pub assigned_counselor: String,
    pub notes: String,
}

impl ClientForm {
    pub fn validate(&self) -> Result<NewClient, ValidationErrors> {
        let mut check = Checker::default();
        let first_name = check.required("first_name", &self.first_name);
        let last_name = check.required("last_name", &self.last_name);
        let date_of_birth = check.date("date_of_birth", &self.date_of_birth);
        let gender = check.choice("gender", &self.gender, Gender::from_db_value);
        let email = check.email("email", &self.email);
        let phone = check.phone("phone", &self.phone);
        let status = match optional(&self.status) {
            Some(_) => check.choice("status", &self.status, ClientStatus::from_db_value),
            None => Some(ClientStatus::Pending),
        };
        let program_type =
            check.choice("program_type", &self.program_type, ProgramType::from_db_value);
        let admission_date = check.date("admission_date", &self.admission_date);
        let discharge_date = check.date("discharge_date", &self.discharge_date);
        if let (Some(admitted), Some(discharged)) = (admission_date, discharge_date) {
            if discharged < admitted {
                check.fail("discharge_date", "must not be before the admission date");
            }
        }
        let errors = check.finish();

        let (Some(first_name), Some(last_name), Some(status)) = (first_name, last_name, status)
        else {
            return Err(errors.err().unwrap_or_default());
        };
        errors?;
        Ok(NewClient {
            first_name,
            last_name,
            date_of_birth,
            gender,
            email,
            phone,
            address: optional(&self.address),
            status,
            program_type,
            admission_date,
            discharge_date,
            assigned_counselor: optional(&self.assigned_counselor),
            notes: optional(&self.notes),
        })
    }

    /// Full-record edit: every field is written, blanks clear.
    pub fn validate_patch(&self, expected_version: u64) -> Result<ClientPatch, ValidationErrors> {
        let client = self.validate()?;
        Ok(ClientPatch {
            first_name: Some(client.first_name),
            last_name: Some(client.last_name),
            date_of_birth: Some(client.date_of_birth),
            gender: Some(client.gender),
            email: Some(client.email),
            phone: Some(client.phone),
            address: Some(client.address),
            status: Some(client.status),
            program_type: Some(client.program_type),
            admission_date: Some(client.admission_date),
            discharge_date: Some(client.discharge_date),
            assigned_counselor: Some(client.assigned_counselor),
            notes: Some(client.notes),
            expected_version: Some(expected_version),
        })
    }
}

// =========================================================================
// Alumni
// =========================================================================

/// Edit form for an existing alumni record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AlumniEditForm {
    pub email: String,
    pub phone: String,
    pub status: String,
    pub employment_status: String,
    pub sobriety_status: String,
    /// Blank means unknown, not zero.
    pub sobriety_days: String,
    pub last_contact_date: String,
    pub program_details: String,
    pub emergency_contact_name: String,
    pub emergency_contact_relationship: String,
    pub emergency_contact_phone: String,
    /// Optional note to prepend.
    pub note: String,
    pub note_author: String,
}

impl AlumniEditForm {
    pub fn validate(&self, expected_version: u64) -> Result<AlumniPatch, ValidationErrors> {
        let mut check = Checker::default();
        let email = check.email("email", &self.email);
        let phone = check.phone("phone", &self.phone);
        let status = check.required_choice("status", &self.status, AlumniStatus::from_db_value);
        let employment_status = check.required_choice(
            "employment_status",
            &self.employment_status,
            EmploymentStatus::from_db_value,
        );
        let sobriety_status = check.required_choice(
            "sobriety_status",
            &self.sobriety_status,
            SobrietyStatus::from_db_value,
        );
        let sobriety_days = match optional(&self.sobriety_days) {
            None => None,
            Some(raw) => match raw.parse::<u32>() {
                Ok(days) => Some(days),
                Err(_) => {
                    check.fail("sobriety_days", "must be a whole number of days");
                    None
                }
            },
        };
        let last_contact_date = check.date("last_contact_date", &self.last_contact_date);
        let contact_phone = check.phone("emergency_contact_phone", &self.emergency_contact_phone);
        let emergency_contact = match optional(&self.emergency_contact_name) {
            Some(name) => Some(EmergencyContact {
                name,
                relationship: optional(&self.emergency_contact_relationship),
                phone: contact_phone,
            }),
            None => {
                let relationship = optional(&self.emergency_contact_relationship);
                if contact_phone.is_some() || relationship.is_some() {
                    check.fail("emergency_contact_name", "is required for an emergency contact");
                }
                None
            }
        };
        check.finish()?;

        Ok(AlumniPatch {
            email: Some(email),
            phone: Some(phone),
            status,
            employment_status,
            sobriety_status,
            sobriety_days: Some(sobriety_days),
            last_contact_date: Some(last_contact_date),
            program_details: Some(optional(&self.program_details)),
            emergency_contact: Some(emergency_contact),
            note: optional(&self.note).map(|content| NoteEntry {
                content,
                author: optional(&self.note_author),
            }),
            expected_version: Some(expected_version),
            ..Default::default()
        })
    }
}

// =========================================================================
// Alerts
// =========================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AlertForm {
    pub client_id: String,
    pub title: String,
    pub description: String,
    pub alert_type: String,
    pub priority: String,
    pub due_date: String,
    pub assigned_to: String,
}

impl AlertForm {
    pub fn validate(&self) -> Result<NewAlert, ValidationErrors> {
        let mut check = Checker::default();
        let title = check.required("title", &self.title);
        let alert_type =
            check.required_choice("alert_type", &self.alert_type, AlertType::from_db_value);
        let priority = match optional(&self.priority) {
            Some(_) => check.choice("priority", &self.priority, AlertPriority::from_db_value),
            None => Some(AlertPriority::Medium),
        };
        let due_date = check.date("due_date", &self.due_date);
        let errors = check.finish();

        let (Some(title), Some(alert_type), Some(priority)) = (title, alert_type, priority) else {
            return Err(errors.err().unwrap_or_default());
        };
        errors?;
        Ok(NewAlert {
            client_id: optional(&self.client_id),
            title,
            description: optional(&self.description),
            alert_type,
            priority,
            due_date,
            assigned_to: optional(&self.assigned_to),
        })
    }

    /// Edit of the descriptive fields; lifecycle fields are left alone.
    pub fn validate_patch(&self, expected_version: u64) -> Result<AlertPatch, ValidationErrors> {
        let alert = self.validate()?;
        Ok(AlertPatch {
            client_id: Some(alert.client_id),
            title: Some(alert.title),
            description: Some(alert.description),
            alert_type: Some(alert.alert_type),
            priority: Some(alert.priority),
            due_date: Some(alert.due_date),
            assigned_to: Some(alert.assigned_to),
            expected_version: Some(expected_version),
            ..Default::default()
        })
    }
}

// =========================================================================
// Shifts
// =========================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShiftForm {
    pub staff_id: String,
    pub date: String,
    pub start_time: String,
    pub end_time: String,
    pub role: String,
    pub shift_type: String,
    pub notes: String,
}

impl ShiftForm {
    pub fn validate(&self) -> Result<NewShift, ValidationErrors> {
        let mut check = Checker::default();
        let staff_id = check.required("staff_id", &self.staff_id);
        let date = check.required_date("date", &self.date);
        let start_time = check.time("start_time", &self.start_time);
        let end_time = check.time("end_time", &self.end_time);
        let role = check.required("role", &self.role);
        let shift_type =
            check.required_choice("shift_type", &self.shift_type, ShiftType::from_db_value);

        if let (Some(start), Some(end)) = (start_time, end_time) {
            if start == end {
                check.fail("end_time", "must differ from the start time");
            } else if end < start && shift_type.is_some_and(|t| t != ShiftType::Night) {
                // only night shifts may run past midnight
                check.fail("end_time", "must be after the start time");
            }
        }
        let errors = check.finish();

        let (
            Some(staff_id),
            Some(date),
            Some(start_time),
            Some(end_time),
            Some(role),
            Some(shift_type),
        ) = (staff_id, date, start_time, end_time, role, shift_type)
        else {
            return Err(errors.err().unwrap_or_default());
        };
        errors?;
        Ok(NewShift {
            staff_id,
            date,
            start_time,
            end_time,
            role,
            shift_type,
            notes: optional(&self.notes),
        })
    }
}
