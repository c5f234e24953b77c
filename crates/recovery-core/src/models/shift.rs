//! Staff scheduling models.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

use super::{double_option, impl_record, set_if, Patch};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShiftType {
    Morning,
    Afternoon,
    Evening,
    Night,
    OnCall,
}

impl ShiftType {
    pub const ALL: [ShiftType; 5] = [
        Self::Morning,
        Self::Afternoon,
        Self::Evening,
        Self::Night,
        Self::OnCall,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Morning => "morning",
            Self::Afternoon => "afternoon",
            Self::Evening => "evening",
            Self::Night => "night",
            Self::OnCall => "on_call",
        }
    }

    pub fn from_db_value(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.as_str() == value)
    }
}

/// A scheduled shift for a staff member.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StaffShift {
    pub id: String,
    pub staff_id: String,
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub role: String,
    pub shift_type: ShiftType,
    pub notes: Option<String>,
    pub version: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl_record!(StaffShift, "staff_shift");

impl StaffShift {
    pub fn from_new(data: NewShift) -> Self {
        let now = Utc::now();
        Self {
            id: super::new_id(),
            staff_id: data.staff_id,
            date: data.date,
            start_time: data.start_time,
            end_time: data.end_time,
            role: data.role,
            shift_type: data.shift_type,
            notes: data.notes,
            version: 1,
            created_at: now,
            updated_at: now,
        }
    }

    /// Shift length in minutes; an end before the start wraps past midnight.
    pub fn duration_minutes(&self) -> i64 {
        let minutes = (self.end_time - self.start_time).num_minutes();
        if minutes < 0 {
            minutes + 24 * 60
        } else {
            minutes
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewShift {
    pub staff_id: String,
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub role: String,
    pub shift_type: ShiftType,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ShiftPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub staff_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_time: Option<NaiveTime>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_time: Option<NaiveTime>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shift_type: Option<ShiftType>,
    #[serde(with = "double_option", skip_serializing_if = "Option::is_none")]
    pub notes: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expected_version: Option<u64>,
}

impl Patch<StaffShift> for ShiftPatch {
    fn expected_version(&self) -> Option<u64> {
        self.expected_version
    }

    fn apply_to(&self, s: &mut StaffShift) {
        set_if(&mut s.staff_id, &self.staff_id);
        set_if(&mut s.date, &self.date);
        set_if(&mut s.start_time, &self.start_time);
        set_if(&mut s.end_time, &self.end_time);
        set_if(&mut s.role, &self.role);
        set_if(&mut s.shift_type, &self.shift_type);
        set_if(&mut s.notes, &self.notes);
    }
}
