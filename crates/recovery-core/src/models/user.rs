//! Staff directory models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Admin,
    Counselor,
    Medical,
    Staff,
    Manager,
}

impl UserRole {
    pub const ALL: [UserRole; 5] = [
        Self::Admin,
        Self::Counselor,
        Self::Medical,
        Self::Staff,
        Self::Manager,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Counselor => "counselor",
            Self::Medical => "medical",
            Self::Staff => "staff",
            Self::Manager => "manager",
        }
    }

    pub fn from_db_value(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|r| r.as_str() == value)
    }
}

/// A staff member. Read-only from the data-access layer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct User {
    pub id: String,
    pub email: String,
    pub full_name: String,
    pub role: UserRole,
    pub created_at: DateTime<Utc>,
}
