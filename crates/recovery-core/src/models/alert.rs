//! Alert models and lifecycle transitions.
//!
//! ```text
//! active ──snooze(days)──▶ snoozed ──reactivate──▶ active
//!   │                        │
//!   └──────resolve───────────┴──────▶ resolved ──reactivate──▶ active
//! ```

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::{double_option, impl_record, set_if, Patch};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertType {
    Medication,
    Appointment,
    Documentation,
    Legal,
    Insurance,
    Custom,
}

impl AlertType {
    pub const ALL: [AlertType; 6] = [
        Self::Medication,
        Self::Appointment,
        Self::Documentation,
        Self::Legal,
        Self::Insurance,
        Self::Custom,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Medication => "medication",
            Self::Appointment => "appointment",
            Self::Documentation => "documentation",
            Self::Legal => "legal",
            Self::Insurance => "insurance",
            Self::Custom => "custom",
        }
    }

    pub fn from_db_value(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.as_str() == value)
    }
}

/// Alert priority, ordered from least to most pressing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertPriority {
    Low,
    Medium,
    High,
    Urgent,
}

impl AlertPriority {
    pub const ALL: [AlertPriority; 4] = [Self::Low, Self::Medium, Self::High, Self::Urgent];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Urgent => "urgent",
        }
    }

    pub fn from_db_value(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.as_str() == value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertStatus {
    Active,
    Snoozed,
    Resolved,
}

impl AlertStatus {
    pub const ALL: [AlertStatus; 3] = [Self::Active, Self::Snoozed, Self::Resolved];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Snoozed => "snoozed",
            Self::Resolved => "resolved",
        }
    }

    pub fn from_db_value(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.as_str() == value)
    }
}

/// Rejected alert lifecycle transition.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransitionError {
    #[error("alert is already resolved")]
    AlreadyResolved,

    #[error("invalid snooze duration of {0} days")]
    InvalidSnooze(i64),
}

/// A time-bound reminder, optionally tied to a client.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Alert {
    pub id: String,
    pub client_id: Option<String>,
    pub title: String,
    pub description: Option<String>,
    pub alert_type: AlertType,
    pub priority: AlertPriority,
    pub status: AlertStatus,
    pub due_date: Option<NaiveDate>,
    /// Staff user id responsible for the alert
    pub assigned_to: Option<String>,
    pub snooze_until: Option<DateTime<Utc>>,
    pub resolved_by: Option<String>,
    pub resolved_at: Option<DateTime<Utc>>,
    pub version: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl_record!(Alert, "alert");

impl Alert {
    /// New alerts always start active.
    pub fn from_new(data: NewAlert) -> Self {
        let now = Utc::now();
        Self {
            id: super::new_id(),
            client_id: data.client_id,
            title: data.title,
            description: data.description,
            alert_type: data.alert_type,
            priority: data.priority,
            status: AlertStatus::Active,
            due_date: data.due_date,
            assigned_to: data.assigned_to,
            snooze_until: None,
            resolved_by: None,
            resolved_at: None,
            version: 1,
            created_at: now,
            updated_at: now,
        }
    }

    /// Mark resolved by `resolved_by` at `at`.
    pub fn resolve(&mut self, resolved_by: &str, at: DateTime<Utc>) -> Result<(), TransitionError> {
        if self.status == AlertStatus::Resolved {
            return Err(TransitionError::AlreadyResolved);
        }
        self.status = AlertStatus::Resolved;
        self.resolved_by = Some(resolved_by.to_string());
        self.resolved_at = Some(at);
        self.snooze_until = None;
        Ok(())
    }

    /// Snooze until `now + days`.
    pub fn snooze(&mut self, days: i64, now: DateTime<Utc>) -> Result<(), TransitionError> {
        if days < 1 {
            return Err(TransitionError::InvalidSnooze(days));
        }
        if self.status == AlertStatus::Resolved {
            return Err(TransitionError::AlreadyResolved);
        }
        let until = Duration::try_days(days)
            .and_then(|span| now.checked_add_signed(span))
            .ok_or(TransitionError::InvalidSnooze(days))?;
        self.status = AlertStatus::Snoozed;
        self.snooze_until = Some(until);
        Ok(())
    }

    /// Return to active, clearing snooze and resolution fields.
    pub fn reactivate(&mut self) {
        self.status = AlertStatus::Active;
        self.snooze_until = None;
        self.resolved_by = None;
        self.resolved_at = None;
    }

    /// Status as seen at `now`: a snooze that has run out counts as active.
    pub fn effective_status(&self, now: DateTime<Utc>) -> AlertStatus {
        match (self.status, self.snooze_until) {
            (AlertStatus::Snoozed, Some(until)) if until <= now => AlertStatus::Active,
            (status, _) => status,
        }
    }

    /// Unresolved and past its due date.
    pub fn is_overdue(&self, today: NaiveDate) -> bool {
        self.status != AlertStatus::Resolved && self.due_date.is_some_and(|due| due < today)
    }

    /// Patch that writes every lifecycle field of this alert.
    pub fn lifecycle_patch(&self) -> AlertPatch {
        AlertPatch {
            status: Some(self.status),
            snooze_until: Some(self.snooze_until),
            resolved_by: Some(self.resolved_by.clone()),
            resolved_at: Some(self.resolved_at),
            expected_version: Some(self.version),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewAlert {
    #[serde(default)]
    pub client_id: Option<String>,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub alert_type: AlertType,
    pub priority: AlertPriority,
    #[serde(default)]
    pub due_date: Option<NaiveDate>,
    #[serde(default)]
    pub assigned_to: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AlertPatch {
    #[serde(with = "double_option", skip_serializing_if = "Option::is_none")]
    pub client_id: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(with = "double_option", skip_serializing_if = "Option::is_none")]
    pub description: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alert_type: Option<AlertType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<AlertPriority>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<AlertStatus>,
    #[serde(with = "double_option", skip_serializing_if = "Option::is_none")]
    pub due_date: Option<Option<NaiveDate>>,
    #[serde(with = "double_option", skip_serializing_if = "Option::is_none")]
    pub assigned_to: Option<Option<String>>,
    #[serde(with = "double_option", skip_serializing_if = "Option::is_none")]
    pub snooze_until: Option<Option<DateTime<Utc>>>,
    #[serde(with = "double_option", skip_serializing_if = "Option::is_none")]
    pub resolved_by: Option<Option<String>>,
    #[serde(with = "double_option", skip_serializing_if = "Option::is_none")]
    pub resolved_at: Option<Option<DateTime<Utc>>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expected_version: Option<u64>,
}

impl Patch<Alert> for AlertPatch {
    fn expected_version(&self) -> Option<u64> {
        self.expected_version
    }

    fn apply_to(&self, a: &mut Alert) {
        set_if(&mut a.client_id, &self.client_id);
        set_if(&mut a.title, &self.title);
        set_if(&mut a.description, &self.description);
        set_if(&mut a.alert_type, &self.alert_type);
        set_if(&mut a.priority, &self.priority);
        set_if(&mut a.status, &self.status);
        set_if(&mut a.due_date, &self.due_date);
        set_if(&mut a.assigned_to, &self.assigned_to);
        set_if(&mut a.snooze_until, &self.snooze_until);
        set_if(&mut a.resolved_by, &self.resolved_by);
        set_if(&mut a.resolved_at, &self.resolved_at);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_alert() -> Alert {
        Alert::from_new(NewAlert {
            client_id: Some("client-1".into()),
            title: "Refill prescription".into(),
            description: None,
            alert_type: AlertType::Medication,
            priority: AlertPriority::High,
            due_date: NaiveDate::from_ymd_opt(2024, 5, 1),
            assigned_to: None,
        })
    }

    #[test]
    fn test_new_alert_is_active() {
        assert_eq!(make_alert().status, AlertStatus::Active);
    }

    #[test]
    fn test_snooze_then_reactivate() {
        let mut alert = make_alert();
        let now = Utc::now();
        alert.snooze(3, now).unwrap();
        assert_eq!(alert.status, AlertStatus::Snoozed);
        assert_eq!(alert.snooze_until, Some(now + Duration::days(3)));

        alert.reactivate();
        assert_eq!(alert.status, AlertStatus::Active);
        assert_eq!(alert.snooze_until, None);
    }

    #[test]
    fn test_resolve_records_resolver() {
        let mut alert = make_alert();
        let at = Utc::now();
        alert.resolve("staff-2", at).unwrap();
        assert_eq!(alert.status, AlertStatus::Resolved);
        assert_eq!(alert.resolved_by.as_deref(), Some("staff-2"));
        assert_eq!(alert.resolved_at, Some(at));

        assert_eq!(alert.resolve("staff-3", at), Err(TransitionError::AlreadyResolved));
        assert_eq!(alert.snooze(1, at), Err(TransitionError::AlreadyResolved));
    }

    #[test]
    fn test_snooze_rejects_non_positive_days() {
        let mut alert = make_alert();
        assert_eq!(alert.snooze(0, Utc::now()), Err(TransitionError::InvalidSnooze(0)));
        assert_eq!(alert.status, AlertStatus::Active);
    }

    #[test]
    fn test_snooze_rejects_out_of_range_days() {
        let mut alert = make_alert();
        for days in [10_000_000_000_000, i64::MAX, 1_000_000_000] {
            assert_eq!(
                alert.snooze(days, Utc::now()),
                Err(TransitionError::InvalidSnooze(days))
            );
        }
        assert_eq!(alert.status, AlertStatus::Active);
        assert_eq!(alert.snooze_until, None);
    }

    #[test]
    fn test_expired_snooze_is_effectively_active() {
        let mut alert = make_alert();
        let then = Utc::now() - Duration::days(10);
        alert.snooze(2, then).unwrap();
        assert_eq!(alert.effective_status(Utc::now()), AlertStatus::Active);
        assert_eq!(alert.effective_status(then), AlertStatus::Snoozed);
    }

    #[test]
    fn test_overdue() {
        let mut alert = make_alert();
        let today = NaiveDate::from_ymd_opt(2024, 5, 2).unwrap();
        assert!(alert.is_overdue(today));
        alert.resolve("staff-1", Utc::now()).unwrap();
        assert!(!alert.is_overdue(today));
    }

    #[test]
    fn test_priority_ordering() {
        assert!(AlertPriority::Urgent > AlertPriority::High);
        assert!(AlertPriority::Low < AlertPriority::Medium);
    }
}
