//! Filter predicates for the list screens.
//!
//! Every filter is a conjunction of independent criteria; an unset criterion
//! (empty search, `None`, empty set) matches everything.

use std::collections::BTreeSet;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{
    Alert, AlertPriority, AlertStatus, AlertType, Alumni, AlumniStatus, Client, ClientStatus,
    EmploymentStatus, ProgramType, StaffShift,
};

/// A predicate over list items.
pub trait Filter<T> {
    fn matches(&self, item: &T) -> bool;

    /// Reset every criterion.
    fn clear(&mut self);

    /// Matching items, in their original order.
    fn apply<'a>(&self, items: &'a [T]) -> Vec<&'a T> {
        items.iter().filter(|item| self.matches(item)).collect()
    }
}

/// Case-insensitive substring match of `query` against any of `fields`.
///
/// A blank query matches everything.
pub fn matches_search<'a, I>(query: &str, fields: I) -> bool
where
    I: IntoIterator<Item = Option<&'a str>>,
{
    let query = query.trim().to_lowercase();
    if query.is_empty() {
        return true;
    }
    fields
        .into_iter()
        .flatten()
        .any(|field| field.to_lowercase().contains(&query))
}

fn in_set<T: Ord>(set: &BTreeSet<T>, value: Option<&T>) -> bool {
    set.is_empty() || value.is_some_and(|v| set.contains(v))
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientFilter {
    pub search: String,
    /// Selected status tab; `None` is "all".
    pub status: Option<ClientStatus>,
    pub program_types: BTreeSet<ProgramType>,
}

impl Filter<Client> for ClientFilter {
    fn matches(&self, client: &Client) -> bool {
        let full_name = client.full_name();
        matches_search(
            &self.search,
            [
                Some(full_name.as_str()),
                client.email.as_deref(),
                client.phone.as_deref(),
            ],
        ) && self.status.map_or(true, |s| client.status == s)
            && in_set(&self.program_types, client.program_type.as_ref())
    }

    fn clear(&mut self) {
        *self = Self::default();
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AlumniFilter {
    pub search: String,
    pub status: Option<AlumniStatus>,
    pub employment: BTreeSet<EmploymentStatus>,
}

impl Filter<Alumni> for AlumniFilter {
    fn matches(&self, alumni: &Alumni) -> bool {
        let full_name = alumni.full_name();
        matches_search(
            &self.search,
            [
                Some(full_name.as_str()),
                alumni.email.as_deref(),
                alumni.phone.as_deref(),
                alumni.program_details.as_deref(),
            ],
        ) && self.status.map_or(true, |s| alumni.status == s)
            && in_set(&self.employment, Some(&alumni.employment_status))
    }

    fn clear(&mut self) {
        *self = Self::default();
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AlertFilter {
    pub search: String,
    pub status: Option<AlertStatus>,
    pub priorities: BTreeSet<AlertPriority>,
    pub alert_types: BTreeSet<AlertType>,
    pub client_id: Option<String>,
    /// Compare against the status in effect at this instant (an expired
    /// snooze counts as active). Stored status when unset.
    pub as_of: Option<DateTime<Utc>>,
}

impl Filter<Alert> for AlertFilter {
    fn matches(&self, alert: &Alert) -> bool {
        let status = match self.as_of {
            Some(now) => alert.effective_status(now),
            None => alert.status,
        };
        matches_search(
            &self.search,
            [Some(alert.title.as_str()), alert.description.as_deref()],
        ) && self.status.map_or(true, |s| status == s)
            && in_set(&self.priorities, Some(&alert.priority))
            && in_set(&self.alert_types, Some(&alert.alert_type))
            && self
                .client_id
                .as_deref()
                .map_or(true, |id| alert.client_id.as_deref() == Some(id))
    }

    fn clear(&mut self) {
        *self = Self::default();
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShiftFilter {
    pub staff_id: Option<String>,
    /// Case-insensitive exact role match.
    pub role: Option<String>,
    /// Inclusive bounds.
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

impl Filter<StaffShift> for ShiftFilter {
    fn matches(&self, shift: &StaffShift) -> bool {
        self.staff_id.as_deref().map_or(true, |id| shift.staff_id == id)
            && self
                .role
                .as_deref()
                .map_or(true, |role| shift.role.eq_ignore_ascii_case(role.trim()))
            && self.from.map_or(true, |from| shift.date >= from)
            && self.to.map_or(true, |to| shift.date <= to)
    }

    fn clear(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{NewAlert, NewClient};
    use crate::store::seed;

    fn alert(title: &str, status: AlertStatus, priority: AlertPriority) -> Alert {
        let mut alert = Alert::from_new(NewAlert {
            client_id: None,
            title: title.into(),
            description: None,
            alert_type: AlertType::Custom,
            priority,
            due_date: None,
            assigned_to: None,
        });
        alert.status = status;
        alert
    }

    #[test]
    fn test_alert_status_filter() {
        let alerts = vec![
            alert("one", AlertStatus::Active, AlertPriority::High),
            alert("two", AlertStatus::Resolved, AlertPriority::Low),
        ];
        let filter = AlertFilter {
            status: Some(AlertStatus::Active),
            ..Default::default()
        };
        let visible = filter.apply(&alerts);
        assert_eq!(visible.len(), 1);
        assert_eq!(visible[0].title, "one");
    }

    #[test]
    fn test_expired_snooze_counts_as_active() {
        let now = Utc::now();
        let mut snoozed = alert("later", AlertStatus::Active, AlertPriority::Medium);
        snoozed.snooze(1, now - chrono::Duration::days(3)).unwrap();

        let filter = AlertFilter {
            status: Some(AlertStatus::Active),
            as_of: Some(now),
            ..Default::default()
        };
        assert!(filter.matches(&snoozed));

        let stored = AlertFilter {
            status: Some(AlertStatus::Active),
            ..Default::default()
        };
        assert!(!stored.matches(&snoozed));
    }

    #[test]
    fn test_client_search_is_case_insensitive() {
        let mut data = NewClient::new("Maria", "Garcia");
        data.email = Some("mgarcia@example.com".into());
        let client = Client::from_new(data);

        for query in ["garc", "MARIA G", "example.com", "  "] {
            let filter = ClientFilter {
                search: query.into(),
                ..Default::default()
            };
            assert!(filter.matches(&client), "query {:?}", query);
        }
        let filter = ClientFilter {
            search: "smith".into(),
            ..Default::default()
        };
        assert!(!filter.matches(&client));
    }

    #[test]
    fn test_program_set_and_clear() {
        let clients = seed::clients();
        let mut filter = ClientFilter {
            program_types: BTreeSet::from([ProgramType::Residential]),
            ..Default::default()
        };
        let matched = filter.apply(&clients);
        assert!(matched
            .iter()
            .all(|c| c.program_type == Some(ProgramType::Residential)));

        filter.clear();
        assert_eq!(filter, ClientFilter::default());
        assert_eq!(filter.apply(&clients).len(), clients.len());
    }

    #[test]
    fn test_shift_date_range_is_inclusive() {
        let shifts = seed::shifts();
        let first = shifts[0].date;
        let filter = ShiftFilter {
            from: Some(first),
            to: Some(first),
            ..Default::default()
        };
        assert!(filter.apply(&shifts).iter().all(|s| s.date == first));
        assert!(!filter.apply(&shifts).is_empty());
    }
}
