//! Dashboard aggregates.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{Alert, AlertPriority, AlertStatus, Alumni, Client};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClientStats {
    pub total: usize,
    pub by_status: BTreeMap<String, usize>,
    /// Clients without a program are not counted here.
    pub by_program: BTreeMap<String, usize>,
}

impl ClientStats {
    pub fn compute(clients: &[Client]) -> Self {
        let mut stats = Self {
            total: clients.len(),
            ..Default::default()
        };
        for client in clients {
            *stats
                .by_status
                .entry(client.status.as_str().to_string())
                .or_default() += 1;
            if let Some(program) = client.program_type {
                *stats
                    .by_program
                    .entry(program.as_str().to_string())
                    .or_default() += 1;
            }
        }
        stats
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AlertStats {
    pub total: usize,
    pub active: usize,
    pub snoozed: usize,
    pub resolved: usize,
    pub overdue: usize,
    /// Unresolved urgent alerts.
    pub urgent: usize,
}

impl AlertStats {
    /// Counts as of `now`; expired snoozes count as active.
    pub fn compute(alerts: &[Alert], now: DateTime<Utc>) -> Self {
        let today = now.date_naive();
        let mut stats = Self {
            total: alerts.len(),
            ..Default::default()
        };
        for alert in alerts {
            match alert.effective_status(now) {
                AlertStatus::Active => stats.active += 1,
                AlertStatus::Snoozed => stats.snoozed += 1,
                AlertStatus::Resolved => stats.resolved += 1,
            }
            if alert.is_overdue(today) {
                stats.overdue += 1;
            }
            if alert.priority == AlertPriority::Urgent && alert.status != AlertStatus::Resolved {
                stats.urgent += 1;
            }
        }
        stats
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AlumniStats {
    pub total: usize,
    pub by_status: BTreeMap<String, usize>,
    pub by_employment: BTreeMap<String, usize>,
    pub by_sobriety: BTreeMap<String, usize>,
    /// Mean over alumni with a known count.
    pub average_sobriety_days: Option<f64>,
}

impl AlumniStats {
    pub fn compute(alumni: &[Alumni]) -> Self {
        let mut stats = Self {
            total: alumni.len(),
            ..Default::default()
        };
        let mut known_days = Vec::new();
        for record in alumni {
            *stats
                .by_status
                .entry(record.status.as_str().to_string())
                .or_default() += 1;
            *stats
                .by_employment
                .entry(record.employment_status.as_str().to_string())
                .or_default() += 1;
            *stats
                .by_sobriety
                .entry(record.sobriety_status.as_str().to_string())
                .or_default() += 1;
            if let Some(days) = record.sobriety_days {
                known_days.push(f64::from(days));
            }
        }
        if !known_days.is_empty() {
            stats.average_sobriety_days =
                Some(known_days.iter().sum::<f64>() / known_days.len() as f64);
        }
        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{NewAlert, AlertType, SobrietyStatus};
    use crate::store::seed;
    use chrono::Duration;

    #[test]
    fn test_client_stats_from_seed() {
        let clients = seed::clients();
        let stats = ClientStats::compute(&clients);
        assert_eq!(stats.total, clients.len());
        assert_eq!(stats.by_status.values().sum::<usize>(), clients.len());
        assert_eq!(stats.by_status.get("Graduated"), Some(&1));
        assert_eq!(stats.by_status.get("On Leave"), Some(&1));
    }

    #[test]
    fn test_alert_stats() {
        let now = Utc::now();
        let new = |priority, due_days_ago: Option<i64>| {
            Alert::from_new(NewAlert {
                client_id: None,
                title: "t".into(),
                description: None,
                alert_type: AlertType::Custom,
                priority,
                due_date: due_days_ago.map(|d| (now - Duration::days(d)).date_naive()),
                assigned_to: None,
            })
        };

        let overdue_urgent = new(AlertPriority::Urgent, Some(2));
        let mut snoozed = new(AlertPriority::Low, None);
        snoozed.snooze(3, now).unwrap();
        let mut resolved = new(AlertPriority::Urgent, Some(5));
        resolved.resolve("user-1", now).unwrap();

        let stats = AlertStats::compute(&[overdue_urgent, snoozed, resolved], now);
        assert_eq!(
            stats,
            AlertStats {
                total: 3,
                active: 1,
                snoozed: 1,
                resolved: 1,
                overdue: 1,
                urgent: 1,
            }
        );
    }

    #[test]
    fn test_alumni_average_ignores_unknown_days() {
        let mut alumni = seed::alumni();
        let mut second = alumni[0].clone();
        second.id = "alumni-x".into();
        second.sobriety_days = None;
        second.sobriety_status = SobrietyStatus::Unknown;
        alumni[0].sobriety_days = Some(100);
        alumni.push(second);

        let stats = AlumniStats::compute(&alumni);
        assert_eq!(stats.total, 2);
        assert_eq!(stats.average_sobriety_days, Some(100.0));
        assert_eq!(stats.by_sobriety.get("unknown"), Some(&1));
    }
}
