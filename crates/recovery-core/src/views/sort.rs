//! Sort orders for client and alert lists.

use std::cmp::{Ordering, Reverse};

use serde::{Deserialize, Serialize};

use crate::models::{Alert, Client};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClientSort {
    #[default]
    Name,
    /// Most recent admission first; clients without one last.
    AdmissionDate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertSort {
    /// Earliest due first; undated alerts last.
    #[default]
    DueDate,
    /// Most urgent first, then by due date.
    Priority,
}

/// `None` sorts after every `Some`.
fn none_last<T: Ord>(a: &Option<T>, b: &Option<T>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.cmp(b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

fn by_name(a: &Client, b: &Client) -> Ordering {
    a.last_name
        .to_lowercase()
        .cmp(&b.last_name.to_lowercase())
        .then_with(|| a.first_name.to_lowercase().cmp(&b.first_name.to_lowercase()))
}

pub fn sort_clients(clients: &mut [Client], order: ClientSort) {
    match order {
        ClientSort::Name => clients.sort_by(by_name),
        ClientSort::AdmissionDate => clients.sort_by(|a, b| {
            none_last(&a.admission_date.map(Reverse), &b.admission_date.map(Reverse))
                .then_with(|| by_name(a, b))
        }),
    }
}

pub fn sort_alerts(alerts: &mut [Alert], order: AlertSort) {
    match order {
        AlertSort::DueDate => alerts.sort_by(|a, b| {
            none_last(&a.due_date, &b.due_date).then_with(|| b.priority.cmp(&a.priority))
        }),
        AlertSort::Priority => alerts.sort_by(|a, b| {
            b.priority
                .cmp(&a.priority)
                .then_with(|| none_last(&a.due_date, &b.due_date))
        }),
    }
}
