//! List-screen state: filters, sorting, aggregates and reconciliation of
//! local collections after create / update / delete.

mod filters;
mod sort;
mod stats;

pub use filters::*;
pub use sort::*;
pub use stats::*;

use crate::models::Record;

/// A full collection plus the filter currently applied to it.
///
/// The visible subset is recomputed on every call, so edits to either the
/// items or the filter are reflected immediately.
#[derive(Debug, Clone)]
pub struct ListView<T, F> {
    items: Vec<T>,
    filter: F,
}

impl<T, F> ListView<T, F>
where
    T: Record,
    F: Filter<T> + Default,
{
    pub fn new(items: Vec<T>) -> Self {
        Self {
            items,
            filter: F::default(),
        }
    }

    pub fn with_filter(items: Vec<T>, filter: F) -> Self {
        Self { items, filter }
    }

    /// Replace the collection after a reload.
    pub fn replace_all(&mut self, items: Vec<T>) {
        self.items = items;
    }

    /// Insert a created record or replace an updated one, by id.
    pub fn upsert(&mut self, item: T) {
        match self.items.iter_mut().find(|i| i.id() == item.id()) {
            Some(slot) => *slot = item,
            None => self.items.push(item),
        }
    }

    /// Drop a deleted record. Returns whether it was present.
    pub fn remove(&mut self, id: &str) -> bool {
        let before = self.items.len();
        self.items.retain(|i| i.id() != id);
        self.items.len() < before
    }

    pub fn get(&self, id: &str) -> Option<&T> {
        self.items.iter().find(|i| i.id() == id)
    }

    pub fn items(&self) -> &[T] {
        &self.items
    }

    pub fn visible(&self) -> Vec<&T> {
        self.filter.apply(&self.items)
    }

    pub fn filter(&self) -> &F {
        &self.filter
    }

    pub fn filter_mut(&mut self) -> &mut F {
        &mut self.filter
    }

    pub fn set_filter(&mut self, filter: F) {
        self.filter = filter;
    }

    pub fn clear_filters(&mut self) {
        self.filter.clear();
    }
}

pub type ClientListView = ListView<crate::models::Client, ClientFilter>;
pub type AlumniListView = ListView<crate::models::Alumni, AlumniFilter>;
pub type AlertListView = ListView<crate::models::Alert, AlertFilter>;
pub type ShiftListView = ListView<crate::models::StaffShift, ShiftFilter>;
