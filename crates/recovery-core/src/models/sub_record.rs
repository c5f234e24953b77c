//! Per-client sub-records (medical, legal, insurance) and item-level changes.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Which sub-record a document holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubRecordKind {
    Medical,
    Legal,
    Insurance,
}

impl SubRecordKind {
    pub const ALL: [SubRecordKind; 3] = [Self::Medical, Self::Legal, Self::Insurance];

    /// Backing table name.
    pub fn table(self) -> &'static str {
        match self {
            Self::Medical => "medical_info",
            Self::Legal => "legal_info",
            Self::Insurance => "insurance_info",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Medical => "medical",
            Self::Legal => "legal",
            Self::Insurance => "insurance",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.as_str() == value)
    }
}

/// An item change could not be applied.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ChangeError {
    #[error("{collection} item {id} already exists")]
    Duplicate { collection: &'static str, id: String },

    #[error("{collection} item {id} not found")]
    Missing { collection: &'static str, id: String },
}

/// An item in a sub-record collection.
pub trait Item: Clone {
    const COLLECTION: &'static str;

    fn id(&self) -> &str;
}

/// Add, replace or remove one item of a collection.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "op", content = "item", rename_all = "lowercase")]
pub enum Change<T> {
    Add(T),
    Update(T),
    Remove(String),
}

impl<T: Item> Change<T> {
    /// Apply to `items`, keeping insertion order.
    pub fn apply(&self, items: &mut Vec<T>) -> Result<(), ChangeError> {
        match self {
            Change::Add(item) => {
                if items.iter().any(|i| i.id() == item.id()) {
                    return Err(ChangeError::Duplicate {
                        collection: T::COLLECTION,
                        id: item.id().to_string(),
                    });
                }
                items.push(item.clone());
            }
            Change::Update(item) => {
                let slot = items
                    .iter_mut()
                    .find(|i| i.id() == item.id())
                    .ok_or_else(|| missing::<T>(item.id()))?;
                *slot = item.clone();
            }
            Change::Remove(id) => {
                let before = items.len();
                items.retain(|i| i.id() != id);
                if items.len() == before {
                    return Err(missing::<T>(id));
                }
            }
        }
        Ok(())
    }
}

fn missing<T: Item>(id: &str) -> ChangeError {
    ChangeError::Missing {
        collection: T::COLLECTION,
        id: id.to_string(),
    }
}

/// A per-client document stored as one versioned JSON value.
pub trait SubRecord: Serialize + DeserializeOwned + Clone + PartialEq {
    type Change: Clone + Serialize + DeserializeOwned;

    const KIND: SubRecordKind;

    /// Empty record for a client that has none yet.
    fn empty(client_id: &str) -> Self;

    /// Predefined snapshot shown when the backing table is unavailable.
    fn mock(client_id: &str) -> Self;

    fn apply(&mut self, change: &Self::Change) -> Result<(), ChangeError>;
}

macro_rules! impl_item {
    ($ty:ty, $collection:literal) => {
        impl $crate::models::Item for $ty {
            const COLLECTION: &'static str = $collection;

            fn id(&self) -> &str {
                &self.id
            }
        }
    };
}

pub(crate) use impl_item;

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Thing {
        id: String,
        label: &'static str,
    }

    impl_item!(Thing, "things");

    fn thing(id: &str, label: &'static str) -> Thing {
        Thing {
            id: id.into(),
            label,
        }
    }

    #[test]
    fn test_add_update_remove() {
        let mut items = vec![thing("a", "one")];

        Change::Add(thing("b", "two")).apply(&mut items).unwrap();
        Change::Update(thing("a", "uno")).apply(&mut items).unwrap();
        Change::Remove("b".into()).apply(&mut items).unwrap();

        assert_eq!(items, vec![thing("a", "uno")]);
    }

    #[test]
    fn test_conflicting_changes_are_rejected() {
        let mut items = vec![thing("a", "one")];

        let dup = Change::Add(thing("a", "again")).apply(&mut items);
        assert!(matches!(dup, Err(ChangeError::Duplicate { .. })));

        let gone = Change::<Thing>::Remove("zzz".into()).apply(&mut items);
        assert_eq!(
            gone,
            Err(ChangeError::Missing {
                collection: "things",
                id: "zzz".into()
            })
        );
    }

    #[test]
    fn test_kind_tables() {
        assert_eq!(SubRecordKind::Medical.table(), "medical_info");
        assert_eq!(SubRecordKind::parse("legal"), Some(SubRecordKind::Legal));
        assert_eq!(SubRecordKind::parse("dental"), None);
    }
}
