//! Domain models for the recovery-center system.

mod alert;
mod alumni;
mod client;
mod insurance;
mod legal;
mod medical;
mod note;
mod shift;
mod sub_record;
mod user;

pub use alert::*;
pub use alumni::*;
pub use client::*;
pub use insurance::*;
pub use legal::*;
pub use medical::*;
pub use note::*;
pub use shift::*;
pub use sub_record::*;
pub use user::*;

use chrono::{DateTime, Duration, Utc};

/// A top-level record with an immutable id and an optimistic-concurrency version.
pub trait Record: Clone {
    /// Entity name used in errors and logs.
    const ENTITY: &'static str;

    fn id(&self) -> &str;
    fn version(&self) -> u64;
    fn updated_at(&self) -> DateTime<Utc>;

    /// Bump the version and advance `updated_at`.
    fn touch(&mut self);
}

/// A partial update for a record of type `T`.
///
/// Only fields set on the patch are written; everything else is left as is.
pub trait Patch<T> {
    /// Version the caller last saw, if it wants a concurrency check.
    fn expected_version(&self) -> Option<u64>;

    /// Write the patched fields into `target`.
    fn apply_to(&self, target: &mut T);
}

/// Generate a new record id.
pub fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// Next `updated_at` value: now, or one microsecond past `previous` when the
/// clock has not moved.
pub fn advance_timestamp(previous: DateTime<Utc>) -> DateTime<Utc> {
    let now = Utc::now();
    if now > previous {
        now
    } else {
        previous + Duration::microseconds(1)
    }
}

/// Set `field` from a patch value when present.
pub(crate) fn set_if<T: Clone>(field: &mut T, value: &Option<T>) {
    if let Some(v) = value {
        *field = v.clone();
    }
}

/// Serde helper for `Option<Option<T>>` patch fields: a missing key stays
/// `None`, an explicit `null` becomes `Some(None)`.
pub(crate) mod double_option {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<T, S>(value: &Option<Option<T>>, serializer: S) -> Result<S::Ok, S::Error>
    where
        T: Serialize,
        S: Serializer,
    {
        match value {
            Some(inner) => inner.serialize(serializer),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
    where
        T: Deserialize<'de>,
        D: Deserializer<'de>,
    {
        Option::<T>::deserialize(deserializer).map(Some)
    }
}

macro_rules! impl_record {
    ($ty:ty, $entity:literal) => {
        impl $crate::models::Record for $ty {
            const ENTITY: &'static str = $entity;

            fn id(&self) -> &str {
                &self.id
            }

            fn version(&self) -> u64 {
                self.version
            }

            fn updated_at(&self) -> chrono::DateTime<chrono::Utc> {
                self.updated_at
            }

            fn touch(&mut self) {
                self.version += 1;
                self.updated_at = $crate::models::advance_timestamp(self.updated_at);
            }
        }
    };
}

pub(crate) use impl_record;
