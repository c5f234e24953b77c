//! Insurance sub-record: primary/secondary policies and verification history.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::{impl_item, Change, ChangeError, SubRecord, SubRecordKind};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InsurancePolicy {
    pub provider: String,
    pub policy_number: String,
    pub group_number: Option<String>,
    pub subscriber_name: Option<String>,
    pub effective_date: Option<NaiveDate>,
    pub expiration_date: Option<NaiveDate>,
    pub coverage_notes: Option<String>,
}

impl InsurancePolicy {
    pub fn is_expired(&self, today: NaiveDate) -> bool {
        self.expiration_date.is_some_and(|end| end < today)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VerificationStatus {
    Verified,
    Pending,
    Denied,
    Expired,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Verification {
    pub id: String,
    pub verified_at: DateTime<Utc>,
    pub verified_by: Option<String>,
    pub status: VerificationStatus,
    pub notes: Option<String>,
}

impl_item!(Verification, "verifications");

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InsuranceRecord {
    pub client_id: String,
    #[serde(default)]
    pub primary: Option<InsurancePolicy>,
    #[serde(default)]
    pub secondary: Option<InsurancePolicy>,
    #[serde(default)]
    pub verifications: Vec<Verification>,
}

impl InsuranceRecord {
    pub fn latest_verification(&self) -> Option<&Verification> {
        self.verifications.iter().max_by_key(|v| v.verified_at)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "collection", content = "change", rename_all = "snake_case")]
pub enum InsuranceChange {
    SetPrimary(Option<InsurancePolicy>),
    SetSecondary(Option<InsurancePolicy>),
    Verification(Change<Verification>),
}

impl SubRecord for InsuranceRecord {
    type Change = InsuranceChange;

    const KIND: SubRecordKind = SubRecordKind::Insurance;

    fn empty(client_id: &str) -> Self {
        Self {
            client_id: client_id.to_string(),
            primary: None,
            secondary: None,
            verifications: Vec::new(),
        }
    }

    fn mock(client_id: &str) -> Self {
        crate::store::seed::mock_insurance(client_id)
    }

    fn apply(&mut self, change: &InsuranceChange) -> Result<(), ChangeError> {
        match change {
            InsuranceChange::SetPrimary(policy) => self.primary = policy.clone(),
            InsuranceChange::SetSecondary(policy) => self.secondary = policy.clone(),
            InsuranceChange::Verification(c) => c.apply(&mut self.verifications)?,
        }
        Ok(())
    }
}
