//! Medical sub-record: medications, conditions, vitals, allergies.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::{impl_item, Change, ChangeError, SubRecord, SubRecordKind};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Medication {
    pub id: String,
    pub name: String,
    pub dosage: String,
    pub frequency: String,
    pub prescriber: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub notes: Option<String>,
}

impl_item!(Medication, "medications");

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConditionStatus {
    Active,
    Managed,
    Resolved,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Condition {
    pub id: String,
    pub name: String,
    pub diagnosed_date: Option<NaiveDate>,
    pub status: ConditionStatus,
    pub notes: Option<String>,
}

impl_item!(Condition, "conditions");

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VitalSigns {
    pub id: String,
    pub recorded_at: DateTime<Utc>,
    /// e.g. "120/80"
    pub blood_pressure: Option<String>,
    pub heart_rate: Option<u16>,
    pub temperature_f: Option<f32>,
    pub weight_lbs: Option<f32>,
}

impl_item!(VitalSigns, "vitals");

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MedicalRecord {
    pub client_id: String,
    #[serde(default)]
    pub medications: Vec<Medication>,
    #[serde(default)]
    pub conditions: Vec<Condition>,
    #[serde(default)]
    pub vitals: Vec<VitalSigns>,
    #[serde(default)]
    pub allergies: Vec<String>,
}

impl MedicalRecord {
    /// Medications with no end date, or ending on/after `today`.
    pub fn current_medications(&self, today: NaiveDate) -> impl Iterator<Item = &Medication> {
        self.medications
            .iter()
            .filter(move |m| m.end_date.map_or(true, |end| end >= today))
    }

    pub fn latest_vitals(&self) -> Option<&VitalSigns> {
        self.vitals.iter().max_by_key(|v| v.recorded_at)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "collection", content = "change", rename_all = "snake_case")]
pub enum MedicalChange {
    Medication(Change<Medication>),
    Condition(Change<Condition>),
    Vitals(Change<VitalSigns>),
    SetAllergies(Vec<String>),
}

impl SubRecord for MedicalRecord {
    type Change = MedicalChange;

    const KIND: SubRecordKind = SubRecordKind::Medical;

    fn empty(client_id: &str) -> Self {
        Self {
            client_id: client_id.to_string(),
            medications: Vec::new(),
            conditions: Vec::new(),
            vitals: Vec::new(),
            allergies: Vec::new(),
        }
    }

    fn mock(client_id: &str) -> Self {
        crate::store::seed::mock_medical(client_id)
    }

    fn apply(&mut self, change: &MedicalChange) -> Result<(), ChangeError> {
        match change {
            MedicalChange::Medication(c) => c.apply(&mut self.medications),
            MedicalChange::Condition(c) => c.apply(&mut self.conditions),
            MedicalChange::Vitals(c) => c.apply(&mut self.vitals),
            MedicalChange::SetAllergies(allergies) => {
                self.allergies = allergies.clone();
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn medication(id: &str, end: Option<NaiveDate>) -> Medication {
        Medication {
            id: id.into(),
            name: "Naltrexone".into(),
            dosage: "50mg".into(),
            frequency: "daily".into(),
            prescriber: None,
            start_date: None,
            end_date: end,
            notes: None,
        }
    }

    #[test]
    fn test_current_medications_excludes_ended() {
        let today = NaiveDate::from_ymd_opt(2024, 8, 1).unwrap();
        let mut record = MedicalRecord::empty("client-1");
        record.medications = vec![
            medication("m1", None),
            medication("m2", NaiveDate::from_ymd_opt(2024, 7, 1)),
            medication("m3", Some(today)),
        ];
        let ids: Vec<&str> = record
            .current_medications(today)
            .map(|m| m.id.as_str())
            .collect();
        assert_eq!(ids, vec!["m1", "m3"]);
    }

    #[test]
    fn test_change_json_shape() {
        let change = MedicalChange::Medication(Change::Remove("m1".into()));
        let json = serde_json::to_value(&change).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "collection": "medication",
                "change": {"op": "remove", "item": "m1"}
            })
        );
        let back: MedicalChange = serde_json::from_value(json).unwrap();
        assert_eq!(back, change);
    }

    #[test]
    fn test_apply_set_allergies() {
        let mut record = MedicalRecord::empty("client-1");
        record
            .apply(&MedicalChange::SetAllergies(vec!["Penicillin".into()]))
            .unwrap();
        assert_eq!(record.allergies, vec!["Penicillin".to_string()]);
    }
}
