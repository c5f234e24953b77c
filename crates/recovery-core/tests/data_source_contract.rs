//! The data-access contract, exercised against every local backend.

use chrono::{Duration, NaiveDate, Utc};
use recovery_core::db::SqliteDataSource;
use recovery_core::forms::AlumniEditForm;
use recovery_core::models::{
    AlertPatch, AlertPriority, AlertStatus, AlertType, AlumniStatus, ClientPatch, ClientStatus,
    NewAlert, NewClient, NewShift, ShiftPatch, ShiftType,
};
use recovery_core::store::{
    graduate_client, reactivate_alert, resolve_alert, snooze_alert, DataSource,
    InMemoryDataSource, StoreError,
};

fn backends() -> Vec<(&'static str, Box<dyn DataSource>)> {
    let sqlite = SqliteDataSource::open_in_memory().unwrap();
    assert!(sqlite.seed_mock_data().unwrap());
    vec![
        ("memory", Box::new(InMemoryDataSource::seeded())),
        ("sqlite", Box::new(sqlite)),
    ]
}

fn new_client() -> NewClient {
    let mut data = NewClient::new("Dana", "Whitfield");
    data.email = Some("dana@example.org".into());
    data.status = ClientStatus::Active;
    data.admission_date = NaiveDate::from_ymd_opt(2024, 4, 2);
    data
}

#[test]
fn test_create_then_get_returns_submitted_data() {
    for (name, source) in backends() {
        let created = source.create_client(new_client()).unwrap();
        assert_eq!(created.version, 1, "{}", name);
        assert!(!created.id.is_empty());

        let fetched = source.get_client_by_id(&created.id).unwrap().unwrap();
        assert_eq!(fetched.first_name, "Dana", "{}", name);
        assert_eq!(fetched.email.as_deref(), Some("dana@example.org"));
        assert_eq!(fetched.admission_date, NaiveDate::from_ymd_opt(2024, 4, 2));
        assert_eq!(fetched.created_at, created.created_at, "{}", name);
    }
}

#[test]
fn test_update_changes_only_patched_fields() {
    for (name, source) in backends() {
        let before = source.get_client_by_id("client-1").unwrap().unwrap();
        let patch = ClientPatch {
            phone: Some(Some("555-0142".into())),
            ..Default::default()
        };
        let after = source.update_client("client-1", &patch).unwrap().unwrap();

        assert_eq!(after.phone.as_deref(), Some("555-0142"), "{}", name);
        assert_eq!(after.first_name, before.first_name);
        assert_eq!(after.email, before.email);
        assert_eq!(after.status, before.status);
        assert_eq!(after.version, before.version + 1, "{}", name);
        assert!(after.updated_at > before.updated_at, "{}", name);
        assert_eq!(source.get_client_by_id("client-1").unwrap().unwrap(), after);
    }
}

#[test]
fn test_stale_version_is_rejected_without_writing() {
    for (name, source) in backends() {
        let shift = source.get_shift_by_id("shift-1").unwrap().unwrap();
        let first = ShiftPatch {
            role: Some("Lead Counselor".into()),
            expected_version: Some(shift.version),
            ..Default::default()
        };
        source.update_shift("shift-1", &first).unwrap().unwrap();

        let stale = ShiftPatch {
            notes: Some(Some("covering".into())),
            expected_version: Some(shift.version),
            ..Default::default()
        };
        let err = source.update_shift("shift-1", &stale).unwrap_err();
        assert!(err.is_conflict(), "{}: {:?}", name, err);

        let stored = source.get_shift_by_id("shift-1").unwrap().unwrap();
        assert_eq!(stored.role, "Lead Counselor");
        assert_eq!(stored.notes, shift.notes, "{}", name);
    }
}

#[test]
fn test_absent_records() {
    for (name, source) in backends() {
        assert!(source.get_alert_by_id("missing").unwrap().is_none(), "{}", name);
        let patch = AlertPatch {
            title: Some("x".into()),
            ..Default::default()
        };
        assert!(source.update_alert("missing", &patch).unwrap().is_none());
        assert!(!source.delete_alert("missing").unwrap(), "{}", name);
        assert!(snooze_alert(source.as_ref(), "missing", 2).unwrap().is_none());
    }
}

#[test]
fn test_alert_lifecycle() {
    for (name, source) in backends() {
        let created = source
            .create_alert(NewAlert {
                client_id: Some("client-2".into()),
                title: "Insurance renewal".into(),
                description: None,
                alert_type: AlertType::Insurance,
                priority: AlertPriority::Medium,
                due_date: None,
                assigned_to: None,
            })
            .unwrap();

        let before = Utc::now();
        let snoozed = snooze_alert(source.as_ref(), &created.id, 3).unwrap().unwrap();
        let after = Utc::now();
        let until = snoozed.snooze_until.unwrap();
        assert_eq!(snoozed.status, AlertStatus::Snoozed, "{}", name);
        assert!(until >= before + Duration::days(3) - Duration::seconds(1));
        assert!(until <= after + Duration::days(3) + Duration::seconds(1));

        let active = reactivate_alert(source.as_ref(), &created.id).unwrap().unwrap();
        assert_eq!(active.status, AlertStatus::Active);
        assert_eq!(active.snooze_until, None, "{}", name);

        let resolved = resolve_alert(source.as_ref(), &created.id, "user-2").unwrap().unwrap();
        assert_eq!(resolved.status, AlertStatus::Resolved);
        assert_eq!(resolved.resolved_by.as_deref(), Some("user-2"));
        assert!(resolved.resolved_at.is_some(), "{}", name);

        let err = snooze_alert(source.as_ref(), &created.id, 1).unwrap_err();
        assert!(matches!(err, StoreError::InvalidTransition(_)), "{}", name);

        assert!(source.delete_alert(&created.id).unwrap());
        assert!(source.get_alert_by_id(&created.id).unwrap().is_none());
    }
}

#[test]
fn test_lost_contact_with_unknown_sobriety_days() {
    for (name, source) in backends() {
        let alumni = source.get_alumni_by_id("alumni-1").unwrap().unwrap();
        assert_eq!(alumni.sobriety_days, Some(210));

        let form = AlumniEditForm {
            status: "Lost Contact".into(),
            employment_status: alumni.employment_status.as_str().into(),
            sobriety_status: alumni.sobriety_status.as_str().into(),
            sobriety_days: String::new(),
            note: "No answer on three attempts".into(),
            ..Default::default()
        };
        let patch = form.validate(alumni.version).unwrap();
        source.update_alumni("alumni-1", &patch).unwrap().unwrap();

        let stored = source.get_alumni_by_id("alumni-1").unwrap().unwrap();
        assert_eq!(stored.status, AlumniStatus::LostContact, "{}", name);
        assert_eq!(stored.sobriety_days, None, "{}", name);
        assert!(stored
            .notes
            .iter()
            .any(|n| n.content == "No answer on three attempts"));
        assert_eq!(stored.notes.len(), alumni.notes.len() + 1, "{}", name);
    }
}

#[test]
fn test_graduation_creates_one_alumni_record() {
    for (name, source) in backends() {
        let date = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
        let alumni = graduate_client(source.as_ref(), "client-2", date)
            .unwrap()
            .unwrap();
        assert_eq!(alumni.client_id, "client-2");

        let client = source.get_client_by_id("client-2").unwrap().unwrap();
        assert_eq!(client.status, ClientStatus::Graduated, "{}", name);

        let again = graduate_client(source.as_ref(), "client-2", date).unwrap_err();
        assert!(matches!(again, StoreError::Duplicate { .. }), "{}", name);
        assert!(graduate_client(source.as_ref(), "nobody", date).unwrap().is_none());
    }
}

#[test]
fn test_delete_client_orphans_alerts() {
    for (name, source) in backends() {
        let open: Vec<_> = source
            .get_alerts()
            .unwrap()
            .into_iter()
            .filter(|a| a.client_id.as_deref() == Some("client-5"))
            .collect();
        assert!(!open.is_empty(), "{}", name);

        assert!(source.delete_client("client-5").unwrap());
        assert!(source.get_client_by_id("client-5").unwrap().is_none());
        for alert in open {
            let stored = source.get_alert_by_id(&alert.id).unwrap().unwrap();
            assert_eq!(stored.client_id, None, "{}", name);
            assert_eq!(stored.version, alert.version + 1);
        }
    }
}

#[test]
fn test_shift_create_and_delete() {
    for (name, source) in backends() {
        let before = source.get_shifts().unwrap().len();
        let shift = source
            .create_shift(NewShift {
                staff_id: "user-4".into(),
                date: NaiveDate::from_ymd_opt(2024, 6, 3).unwrap(),
                start_time: chrono::NaiveTime::from_hms_opt(23, 0, 0).unwrap(),
                end_time: chrono::NaiveTime::from_hms_opt(7, 0, 0).unwrap(),
                role: "Night Monitor".into(),
                shift_type: ShiftType::Night,
                notes: None,
            })
            .unwrap();
        assert_eq!(source.get_shifts().unwrap().len(), before + 1, "{}", name);
        assert!(source.delete_shift(&shift.id).unwrap());
        assert_eq!(source.get_shifts().unwrap().len(), before, "{}", name);
    }
}
