//! Sub-record editors against a file-backed SQLite database shared by two
//! connections, the way two staff members' sessions would see it.

use chrono::NaiveDate;
use recovery_core::db::{Database, SqliteDataSource};
use recovery_core::editor::{InsuranceEditor, LegalEditor};
use recovery_core::models::{
    Change, CourtDate, InsuranceRecord, LegalChange, LegalStatus, SubRecord,
};
use tempfile::TempDir;

fn shared_database() -> (TempDir, SqliteDataSource, SqliteDataSource) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("recovery.db");
    let first = SqliteDataSource::open(&path).unwrap();
    first.seed_mock_data().unwrap();
    let second = SqliteDataSource::open(&path).unwrap();
    (dir, first, second)
}

fn court_date(id: &str, day: u32) -> CourtDate {
    CourtDate {
        id: id.to_string(),
        date: NaiveDate::from_ymd_opt(2024, 7, day).unwrap(),
        court: "County Drug Court".to_string(),
        purpose: "Review".to_string(),
        outcome: None,
    }
}

#[test]
fn test_edits_from_two_sessions_merge() {
    let (_dir, alice, bob) = shared_database();

    let mut first = LegalEditor::load(&alice, "client-2").unwrap();
    let mut second = LegalEditor::load(&bob, "client-2").unwrap();

    first
        .stage(LegalChange::CourtDate(Change::Add(court_date("court-a", 3))))
        .unwrap();
    second
        .stage(LegalChange::SetStatus(LegalStatus::DrugCourt))
        .unwrap();

    first.save(&alice).unwrap();
    second.save(&bob).unwrap();

    let reloaded = LegalEditor::load(&alice, "client-2").unwrap();
    assert_eq!(reloaded.record().status, LegalStatus::DrugCourt);
    assert_eq!(reloaded.record().court_dates, vec![court_date("court-a", 3)]);
    assert_eq!(reloaded.version(), second.version());
}

#[test]
fn test_conflicting_item_edit_is_rejected() {
    let (_dir, alice, bob) = shared_database();

    let mut setup = LegalEditor::load(&alice, "client-1").unwrap();
    setup
        .stage(LegalChange::CourtDate(Change::Add(court_date("court-b", 9))))
        .unwrap();
    setup.save(&alice).unwrap();

    let mut remover = LegalEditor::load(&alice, "client-1").unwrap();
    let mut editor = LegalEditor::load(&bob, "client-1").unwrap();
    remover
        .stage(LegalChange::CourtDate(Change::Remove("court-b".into())))
        .unwrap();
    remover.save(&alice).unwrap();

    let mut rescheduled = court_date("court-b", 10);
    rescheduled.outcome = Some("Continued".into());
    editor
        .stage(LegalChange::CourtDate(Change::Update(rescheduled)))
        .unwrap();
    let err = editor.save(&bob).unwrap_err();
    assert!(err.is_conflict());

    let stored = LegalEditor::load(&bob, "client-1").unwrap();
    assert!(stored.record().court_dates.is_empty());
}

#[test]
fn test_missing_table_falls_back_to_mock() {
    let db = Database::open_in_memory().unwrap();
    db.conn().execute_batch("DROP TABLE insurance_info").unwrap();
    let source = SqliteDataSource::from_database(db);

    let mut editor = InsuranceEditor::load(&source, "client-3").unwrap();
    assert!(editor.using_mock_data());
    assert_eq!(editor.record(), &InsuranceRecord::mock("client-3"));

    // local-only save does not touch the missing table
    let before = editor.record().clone();
    editor.save(&source).unwrap();
    assert_eq!(editor.record(), &before);
    assert!(!editor.is_dirty());
}
