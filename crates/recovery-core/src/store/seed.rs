//! Mock data set.
//!
//! Seeds the in-memory store and provides the sub-record snapshots shown when
//! a backing table is unavailable.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};

use crate::models::{
    Alert, AlertPriority, AlertStatus, AlertType, Alumni, AlumniNote, AlumniStatus, Client,
    ClientStatus, Condition, ConditionStatus, CourtDate, EmergencyContact, EmploymentStatus,
    Gender, InsurancePolicy, InsuranceRecord, LegalDocument, LegalNote, LegalRecord, LegalStatus,
    MedicalRecord, Medication, NoteCategory, ProgramType, ProgressNote, ShiftType,
    SobrietyCheckIn, SobrietyStatus, StaffShift, User, UserRole, Verification,
    VerificationStatus, VitalSigns,
};

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap_or_default()
}

fn at(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
    date(y, m, d).and_hms_opt(h, 0, 0).unwrap_or_default().and_utc()
}

fn time(h: u32, m: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(h, m, 0).unwrap_or_default()
}

pub fn users() -> Vec<User> {
    [
        ("user-1", "admin@recovery.example", "Morgan Hale", UserRole::Admin),
        ("user-2", "jlee@recovery.example", "Jordan Lee", UserRole::Counselor),
        ("user-3", "pnair@recovery.example", "Priya Nair", UserRole::Medical),
        ("user-4", "cwu@recovery.example", "Chris Wu", UserRole::Staff),
    ]
    .into_iter()
    .map(|(id, email, name, role)| User {
        id: id.into(),
        email: email.into(),
        full_name: name.into(),
        role,
        created_at: at(2023, 1, 2, 9),
    })
    .collect()
}

#[allow(clippy::too_many_arguments)]
fn client(
    id: &str,
    first: &str,
    last: &str,
    gender: Gender,
    status: ClientStatus,
    program: ProgramType,
    admitted: NaiveDate,
    discharged: Option<NaiveDate>,
    counselor: &str,
) -> Client {
    let created = admitted.and_hms_opt(10, 0, 0).unwrap_or_default().and_utc();
    Client {
        id: id.into(),
        first_name: first.into(),
        last_name: last.into(),
        date_of_birth: Some(date(1988, 4, 12)),
        gender: Some(gender),
        email: Some(format!("{}.{}@mail.example", first, last).to_lowercase()),
        phone: Some("555-0100".into()),
        address: None,
        status,
        program_type: Some(program),
        admission_date: Some(admitted),
        discharge_date: discharged,
        assigned_counselor: Some(counselor.into()),
        notes: None,
        version: 1,
        created_at: created,
        updated_at: created,
    }
}

pub fn clients() -> Vec<Client> {
    vec![
        client(
            "client-1",
            "John",
            "Smith",
            Gender::Male,
            ClientStatus::Active,
            ProgramType::Residential,
            date(2024, 1, 15),
            None,
            "user-2",
        ),
        client(
            "client-2",
            "Maria",
            "Garcia",
            Gender::Female,
            ClientStatus::Active,
            ProgramType::IntensiveOutpatient,
            date(2024, 2, 3),
            None,
            "user-2",
        ),
        client(
            "client-3",
            "Taylor",
            "Brooks",
            Gender::NonBinary,
            ClientStatus::Pending,
            ProgramType::Detox,
            date(2024, 3, 20),
            None,
            "user-2",
        ),
        client(
            "client-4",
            "Robert",
            "Johnson",
            Gender::Male,
            ClientStatus::Graduated,
            ProgramType::Residential,
            date(2023, 6, 1),
            Some(date(2023, 9, 1)),
            "user-2",
        ),
        client(
            "client-5",
            "Lisa",
            "Chen",
            Gender::Female,
            ClientStatus::OnLeave,
            ProgramType::SoberLiving,
            date(2023, 11, 10),
            None,
            "user-2",
        ),
    ]
}

pub fn alumni() -> Vec<Alumni> {
    let created = at(2023, 9, 1, 12);
    vec![Alumni {
        id: "alumni-1".into(),
        client_id: "client-4".into(),
        first_name: "Robert".into(),
        last_name: "Johnson".into(),
        email: Some("robert.johnson@mail.example".into()),
        phone: Some("555-0104".into()),
        graduation_date: date(2023, 9, 1),
        program_type: Some(ProgramType::Residential),
        program_details: Some("90-day residential program".into()),
        status: AlumniStatus::Active,
        employment_status: EmploymentStatus::Employed,
        sobriety_status: SobrietyStatus::Sober,
        sobriety_days: Some(210),
        emergency_contact: Some(EmergencyContact {
            name: "Karen Johnson".into(),
            relationship: Some("Sister".into()),
            phone: Some("555-0199".into()),
        }),
        last_contact_date: Some(date(2024, 3, 1)),
        notes: vec![AlumniNote {
            id: "alumni-note-1".into(),
            date: at(2024, 3, 1, 15),
            author: Some("user-2".into()),
            content: "Monthly check-in call. Started new job.".into(),
        }],
        version: 1,
        created_at: created,
        updated_at: created,
    }]
}

#[allow(clippy::too_many_arguments)]
fn alert(
    id: &str,
    client_id: Option<&str>,
    title: &str,
    alert_type: AlertType,
    priority: AlertPriority,
    status: AlertStatus,
    due: NaiveDate,
    assigned_to: &str,
) -> Alert {
    let created = at(2024, 3, 1, 8);
    Alert {
        id: id.into(),
        client_id: client_id.map(Into::into),
        title: title.into(),
        description: None,
        alert_type,
        priority,
        status,
        due_date: Some(due),
        assigned_to: Some(assigned_to.into()),
        snooze_until: None,
        resolved_by: None,
        resolved_at: None,
        version: 1,
        created_at: created,
        updated_at: created,
    }
}

pub fn alerts() -> Vec<Alert> {
    let mut resolved = alert(
        "alert-4",
        Some("client-2"),
        "Upload signed consent form",
        AlertType::Documentation,
        AlertPriority::Low,
        AlertStatus::Resolved,
        date(2024, 3, 5),
        "user-4",
    );
    resolved.resolved_by = Some("user-4".into());
    resolved.resolved_at = Some(at(2024, 3, 4, 16));

    vec![
        alert(
            "alert-1",
            Some("client-1"),
            "Medication refill due",
            AlertType::Medication,
            AlertPriority::High,
            AlertStatus::Active,
            date(2024, 3, 10),
            "user-3",
        ),
        alert(
            "alert-2",
            Some("client-2"),
            "Court appearance",
            AlertType::Legal,
            AlertPriority::Urgent,
            AlertStatus::Active,
            date(2024, 3, 15),
            "user-2",
        ),
        alert(
            "alert-3",
            Some("client-5"),
            "Insurance re-verification",
            AlertType::Insurance,
            AlertPriority::Medium,
            AlertStatus::Active,
            date(2024, 4, 1),
            "user-4",
        ),
        resolved,
        alert(
            "alert-5",
            None,
            "Quarterly fire drill",
            AlertType::Custom,
            AlertPriority::Low,
            AlertStatus::Active,
            date(2024, 4, 15),
            "user-1",
        ),
    ]
}

pub fn shifts() -> Vec<StaffShift> {
    let created = at(2024, 2, 25, 9);
    [
        ("shift-1", "user-2", 4, (8, 0), (16, 0), "Counselor", ShiftType::Morning),
        ("shift-2", "user-3", 4, (16, 0), (23, 59), "Nurse", ShiftType::Evening),
        ("shift-3", "user-4", 4, (23, 0), (7, 0), "Technician", ShiftType::Night),
        ("shift-4", "user-1", 5, (9, 0), (17, 0), "Administrator", ShiftType::OnCall),
    ]
    .into_iter()
    .map(|(id, staff, day, start, end, role, shift_type)| StaffShift {
        id: id.into(),
        staff_id: staff.into(),
        date: date(2024, 3, day),
        start_time: time(start.0, start.1),
        end_time: time(end.0, end.1),
        role: role.into(),
        shift_type,
        notes: None,
        version: 1,
        created_at: created,
        updated_at: created,
    })
    .collect()
}

pub fn progress_notes() -> Vec<ProgressNote> {
    vec![
        ProgressNote {
            id: "note-1".into(),
            client_id: "client-1".into(),
            author_id: "user-2".into(),
            category: NoteCategory::Session,
            content: "Engaged well in group session; discussed relapse triggers.".into(),
            created_at: at(2024, 2, 20, 14),
        },
        ProgressNote {
            id: "note-2".into(),
            client_id: "client-1".into(),
            author_id: "user-3".into(),
            category: NoteCategory::Medical,
            content: "Vitals stable. No withdrawal symptoms reported.".into(),
            created_at: at(2024, 2, 22, 9),
        },
        ProgressNote {
            id: "note-3".into(),
            client_id: "client-2".into(),
            author_id: "user-2".into(),
            category: NoteCategory::General,
            content: "Completed intake paperwork.".into(),
            created_at: at(2024, 2, 3, 11),
        },
    ]
}

pub fn sobriety_check_ins() -> Vec<SobrietyCheckIn> {
    (1..=5)
        .map(|day| SobrietyCheckIn {
            id: format!("checkin-{}", day),
            client_id: "client-1".into(),
            date: date(2024, 3, day),
            status: SobrietyStatus::Sober,
            notes: None,
            created_at: at(2024, 3, day, 20),
        })
        .collect()
}

pub fn mock_medical(client_id: &str) -> MedicalRecord {
    MedicalRecord {
        client_id: client_id.to_string(),
        medications: vec![
            Medication {
                id: "med-1".into(),
                name: "Buprenorphine".into(),
                dosage: "8mg".into(),
                frequency: "Once daily".into(),
                prescriber: Some("Dr. Patel".into()),
                start_date: Some(date(2024, 1, 16)),
                end_date: None,
                notes: None,
            },
            Medication {
                id: "med-2".into(),
                name: "Sertraline".into(),
                dosage: "50mg".into(),
                frequency: "Once daily".into(),
                prescriber: Some("Dr. Patel".into()),
                start_date: Some(date(2024, 1, 20)),
                end_date: None,
                notes: Some("Take with food".into()),
            },
        ],
        conditions: vec![Condition {
            id: "cond-1".into(),
            name: "Generalized anxiety disorder".into(),
            diagnosed_date: Some(date(2022, 5, 1)),
            status: ConditionStatus::Managed,
            notes: None,
        }],
        vitals: vec![VitalSigns {
            id: "vitals-1".into(),
            recorded_at: at(2024, 3, 1, 9),
            blood_pressure: Some("122/80".into()),
            heart_rate: Some(72),
            temperature_f: Some(98.4),
            weight_lbs: Some(176.0),
        }],
        allergies: vec!["Penicillin".into()],
    }
}

pub fn mock_legal(client_id: &str) -> LegalRecord {
    LegalRecord {
        client_id: client_id.to_string(),
        status: LegalStatus::Probation,
        probation_officer: Some("Officer Dana Reyes".into()),
        case_number: Some("CR-2023-04417".into()),
        court_dates: vec![CourtDate {
            id: "court-1".into(),
            date: date(2024, 4, 12),
            court: "County Superior Court".into(),
            purpose: "Probation review".into(),
            outcome: None,
        }],
        documents: vec![LegalDocument {
            id: "doc-1".into(),
            title: "Probation terms".into(),
            document_type: "court_order".into(),
            uploaded_at: at(2024, 1, 17, 10),
            url: None,
        }],
        notes: vec![LegalNote {
            id: "legal-note-1".into(),
            date: at(2024, 2, 1, 13),
            author: Some("user-2".into()),
            content: "Monthly report sent to probation officer.".into(),
        }],
    }
}

pub fn mock_insurance(client_id: &str) -> InsuranceRecord {
    InsuranceRecord {
        client_id: client_id.to_string(),
        primary: Some(InsurancePolicy {
            provider: "Blue Cross".into(),
            policy_number: "BC-778812".into(),
            group_number: Some("GRP-1001".into()),
            subscriber_name: None,
            effective_date: Some(date(2024, 1, 1)),
            expiration_date: Some(date(2024, 12, 31)),
            coverage_notes: Some("Residential covered for 30 days".into()),
        }),
        secondary: None,
        verifications: vec![Verification {
            id: "verify-1".into(),
            verified_at: at(2024, 1, 15, 11),
            verified_by: Some("user-4".into()),
            status: VerificationStatus::Verified,
            notes: None,
        }],
    }
}
