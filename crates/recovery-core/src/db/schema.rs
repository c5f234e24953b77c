//! SQLite schema definition.

/// Complete database schema for the recovery-center core.
pub const SCHEMA: &str = r#"
-- Enable foreign keys
PRAGMA foreign_keys = ON;

-- ============================================================================
-- Staff
-- ============================================================================

CREATE TABLE IF NOT EXISTS users (
    id TEXT PRIMARY KEY,
    email TEXT NOT NULL UNIQUE,
    full_name TEXT NOT NULL,
    role TEXT NOT NULL,                          -- admin, counselor, medical, staff, manager
    created_at TEXT NOT NULL
);

-- ============================================================================
-- Clients
-- ============================================================================

CREATE TABLE IF NOT EXISTS clients (
    id TEXT PRIMARY KEY,
    first_name TEXT NOT NULL,
    last_name TEXT NOT NULL,
    date_of_birth TEXT,
    gender TEXT,
    email TEXT,
    phone TEXT,
    address TEXT,
    status TEXT NOT NULL,                        -- Active, Inactive, Pending, Discharged, Graduated, On Leave
    program_type TEXT,
    admission_date TEXT,
    discharge_date TEXT,
    assigned_counselor TEXT,
    notes TEXT,
    version INTEGER NOT NULL DEFAULT 1,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_clients_status ON clients(status);
CREATE INDEX IF NOT EXISTS idx_clients_name ON clients(last_name, first_name);

-- ============================================================================
-- Alumni (one per client)
-- ============================================================================

CREATE TABLE IF NOT EXISTS alumni (
    id TEXT PRIMARY KEY,
    client_id TEXT NOT NULL UNIQUE REFERENCES clients(id) ON DELETE CASCADE,
    first_name TEXT NOT NULL,
    last_name TEXT NOT NULL,
    email TEXT,
    phone TEXT,
    graduation_date TEXT NOT NULL,
    program_type TEXT,
    program_details TEXT,
    status TEXT NOT NULL,
    employment_status TEXT NOT NULL,
    sobriety_status TEXT NOT NULL,
    sobriety_days INTEGER,
    emergency_contact TEXT,                      -- JSON object or NULL
    last_contact_date TEXT,
    notes TEXT NOT NULL DEFAULT '[]',            -- JSON array, newest first
    version INTEGER NOT NULL DEFAULT 1,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

-- ============================================================================
-- Alerts
-- ============================================================================

CREATE TABLE IF NOT EXISTS alerts (
    id TEXT PRIMARY KEY,
    client_id TEXT REFERENCES clients(id) ON DELETE SET NULL,
    title TEXT NOT NULL,
    description TEXT,
    alert_type TEXT NOT NULL,
    priority TEXT NOT NULL,
    status TEXT NOT NULL DEFAULT 'active',       -- active, snoozed, resolved
    due_date TEXT,
    assigned_to TEXT,
    snooze_until TEXT,
    resolved_by TEXT,
    resolved_at TEXT,
    version INTEGER NOT NULL DEFAULT 1,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_alerts_status ON alerts(status);
CREATE INDEX IF NOT EXISTS idx_alerts_client ON alerts(client_id);

-- ============================================================================
-- Staff schedules
-- ============================================================================

CREATE TABLE IF NOT EXISTS staff_schedules (
    id TEXT PRIMARY KEY,
    staff_id TEXT NOT NULL,
    date TEXT NOT NULL,
    start_time TEXT NOT NULL,
    end_time TEXT NOT NULL,
    role TEXT NOT NULL,
    shift_type TEXT NOT NULL,
    notes TEXT,
    version INTEGER NOT NULL DEFAULT 1,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_schedules_date ON staff_schedules(date);

-- ============================================================================
-- Progress notes and sobriety tracking (append-only)
-- ============================================================================

CREATE TABLE IF NOT EXISTS progress_notes (
    id TEXT PRIMARY KEY,
    client_id TEXT NOT NULL REFERENCES clients(id) ON DELETE CASCADE,
    author_id TEXT NOT NULL,
    category TEXT NOT NULL,
    content TEXT NOT NULL,
    created_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_notes_client ON progress_notes(client_id);

CREATE TABLE IF NOT EXISTS sobriety_tracking (
    id TEXT PRIMARY KEY,
    client_id TEXT NOT NULL REFERENCES clients(id) ON DELETE CASCADE,
    date TEXT NOT NULL,
    status TEXT NOT NULL,                        -- sober, relapsed, unknown
    notes TEXT,
    created_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_sobriety_client ON sobriety_tracking(client_id, date);

-- ============================================================================
-- Sub-records (one versioned JSON document per client)
-- ============================================================================

CREATE TABLE IF NOT EXISTS medical_info (
    client_id TEXT PRIMARY KEY,
    data TEXT NOT NULL,
    version INTEGER NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS legal_info (
    client_id TEXT PRIMARY KEY,
    data TEXT NOT NULL,
    version INTEGER NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS insurance_info (
    client_id TEXT PRIMARY KEY,
    data TEXT NOT NULL,
    version INTEGER NOT NULL,
    updated_at TEXT NOT NULL
);
"#;
