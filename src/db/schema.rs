//! SQL DDL for the tracker store (SQLite).

/// Tables:
/// - `users`: `username` and `email` UNIQUE
/// - `requirements`, `test_cases`: enum columns CHECK-constrained to their labels;
///   `created_by` is a plain user id so a missing creator never blocks reads
/// - `requirement_test_mapping`: UNIQUE `(requirement_id, test_case_id)`,
///   both sides `ON DELETE CASCADE`
///
/// Timestamps are RFC 3339 TEXT written by the application.
pub const SQLITE_INIT: &str = r#"
CREATE TABLE IF NOT EXISTS users (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    username TEXT NOT NULL UNIQUE,
    password TEXT NOT NULL,
    email TEXT NOT NULL UNIQUE,
    created_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS requirements (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    title TEXT NOT NULL,
    description TEXT NULL,
    priority TEXT NOT NULL DEFAULT 'Medium'
        CHECK (priority IN ('Low', 'Medium', 'High', 'Critical')),
    status TEXT NOT NULL DEFAULT 'Draft'
        CHECK (status IN ('Draft', 'Active', 'Completed', 'Deprecated')),
    created_by INTEGER NULL,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS test_cases (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    title TEXT NOT NULL,
    description TEXT NULL,
    steps TEXT NULL,
    expected_result TEXT NULL,
    status TEXT NOT NULL DEFAULT 'Draft'
        CHECK (status IN ('Draft', 'Active', 'Passed', 'Failed', 'Blocked')),
    created_by INTEGER NULL,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS requirement_test_mapping (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    requirement_id INTEGER NOT NULL REFERENCES requirements(id) ON DELETE CASCADE,
    test_case_id INTEGER NOT NULL REFERENCES test_cases(id) ON DELETE CASCADE,
    created_at TEXT NOT NULL,
    UNIQUE (requirement_id, test_case_id)
);

CREATE INDEX IF NOT EXISTS idx_mapping_test_case ON requirement_test_mapping(test_case_id)
"#;
