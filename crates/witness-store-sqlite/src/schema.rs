//! SQL schema for the Witness SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS incidents (
    id                  INTEGER PRIMARY KEY AUTOINCREMENT,
    incident_id         TEXT NOT NULL UNIQUE,  -- public UUID
    fields_json         TEXT NOT NULL,         -- IncidentFields
    name_key            TEXT,                  -- trimmed, lowercased victim name
    facility_key        TEXT,                  -- trimmed, lowercased facility
    verification_status TEXT NOT NULL DEFAULT 'pending',
    first_verified_by   INTEGER,
    first_verified_at   TEXT,
    second_verified_by  INTEGER,
    second_verified_at  TEXT,
    verified_at         TEXT,
    rejection_reason    TEXT,
    created_at          TEXT NOT NULL,
    updated_at          TEXT NOT NULL
);

-- Every child record of an incident: agencies, violations, sources, quotes,
-- media and timeline entries.
CREATE TABLE IF NOT EXISTS attachments (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    incident_id INTEGER NOT NULL REFERENCES incidents(id),
    kind        TEXT NOT NULL,   -- AttachmentKind discriminant
    value_json  TEXT NOT NULL,   -- payload without id / incident_id
    dedup_key   TEXT,            -- NULL when duplicates are allowed
    url_key     TEXT,            -- normalised URL, sources only
    UNIQUE (incident_id, kind, dedup_key)
);

CREATE TABLE IF NOT EXISTS guest_submissions (
    id              INTEGER PRIMARY KEY AUTOINCREMENT,
    submitted_at    TEXT NOT NULL,
    report_json     TEXT NOT NULL,   -- GuestReport as submitted
    name_key        TEXT,
    status          TEXT NOT NULL DEFAULT 'pending',
    incident_id     INTEGER REFERENCES incidents(id),
    deleted_at      TEXT,
    deletion_reason TEXT,
    CHECK (deleted_at IS NULL OR deletion_reason IS NOT NULL)
);

CREATE TABLE IF NOT EXISTS reviewers (
    id   INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    role TEXT NOT NULL DEFAULT 'viewer'
);

CREATE INDEX IF NOT EXISTS incidents_status_idx   ON incidents(verification_status);
CREATE INDEX IF NOT EXISTS incidents_name_idx     ON incidents(name_key);
CREATE INDEX IF NOT EXISTS attachments_parent_idx ON attachments(incident_id, kind);
CREATE INDEX IF NOT EXISTS attachments_url_idx    ON attachments(kind, url_key);
CREATE INDEX IF NOT EXISTS guests_name_idx        ON guest_submissions(name_key);

PRAGMA user_version = 1;
";
