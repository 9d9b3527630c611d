//! SQL schema for the Reunite SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS cases (
    id                    INTEGER PRIMARY KEY AUTOINCREMENT,
    case_number           TEXT NOT NULL UNIQUE,
    full_name             TEXT NOT NULL,
    age                   INTEGER,
    gender                TEXT,
    national_id_encrypted TEXT,            -- vault token; plaintext never stored
    phone                 TEXT,
    email                 TEXT,
    last_seen_location    TEXT,
    last_seen_date        TEXT,            -- YYYY-MM-DD
    physical_description  TEXT,
    status                TEXT NOT NULL DEFAULT 'active',  -- 'active' | 'found' | 'closed'
    created_at            TEXT NOT NULL,   -- RFC 3339 UTC, microsecond precision
    updated_at            TEXT NOT NULL
);

-- Ordered photo evidence for a case; written in the same transaction as the
-- case row.
CREATE TABLE IF NOT EXISTS case_photos (
    case_id   INTEGER NOT NULL REFERENCES cases(id),
    position  INTEGER NOT NULL,
    photo_ref TEXT    NOT NULL,
    PRIMARY KEY (case_id, position)
);

CREATE TABLE IF NOT EXISTS reports (
    id               INTEGER PRIMARY KEY AUTOINCREMENT,
    report_id        TEXT NOT NULL UNIQUE,
    photo_ref        TEXT NOT NULL,
    reporter_name    TEXT,             -- NULL = anonymous
    reporter_phone   TEXT,
    found_location   TEXT NOT NULL,
    found_address    TEXT,
    additional_notes TEXT,
    processed        INTEGER NOT NULL DEFAULT 0,
    created_at       TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS matches (
    id            INTEGER PRIMARY KEY AUTOINCREMENT,
    case_id       INTEGER NOT NULL REFERENCES cases(id),
    report_id     INTEGER NOT NULL REFERENCES reports(id),
    confidence    REAL    NOT NULL CHECK (confidence >= 0 AND confidence <= 100),
    status        TEXT    NOT NULL DEFAULT 'pending',  -- 'pending' | 'confirmed' | 'rejected'
    notes         TEXT,
    reviewed_by   INTEGER,
    reviewed_at   TEXT,
    created_at    TEXT NOT NULL,
    matched_photo TEXT,   -- snapshot of the case photo at match time
    report_photo  TEXT    -- snapshot of the report photo at match time
);

-- Review decisions, strictly append-only.
-- No UPDATE or DELETE is ever issued against this table.
CREATE TABLE IF NOT EXISTS match_reviews (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    match_id    INTEGER NOT NULL REFERENCES matches(id),
    status      TEXT    NOT NULL,
    notes       TEXT,
    reviewed_by INTEGER NOT NULL,
    reviewed_at TEXT    NOT NULL
);

CREATE TABLE IF NOT EXISTS videos (
    id                INTEGER PRIMARY KEY AUTOINCREMENT,
    video_ref         TEXT    NOT NULL,
    uploaded_by       INTEGER NOT NULL,
    processing_status TEXT    NOT NULL DEFAULT 'pending',
    created_at        TEXT    NOT NULL
);

CREATE TABLE IF NOT EXISTS video_matches (
    id             INTEGER PRIMARY KEY AUTOINCREMENT,
    video_id       INTEGER NOT NULL REFERENCES videos(id),
    case_id        INTEGER NOT NULL REFERENCES cases(id),
    timestamp_secs REAL    NOT NULL,
    frame_ref      TEXT,
    confidence     REAL    NOT NULL CHECK (confidence >= 0 AND confidence <= 100),
    created_at     TEXT    NOT NULL
);

CREATE INDEX IF NOT EXISTS cases_status_idx         ON cases(status, created_at);
CREATE INDEX IF NOT EXISTS matches_queue_idx        ON matches(status, confidence);
CREATE INDEX IF NOT EXISTS matches_case_idx         ON matches(case_id);
CREATE INDEX IF NOT EXISTS match_reviews_match_idx  ON match_reviews(match_id);
CREATE INDEX IF NOT EXISTS reports_processed_idx    ON reports(processed);
CREATE INDEX IF NOT EXISTS video_matches_video_idx  ON video_matches(video_id);

PRAGMA user_version = 1;
";
