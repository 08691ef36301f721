//! SQL schema for the shiftboard SQLite store.
//!
//! Executed once at connection startup via `PRAGMA user_version`. Future
//! migrations will be gated on that version number.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS shifts (
    name                  TEXT PRIMARY KEY,
    rollover_through_hour INTEGER           -- NULL: never rolls past midnight
);

-- Clock times are 'HH:MM:SS'; a block is absent when both slots are NULL.
CREATE TABLE IF NOT EXISTS schedules (
    schedule_id TEXT PRIMARY KEY,
    area        TEXT NOT NULL,
    shift       TEXT NOT NULL REFERENCES shifts(name),
    name        TEXT NOT NULL,
    start1 TEXT, end1 TEXT,
    start2 TEXT, end2 TEXT,
    start3 TEXT, end3 TEXT,
    start4 TEXT, end4 TEXT,
    UNIQUE (area, shift, name)
);

CREATE TABLE IF NOT EXISTS kpis (
    kpi_id          TEXT PRIMARY KEY,
    area            TEXT NOT NULL,
    shift           TEXT NOT NULL,
    d               TEXT NOT NULL,     -- shift date, 'YYYY-MM-DD'
    demand          INTEGER NOT NULL DEFAULT 0,
    plan_cycle_time INTEGER NOT NULL,  -- planned seconds per cycle
    schedule_id     TEXT NOT NULL REFERENCES schedules(schedule_id),
    UNIQUE (area, shift, d)
);

-- Cycles are strictly append-only.
-- Timestamps are fixed-width 'YYYY-MM-DD HH:MM:SS.ffffff' so they sort as text.
CREATE TABLE IF NOT EXISTS cycles (
    cycle_id   TEXT PRIMARY KEY,
    kpi_id     TEXT NOT NULL REFERENCES kpis(kpi_id),
    d          TEXT NOT NULL,
    sequence   INTEGER NOT NULL,
    cycle_time INTEGER NOT NULL,
    parts_per  INTEGER NOT NULL,
    delivered  INTEGER NOT NULL DEFAULT 0,
    code       INTEGER NOT NULL DEFAULT 0
);

-- The only UPDATE ever issued here flips responded 0 -> 1.
CREATE TABLE IF NOT EXISTS andons (
    andon_id   TEXT PRIMARY KEY,
    kpi_id     TEXT NOT NULL REFERENCES kpis(kpi_id),
    d          TEXT NOT NULL,
    sequence   INTEGER NOT NULL,
    andon_type TEXT NOT NULL,
    responded  INTEGER NOT NULL DEFAULT 0,
    response_d TEXT
);

CREATE INDEX IF NOT EXISTS cycles_kpi_seq_idx ON cycles(kpi_id, sequence, d);
CREATE INDEX IF NOT EXISTS andons_kpi_seq_idx ON andons(kpi_id, sequence, d);
CREATE INDEX IF NOT EXISTS andons_open_idx    ON andons(kpi_id, sequence) WHERE responded = 0;

PRAGMA user_version = 1;
";
