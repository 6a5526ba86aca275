//! SQL schema for the podium SQLite store.
//!
//! Run on every open; all statements are `IF NOT EXISTS`. The schema
//! version lives in `PRAGMA user_version`.

/// Schema DDL plus per-connection pragmas.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;
PRAGMA busy_timeout = 5000;

-- One row per athlete per cohort. Exactly one identity mode is set.
-- Sport compares case-insensitively here and in the unique index.
CREATE TABLE IF NOT EXISTS ranking_entries (
    entry_id              TEXT PRIMARY KEY,
    athlete_id            TEXT,
    external_athlete_name TEXT,
    is_external_only      INTEGER NOT NULL DEFAULT 0,
    sport                 TEXT NOT NULL COLLATE NOCASE,
    graduation_year       INTEGER,            -- NULL = unknown cohort
    position              TEXT,
    state                 TEXT,
    composite_score       REAL CHECK (composite_score IS NULL OR composite_score BETWEEN 0 AND 100),
    overall_rank          INTEGER CHECK (overall_rank  IS NULL OR overall_rank  >= 1),
    position_rank         INTEGER CHECK (position_rank IS NULL OR position_rank >= 1),
    state_rank            INTEGER CHECK (state_rank    IS NULL OR state_rank    >= 1),
    national_rank         INTEGER CHECK (national_rank IS NULL OR national_rank >= 1),
    is_manual_override    INTEGER NOT NULL DEFAULT 0,
    overridden_by         TEXT,
    overridden_at         TEXT,               -- ISO 8601 UTC
    last_calculated       TEXT NOT NULL,      -- ISO 8601 UTC
    CHECK (
        (athlete_id IS NOT NULL AND external_athlete_name IS NULL AND is_external_only = 0)
     OR (athlete_id IS NULL AND external_athlete_name IS NOT NULL AND is_external_only = 1)
    )
);

CREATE UNIQUE INDEX IF NOT EXISTS ranking_entries_cohort_uidx ON ranking_entries (
    IFNULL(athlete_id, 'external:' || external_athlete_name),
    sport,
    IFNULL(graduation_year, -1)
);
CREATE INDEX IF NOT EXISTS ranking_entries_sport_idx ON ranking_entries(sport);

-- Most recently normalised candidates, one snapshot per sport and origin.
CREATE TABLE IF NOT EXISTS candidate_snapshots (
    sport           TEXT NOT NULL COLLATE NOCASE,
    origin          TEXT NOT NULL,            -- 'internal' | 'external'
    candidates_json TEXT NOT NULL,
    normalized_at   TEXT NOT NULL,
    PRIMARY KEY (sport, origin)
);

-- Athlete records and evaluations are owned by the profile application;
-- the engine only reads them.
CREATE TABLE IF NOT EXISTS athletes (
    athlete_id        TEXT PRIMARY KEY,
    full_name         TEXT NOT NULL,
    sport             TEXT NOT NULL,
    graduation_year   INTEGER,
    position          TEXT,
    state             TEXT,
    courses_completed INTEGER NOT NULL DEFAULT 0
);

CREATE TABLE IF NOT EXISTS evaluations (
    evaluation_id   TEXT PRIMARY KEY,
    athlete_id      TEXT NOT NULL REFERENCES athletes(athlete_id) ON DELETE CASCADE,
    technical_skill REAL,
    game_knowledge  REAL,
    athleticism     REAL,
    mental_game     REAL,
    recorded_at     TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS athletes_sport_idx       ON athletes(sport);
CREATE INDEX IF NOT EXISTS evaluations_athlete_idx  ON evaluations(athlete_id, recorded_at);

PRAGMA user_version = 1;
";
