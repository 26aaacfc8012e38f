//! SQL schema for the BioSamples SQLite store.
//!
//! Executed once at connection startup. The schema version is recorded in
//! `PRAGMA user_version` so later migrations can be gated on it.

/// Full schema DDL; idempotent thanks to `IF NOT EXISTS` / `OR IGNORE`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

-- One row per accession holding the latest saved version.
CREATE TABLE IF NOT EXISTS samples (
    accession  TEXT PRIMARY KEY,
    name       TEXT NOT NULL,
    domain     TEXT,
    document   TEXT NOT NULL,   -- JSON-encoded SampleRecord
    saved_at   TEXT NOT NULL    -- ISO 8601 UTC; server-assigned
);

-- Relationship edges of the latest version, indexed by target so a read can
-- find the edges other records point at it.
CREATE TABLE IF NOT EXISTS relationships (
    owner     TEXT NOT NULL REFERENCES samples(accession) ON DELETE CASCADE,
    source    TEXT NOT NULL,
    rel_type  TEXT NOT NULL,
    target    TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS accession_counters (
    namespace   TEXT PRIMARY KEY,   -- 'sample' | 'group'
    next_value  INTEGER NOT NULL
);

INSERT OR IGNORE INTO accession_counters (namespace, next_value)
VALUES ('sample', 1), ('group', 1);

-- Curations are stored beside the sample and applied on read only.
CREATE TABLE IF NOT EXISTS curation_links (
    curation_id      TEXT PRIMARY KEY,
    accession        TEXT NOT NULL,
    domain           TEXT NOT NULL,
    repo             TEXT,
    attributes_pre   TEXT NOT NULL,   -- JSON array of attributes
    attributes_post  TEXT NOT NULL,   -- JSON array of attributes
    created          TEXT NOT NULL
);

-- Outbox of change notifications, consumed by downstream indexers.
CREATE TABLE IF NOT EXISTS change_events (
    event_id       TEXT PRIMARY KEY,
    accession      TEXT NOT NULL,
    prior_targets  TEXT NOT NULL,   -- JSON array of accessions
    recorded_at    TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS samples_domain_name_idx  ON samples(domain, name);
CREATE INDEX IF NOT EXISTS relationships_owner_idx  ON relationships(owner);
CREATE INDEX IF NOT EXISTS relationships_target_idx ON relationships(target);
CREATE INDEX IF NOT EXISTS curation_accession_idx   ON curation_links(accession);
CREATE INDEX IF NOT EXISTS change_events_order_idx  ON change_events(recorded_at);

PRAGMA user_version = 1;
";
