//! SQL schema for the Lendcraft SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;

-- Events are strictly append-only and keyed by their content fingerprint.
-- No UPDATE or DELETE is ever issued against this table.
CREATE TABLE IF NOT EXISTS events (
    id                 TEXT PRIMARY KEY,
    kind               TEXT NOT NULL,   -- 'lend' | 'return'
    card_name          TEXT NOT NULL,
    catalog_id         TEXT,
    set_code           TEXT,
    lender_name        TEXT NOT NULL,
    borrower_name      TEXT NOT NULL,
    timestamp          INTEGER NOT NULL, -- ms since epoch; producer-assigned
    return_of_event_id TEXT,            -- only on 'return'; may dangle
    note               TEXT
);

-- Derived from events; removable without touching the ledger.
CREATE TABLE IF NOT EXISTS friends (
    name TEXT PRIMARY KEY
);

CREATE TABLE IF NOT EXISTS settings (
    key   TEXT PRIMARY KEY,
    value TEXT NOT NULL
);

-- Catalog autocomplete results; freshness is decided by the reader.
CREATE TABLE IF NOT EXISTS card_cache (
    query        TEXT PRIMARY KEY,
    results_json TEXT NOT NULL,
    cached_at    INTEGER NOT NULL
);

CREATE INDEX IF NOT EXISTS events_timestamp_idx ON events(timestamp);
CREATE INDEX IF NOT EXISTS events_return_of_idx ON events(return_of_event_id);
CREATE INDEX IF NOT EXISTS card_cache_at_idx    ON card_cache(cached_at);

PRAGMA user_version = 1;
";
