//! [`SqliteStore`]: the SQLite implementation of [`LedgerStore`].

use std::path::Path;

use lendcraft_core::{
  fact::{EventId, LendingEvent, RawEvent},
  store::{CachedSuggestions, LedgerStore},
};
use rusqlite::OptionalExtension as _;

use crate::{
  Result,
  encode::{
    EVENT_COLUMNS, cache_key, decode_event, decode_results, encode_event,
    encode_results, read_event_row,
  },
  schema::SCHEMA,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A Lendcraft ledger backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store, for tests.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}

/// Put-if-absent for one event row. Friends are only registered when the
/// event is new, so re-importing never resurrects a removed friend.
fn insert_row(
  conn: &rusqlite::Connection,
  raw: &RawEvent,
) -> rusqlite::Result<bool> {
  let added = conn.execute(
    "INSERT OR IGNORE INTO events (
       id, kind, card_name, catalog_id, set_code,
       lender_name, borrower_name, timestamp, return_of_event_id, note
     ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
    rusqlite::params![
      raw.id,
      raw.kind,
      raw.card_name,
      raw.scryfall_id,
      raw.set_code,
      raw.lender_name,
      raw.borrower_name,
      raw.timestamp,
      raw.return_of_event_id,
      raw.note,
    ],
  )? == 1;

  if added {
    for name in [&raw.lender_name, &raw.borrower_name] {
      conn.execute(
        "INSERT OR IGNORE INTO friends (name) VALUES (?1)",
        rusqlite::params![name],
      )?;
    }
  }

  Ok(added)
}

// ─── LedgerStore impl ────────────────────────────────────────────────────────

impl LedgerStore for SqliteStore {
  type Error = crate::Error;

  // ── Events ────────────────────────────────────────────────────────────────

  async fn insert(&self, event: LendingEvent) -> Result<bool> {
    let raw = encode_event(event);
    let id = raw.id.clone();

    let added = self
      .conn
      .call(move |conn| Ok(insert_row(conn, &raw)?))
      .await?;

    if !added {
      tracing::debug!(%id, "event already known, skipped");
    }
    Ok(added)
  }

  async fn insert_batch(&self, events: Vec<LendingEvent>) -> Result<usize> {
    let raws: Vec<RawEvent> = events.into_iter().map(encode_event).collect();
    let total = raws.len();

    let added = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let mut added: usize = 0;
        for raw in &raws {
          if insert_row(&tx, raw)? {
            added += 1;
          }
        }
        tx.commit()?;
        Ok(added)
      })
      .await?;

    tracing::debug!(added, skipped = total - added, "batch inserted");
    Ok(added)
  }

  async fn all_events(&self) -> Result<Vec<LendingEvent>> {
    let raws: Vec<RawEvent> = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {EVENT_COLUMNS} FROM events ORDER BY timestamp, id"
        ))?;
        let rows = stmt
          .query_map([], read_event_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(decode_event).collect()
  }

  async fn event_by_id(&self, id: &EventId) -> Result<Option<LendingEvent>> {
    let id_str = id.as_str().to_owned();

    let raw: Option<RawEvent> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!("SELECT {EVENT_COLUMNS} FROM events WHERE id = ?1"),
              rusqlite::params![id_str],
              read_event_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(decode_event).transpose()
  }

  // ── Friends ───────────────────────────────────────────────────────────────

  async fn add_friend(&self, name: String) -> Result<()> {
    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT OR IGNORE INTO friends (name) VALUES (?1)",
          rusqlite::params![name],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn remove_friend(&self, name: String) -> Result<bool> {
    let removed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "DELETE FROM friends WHERE name = ?1",
          rusqlite::params![name],
        )?)
      })
      .await?;
    Ok(removed > 0)
  }

  async fn friends(&self) -> Result<Vec<String>> {
    let names = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare("SELECT name FROM friends ORDER BY name")?;
        let rows = stmt
          .query_map([], |row| row.get(0))?
          .collect::<rusqlite::Result<Vec<String>>>()?;
        Ok(rows)
      })
      .await?;
    Ok(names)
  }

  // ── Settings ──────────────────────────────────────────────────────────────

  async fn setting(&self, key: &str) -> Result<Option<String>> {
    let key = key.to_owned();
    let value: Option<String> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT value FROM settings WHERE key = ?1",
              rusqlite::params![key],
              |row| row.get(0),
            )
            .optional()?,
        )
      })
      .await?;
    Ok(value)
  }

  async fn put_setting(&self, key: &str, value: String) -> Result<()> {
    let key = key.to_owned();
    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO settings (key, value) VALUES (?1, ?2)
           ON CONFLICT(key) DO UPDATE SET value = excluded.value",
          rusqlite::params![key, value],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  // ── Suggestion cache ──────────────────────────────────────────────────────

  async fn cached_suggestions(
    &self,
    query: &str,
  ) -> Result<Option<CachedSuggestions>> {
    let key = cache_key(query);

    let row: Option<(String, i64)> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT results_json, cached_at FROM card_cache WHERE query = ?1",
              rusqlite::params![key],
              |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?,
        )
      })
      .await?;

    row
      .map(|(json, cached_at)| {
        Ok(CachedSuggestions { results: decode_results(&json)?, cached_at })
      })
      .transpose()
  }

  async fn cache_suggestions(
    &self,
    query: &str,
    entry: CachedSuggestions,
  ) -> Result<()> {
    let key = cache_key(query);
    let json = encode_results(&entry.results)?;
    let at = entry.cached_at;

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO card_cache (query, results_json, cached_at)
           VALUES (?1, ?2, ?3)
           ON CONFLICT(query) DO UPDATE SET
             results_json = excluded.results_json,
             cached_at    = excluded.cached_at",
          rusqlite::params![key, json, at],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}
