//! Conversions between domain types and the plain column values stored in
//! SQLite.
//!
//! Event rows are read into the core [`RawEvent`] wire record and pass the
//! same well-formedness check as imported events on the way out. Suggestion
//! lists are stored as compact JSON arrays.

use lendcraft_core::fact::{LendingEvent, RawEvent};

use crate::{Error, Result};

/// Column list shared by every `SELECT` over `events`, in [`read_event_row`]
/// order.
pub const EVENT_COLUMNS: &str = "id, kind, card_name, catalog_id, set_code, \
  lender_name, borrower_name, timestamp, return_of_event_id, note";

// ─── Events ──────────────────────────────────────────────────────────────────

pub fn encode_event(event: LendingEvent) -> RawEvent { RawEvent::from(event) }

pub fn read_event_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawEvent> {
  Ok(RawEvent {
    id:                 row.get(0)?,
    kind:               row.get(1)?,
    card_name:          row.get(2)?,
    scryfall_id:        row.get(3)?,
    set_code:           row.get(4)?,
    lender_name:        row.get(5)?,
    borrower_name:      row.get(6)?,
    timestamp:          row.get(7)?,
    return_of_event_id: row.get(8)?,
    note:               row.get(9)?,
  })
}

pub fn decode_event(raw: RawEvent) -> Result<LendingEvent> {
  let id = raw.id.clone();
  LendingEvent::try_from(raw).map_err(|e| Error::CorruptRow {
    id,
    reason: e.to_string(),
  })
}

// ─── Suggestions ─────────────────────────────────────────────────────────────

pub fn encode_results(results: &[String]) -> Result<String> {
  Ok(serde_json::to_string(results)?)
}

pub fn decode_results(s: &str) -> Result<Vec<String>> {
  Ok(serde_json::from_str(s)?)
}

/// Cache keys ignore case, so "sol r" and "Sol R" share an entry.
pub fn cache_key(query: &str) -> String { query.trim().to_lowercase() }
