//! Producer and consumer sides of an event transfer.
//!
//! A local action mints events, inserts them into the local store and encodes
//! exactly that batch as a share code for out-of-band transport. The receiver
//! decodes the code, checks each record and inserts it; duplicates are
//! counted, not reported as failures.
//!
//! The local display name is never read from the store here. Callers pass it
//! in, so the flow stays a pure function of its arguments plus the store.

use std::fmt;

use lendcraft_core::{
  Error as CoreError,
  fact::{EventId, LendingEvent, NewEvent, RawEvent, same_name},
  store::LedgerStore,
};

use crate::{
  Error, Result,
  codec::{decode, encode},
};

// ─── Producer side ───────────────────────────────────────────────────────────

/// Which way the card travels, seen from the local user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
  /// The local user hands the card to the counterparty.
  Lending,
  /// The counterparty hands the card to the local user.
  Borrowing,
}

/// One "record a loan" action.
#[derive(Debug, Clone)]
pub struct LendRequest {
  pub card_name:    String,
  pub counterparty: String,
  pub direction:    Direction,
  /// Number of copies handed over in this action; each becomes its own event.
  pub copies:       usize,
  pub catalog_id:   Option<String>,
  pub set_code:     Option<String>,
  pub note:         Option<String>,
}

impl LendRequest {
  pub fn new(
    card_name: impl Into<String>,
    counterparty: impl Into<String>,
    direction: Direction,
  ) -> Self {
    Self {
      card_name: card_name.into(),
      counterparty: counterparty.into(),
      direction,
      copies: 1,
      catalog_id: None,
      set_code: None,
      note: None,
    }
  }
}

/// Events just created locally, and the share code carrying exactly them.
#[derive(Debug, Clone)]
pub struct Outgoing {
  pub events: Vec<LendingEvent>,
  pub code:   String,
}

/// Record a loan between the local user and `request.counterparty`.
pub async fn record_lend<S: LedgerStore>(
  store: &S,
  local_name: &str,
  request: LendRequest,
  now_ms: i64,
) -> Result<Outgoing> {
  let (lender, borrower) = match request.direction {
    Direction::Lending => (local_name.to_owned(), request.counterparty),
    Direction::Borrowing => (request.counterparty, local_name.to_owned()),
  };

  let mut new = NewEvent::lend(request.card_name, lender, borrower, now_ms);
  new.catalog_id = request.catalog_id;
  new.set_code = request.set_code;
  new.note = request.note;

  let events = mint_unused(store, new, request.copies).await?;
  publish(store, events).await
}

/// Mint `copies` events from `template`, moving any copy whose id is already
/// in the ledger to the next free millisecond. An earlier batch of the same
/// card between the same people can occupy `timestamp + i`; reusing its ids
/// would record fewer loans than were handed over.
async fn mint_unused<S: LedgerStore>(
  store: &S,
  template: NewEvent,
  copies: usize,
) -> Result<Vec<LendingEvent>> {
  if copies == 0 {
    return Err(CoreError::EmptyBatch.into());
  }

  let mut minted = Vec::with_capacity(copies);
  let mut timestamp = template.timestamp;
  loop {
    let mut candidate = template.clone();
    candidate.timestamp = timestamp;
    let event = candidate.build()?;

    let taken = store
      .event_by_id(&event.id)
      .await
      .map_err(Error::store)?
      .is_some();
    if taken {
      tracing::debug!(id = %event.id, "id already recorded, shifting copy");
    } else {
      minted.push(event);
      if minted.len() == copies {
        return Ok(minted);
      }
    }

    timestamp = timestamp
      .checked_add(1)
      .ok_or(CoreError::TimestampOverflow)?;
  }
}

/// Record that the loan `lend_id` came back.
pub async fn record_return<S: LedgerStore>(
  store: &S,
  lend_id: &EventId,
  now_ms: i64,
) -> Result<Outgoing> {
  let lend = store
    .event_by_id(lend_id)
    .await
    .map_err(Error::store)?
    .ok_or_else(|| Error::UnknownLoan(lend_id.clone()))?;

  if !lend.is_lend() {
    return Err(Error::NotALoan(lend_id.clone()));
  }

  let still_open = store
    .active_loans()
    .await
    .map_err(Error::store)?
    .iter()
    .any(|loan| &loan.lend.id == lend_id);
  if !still_open {
    return Err(Error::AlreadyReturned(lend_id.clone()));
  }

  let ret = NewEvent::closing(&lend, now_ms).build()?;
  publish(store, vec![ret]).await
}

/// Insert freshly minted `events` locally and encode that same batch. Every
/// event must be new to the ledger, otherwise nothing is stored or encoded.
pub async fn publish<S: LedgerStore>(
  store: &S,
  events: Vec<LendingEvent>,
) -> Result<Outgoing> {
  for (i, event) in events.iter().enumerate() {
    let repeated = events[..i].iter().any(|e| e.id == event.id);
    let recorded = store
      .event_by_id(&event.id)
      .await
      .map_err(Error::store)?
      .is_some();
    if repeated || recorded {
      return Err(Error::Collision(event.id.clone()));
    }
  }

  let code = encode(&events)?;
  store
    .insert_batch(events.clone())
    .await
    .map_err(Error::store)?;
  Ok(Outgoing { events, code })
}

/// Encode the whole ledger as one share code.
pub async fn export_all<S: LedgerStore>(store: &S) -> Result<String> {
  let events = store.all_events().await.map_err(Error::store)?;
  Ok(encode(&events)?)
}

// ─── Consumer side ───────────────────────────────────────────────────────────

/// Whether participant-scoped views can be shown after an import.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LocalIdentity {
  /// The device already has a display name.
  Known,
  /// No display name and nothing to choose from yet.
  Unset,
  /// No display name; the user must pick which of these names is them.
  /// Only the local display binding depends on the answer, never the ledger.
  Choose(Vec<String>),
}

/// Outcome of merging a batch of records into the local store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportReport {
  pub added:        usize,
  pub duplicates:   usize,
  /// Records that failed the well-formedness check and were not stored.
  pub malformed:    usize,
  /// Distinct party names among the well-formed records, compared
  /// case-insensitively, in first-seen spelling, sorted.
  pub participants: Vec<String>,
  pub identity:     LocalIdentity,
}

impl fmt::Display for ImportReport {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let plural = |n: usize| if n == 1 { "" } else { "s" };
    write!(f, "Imported {} event{}", self.added, plural(self.added))?;
    if self.duplicates > 0 {
      write!(
        f,
        " ({} duplicate{} skipped)",
        self.duplicates,
        plural(self.duplicates)
      )?;
    }
    if self.malformed > 0 {
      write!(
        f,
        " ({} malformed record{} ignored)",
        self.malformed,
        plural(self.malformed)
      )?;
    }
    Ok(())
  }
}

/// Decode `code` and merge its events into `store`.
///
/// Decoding is all-or-nothing: an invalid code returns
/// [`Error::InvalidCode`] before the store is touched. Insertion is per
/// event; a store failure midway leaves the already-inserted events in
/// place, which is safe because every insert is idempotent.
pub async fn import_code<S: LedgerStore>(
  store: &S,
  code: &str,
  local_name: Option<&str>,
) -> Result<ImportReport> {
  let records = decode(code)?;
  merge_records(store, records, local_name).await
}

/// Shared consumer path for share codes and backup files.
pub(crate) async fn merge_records<S: LedgerStore>(
  store: &S,
  records: Vec<RawEvent>,
  local_name: Option<&str>,
) -> Result<ImportReport> {
  let mut report = ImportReport {
    added:        0,
    duplicates:   0,
    malformed:    0,
    participants: Vec::new(),
    identity:     LocalIdentity::Known,
  };

  for record in records {
    let event = match LendingEvent::try_from(record) {
      Ok(event) => event,
      Err(e) => {
        tracing::warn!(error = %e, "skipping malformed record");
        report.malformed += 1;
        continue;
      }
    };

    for name in [&event.lender_name, &event.borrower_name] {
      if !report.participants.iter().any(|p| same_name(p, name)) {
        report.participants.push(name.clone());
      }
    }

    if store.insert(event).await.map_err(Error::store)? {
      report.added += 1;
    } else {
      report.duplicates += 1;
    }
  }

  report.participants.sort();
  report.identity = match local_name {
    Some(_) => LocalIdentity::Known,
    None if report.participants.is_empty() => LocalIdentity::Unset,
    None => LocalIdentity::Choose(report.participants.clone()),
  };

  tracing::info!(
    added = report.added,
    duplicates = report.duplicates,
    malformed = report.malformed,
    "merged events"
  );
  Ok(report)
}
