//! Lending events: the fundamental unit of the Lendcraft ledger.
//!
//! An event is an immutable record of one state transition: a card was lent,
//! or a lent card came back. Events are never updated; a correction is a new
//! event. Each event is identified by a fingerprint of its content, so two
//! devices that record the same fact converge on the same id.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};
use strum::{AsRefStr, Display, EnumString};

use crate::{Error, Result, fingerprint::fingerprint};

// ─── Identity ────────────────────────────────────────────────────────────────

/// Content-derived identifier of a [`LendingEvent`].
#[derive(
  Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct EventId(String);

impl EventId {
  pub fn new(id: impl Into<String>) -> Self { Self(id.into()) }

  pub fn as_str(&self) -> &str { &self.0 }

  pub fn into_inner(self) -> String { self.0 }
}

impl fmt::Display for EventId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.0)
  }
}

impl AsRef<str> for EventId {
  fn as_ref(&self) -> &str { &self.0 }
}

impl From<String> for EventId {
  fn from(s: String) -> Self { Self(s) }
}

impl From<&str> for EventId {
  fn from(s: &str) -> Self { Self(s.to_owned()) }
}

// ─── Kind ────────────────────────────────────────────────────────────────────

/// The bare discriminant of an event, as it appears on the wire and in the
/// identifier input string.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  AsRefStr,
  Display,
  EnumString,
  Serialize,
  Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum KindTag {
  Lend,
  Return,
}

/// What an event records. A return always names the loan it closes.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum EventKind {
  Lend,
  Return {
    /// Id of the `Lend` event this return closes. It may refer to a loan the
    /// local ledger has not seen yet.
    return_of: EventId,
  },
}

impl EventKind {
  pub fn tag(&self) -> KindTag {
    match self {
      Self::Lend => KindTag::Lend,
      Self::Return { .. } => KindTag::Return,
    }
  }
}

// ─── LendingEvent ────────────────────────────────────────────────────────────

/// An immutable lend or return fact.
///
/// Serialises to the flat [`RawEvent`] shape, so the share code, the backup
/// file and the database all speak the same JSON schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawEvent", into = "RawEvent")]
pub struct LendingEvent {
  pub id:            EventId,
  pub kind:          EventKind,
  pub card_name:     String,
  /// Cross-reference into the external card catalog.
  pub catalog_id:    Option<String>,
  pub set_code:      Option<String>,
  pub lender_name:   String,
  pub borrower_name: String,
  /// Milliseconds since the Unix epoch, assigned by the producer. Advisory:
  /// used for display ordering and to separate batch fingerprints.
  pub timestamp:     i64,
  pub note:          Option<String>,
}

impl LendingEvent {
  pub fn is_lend(&self) -> bool { matches!(self.kind, EventKind::Lend) }

  /// The loan this event closes, if it is a return.
  pub fn closes(&self) -> Option<&EventId> {
    match &self.kind {
      EventKind::Lend => None,
      EventKind::Return { return_of } => Some(return_of),
    }
  }

  /// Recompute the fingerprint from the content fields.
  pub fn content_id(&self) -> EventId {
    fingerprint(
      &self.lender_name,
      &self.borrower_name,
      &self.card_name,
      self.timestamp,
      self.kind.tag(),
    )
  }

  /// Whether `name` is either party to this event (case-insensitive).
  pub fn involves(&self, name: &str) -> bool {
    same_name(&self.lender_name, name) || same_name(&self.borrower_name, name)
  }
}

/// Participant-name equality used by views. Storage keeps the original case.
pub fn same_name(a: &str, b: &str) -> bool {
  a == b || a.to_lowercase() == b.to_lowercase()
}

// ─── RawEvent ────────────────────────────────────────────────────────────────

/// The loosely-typed wire record of an event.
///
/// Every field is defaulted so that any JSON object decodes; whether the
/// record is a usable fact is decided by [`RawEvent::validate`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawEvent {
  /// Absent and `null` both mean "derive from content".
  #[serde(default, deserialize_with = "null_as_empty")]
  pub id:                 String,
  #[serde(rename = "type", default)]
  pub kind:               String,
  #[serde(default)]
  pub card_name:          String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub scryfall_id:        Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub set_code:           Option<String>,
  #[serde(default)]
  pub lender_name:        String,
  #[serde(default)]
  pub borrower_name:      String,
  #[serde(default)]
  pub timestamp:          i64,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub return_of_event_id: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub note:               Option<String>,
}

fn null_as_empty<'de, D: Deserializer<'de>>(
  deserializer: D,
) -> Result<String, D::Error> {
  Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

impl RawEvent {
  /// Check the record against the fact contract: non-empty card and party
  /// names, a known kind, and a target for returns. Whether the target
  /// actually exists is the resolver's business, not this check's.
  pub fn validate(&self) -> Result<EventKind> {
    if self.card_name.trim().is_empty() {
      return Err(Error::MissingField("cardName"));
    }
    if self.lender_name.trim().is_empty() {
      return Err(Error::MissingField("lenderName"));
    }
    if self.borrower_name.trim().is_empty() {
      return Err(Error::MissingField("borrowerName"));
    }

    let tag: KindTag = self
      .kind
      .parse()
      .map_err(|_| Error::UnknownKind(self.kind.clone()))?;

    match tag {
      KindTag::Lend => Ok(EventKind::Lend),
      KindTag::Return => match self.return_of_event_id.as_deref() {
        Some(target) if !target.is_empty() => Ok(EventKind::Return {
          return_of: EventId::new(target),
        }),
        _ => Err(Error::ReturnWithoutTarget),
      },
    }
  }

  pub fn is_well_formed(&self) -> bool { self.validate().is_ok() }
}

impl TryFrom<RawEvent> for LendingEvent {
  type Error = Error;

  /// Validates the record. A missing id is filled in from the fingerprint; a
  /// present id is kept exactly as the producer minted it, since returns on
  /// other devices already reference it.
  fn try_from(raw: RawEvent) -> Result<Self> {
    let kind = raw.validate()?;

    let mut event = LendingEvent {
      id: EventId::new(raw.id),
      kind,
      card_name: raw.card_name,
      catalog_id: raw.scryfall_id,
      set_code: raw.set_code,
      lender_name: raw.lender_name,
      borrower_name: raw.borrower_name,
      timestamp: raw.timestamp,
      note: raw.note,
    };
    if event.id.as_str().is_empty() {
      event.id = event.content_id();
    }
    Ok(event)
  }
}

impl From<LendingEvent> for RawEvent {
  fn from(event: LendingEvent) -> Self {
    let kind = event.kind.tag().to_string();
    let return_of_event_id = match event.kind {
      EventKind::Lend => None,
      EventKind::Return { return_of } => Some(return_of.into_inner()),
    };
    RawEvent {
      id: event.id.into_inner(),
      kind,
      card_name: event.card_name,
      scryfall_id: event.catalog_id,
      set_code: event.set_code,
      lender_name: event.lender_name,
      borrower_name: event.borrower_name,
      timestamp: event.timestamp,
      return_of_event_id,
      note: event.note,
    }
  }
}

// ─── NewEvent ────────────────────────────────────────────────────────────────

/// Input for minting a [`LendingEvent`]. The id is never accepted from
/// callers; it is always derived from the content.
#[derive(Debug, Clone)]
pub struct NewEvent {
  pub kind:          EventKind,
  pub card_name:     String,
  pub catalog_id:    Option<String>,
  pub set_code:      Option<String>,
  pub lender_name:   String,
  pub borrower_name: String,
  pub timestamp:     i64,
  pub note:          Option<String>,
}

impl NewEvent {
  /// A loan of one copy of `card_name`, with all optional fields unset.
  pub fn lend(
    card_name: impl Into<String>,
    lender_name: impl Into<String>,
    borrower_name: impl Into<String>,
    timestamp: i64,
  ) -> Self {
    Self {
      kind: EventKind::Lend,
      card_name: card_name.into(),
      catalog_id: None,
      set_code: None,
      lender_name: lender_name.into(),
      borrower_name: borrower_name.into(),
      timestamp,
      note: None,
    }
  }

  /// The return that closes `lend`. Card, parties and catalog references are
  /// copied from the loan.
  pub fn closing(lend: &LendingEvent, timestamp: i64) -> Self {
    Self {
      kind: EventKind::Return { return_of: lend.id.clone() },
      card_name: lend.card_name.clone(),
      catalog_id: lend.catalog_id.clone(),
      set_code: lend.set_code.clone(),
      lender_name: lend.lender_name.clone(),
      borrower_name: lend.borrower_name.clone(),
      timestamp,
      note: None,
    }
  }

  /// Validate and assign the fingerprint.
  pub fn build(self) -> Result<LendingEvent> {
    let mut event = LendingEvent {
      id:            EventId::new(String::new()),
      kind:          self.kind,
      card_name:     self.card_name,
      catalog_id:    self.catalog_id,
      set_code:      self.set_code,
      lender_name:   self.lender_name,
      borrower_name: self.borrower_name,
      timestamp:     self.timestamp,
      note:          self.note,
    };
    RawEvent::from(event.clone()).validate()?;
    event.id = event.content_id();
    Ok(event)
  }

  /// Mint `copies` events from one action, at `timestamp + i`, so each copy
  /// gets its own fingerprint. Identical timestamps would collapse the batch
  /// into a single id.
  pub fn batch(self, copies: usize) -> Result<Vec<LendingEvent>> {
    if copies == 0 {
      return Err(Error::EmptyBatch);
    }
    (0..copies)
      .map(|i| {
        let mut copy = self.clone();
        copy.timestamp = i64::try_from(i)
          .ok()
          .and_then(|offset| self.timestamp.checked_add(offset))
          .ok_or(Error::TimestampOverflow)?;
        copy.build()
      })
      .collect()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn lend_raw() -> RawEvent {
    RawEvent {
      id: String::new(),
      kind: "lend".into(),
      card_name: "Sol Ring".into(),
      lender_name: "Alice".into(),
      borrower_name: "Bo".into(),
      timestamp: 1000,
      ..Default::default()
    }
  }

  #[test]
  fn well_formed_lend() {
    assert!(lend_raw().is_well_formed());
  }

  #[test]
  fn blank_names_are_malformed() {
    let mut raw = lend_raw();
    raw.card_name = "  ".into();
    assert_eq!(raw.validate(), Err(Error::MissingField("cardName")));

    let mut raw = lend_raw();
    raw.lender_name.clear();
    assert_eq!(raw.validate(), Err(Error::MissingField("lenderName")));

    let mut raw = lend_raw();
    raw.borrower_name.clear();
    assert_eq!(raw.validate(), Err(Error::MissingField("borrowerName")));
  }

  #[test]
  fn unknown_kind_is_malformed() {
    let mut raw = lend_raw();
    raw.kind = "borrow".into();
    assert_eq!(raw.validate(), Err(Error::UnknownKind("borrow".into())));
  }

  #[test]
  fn return_requires_target() {
    let mut raw = lend_raw();
    raw.kind = "return".into();
    assert_eq!(raw.validate(), Err(Error::ReturnWithoutTarget));

    raw.return_of_event_id = Some(String::new());
    assert_eq!(raw.validate(), Err(Error::ReturnWithoutTarget));

    raw.return_of_event_id = Some("abc".into());
    assert_eq!(
      raw.validate(),
      Ok(EventKind::Return { return_of: EventId::new("abc") })
    );
  }

  #[test]
  fn missing_id_is_filled_from_content() {
    let event = LendingEvent::try_from(lend_raw()).unwrap();
    assert_eq!(event.id, event.content_id());
  }

  #[test]
  fn present_id_is_kept() {
    let mut raw = lend_raw();
    raw.id = "producer-minted".into();
    let event = LendingEvent::try_from(raw).unwrap();
    assert_eq!(event.id.as_str(), "producer-minted");
  }

  #[test]
  fn json_uses_wire_field_names() {
    let lend = NewEvent::lend("Sol Ring", "Alice", "Bo", 1000).build().unwrap();
    let ret = NewEvent::closing(&lend, 2000).build().unwrap();

    let json = serde_json::to_value(&ret).unwrap();
    assert_eq!(json["type"], "return");
    assert_eq!(json["cardName"], "Sol Ring");
    assert_eq!(json["returnOfEventId"], lend.id.as_str());
    assert!(json.get("note").is_none());

    let back: LendingEvent = serde_json::from_value(json).unwrap();
    assert_eq!(back, ret);
  }

  #[test]
  fn malformed_json_fails_typed_deserialisation() {
    let json = serde_json::json!({ "type": "return", "cardName": "X",
      "lenderName": "A", "borrowerName": "B", "timestamp": 1 });
    assert!(serde_json::from_value::<LendingEvent>(json).is_err());
  }

  #[test]
  fn closing_copies_loan_content() {
    let mut new = NewEvent::lend("Sol Ring", "Alice", "Bo", 1000);
    new.set_code = Some("c21".into());
    let lend = new.build().unwrap();
    let ret = NewEvent::closing(&lend, 5000).build().unwrap();

    assert_eq!(ret.closes(), Some(&lend.id));
    assert_eq!(ret.set_code.as_deref(), Some("c21"));
    assert_eq!(ret.lender_name, "Alice");
    assert_ne!(ret.id, lend.id);
  }

  #[test]
  fn batch_mints_distinct_ids() {
    let events = NewEvent::lend("Sol Ring", "Alice", "Bo", 1000)
      .batch(3)
      .unwrap();
    let timestamps: Vec<_> = events.iter().map(|e| e.timestamp).collect();
    assert_eq!(timestamps, vec![1000, 1001, 1002]);

    let ids: std::collections::HashSet<_> =
      events.iter().map(|e| e.id.clone()).collect();
    assert_eq!(ids.len(), 3);
  }

  #[test]
  fn batch_past_the_end_of_time_is_rejected() {
    let err = NewEvent::lend("Sol Ring", "Alice", "Bo", i64::MAX - 1)
      .batch(3)
      .unwrap_err();
    assert_eq!(err, Error::TimestampOverflow);

    let last = NewEvent::lend("Sol Ring", "Alice", "Bo", i64::MAX - 1)
      .batch(2)
      .unwrap();
    assert_eq!(last[1].timestamp, i64::MAX);
  }

  #[test]
  fn null_id_is_filled_from_content() {
    let json = serde_json::json!({ "id": null, "type": "lend",
      "cardName": "Sol Ring", "lenderName": "Alice", "borrowerName": "Bo",
      "timestamp": 1000 });
    let event: LendingEvent = serde_json::from_value(json).unwrap();
    assert_eq!(event.id, event.content_id());
  }

  #[test]
  fn empty_batch_is_rejected() {
    let err = NewEvent::lend("Sol Ring", "Alice", "Bo", 1000)
      .batch(0)
      .unwrap_err();
    assert_eq!(err, Error::EmptyBatch);
  }

  #[test]
  fn involves_ignores_case() {
    let lend = NewEvent::lend("Sol Ring", "Alice", "Bo", 1000).build().unwrap();
    assert!(lend.involves("alice"));
    assert!(lend.involves("BO"));
    assert!(!lend.involves("Carol"));
  }
}
