//! Persistence seam for a device's ledger.
//!
//! Backends implement [`LedgerStore`]; the exchange flows, the catalog cache
//! and the CLI are written against the trait only.

use std::future::Future;

use serde::{Deserialize, Serialize};

use crate::{
  fact::{EventId, LendingEvent},
  loans::{ActiveLoan, active_loans},
};

/// Settings key holding the local user's display name.
pub const LOCAL_NAME_KEY: &str = "myName";

/// A catalog suggestion list as cached by the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CachedSuggestions {
  pub results:   Vec<String>,
  /// Milliseconds since the Unix epoch.
  pub cached_at: i64,
}

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Abstraction over a device's ledger backend.
///
/// Events are append-only and keyed by their fingerprint: inserting an event
/// whose id is already present is a no-op that reports `false`. That makes
/// merging another device's events idempotent and order-independent.
///
/// The store also holds the small amount of device-local state that is not
/// part of the ledger: the known-friends set, scalar settings, and a
/// time-stamped cache of catalog suggestions.
///
/// A single writer per device is assumed; implementations only need the
/// atomicity of a single put-if-absent.
pub trait LedgerStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Events ────────────────────────────────────────────────────────────

  /// Persist `event` unless an event with the same id already exists.
  ///
  /// Returns `true` if the event was newly added and `false` if it was
  /// already known. Newly added events register both parties as friends.
  fn insert(
    &self,
    event: LendingEvent,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  /// Apply [`insert`](Self::insert) to every element independently and
  /// return how many were newly added.
  fn insert_batch(
    &self,
    events: Vec<LendingEvent>,
  ) -> impl Future<Output = Result<usize, Self::Error>> + Send + '_;

  /// Every event, ordered by timestamp (ties broken by id). The order is a
  /// display convenience only.
  fn all_events(
    &self,
  ) -> impl Future<Output = Result<Vec<LendingEvent>, Self::Error>> + Send + '_;

  fn event_by_id<'a>(
    &'a self,
    id: &'a EventId,
  ) -> impl Future<Output = Result<Option<LendingEvent>, Self::Error>> + Send + 'a;

  /// The loans currently open according to this ledger.
  fn active_loans(
    &self,
  ) -> impl Future<Output = Result<Vec<ActiveLoan>, Self::Error>> + Send + '_ {
    async move {
      let events = self.all_events().await?;
      Ok(active_loans(&events))
    }
  }

  // ── Friends ───────────────────────────────────────────────────────────

  fn add_friend(
    &self,
    name: String,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// Forget a friend. Events naming them are untouched. Returns whether the
  /// name was known.
  fn remove_friend(
    &self,
    name: String,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  /// All known friend names, sorted.
  fn friends(
    &self,
  ) -> impl Future<Output = Result<Vec<String>, Self::Error>> + Send + '_;

  // ── Settings ──────────────────────────────────────────────────────────

  fn setting<'a>(
    &'a self,
    key: &'a str,
  ) -> impl Future<Output = Result<Option<String>, Self::Error>> + Send + 'a;

  fn put_setting<'a>(
    &'a self,
    key: &'a str,
    value: String,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;

  /// The local user's display name, if one has been chosen.
  fn local_name(
    &self,
  ) -> impl Future<Output = Result<Option<String>, Self::Error>> + Send + '_ {
    self.setting(LOCAL_NAME_KEY)
  }

  fn set_local_name(
    &self,
    name: String,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_ {
    self.put_setting(LOCAL_NAME_KEY, name)
  }

  // ── Suggestion cache ──────────────────────────────────────────────────

  /// Cached catalog suggestions for `query`, regardless of age. Freshness is
  /// the caller's policy.
  fn cached_suggestions<'a>(
    &'a self,
    query: &'a str,
  ) -> impl Future<Output = Result<Option<CachedSuggestions>, Self::Error>> + Send + 'a;

  fn cache_suggestions<'a>(
    &'a self,
    query: &'a str,
    entry: CachedSuggestions,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;
}
