//! A time-bounded suggestion cache in front of a [`CardCatalog`].

use std::time::Duration;

use chrono::Utc;
use lendcraft_core::{
  catalog::CardCatalog,
  store::{CachedSuggestions, LedgerStore},
};

use crate::too_short;

/// Serves suggestions from the store's cache while they are younger than
/// `ttl`, otherwise asks `inner` and remembers the answer.
///
/// Empty answers are not cached: the inner catalog reports failures as empty
/// lists, and a transient outage should not stick for a whole TTL.
pub struct CachedCatalog<C, S> {
  inner: C,
  store: S,
  ttl:   Duration,
}

/// How long a cached suggestion list stays fresh unless configured otherwise.
pub const DEFAULT_SUGGESTION_TTL: Duration = Duration::from_secs(60 * 60);

impl<C, S> CachedCatalog<C, S> {
  pub fn new(inner: C, store: S, ttl: Duration) -> Self {
    Self { inner, store, ttl }
  }
}

impl<C, S> CardCatalog for CachedCatalog<C, S>
where
  C: CardCatalog,
  S: LedgerStore,
{
  async fn suggest(&self, partial: &str) -> Vec<String> {
    if too_short(partial) {
      return Vec::new();
    }

    let now = Utc::now().timestamp_millis();
    let ttl_ms = i64::try_from(self.ttl.as_millis()).unwrap_or(i64::MAX);

    match self.store.cached_suggestions(partial).await {
      Ok(Some(entry)) if now.saturating_sub(entry.cached_at) < ttl_ms => {
        tracing::debug!(partial, "suggestion cache hit");
        return entry.results;
      }
      Ok(_) => {}
      Err(e) => tracing::warn!(error = %e, "reading suggestion cache failed"),
    }

    let results = self.inner.suggest(partial).await;
    if !results.is_empty() {
      let entry = CachedSuggestions { results: results.clone(), cached_at: now };
      if let Err(e) = self.store.cache_suggestions(partial, entry).await {
        tracing::warn!(error = %e, "writing suggestion cache failed");
      }
    }
    results
  }

  fn image_url(&self, exact_name: &str) -> String {
    self.inner.image_url(exact_name)
  }
}

#[cfg(test)]
mod tests {
  use std::sync::atomic::{AtomicUsize, Ordering};

  use lendcraft_store_sqlite::SqliteStore;

  use super::*;

  /// Answers every query with a fixed list and counts how often it was asked.
  struct FixedCatalog {
    answer: Vec<String>,
    calls:  AtomicUsize,
  }

  impl FixedCatalog {
    fn new(answer: &[&str]) -> Self {
      Self {
        answer: answer.iter().map(|s| s.to_string()).collect(),
        calls:  AtomicUsize::new(0),
      }
    }
  }

  impl CardCatalog for FixedCatalog {
    async fn suggest(&self, _partial: &str) -> Vec<String> {
      self.calls.fetch_add(1, Ordering::SeqCst);
      self.answer.clone()
    }

    fn image_url(&self, exact_name: &str) -> String {
      format!("img://{exact_name}")
    }
  }

  async fn cached(answer: &[&str]) -> CachedCatalog<FixedCatalog, SqliteStore> {
    let store = SqliteStore::open_in_memory().await.unwrap();
    CachedCatalog::new(FixedCatalog::new(answer), store, DEFAULT_SUGGESTION_TTL)
  }

  #[tokio::test]
  async fn second_lookup_is_served_from_cache() {
    let c = cached(&["Sol Ring"]).await;

    assert_eq!(c.suggest("sol").await, vec!["Sol Ring"]);
    assert_eq!(c.suggest("SOL").await, vec!["Sol Ring"]);
    assert_eq!(c.inner.calls.load(Ordering::SeqCst), 1);
  }

  #[tokio::test]
  async fn stale_entry_is_refreshed() {
    let c = cached(&["Sol Ring"]).await;
    let two_hours_ago = Utc::now().timestamp_millis() - 2 * 60 * 60 * 1000;
    c.store
      .cache_suggestions(
        "sol",
        CachedSuggestions { results: vec!["Old".into()], cached_at: two_hours_ago },
      )
      .await
      .unwrap();

    assert_eq!(c.suggest("sol").await, vec!["Sol Ring"]);
    assert_eq!(c.inner.calls.load(Ordering::SeqCst), 1);

    let entry = c.store.cached_suggestions("sol").await.unwrap().unwrap();
    assert_eq!(entry.results, vec!["Sol Ring"]);
  }

  #[tokio::test]
  async fn empty_answers_are_not_cached() {
    let c = cached(&[]).await;
    assert!(c.suggest("zzz").await.is_empty());
    assert!(c.suggest("zzz").await.is_empty());
    assert_eq!(c.inner.calls.load(Ordering::SeqCst), 2);
    assert!(c.store.cached_suggestions("zzz").await.unwrap().is_none());
  }

  #[tokio::test]
  async fn short_queries_skip_everything() {
    let c = cached(&["Sol Ring"]).await;
    assert!(c.suggest("s").await.is_empty());
    assert_eq!(c.inner.calls.load(Ordering::SeqCst), 0);
  }

  #[tokio::test]
  async fn image_url_passes_through() {
    let c = cached(&[]).await;
    assert_eq!(c.image_url("Sol Ring"), "img://Sol Ring");
  }
}
