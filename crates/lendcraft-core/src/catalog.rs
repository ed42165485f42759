//! The external card catalog, seen as a capability.
//!
//! Lookups are best-effort enrichment for the person typing a card name.
//! Nothing in the ledger, the codec or the resolver depends on them, and a
//! failed lookup must never block recording or merging events.

use std::future::Future;

pub trait CardCatalog: Send + Sync {
  /// Card names completing `partial`. Failures degrade to an empty list.
  fn suggest<'a>(
    &'a self,
    partial: &'a str,
  ) -> impl Future<Output = Vec<String>> + Send + 'a;

  /// Locator of a small image for the card named exactly `exact_name`.
  fn image_url(&self, exact_name: &str) -> String;
}
