//! Card-name lookups against an external catalog.
//!
//! [`ScryfallCatalog`] talks to the Scryfall API; [`CachedCatalog`] layers
//! the store's suggestion cache in front of any [`CardCatalog`]. Both are
//! best-effort: failures are logged and degrade to "no suggestion".
//!
//! [`CardCatalog`]: lendcraft_core::catalog::CardCatalog

mod cache;
mod scryfall;

pub mod error;

pub use cache::{CachedCatalog, DEFAULT_SUGGESTION_TTL};
pub use error::{Error, Result};
pub use scryfall::{ScryfallCatalog, ScryfallConfig};

/// Queries shorter than this (in characters) never produce suggestions.
pub const MIN_QUERY_LEN: usize = 2;

pub(crate) fn too_short(partial: &str) -> bool {
  partial.trim().chars().count() < MIN_QUERY_LEN
}
