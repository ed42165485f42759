//! Async HTTP client for the Scryfall card catalog.

use std::time::Duration;

use lendcraft_core::catalog::CardCatalog;
use reqwest::{Client, Url};
use serde::Deserialize;

use crate::{Error, Result, too_short};

/// Connection settings for the catalog.
#[derive(Debug, Clone)]
pub struct ScryfallConfig {
  pub base_url: String,
  /// Kept short: a slow catalog must not hold up recording a loan.
  pub timeout:  Duration,
}

impl Default for ScryfallConfig {
  fn default() -> Self {
    Self {
      base_url: "https://api.scryfall.com".to_string(),
      timeout:  Duration::from_secs(3),
    }
  }
}

/// Shape of `GET /cards/autocomplete`.
#[derive(Deserialize)]
struct AutocompleteResponse {
  #[serde(default)]
  data: Vec<String>,
}

/// Scryfall-backed [`CardCatalog`].
///
/// Cheap to clone; the inner [`reqwest::Client`] is `Arc`-based.
#[derive(Clone)]
pub struct ScryfallCatalog {
  client:       Client,
  autocomplete: Url,
  named:        Url,
}

impl ScryfallCatalog {
  pub fn new(config: ScryfallConfig) -> Result<Self> {
    let client = Client::builder()
      .timeout(config.timeout)
      .user_agent(concat!("lendcraft/", env!("CARGO_PKG_VERSION")))
      .build()?;

    let base = format!("{}/", config.base_url.trim_end_matches('/'));
    let base = Url::parse(&base).map_err(|e| Error::BaseUrl {
      url:    config.base_url.clone(),
      reason: e.to_string(),
    })?;
    let join = |path: &str| {
      base.join(path).map_err(|e| Error::BaseUrl {
        url:    config.base_url.clone(),
        reason: e.to_string(),
      })
    };

    Ok(Self {
      client,
      autocomplete: join("cards/autocomplete")?,
      named: join("cards/named")?,
    })
  }

  /// `GET /cards/autocomplete?q=<partial>`
  async fn fetch_suggestions(&self, partial: &str) -> Result<Vec<String>> {
    let resp = self
      .client
      .get(self.autocomplete.clone())
      .query(&[("q", partial)])
      .send()
      .await?;

    if !resp.status().is_success() {
      return Err(Error::Status(resp.status()));
    }
    let body: AutocompleteResponse = resp.json().await?;
    Ok(body.data)
  }
}

impl CardCatalog for ScryfallCatalog {
  async fn suggest(&self, partial: &str) -> Vec<String> {
    if too_short(partial) {
      return Vec::new();
    }
    match self.fetch_suggestions(partial.trim()).await {
      Ok(names) => names,
      Err(e) => {
        tracing::warn!(error = %e, partial, "card autocomplete failed");
        Vec::new()
      }
    }
  }

  fn image_url(&self, exact_name: &str) -> String {
    let mut url = self.named.clone();
    url
      .query_pairs_mut()
      .append_pair("exact", exact_name)
      .append_pair("format", "image")
      .append_pair("version", "small");
    url.into()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn catalog(base_url: &str) -> ScryfallCatalog {
    ScryfallCatalog::new(ScryfallConfig {
      base_url: base_url.into(),
      timeout:  Duration::from_millis(200),
    })
    .unwrap()
  }

  #[test]
  fn image_url_escapes_card_name() {
    let c = catalog("https://api.scryfall.com");
    assert_eq!(
      c.image_url("Jace, the Mind Sculptor"),
      "https://api.scryfall.com/cards/named?exact=Jace%2C+the+Mind+Sculptor&format=image&version=small"
    );
  }

  #[test]
  fn base_url_trailing_slash_is_optional() {
    let a = catalog("https://example.test/api/");
    let b = catalog("https://example.test/api");
    assert_eq!(a.image_url("Sol Ring"), b.image_url("Sol Ring"));
    assert!(a.image_url("Sol Ring").starts_with("https://example.test/api/cards/named?"));
  }

  #[test]
  fn invalid_base_url_rejected() {
    let err = ScryfallCatalog::new(ScryfallConfig {
      base_url: "not a url".into(),
      ..ScryfallConfig::default()
    })
    .err()
    .unwrap();
    assert!(matches!(err, Error::BaseUrl { .. }));
  }

  #[tokio::test]
  async fn short_query_skips_network() {
    // Nothing listens on this address; a request would have to fail.
    let c = catalog("http://127.0.0.1:9");
    assert!(c.suggest("s").await.is_empty());
  }

  #[tokio::test]
  async fn unreachable_catalog_degrades_to_empty() {
    let c = catalog("http://127.0.0.1:9");
    assert!(c.suggest("sol ring").await.is_empty());
  }
}
