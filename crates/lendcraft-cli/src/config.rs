//! Runtime configuration: an optional TOML file plus `LENDCRAFT_*`
//! environment overrides.

use std::path::{Path, PathBuf};

use anyhow::Context as _;
use serde::Deserialize;

/// Shape of `lendcraft.toml`. Every key is optional.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Settings {
  /// SQLite file holding the ledger. A leading `~/` is expanded.
  pub store_path:          PathBuf,
  pub catalog_url:         String,
  pub catalog_timeout_ms:  u64,
  pub suggestion_ttl_secs: u64,
}

impl Default for Settings {
  fn default() -> Self {
    Self {
      store_path:          PathBuf::from("~/.local/share/lendcraft/ledger.db"),
      catalog_url:         "https://api.scryfall.com".to_string(),
      catalog_timeout_ms:  3_000,
      suggestion_ttl_secs: 60 * 60,
    }
  }
}

impl Settings {
  /// Read `path` (if it exists) and the environment, falling back to
  /// defaults for anything unset.
  pub fn load(path: &Path) -> anyhow::Result<Self> {
    let raw = config::Config::builder()
      .add_source(config::File::from(path).required(false))
      .add_source(config::Environment::with_prefix("LENDCRAFT"))
      .build()
      .with_context(|| format!("failed to read config file {}", path.display()))?;

    raw
      .try_deserialize()
      .context("failed to deserialise settings")
  }
}

/// Expand a leading `~` to the user's home directory.
pub fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn missing_file_yields_defaults() {
    let settings = Settings::load(Path::new("/nonexistent/lendcraft.toml")).unwrap();
    assert_eq!(settings.catalog_url, "https://api.scryfall.com");
    assert_eq!(settings.suggestion_ttl_secs, 3600);
  }

  #[test]
  fn paths_without_tilde_are_untouched() {
    let p = Path::new("/var/lib/lendcraft.db");
    assert_eq!(expand_tilde(p), p);
  }
}
