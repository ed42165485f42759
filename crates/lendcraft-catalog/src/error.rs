//! Error type for `lendcraft-catalog`.
//!
//! Only construction can fail loudly. Lookups swallow their errors after
//! logging them, since a missing suggestion must never block the caller.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("invalid catalog base URL {url:?}: {reason}")]
  BaseUrl { url: String, reason: String },

  #[error("http error: {0}")]
  Http(#[from] reqwest::Error),

  #[error("catalog returned {0}")]
  Status(reqwest::StatusCode),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
