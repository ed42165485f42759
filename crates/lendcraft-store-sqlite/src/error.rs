//! Error type for `lendcraft-store-sqlite`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("core error: {0}")]
  Core(#[from] lendcraft_core::Error),

  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("json error: {0}")]
  Json(#[from] serde_json::Error),

  /// A stored row does not decode into a valid event.
  #[error("corrupt event row {id}: {reason}")]
  CorruptRow { id: String, reason: String },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
