//! Error types for `lendcraft-share`.

use lendcraft_core::fact::EventId;
use thiserror::Error;

/// Why a share code could not be decoded. Any of these means the whole code
/// is rejected and nothing is imported.
#[derive(Debug, Error)]
pub enum CodecError {
  #[error("not a share code (missing \"MTG1:\" prefix)")]
  MissingTag,

  #[error("unsupported share code version {0:?}")]
  UnsupportedVersion(String),

  #[error("share code is not valid base64url: {0}")]
  Base64(#[from] base64::DecodeError),

  #[error("share code payload is corrupt: {0}")]
  Compression(#[from] std::io::Error),

  #[error("share code payload is not valid JSON: {0}")]
  Json(#[from] serde_json::Error),

  #[error("share code payload is not a list of events")]
  NotAnArray,
}

#[derive(Debug, Error)]
pub enum Error {
  #[error("invalid code: {0}")]
  InvalidCode(#[from] CodecError),

  #[error("invalid backup: {0}")]
  InvalidBackup(String),

  #[error("malformed event: {0}")]
  Malformed(#[from] lendcraft_core::Error),

  #[error("no loan with id {0}")]
  UnknownLoan(EventId),

  #[error("{0} is a return, not a loan")]
  NotALoan(EventId),

  #[error("loan {0} has already been returned")]
  AlreadyReturned(EventId),

  #[error("event {0} is already recorded")]
  Collision(EventId),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
  pub(crate) fn store<E>(e: E) -> Self
  where
    E: std::error::Error + Send + Sync + 'static,
  {
    Self::Store(Box::new(e))
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
