//! Error types for `lendcraft-core`.

use thiserror::Error;

/// Why a fact record failed the well-formedness check.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
  #[error("fact is missing required field `{0}`")]
  MissingField(&'static str),

  #[error("unknown event type: {0:?}")]
  UnknownKind(String),

  #[error("return fact does not reference the loan it closes")]
  ReturnWithoutTarget,

  #[error("cannot mint a batch of zero copies")]
  EmptyBatch,

  #[error("timestamp out of range")]
  TimestampOverflow,
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
