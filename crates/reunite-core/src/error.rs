//! Error taxonomy shared by every Reunite crate.
//!
//! Backends keep their own error enums and convert into this one at the
//! boundary, so callers can decide on retries and status codes without
//! knowing which store is underneath.

use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  /// Malformed or missing input. Never retried.
  #[error("validation error: {0}")]
  Validation(String),

  #[error("{entity} not found: {id}")]
  NotFound { entity: &'static str, id: String },

  /// The sensitive field could not be read with the current vault key.
  #[error("decryption error: {0}")]
  Decryption(String),

  /// A match (or video match) referenced a case, report, or video that does
  /// not exist at creation time.
  #[error("referential error: {0}")]
  Referential(String),

  #[error("storage call timed out after {0:?}")]
  StorageTimeout(Duration),

  #[error("storage unavailable: {0}")]
  StorageUnavailable(String),

  #[error("serialization error: {0}")]
  Serialization(#[from] serde_json::Error),
}

impl Error {
  pub fn validation(message: impl Into<String>) -> Self {
    Self::Validation(message.into())
  }

  pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
    Self::NotFound { entity, id: id.to_string() }
  }

  /// Infrastructure failures the calling layer may retry once.
  pub fn is_transient(&self) -> bool {
    matches!(self, Self::StorageTimeout(_) | Self::StorageUnavailable(_))
  }

  /// Whether the failed write may still have committed. A timed-out call
  /// keeps running on the storage side; every other error rolls back.
  pub fn may_have_committed(&self) -> bool { matches!(self, Self::StorageTimeout(_)) }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
