//! Error type for `reunite-vault`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("encryption failed: {0}")]
  Encryption(String),

  /// The token was produced under a different key, was corrupted, or is not
  /// a token at all.
  #[error("decryption failed: {0}")]
  Decryption(String),

  #[error("plaintext must not be empty")]
  EmptyPlaintext,
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
