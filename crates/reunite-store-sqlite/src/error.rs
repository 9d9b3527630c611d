//! Error type for `reunite-store-sqlite`.

use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("core error: {0}")]
  Core(#[from] reunite_core::Error),

  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("vault error: {0}")]
  Vault(#[from] reunite_vault::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  /// A column held a value the domain types do not recognise.
  #[error("corrupt row: {0}")]
  CorruptRow(String),

  #[error("storage call timed out after {0:?}")]
  Timeout(Duration),

  #[error("case number already exists: {0}")]
  DuplicateCaseNumber(String),

  #[error("case not found: {0}")]
  CaseNotFound(i64),

  #[error("report not found: {0}")]
  ReportNotFound(i64),

  #[error("match not found: {0}")]
  MatchNotFound(i64),

  #[error("video not found: {0}")]
  VideoNotFound(i64),

  /// A match referenced a row that does not exist.
  #[error("{entity} {id} does not exist")]
  MissingReference { entity: &'static str, id: i64 },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

impl From<Error> for reunite_core::Error {
  fn from(e: Error) -> Self {
    use reunite_core::Error as Core;

    match e {
      Error::Core(inner) => inner,
      Error::Timeout(after) => Core::StorageTimeout(after),
      Error::Database(tokio_rusqlite::Error::ConnectionClosed) => {
        Core::StorageUnavailable("database connection closed".into())
      }
      Error::Database(inner) => Core::StorageUnavailable(inner.to_string()),
      Error::Vault(reunite_vault::Error::Decryption(msg)) => Core::Decryption(msg),
      Error::Vault(reunite_vault::Error::EmptyPlaintext) => {
        Core::validation("national id must not be empty")
      }
      Error::Vault(inner) => Core::StorageUnavailable(inner.to_string()),
      Error::DateParse(msg) | Error::CorruptRow(msg) => {
        Core::StorageUnavailable(format!("unreadable row: {msg}"))
      }
      Error::DuplicateCaseNumber(number) => {
        Core::validation(format!("case number {number} already exists"))
      }
      Error::CaseNotFound(id) => Core::not_found("case", id),
      Error::ReportNotFound(id) => Core::not_found("report", id),
      Error::MatchNotFound(id) => Core::not_found("match", id),
      Error::VideoNotFound(id) => Core::not_found("video", id),
      Error::MissingReference { entity, id } => {
        Core::Referential(format!("{entity} {id} does not exist"))
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn classification_into_core_taxonomy() {
    let core: reunite_core::Error = Error::Timeout(Duration::from_millis(5)).into();
    assert!(matches!(core, reunite_core::Error::StorageTimeout(_)));

    let core: reunite_core::Error =
      Error::MissingReference { entity: "case", id: 9 }.into();
    assert!(matches!(core, reunite_core::Error::Referential(_)));

    let core: reunite_core::Error = Error::MatchNotFound(3).into();
    assert!(matches!(core, reunite_core::Error::NotFound { entity: "match", .. }));

    let core: reunite_core::Error =
      Error::Database(tokio_rusqlite::Error::ConnectionClosed).into();
    assert!(core.is_transient());
  }
}
