//! Single-retry policy for transient storage failures.
//!
//! Only reads and idempotent writes go through [`retry_once`]. Inserts and
//! reviews append rows, so repeating them after an ambiguous failure could
//! duplicate data; those call the store directly.

use std::{future::Future, time::Duration};

use tracing::warn;

/// Pause before the second attempt.
pub const RETRY_BACKOFF: Duration = Duration::from_millis(100);

/// Run `op`, and run it once more after [`RETRY_BACKOFF`] if the first attempt
/// failed with a transient storage error.
pub async fn retry_once<T, E, F, Fut>(
  operation: &'static str,
  mut op: F,
) -> Result<T, reunite_core::Error>
where
  F: FnMut() -> Fut,
  Fut: Future<Output = Result<T, E>>,
  E: Into<reunite_core::Error>,
{
  match op().await.map_err(Into::into) {
    Err(e) if e.is_transient() => {
      warn!(operation, error = %e, "transient storage error; retrying once");
      tokio::time::sleep(RETRY_BACKOFF).await;
      op().await.map_err(Into::into)
    }
    other => other,
  }
}
