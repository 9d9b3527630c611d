//! API error type and [`axum::response::IntoResponse`] implementation.

use axum::{
  Json,
  extract::{multipart::MultipartError, rejection::JsonRejection},
  http::{HeaderValue, StatusCode, header},
  response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error("authentication required")]
  Unauthorized,

  #[error("forbidden: {0}")]
  Forbidden(&'static str),

  #[error("bad request: {0}")]
  BadRequest(String),

  #[error(transparent)]
  Core(#[from] reunite_core::Error),
}

impl ApiError {
  /// Convert a backend error into the shared taxonomy.
  pub fn store<E: Into<reunite_core::Error>>(e: E) -> Self { Self::Core(e.into()) }

  pub fn status(&self) -> StatusCode {
    use reunite_core::Error as Core;

    match self {
      Self::Unauthorized => StatusCode::UNAUTHORIZED,
      Self::Forbidden(_) => StatusCode::FORBIDDEN,
      Self::BadRequest(_) => StatusCode::BAD_REQUEST,
      Self::Core(e) => match e {
        Core::Validation(_) => StatusCode::BAD_REQUEST,
        Core::NotFound { .. } => StatusCode::NOT_FOUND,
        Core::Referential(_) => StatusCode::UNPROCESSABLE_ENTITY,
        Core::Decryption(_) | Core::Serialization(_) => {
          StatusCode::INTERNAL_SERVER_ERROR
        }
        Core::StorageUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        Core::StorageTimeout(_) => StatusCode::GATEWAY_TIMEOUT,
      },
    }
  }
}

impl From<JsonRejection> for ApiError {
  fn from(rejection: JsonRejection) -> Self { Self::BadRequest(rejection.body_text()) }
}

impl From<MultipartError> for ApiError {
  fn from(e: MultipartError) -> Self { Self::BadRequest(e.body_text()) }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let status = self.status();
    if status.is_server_error() {
      tracing::error!(error = %self, "request failed");
    }

    let message = match &self {
      Self::Core(e) => e.to_string(),
      other => other.to_string(),
    };
    let mut res = (status, Json(json!({ "error": message }))).into_response();

    if status == StatusCode::UNAUTHORIZED {
      res.headers_mut().insert(
        header::WWW_AUTHENTICATE,
        HeaderValue::from_static("Basic realm=\"reunite\""),
      );
    }
    res
  }
}

#[cfg(test)]
mod tests {
  use std::time::Duration;

  use super::*;

  #[test]
  fn taxonomy_maps_to_status_codes() {
    use reunite_core::Error as Core;

    let cases = [
      (Core::validation("bad"), StatusCode::BAD_REQUEST),
      (Core::not_found("case", 1), StatusCode::NOT_FOUND),
      (Core::Referential("case 1 does not exist".into()), StatusCode::UNPROCESSABLE_ENTITY),
      (Core::Decryption("auth".into()), StatusCode::INTERNAL_SERVER_ERROR),
      (Core::StorageUnavailable("closed".into()), StatusCode::SERVICE_UNAVAILABLE),
      (Core::StorageTimeout(Duration::from_secs(5)), StatusCode::GATEWAY_TIMEOUT),
    ];
    for (error, expected) in cases {
      assert_eq!(ApiError::from(error).status(), expected);
    }
    assert_eq!(ApiError::Unauthorized.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(ApiError::Forbidden("reviewers only").status(), StatusCode::FORBIDDEN);
  }

  #[test]
  fn unauthorized_carries_challenge() {
    let res = ApiError::Unauthorized.into_response();
    assert!(res.headers().contains_key(header::WWW_AUTHENTICATE));
  }
}
