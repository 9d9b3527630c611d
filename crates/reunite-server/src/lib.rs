//! HTTP API for the Reunite ledger.
//!
//! Exposes an axum [`Router`] backed by any [`LedgerStore`], with HTTP Basic
//! authentication against configured users and an on-disk evidence store for
//! uploaded photos and videos.

pub mod auth;
pub mod config;
pub mod error;
pub mod evidence;
pub mod handlers;
pub mod retry;

pub use error::ApiError;

use std::sync::Arc;

use axum::{
  Router,
  extract::DefaultBodyLimit,
  routing::{get, post, put},
};
use reunite_core::{
  evidence::{MAX_CASE_PHOTOS, PHOTO_MAX_BYTES, VIDEO_MAX_BYTES},
  store::LedgerStore,
};
use tower_http::trace::TraceLayer;

use auth::UserDirectory;
use evidence::DiskEvidenceStore;
use handlers::{cases, matches, reports, stats, videos};

/// Room for multipart boundaries and text fields on top of the file bytes.
pub const FORM_OVERHEAD_BYTES: usize = 1024 * 1024;

pub const CASE_BODY_LIMIT: usize = MAX_CASE_PHOTOS * PHOTO_MAX_BYTES + FORM_OVERHEAD_BYTES;
pub const REPORT_BODY_LIMIT: usize = PHOTO_MAX_BYTES + FORM_OVERHEAD_BYTES;
pub const VIDEO_BODY_LIMIT: usize = VIDEO_MAX_BYTES + FORM_OVERHEAD_BYTES;

// ─── Application state ───────────────────────────────────────────────────────

/// Shared state threaded through all axum handlers.
#[derive(Clone)]
pub struct AppState<S: LedgerStore> {
  pub store:    Arc<S>,
  pub evidence: Arc<DiskEvidenceStore>,
  pub users:    Arc<UserDirectory>,
}

// ─── Router ──────────────────────────────────────────────────────────────────

/// Build the full API router.
pub fn router<S>(state: AppState<S>) -> Router
where
  S: LedgerStore + Clone + 'static,
{
  Router::new()
    .route("/health", get(handlers::health))
    // Public intake
    .route(
      "/public/report",
      post(reports::submit::<S>).layer(DefaultBodyLimit::max(REPORT_BODY_LIMIT)),
    )
    .route("/public/report/{report_id}", get(reports::summary::<S>))
    // Cases
    .route(
      "/cases",
      get(cases::list::<S>)
        .post(cases::create::<S>)
        .layer(DefaultBodyLimit::max(CASE_BODY_LIMIT)),
    )
    .route("/cases/{id}", get(cases::get_one::<S>))
    .route("/cases/{id}/status", put(cases::update_status::<S>))
    .route("/cases/{id}/matches", get(cases::matches::<S>))
    // Match ledger
    .route("/matches", get(matches::list::<S>).post(matches::create::<S>))
    .route("/matches/{id}", get(matches::get_one::<S>))
    .route("/matches/{id}/review", put(matches::review::<S>))
    .route("/matches/{id}/reviews", get(matches::reviews::<S>))
    // Aggregates
    .route("/stats/dashboard", get(stats::dashboard::<S>))
    // Scorer work queue
    .route("/reports/unprocessed", get(reports::unprocessed::<S>))
    .route("/reports/{id}/processed", post(reports::mark_processed::<S>))
    // Video intake
    .route(
      "/videos",
      get(videos::list::<S>)
        .post(videos::upload::<S>)
        .layer(DefaultBodyLimit::max(VIDEO_BODY_LIMIT)),
    )
    .route("/videos/{id}", get(videos::get_one::<S>))
    .route("/videos/{id}/status", put(videos::update_status::<S>))
    .route(
      "/videos/{id}/matches",
      get(videos::matches::<S>).post(videos::record_match::<S>),
    )
    .layer(TraceLayer::new_for_http())
    .with_state(state)
}

#[cfg(test)]
mod tests;
