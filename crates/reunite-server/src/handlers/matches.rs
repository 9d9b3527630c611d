//! Handlers for `/matches` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/matches` | `?status=` (default `pending`), `?min_confidence=` (default 60) |
//! | `POST` | `/matches` | Scorer only. Body: `NewMatch` JSON |
//! | `GET`  | `/matches/{id}` | Match with joined case and report |
//! | `PUT`  | `/matches/{id}/review` | Body: `{"status":"confirmed","notes":"…"}` |
//! | `GET`  | `/matches/{id}/reviews` | Review history, oldest first |

use axum::{
  Json,
  extract::{Path, Query, State, rejection::JsonRejection},
  http::StatusCode,
  response::IntoResponse,
};
use reunite_core::{
  Error,
  ledger::{MatchDetail, MatchQuery, MatchReview, MatchSummary, NewMatch, Review},
  lifecycle::MatchStatus,
  store::LedgerStore,
};
use serde::Deserialize;

use crate::{AppState, auth::Authenticated, error::ApiError, retry::retry_once};

// ─── List ────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ListParams {
  pub status:         Option<String>,
  pub min_confidence: Option<f64>,
}

impl ListParams {
  fn into_query(self) -> Result<MatchQuery, Error> {
    let defaults = MatchQuery::default();
    let status = match self.status.as_deref().map(str::trim) {
      None | Some("") => defaults.status,
      Some(s) => s.parse::<MatchStatus>()?,
    };
    Ok(MatchQuery {
      status,
      min_confidence: self.min_confidence.unwrap_or(defaults.min_confidence),
    })
  }
}

/// `GET /matches[?status=<status>&min_confidence=<n>]`
pub async fn list<S>(
  State(state): State<AppState<S>>,
  auth: Authenticated,
  Query(params): Query<ListParams>,
) -> Result<Json<Vec<MatchSummary>>, ApiError>
where
  S: LedgerStore + Clone + 'static,
{
  auth.reviewer()?;
  let query = params.into_query()?;
  let matches = retry_once("list_matches", || state.store.list_matches(query)).await?;
  Ok(Json(matches))
}

// ─── Record ──────────────────────────────────────────────────────────────────

/// `POST /matches` — written by the external scorer.
pub async fn create<S>(
  State(state): State<AppState<S>>,
  auth: Authenticated,
  body: Result<Json<NewMatch>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError>
where
  S: LedgerStore + Clone + 'static,
{
  auth.scorer()?;
  let Json(input) = body?;
  let recorded = state.store.record_match(input).await.map_err(ApiError::store)?;
  Ok((StatusCode::CREATED, Json(recorded)))
}

// ─── Detail ──────────────────────────────────────────────────────────────────

/// `GET /matches/{id}`
pub async fn get_one<S>(
  State(state): State<AppState<S>>,
  auth: Authenticated,
  Path(id): Path<i64>,
) -> Result<Json<MatchDetail>, ApiError>
where
  S: LedgerStore + Clone + 'static,
{
  auth.reviewer()?;
  let detail = retry_once("get_match_detail", || state.store.get_match_detail(id))
    .await?
    .ok_or_else(|| Error::not_found("match", id))?;
  Ok(Json(detail))
}

// ─── Review ──────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ReviewBody {
  pub status: String,
  #[serde(default)]
  pub notes:  Option<String>,
}

/// `PUT /matches/{id}/review`
///
/// Not retried: each call appends to the review history.
pub async fn review<S>(
  State(state): State<AppState<S>>,
  auth: Authenticated,
  Path(id): Path<i64>,
  body: Result<Json<ReviewBody>, JsonRejection>,
) -> Result<Json<MatchReview>, ApiError>
where
  S: LedgerStore + Clone + 'static,
{
  let actor = auth.reviewer()?;
  let Json(body) = body?;

  let review = Review {
    status:      body.status.parse()?,
    notes:       body.notes,
    reviewer_id: actor.id,
  };
  let logged = state.store.review_match(id, review).await.map_err(ApiError::store)?;
  Ok(Json(logged))
}

/// `GET /matches/{id}/reviews`
pub async fn reviews<S>(
  State(state): State<AppState<S>>,
  auth: Authenticated,
  Path(id): Path<i64>,
) -> Result<Json<Vec<MatchReview>>, ApiError>
where
  S: LedgerStore + Clone + 'static,
{
  auth.reviewer()?;
  let history = retry_once("list_match_reviews", || state.store.list_match_reviews(id)).await?;
  Ok(Json(history))
}
