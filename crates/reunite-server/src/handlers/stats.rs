//! `GET /stats/dashboard`

use axum::{Json, extract::State};
use reunite_core::{stats::DashboardStats, store::LedgerStore};

use crate::{AppState, auth::Authenticated, error::ApiError, retry::retry_once};

/// Counts and success rate, recomputed on every request.
pub async fn dashboard<S>(
  State(state): State<AppState<S>>,
  auth: Authenticated,
) -> Result<Json<DashboardStats>, ApiError>
where
  S: LedgerStore + Clone + 'static,
{
  auth.reviewer()?;
  let stats = retry_once("compute_stats", || state.store.compute_stats()).await?;
  Ok(Json(stats))
}
