//! Handlers for found-person reports: the public submission surface and the
//! scorer's work queue.

use axum::{
  Json,
  extract::{Multipart, Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use reunite_core::{
  Error,
  evidence::MediaKind,
  report::{NewReport, Report, ReportSummary},
  store::LedgerStore,
};
use tracing::debug;

use crate::{
  AppState,
  auth::Authenticated,
  error::ApiError,
  evidence::Folder,
  handlers::Form,
  retry::retry_once,
};

/// `POST /public/report` — multipart: one `photo` plus text fields. No auth.
pub async fn submit<S>(
  State(state): State<AppState<S>>,
  multipart: Multipart,
) -> Result<impl IntoResponse, ApiError>
where
  S: LedgerStore + Clone + 'static,
{
  let mut form = Form::read(multipart).await?;

  let mut photos = form.take_files("photo");
  let photo = match (photos.pop(), photos.is_empty()) {
    (Some(photo), true) => photo,
    (None, _) => return Err(Error::validation("a photo is required").into()),
    (Some(_), false) => {
      return Err(Error::validation("exactly one photo is allowed").into());
    }
  };

  let found_location = form.text("found_location").unwrap_or_default();
  if found_location.is_empty() {
    return Err(Error::validation("found location is required").into());
  }

  let reference = state
    .evidence
    .store(Folder::Reports, MediaKind::Photo, &photo)
    .await?;

  let input = NewReport {
    photo: reference.clone(),
    reporter_name: form.text("reporter_name"),
    reporter_phone: form.text("reporter_phone"),
    found_location,
    found_address: form.text("found_address"),
    additional_notes: form.text("additional_notes"),
  };

  match state.store.submit_report(input).await {
    Ok(receipt) => Ok((StatusCode::CREATED, Json(receipt))),
    Err(e) => {
      let e: Error = e.into();
      state.evidence.release(std::slice::from_ref(&reference), &e).await;
      Err(ApiError::Core(e))
    }
  }
}

/// `GET /public/report/{report_id}` — the submitter's receipt. No auth.
pub async fn summary<S>(
  State(state): State<AppState<S>>,
  Path(report_id): Path<String>,
) -> Result<Json<ReportSummary>, ApiError>
where
  S: LedgerStore + Clone + 'static,
{
  let summary = retry_once("get_report_summary", || {
    state.store.get_report_summary(report_id.clone())
  })
  .await?
  .ok_or_else(|| Error::not_found("report", &report_id))?;
  Ok(Json(summary))
}

/// `GET /reports/unprocessed` — scorer work queue, oldest first.
pub async fn unprocessed<S>(
  State(state): State<AppState<S>>,
  auth: Authenticated,
) -> Result<Json<Vec<Report>>, ApiError>
where
  S: LedgerStore + Clone + 'static,
{
  auth.scorer()?;
  let reports =
    retry_once("list_unprocessed_reports", || state.store.list_unprocessed_reports())
      .await?;
  Ok(Json(reports))
}

/// `POST /reports/{id}/processed`
pub async fn mark_processed<S>(
  State(state): State<AppState<S>>,
  auth: Authenticated,
  Path(id): Path<i64>,
) -> Result<StatusCode, ApiError>
where
  S: LedgerStore + Clone + 'static,
{
  let actor = auth.scorer()?;
  retry_once("mark_report_processed", || state.store.mark_report_processed(id)).await?;
  debug!(report_id = id, marked_by = actor.id, "report processed");
  Ok(StatusCode::NO_CONTENT)
}
