//! Handlers for `/cases` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/cases` | Multipart: `photos` (1–10 files) plus text fields |
//! | `GET`  | `/cases` | Optional `?status=active\|found\|closed`, default `active` |
//! | `GET`  | `/cases/{id}` | 404 if not found |
//! | `PUT`  | `/cases/{id}/status` | Body: `{"status":"found"}` |
//! | `GET`  | `/cases/{id}/matches` | Every match for the case |

use axum::{
  Json,
  extract::{Multipart, Path, Query, State, rejection::JsonRejection},
  http::StatusCode,
  response::IntoResponse,
};
use chrono::NaiveDate;
use reunite_core::{
  Error,
  case::{CaseRecord, CaseSummary, NewCase},
  evidence::{MAX_CASE_PHOTOS, MediaKind},
  ledger::CaseMatch,
  lifecycle::CaseStatus,
  store::LedgerStore,
};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::info;

use crate::{
  AppState,
  auth::Authenticated,
  error::ApiError,
  evidence::Folder,
  handlers::Form,
  retry::retry_once,
};

// ─── Register ────────────────────────────────────────────────────────────────

/// `POST /cases`
pub async fn create<S>(
  State(state): State<AppState<S>>,
  auth: Authenticated,
  multipart: Multipart,
) -> Result<impl IntoResponse, ApiError>
where
  S: LedgerStore + Clone + 'static,
{
  let actor = auth.reviewer()?;
  let mut form = Form::read(multipart).await?;

  let photos = form.take_files("photos");
  if photos.is_empty() {
    return Err(Error::validation("at least one photo is required").into());
  }
  if photos.len() > MAX_CASE_PHOTOS {
    return Err(
      Error::validation(format!("at most {MAX_CASE_PHOTOS} photos are allowed")).into(),
    );
  }
  for photo in &photos {
    photo.check(MediaKind::Photo)?;
  }

  let mut input = new_case_from_form(&form)?;
  input.photos = state
    .evidence
    .store_all(Folder::Cases, MediaKind::Photo, &photos)
    .await?;
  let stored = input.photos.clone();

  match state.store.register_case(input).await {
    Ok(receipt) => {
      info!(
        case_id = receipt.id,
        case_number = %receipt.case_number,
        registered_by = actor.id,
        "case registered"
      );
      Ok((StatusCode::CREATED, Json(receipt)))
    }
    Err(e) => {
      let e: Error = e.into();
      state.evidence.release(&stored, &e).await;
      Err(ApiError::Core(e))
    }
  }
}

fn new_case_from_form(form: &Form) -> Result<NewCase, Error> {
  let age = form
    .text("age")
    .map(|age| {
      age
        .trim()
        .parse::<u32>()
        .map_err(|_| Error::validation(format!("age must be a whole number, got {age:?}")))
    })
    .transpose()?;

  let last_seen_date = form
    .text("last_seen_date")
    .map(|date| {
      NaiveDate::parse_from_str(date.trim(), "%Y-%m-%d").map_err(|_| {
        Error::validation(format!("last_seen_date must be YYYY-MM-DD, got {date:?}"))
      })
    })
    .transpose()?;

  Ok(NewCase {
    case_number: form.text("case_number"),
    full_name: form.text("full_name").unwrap_or_default(),
    age,
    gender: form.text("gender"),
    national_id: form.text("national_id"),
    phone: form.text("phone"),
    email: form.text("email"),
    last_seen_location: form.text("last_seen_location"),
    last_seen_date,
    physical_description: form.text("physical_description"),
    photos: Vec::new(),
  })
}

// ─── List ────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ListParams {
  pub status: Option<String>,
}

/// `GET /cases[?status=<status>]`
pub async fn list<S>(
  State(state): State<AppState<S>>,
  auth: Authenticated,
  Query(params): Query<ListParams>,
) -> Result<Json<Vec<CaseSummary>>, ApiError>
where
  S: LedgerStore + Clone + 'static,
{
  auth.reviewer()?;
  let status = match params.status.as_deref().map(str::trim) {
    None | Some("") => CaseStatus::default(),
    Some(s) => s.parse()?,
  };

  let cases = retry_once("list_cases", || state.store.list_cases(status)).await?;
  Ok(Json(cases))
}

// ─── Get one ─────────────────────────────────────────────────────────────────

/// `GET /cases/{id}`
pub async fn get_one<S>(
  State(state): State<AppState<S>>,
  auth: Authenticated,
  Path(id): Path<i64>,
) -> Result<Json<CaseRecord>, ApiError>
where
  S: LedgerStore + Clone + 'static,
{
  auth.reviewer()?;
  let case = retry_once("get_case", || state.store.get_case(id))
    .await?
    .ok_or_else(|| Error::not_found("case", id))?;
  Ok(Json(case))
}

// ─── Status ──────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct StatusBody {
  pub status: String,
}

/// `PUT /cases/{id}/status` — body: `{"status":"found"}`
pub async fn update_status<S>(
  State(state): State<AppState<S>>,
  auth: Authenticated,
  Path(id): Path<i64>,
  body: Result<Json<StatusBody>, JsonRejection>,
) -> Result<Json<Value>, ApiError>
where
  S: LedgerStore + Clone + 'static,
{
  let actor = auth.reviewer()?;
  let Json(body) = body?;
  let status: CaseStatus = body.status.parse()?;

  retry_once("update_case_status", || state.store.update_case_status(id, status)).await?;
  info!(case_id = id, %status, updated_by = actor.id, "case status changed");
  Ok(Json(json!({ "id": id, "status": status })))
}

// ─── Matches for a case ──────────────────────────────────────────────────────

/// `GET /cases/{id}/matches`
pub async fn matches<S>(
  State(state): State<AppState<S>>,
  auth: Authenticated,
  Path(id): Path<i64>,
) -> Result<Json<Vec<CaseMatch>>, ApiError>
where
  S: LedgerStore + Clone + 'static,
{
  auth.reviewer()?;
  let matches = retry_once("list_matches_for_case", || {
    state.store.list_matches_for_case(id)
  })
  .await?;
  Ok(Json(matches))
}
