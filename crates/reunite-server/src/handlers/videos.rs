//! Handlers for `/videos` endpoints.
//!
//! Uploads are stored and listed here; frame extraction and comparison run
//! in an external processor, which reports progress through
//! `PUT /videos/{id}/status` and results through `POST /videos/{id}/matches`.

use axum::{
  Json,
  extract::{Multipart, Path, State, rejection::JsonRejection},
  http::StatusCode,
  response::IntoResponse,
};
use reunite_core::{
  Error,
  evidence::{EvidenceRef, MediaKind},
  lifecycle::VideoStatus,
  store::LedgerStore,
  video::{NewVideoMatch, VideoListing, VideoMatch, VideoUpload},
};
use serde::Deserialize;
use serde_json::{Value, json};

use crate::{
  AppState,
  auth::Authenticated,
  error::ApiError,
  evidence::Folder,
  handlers::Form,
  retry::retry_once,
};

/// `POST /videos` — multipart: one `video` file.
pub async fn upload<S>(
  State(state): State<AppState<S>>,
  auth: Authenticated,
  multipart: Multipart,
) -> Result<impl IntoResponse, ApiError>
where
  S: LedgerStore + Clone + 'static,
{
  let actor = auth.reviewer()?;
  let mut form = Form::read(multipart).await?;

  let mut videos = form.take_files("video");
  let video = match (videos.pop(), videos.is_empty()) {
    (Some(video), true) => video,
    (None, _) => return Err(Error::validation("a video file is required").into()),
    (Some(_), false) => {
      return Err(Error::validation("exactly one video is allowed").into());
    }
  };

  let reference = state
    .evidence
    .store(Folder::Videos, MediaKind::Video, &video)
    .await?;

  match state.store.record_video(reference.clone(), actor.id).await {
    Ok(upload) => Ok((StatusCode::CREATED, Json(upload))),
    Err(e) => {
      let e: Error = e.into();
      state.evidence.release(std::slice::from_ref(&reference), &e).await;
      Err(ApiError::Core(e))
    }
  }
}

/// `GET /videos`
pub async fn list<S>(
  State(state): State<AppState<S>>,
  auth: Authenticated,
) -> Result<Json<Vec<VideoListing>>, ApiError>
where
  S: LedgerStore + Clone + 'static,
{
  auth.reviewer()?;
  let videos = retry_once("list_videos", || state.store.list_videos()).await?;
  Ok(Json(videos))
}

/// `GET /videos/{id}`
pub async fn get_one<S>(
  State(state): State<AppState<S>>,
  auth: Authenticated,
  Path(id): Path<i64>,
) -> Result<Json<VideoUpload>, ApiError>
where
  S: LedgerStore + Clone + 'static,
{
  auth.reviewer()?;
  let video = retry_once("get_video", || state.store.get_video(id))
    .await?
    .ok_or_else(|| Error::not_found("video", id))?;
  Ok(Json(video))
}

#[derive(Debug, Deserialize)]
pub struct StatusBody {
  pub status: String,
}

/// `PUT /videos/{id}/status` — body: `{"status":"processing"}`
pub async fn update_status<S>(
  State(state): State<AppState<S>>,
  auth: Authenticated,
  Path(id): Path<i64>,
  body: Result<Json<StatusBody>, JsonRejection>,
) -> Result<Json<Value>, ApiError>
where
  S: LedgerStore + Clone + 'static,
{
  auth.scorer()?;
  let Json(body) = body?;
  let status: VideoStatus = body.status.parse()?;

  retry_once("update_video_status", || state.store.update_video_status(id, status)).await?;
  Ok(Json(json!({ "id": id, "processing_status": status })))
}

/// `GET /videos/{id}/matches`
pub async fn matches<S>(
  State(state): State<AppState<S>>,
  auth: Authenticated,
  Path(id): Path<i64>,
) -> Result<Json<Vec<VideoMatch>>, ApiError>
where
  S: LedgerStore + Clone + 'static,
{
  auth.reviewer()?;
  let matches = retry_once("list_video_matches", || state.store.list_video_matches(id)).await?;
  Ok(Json(matches))
}

#[derive(Debug, Deserialize)]
pub struct VideoMatchBody {
  pub case_id:        i64,
  pub timestamp_secs: f64,
  #[serde(default)]
  pub frame:          Option<EvidenceRef>,
  pub confidence:     f64,
}

/// `POST /videos/{id}/matches` — a frame the processor flagged.
pub async fn record_match<S>(
  State(state): State<AppState<S>>,
  auth: Authenticated,
  Path(video_id): Path<i64>,
  body: Result<Json<VideoMatchBody>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError>
where
  S: LedgerStore + Clone + 'static,
{
  auth.scorer()?;
  let Json(body) = body?;

  let input = NewVideoMatch {
    video_id,
    case_id: body.case_id,
    timestamp_secs: body.timestamp_secs,
    frame: body.frame,
    confidence: body.confidence,
  };
  let recorded = state
    .store
    .record_video_match(input)
    .await
    .map_err(ApiError::store)?;
  Ok((StatusCode::CREATED, Json(recorded)))
}
