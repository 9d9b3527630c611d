//! The `LedgerStore` trait.
//!
//! The trait is implemented by storage backends (e.g. `reunite-store-sqlite`).
//! The HTTP layer depends on this abstraction, not on any concrete backend.

use std::future::Future;

use crate::{
  case::{CaseReceipt, CaseRecord, CaseSummary, NewCase},
  evidence::EvidenceRef,
  ledger::{
    CaseMatch, Match, MatchDetail, MatchQuery, MatchReview, MatchSummary,
    NewMatch, Review,
  },
  lifecycle::{CaseStatus, VideoStatus},
  report::{NewReport, Report, ReportReceipt, ReportSummary},
  stats::DashboardStats,
  video::{NewVideoMatch, VideoListing, VideoMatch, VideoUpload},
};

/// Abstraction over a Reunite ledger backend.
///
/// Reads of a single entity return `Ok(None)` when it does not exist; writes
/// against a missing entity fail with the backend's not-found error.
/// Backend errors convert into the shared [`crate::Error`] taxonomy so callers
/// can classify them.
///
/// All methods return `Send` futures so the trait can be used in multi-threaded
/// async runtimes (e.g. tokio with `axum`).
pub trait LedgerStore: Send + Sync {
  type Error: std::error::Error + Into<crate::Error> + Send + Sync + 'static;

  // ── Case registry ─────────────────────────────────────────────────────

  /// Validate and persist a new case with status `active`.
  ///
  /// Assigns a case number when `input.case_number` is `None`. The national
  /// ID, if any, is stored only as ciphertext.
  fn register_case(
    &self,
    input: NewCase,
  ) -> impl Future<Output = Result<CaseReceipt, Self::Error>> + Send + '_;

  /// Cases with the given status, newest first.
  fn list_cases(
    &self,
    status: CaseStatus,
  ) -> impl Future<Output = Result<Vec<CaseSummary>, Self::Error>> + Send + '_;

  /// The full record with the national ID decrypted.
  fn get_case(
    &self,
    id: i64,
  ) -> impl Future<Output = Result<Option<CaseRecord>, Self::Error>> + Send + '_;

  /// Overwrite the case status. Every transition is permitted.
  fn update_case_status(
    &self,
    id: i64,
    status: CaseStatus,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  // ── Report intake ─────────────────────────────────────────────────────

  fn submit_report(
    &self,
    input: NewReport,
  ) -> impl Future<Output = Result<ReportReceipt, Self::Error>> + Send + '_;

  /// Look up the receipt projection by public report ID.
  fn get_report_summary(
    &self,
    report_id: String,
  ) -> impl Future<Output = Result<Option<ReportSummary>, Self::Error>> + Send + '_;

  /// Reports the scorer has not compared yet, oldest first.
  fn list_unprocessed_reports(
    &self,
  ) -> impl Future<Output = Result<Vec<Report>, Self::Error>> + Send + '_;

  fn mark_report_processed(
    &self,
    id: i64,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  // ── Match ledger ──────────────────────────────────────────────────────

  /// Insert a scorer-produced match after checking the confidence range and
  /// that both the case and the report exist. Photo references are
  /// snapshotted at this moment.
  fn record_match(
    &self,
    input: NewMatch,
  ) -> impl Future<Output = Result<Match, Self::Error>> + Send + '_;

  /// Matches with `status == query.status` and
  /// `confidence >= query.min_confidence`, ordered by confidence descending,
  /// then creation time descending.
  fn list_matches(
    &self,
    query: MatchQuery,
  ) -> impl Future<Output = Result<Vec<MatchSummary>, Self::Error>> + Send + '_;

  fn get_match_detail(
    &self,
    id: i64,
  ) -> impl Future<Output = Result<Option<MatchDetail>, Self::Error>> + Send + '_;

  /// Write status, notes, reviewer and review time in one update, and append
  /// the decision to the review log. Re-review overwrites the current status.
  fn review_match(
    &self,
    id: i64,
    review: Review,
  ) -> impl Future<Output = Result<MatchReview, Self::Error>> + Send + '_;

  /// The review log for one match, oldest first. Fails with not-found when
  /// the match does not exist.
  fn list_match_reviews(
    &self,
    match_id: i64,
  ) -> impl Future<Output = Result<Vec<MatchReview>, Self::Error>> + Send + '_;

  /// Every match for a case regardless of status, by confidence then recency.
  fn list_matches_for_case(
    &self,
    case_id: i64,
  ) -> impl Future<Output = Result<Vec<CaseMatch>, Self::Error>> + Send + '_;

  // ── Aggregates ────────────────────────────────────────────────────────

  fn compute_stats(
    &self,
  ) -> impl Future<Output = Result<DashboardStats, Self::Error>> + Send + '_;

  // ── Video intake ──────────────────────────────────────────────────────

  fn record_video(
    &self,
    video: EvidenceRef,
    uploaded_by: i64,
  ) -> impl Future<Output = Result<VideoUpload, Self::Error>> + Send + '_;

  /// Uploads newest first, each with its match count.
  fn list_videos(
    &self,
  ) -> impl Future<Output = Result<Vec<VideoListing>, Self::Error>> + Send + '_;

  fn get_video(
    &self,
    id: i64,
  ) -> impl Future<Output = Result<Option<VideoUpload>, Self::Error>> + Send + '_;

  fn update_video_status(
    &self,
    id: i64,
    status: VideoStatus,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  fn record_video_match(
    &self,
    input: NewVideoMatch,
  ) -> impl Future<Output = Result<VideoMatch, Self::Error>> + Send + '_;

  /// Matches for one video ordered by position in the video.
  fn list_video_matches(
    &self,
    video_id: i64,
  ) -> impl Future<Output = Result<Vec<VideoMatch>, Self::Error>> + Send + '_;
}
