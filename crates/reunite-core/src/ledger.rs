//! Match ledger types — candidate pairings between a case and a report.
//!
//! A match is written once by the external scorer and afterwards only its
//! review columns change. Every review is also appended to a separate event
//! log, so overwriting the current status never loses the earlier decision.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::{
  Error, Result,
  evidence::EvidenceRef,
  lifecycle::MatchStatus,
  report::Report,
};

pub const MIN_CONFIDENCE: f64 = 0.0;
pub const MAX_CONFIDENCE: f64 = 100.0;

/// The default review threshold used by match listings.
pub const DEFAULT_MIN_CONFIDENCE: f64 = 60.0;

/// Reject NaN, infinities, and anything outside `[0, 100]`.
pub fn validate_confidence(confidence: f64) -> Result<()> {
  if confidence.is_finite() && (MIN_CONFIDENCE..=MAX_CONFIDENCE).contains(&confidence) {
    Ok(())
  } else {
    Err(Error::validation(format!(
      "confidence must be between {MIN_CONFIDENCE} and {MAX_CONFIDENCE}, got {confidence}"
    )))
  }
}

// ─── Writes ──────────────────────────────────────────────────────────────────

/// Input to [`crate::store::LedgerStore::record_match`], supplied by the
/// external scorer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewMatch {
  pub case_id:       i64,
  pub report_id:     i64,
  pub confidence:    f64,
  /// The case photo that matched. Defaults to the case's first photo.
  #[serde(default)]
  pub matched_photo: Option<EvidenceRef>,
  /// Defaults to the report's photo.
  #[serde(default)]
  pub report_photo:  Option<EvidenceRef>,
}

impl NewMatch {
  pub fn validate(&self) -> Result<()> { validate_confidence(self.confidence) }
}

/// A review decision, written by an authenticated actor.
#[derive(Debug, Clone)]
pub struct Review {
  pub status:      MatchStatus,
  pub notes:       Option<String>,
  pub reviewer_id: i64,
}

// ─── Stored records ──────────────────────────────────────────────────────────

/// A match row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Match {
  pub id:            i64,
  pub case_id:       i64,
  pub report_id:     i64,
  pub confidence:    f64,
  pub status:        MatchStatus,
  pub notes:         Option<String>,
  pub reviewed_by:   Option<i64>,
  pub reviewed_at:   Option<DateTime<Utc>>,
  pub created_at:    DateTime<Utc>,
  /// Snapshotted at match time; later evidence changes do not alter it.
  pub matched_photo: Option<EvidenceRef>,
  pub report_photo:  Option<EvidenceRef>,
}

/// One entry of the append-only review log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchReview {
  pub id:          i64,
  pub match_id:    i64,
  pub status:      MatchStatus,
  pub notes:       Option<String>,
  pub reviewed_by: i64,
  pub reviewed_at: DateTime<Utc>,
}

// ─── Queries and projections ─────────────────────────────────────────────────

/// Parameters for [`crate::store::LedgerStore::list_matches`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MatchQuery {
  pub status:         MatchStatus,
  pub min_confidence: f64,
}

impl Default for MatchQuery {
  fn default() -> Self {
    Self {
      status:         MatchStatus::Pending,
      min_confidence: DEFAULT_MIN_CONFIDENCE,
    }
  }
}

/// Review-queue row: match joined with case and report summary fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchSummary {
  pub id:             i64,
  pub confidence:     f64,
  pub status:         MatchStatus,
  pub created_at:     DateTime<Utc>,
  pub matched_photo:  Option<EvidenceRef>,
  pub report_photo:   Option<EvidenceRef>,
  pub case_number:    String,
  pub full_name:      String,
  pub age:            Option<u32>,
  pub gender:         Option<String>,
  pub report_id:      String,
  pub reporter_name:  Option<String>,
  pub found_location: String,
  pub reporter_phone: Option<String>,
}

/// The case side of a [`MatchDetail`]. The national ID is never part of the
/// match view.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchedCase {
  pub id:                 i64,
  pub case_number:        String,
  pub full_name:          String,
  pub age:                Option<u32>,
  pub gender:             Option<String>,
  pub phone:              Option<String>,
  pub email:              Option<String>,
  pub last_seen_location: Option<String>,
  pub last_seen_date:     Option<NaiveDate>,
  pub photos:             Vec<EvidenceRef>,
}

/// Everything a reviewer needs to decide on one match.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchDetail {
  #[serde(rename = "match")]
  pub record: Match,
  pub case:   MatchedCase,
  pub report: Report,
}

/// Case-centric row: a match joined with its report's summary fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaseMatch {
  #[serde(flatten)]
  pub record:           Match,
  /// The report's public identifier; `record.report_id` is the numeric one.
  pub public_report_id: String,
  pub reporter_name:    Option<String>,
  pub found_location:   String,
  pub photo:            EvidenceRef,
}
