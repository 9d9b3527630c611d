//! Uploaded surveillance videos and the per-frame matches an external video
//! processor reports against them.
//!
//! Frame extraction and face comparison happen outside the ledger. The ledger
//! stores the upload, tracks the processor's progress, and records the frames
//! it flags.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
  Error, Result,
  evidence::EvidenceRef,
  ledger::validate_confidence,
  lifecycle::VideoStatus,
};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VideoUpload {
  pub id:                i64,
  pub video:             EvidenceRef,
  pub uploaded_by:       i64,
  pub processing_status: VideoStatus,
  pub created_at:        DateTime<Utc>,
}

/// A [`VideoUpload`] with the number of matches recorded against it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VideoListing {
  #[serde(flatten)]
  pub upload:      VideoUpload,
  pub match_count: u64,
}

/// Input to [`crate::store::LedgerStore::record_video_match`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewVideoMatch {
  pub video_id:       i64,
  pub case_id:        i64,
  /// Offset into the video, in seconds.
  pub timestamp_secs: f64,
  pub frame:          Option<EvidenceRef>,
  pub confidence:     f64,
}

impl NewVideoMatch {
  pub fn validate(&self) -> Result<()> {
    validate_confidence(self.confidence)?;
    if !self.timestamp_secs.is_finite() || self.timestamp_secs < 0.0 {
      return Err(Error::validation(format!(
        "video timestamp must be a non-negative number of seconds, got {}",
        self.timestamp_secs
      )));
    }
    Ok(())
  }
}

/// A video match joined with the matched case's summary fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VideoMatch {
  pub id:             i64,
  pub video_id:       i64,
  pub case_id:        i64,
  pub timestamp_secs: f64,
  pub frame:          Option<EvidenceRef>,
  pub confidence:     f64,
  pub created_at:     DateTime<Utc>,
  pub case_number:    String,
  pub full_name:      String,
  pub age:            Option<u32>,
  pub gender:         Option<String>,
}
