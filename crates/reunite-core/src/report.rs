//! Found-person reports submitted by the public.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{Error, Result, evidence::EvidenceRef};

/// Input to [`crate::store::LedgerStore::submit_report`].
#[derive(Debug, Clone)]
pub struct NewReport {
  pub photo:            EvidenceRef,
  /// `None` means the reporter stayed anonymous.
  pub reporter_name:    Option<String>,
  pub reporter_phone:   Option<String>,
  pub found_location:   String,
  pub found_address:    Option<String>,
  pub additional_notes: Option<String>,
}

impl NewReport {
  pub fn validate(&self) -> Result<()> {
    if self.found_location.trim().is_empty() {
      return Err(Error::validation("found location is required"));
    }
    if self.photo.as_str().is_empty() {
      return Err(Error::validation("a photo is required"));
    }
    Ok(())
  }

  /// Blank optional strings are stored as absent, so a blank reporter name is
  /// anonymous everywhere downstream.
  pub fn normalized(mut self) -> Self {
    self.reporter_name = non_blank(self.reporter_name);
    self.reporter_phone = non_blank(self.reporter_phone);
    self.found_address = non_blank(self.found_address);
    self.additional_notes = non_blank(self.additional_notes);
    self
  }
}

/// `Some("")` and `Some("  ")` collapse to `None`.
pub fn non_blank(value: Option<String>) -> Option<String> {
  value.filter(|v| !v.trim().is_empty())
}

/// Returned by a successful submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportReceipt {
  pub id:        i64,
  pub report_id: String,
}

/// Public-safe projection used for submission receipts. Excludes the
/// internal numeric id and the photo path.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportSummary {
  pub report_id:      String,
  pub reporter_name:  Option<String>,
  pub found_location: String,
  pub timestamp:      DateTime<Utc>,
}

/// A stored report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
  pub id:               i64,
  pub report_id:        String,
  pub photo:            EvidenceRef,
  pub reporter_name:    Option<String>,
  pub reporter_phone:   Option<String>,
  pub found_location:   String,
  pub found_address:    Option<String>,
  pub additional_notes: Option<String>,
  /// Set by the scorer once it has compared this report against the cases.
  pub processed:        bool,
  pub created_at:       DateTime<Utc>,
}
