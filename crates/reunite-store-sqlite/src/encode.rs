//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are stored as RFC 3339 strings with fixed microsecond precision
//! so that lexical order equals chronological order. Statuses are stored as
//! their lowercase names. Raw row structs hold what rusqlite hands back and
//! are decoded outside the database thread.

use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use reunite_core::{
  case::{CaseRecord, CaseSummary, SensitiveField},
  evidence::EvidenceRef,
  ledger::{CaseMatch, Match, MatchReview, MatchSummary, MatchedCase},
  lifecycle::{CaseStatus, MatchStatus, VideoStatus},
  report::{Report, ReportSummary},
  video::{VideoMatch, VideoUpload},
};
use reunite_vault::Vault;
use rusqlite::Row;

use crate::{Error, Result};

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String {
  dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

pub fn decode_opt_dt(s: Option<String>) -> Result<Option<DateTime<Utc>>> {
  s.as_deref().map(decode_dt).transpose()
}

// ─── NaiveDate ───────────────────────────────────────────────────────────────

pub fn encode_date(d: NaiveDate) -> String { d.format("%Y-%m-%d").to_string() }

pub fn decode_opt_date(s: Option<String>) -> Result<Option<NaiveDate>> {
  s.as_deref()
    .map(|s| {
      NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .map_err(|e| Error::DateParse(e.to_string()))
    })
    .transpose()
}

// ─── Statuses and small scalars ──────────────────────────────────────────────

pub fn decode_case_status(s: &str) -> Result<CaseStatus> {
  s.parse()
    .map_err(|_| Error::CorruptRow(format!("unknown case status: {s:?}")))
}

pub fn decode_match_status(s: &str) -> Result<MatchStatus> {
  s.parse()
    .map_err(|_| Error::CorruptRow(format!("unknown match status: {s:?}")))
}

pub fn decode_video_status(s: &str) -> Result<VideoStatus> {
  s.parse()
    .map_err(|_| Error::CorruptRow(format!("unknown video status: {s:?}")))
}

pub fn decode_age(age: Option<i64>) -> Result<Option<u32>> {
  age
    .map(|a| {
      u32::try_from(a).map_err(|_| Error::CorruptRow(format!("invalid age: {a}")))
    })
    .transpose()
}

pub fn decode_count(n: i64) -> Result<u64> {
  u64::try_from(n).map_err(|_| Error::CorruptRow(format!("negative count: {n}")))
}

fn evidence(s: Option<String>) -> Option<EvidenceRef> { s.map(EvidenceRef::new) }

// ─── Sensitive field ─────────────────────────────────────────────────────────

/// Decrypt the stored token for display. A token the vault cannot read
/// degrades to [`SensitiveField::Unavailable`] instead of failing the read.
pub fn decode_sensitive(
  token: Option<String>,
  vault: &Vault,
  case_id: i64,
) -> SensitiveField {
  match token {
    None => SensitiveField::Absent,
    Some(token) => match vault.decrypt(&token) {
      Ok(plaintext) => SensitiveField::Present(plaintext),
      Err(e) => {
        tracing::warn!(case_id, error = %e, "national id unavailable");
        SensitiveField::Unavailable
      }
    },
  }
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Raw values read from a `cases` row plus its ordered photos.
pub struct RawCase {
  pub id:                    i64,
  pub case_number:           String,
  pub full_name:             String,
  pub age:                   Option<i64>,
  pub gender:                Option<String>,
  pub national_id_encrypted: Option<String>,
  pub phone:                 Option<String>,
  pub email:                 Option<String>,
  pub last_seen_location:    Option<String>,
  pub last_seen_date:        Option<String>,
  pub physical_description:  Option<String>,
  pub status:                String,
  pub created_at:            String,
  pub updated_at:            String,
  pub photos:                Vec<String>,
}

pub const CASE_COLUMNS: &str = "id, case_number, full_name, age, gender,
  national_id_encrypted, phone, email, last_seen_location, last_seen_date,
  physical_description, status, created_at, updated_at";

impl RawCase {
  /// Read [`CASE_COLUMNS`]; photos are filled in separately.
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:                    row.get(0)?,
      case_number:           row.get(1)?,
      full_name:             row.get(2)?,
      age:                   row.get(3)?,
      gender:                row.get(4)?,
      national_id_encrypted: row.get(5)?,
      phone:                 row.get(6)?,
      email:                 row.get(7)?,
      last_seen_location:    row.get(8)?,
      last_seen_date:        row.get(9)?,
      physical_description:  row.get(10)?,
      status:                row.get(11)?,
      created_at:            row.get(12)?,
      updated_at:            row.get(13)?,
      photos:                Vec::new(),
    })
  }

  pub fn into_record(self, vault: &Vault) -> Result<CaseRecord> {
    Ok(CaseRecord {
      id:                   self.id,
      national_id:          decode_sensitive(self.national_id_encrypted, vault, self.id),
      case_number:          self.case_number,
      full_name:            self.full_name,
      age:                  decode_age(self.age)?,
      gender:               self.gender,
      phone:                self.phone,
      email:                self.email,
      last_seen_location:   self.last_seen_location,
      last_seen_date:       decode_opt_date(self.last_seen_date)?,
      physical_description: self.physical_description,
      photos:               self.photos.into_iter().map(EvidenceRef::new).collect(),
      status:               decode_case_status(&self.status)?,
      created_at:           decode_dt(&self.created_at)?,
      updated_at:           decode_dt(&self.updated_at)?,
    })
  }

  /// The case side of a match view. The encrypted field is dropped unread.
  pub fn into_matched_case(self) -> Result<MatchedCase> {
    Ok(MatchedCase {
      id:                 self.id,
      case_number:        self.case_number,
      full_name:          self.full_name,
      age:                decode_age(self.age)?,
      gender:             self.gender,
      phone:              self.phone,
      email:              self.email,
      last_seen_location: self.last_seen_location,
      last_seen_date:     decode_opt_date(self.last_seen_date)?,
      photos:             self.photos.into_iter().map(EvidenceRef::new).collect(),
    })
  }
}

pub struct RawCaseSummary {
  pub id:                 i64,
  pub case_number:        String,
  pub full_name:          String,
  pub age:                Option<i64>,
  pub gender:             Option<String>,
  pub last_seen_location: Option<String>,
  pub last_seen_date:     Option<String>,
  pub status:             String,
  pub created_at:         String,
}

impl RawCaseSummary {
  pub fn into_summary(self) -> Result<CaseSummary> {
    Ok(CaseSummary {
      id:                 self.id,
      case_number:        self.case_number,
      full_name:          self.full_name,
      age:                decode_age(self.age)?,
      gender:             self.gender,
      last_seen_location: self.last_seen_location,
      last_seen_date:     decode_opt_date(self.last_seen_date)?,
      status:             decode_case_status(&self.status)?,
      created_at:         decode_dt(&self.created_at)?,
    })
  }
}

/// Raw values read from a `reports` row.
pub struct RawReport {
  pub id:               i64,
  pub report_id:        String,
  pub photo_ref:        String,
  pub reporter_name:    Option<String>,
  pub reporter_phone:   Option<String>,
  pub found_location:   String,
  pub found_address:    Option<String>,
  pub additional_notes: Option<String>,
  pub processed:        bool,
  pub created_at:       String,
}

pub const REPORT_COLUMNS: &str = "id, report_id, photo_ref, reporter_name,
  reporter_phone, found_location, found_address, additional_notes, processed,
  created_at";

impl RawReport {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:               row.get(0)?,
      report_id:        row.get(1)?,
      photo_ref:        row.get(2)?,
      reporter_name:    row.get(3)?,
      reporter_phone:   row.get(4)?,
      found_location:   row.get(5)?,
      found_address:    row.get(6)?,
      additional_notes: row.get(7)?,
      processed:        row.get(8)?,
      created_at:       row.get(9)?,
    })
  }

  pub fn into_report(self) -> Result<Report> {
    Ok(Report {
      id:               self.id,
      report_id:        self.report_id,
      photo:            EvidenceRef::new(self.photo_ref),
      reporter_name:    self.reporter_name,
      reporter_phone:   self.reporter_phone,
      found_location:   self.found_location,
      found_address:    self.found_address,
      additional_notes: self.additional_notes,
      processed:        self.processed,
      created_at:       decode_dt(&self.created_at)?,
    })
  }
}

pub struct RawReportSummary {
  pub report_id:      String,
  pub reporter_name:  Option<String>,
  pub found_location: String,
  pub created_at:     String,
}

impl RawReportSummary {
  pub fn into_summary(self) -> Result<ReportSummary> {
    Ok(ReportSummary {
      report_id:      self.report_id,
      reporter_name:  self.reporter_name,
      found_location: self.found_location,
      timestamp:      decode_dt(&self.created_at)?,
    })
  }
}

/// Raw values read from a `matches` row.
pub struct RawMatch {
  pub id:            i64,
  pub case_id:       i64,
  pub report_id:     i64,
  pub confidence:    f64,
  pub status:        String,
  pub notes:         Option<String>,
  pub reviewed_by:   Option<i64>,
  pub reviewed_at:   Option<String>,
  pub created_at:    String,
  pub matched_photo: Option<String>,
  pub report_photo:  Option<String>,
}

/// Column list for [`RawMatch::from_row`], qualified with the `m` alias.
pub const MATCH_COLUMNS: &str = "m.id, m.case_id, m.report_id, m.confidence,
  m.status, m.notes, m.reviewed_by, m.reviewed_at, m.created_at,
  m.matched_photo, m.report_photo";

pub const MATCH_COLUMN_COUNT: usize = 11;

impl RawMatch {
  /// Read [`MATCH_COLUMNS`] starting at column `start`.
  pub fn from_row(row: &Row<'_>, start: usize) -> rusqlite::Result<Self> {
    Ok(Self {
      id:            row.get(start)?,
      case_id:       row.get(start + 1)?,
      report_id:     row.get(start + 2)?,
      confidence:    row.get(start + 3)?,
      status:        row.get(start + 4)?,
      notes:         row.get(start + 5)?,
      reviewed_by:   row.get(start + 6)?,
      reviewed_at:   row.get(start + 7)?,
      created_at:    row.get(start + 8)?,
      matched_photo: row.get(start + 9)?,
      report_photo:  row.get(start + 10)?,
    })
  }

  pub fn into_match(self) -> Result<Match> {
    Ok(Match {
      id:            self.id,
      case_id:       self.case_id,
      report_id:     self.report_id,
      confidence:    self.confidence,
      status:        decode_match_status(&self.status)?,
      notes:         self.notes,
      reviewed_by:   self.reviewed_by,
      reviewed_at:   decode_opt_dt(self.reviewed_at)?,
      created_at:    decode_dt(&self.created_at)?,
      matched_photo: evidence(self.matched_photo),
      report_photo:  evidence(self.report_photo),
    })
  }
}

/// A review-queue row: match columns joined with case and report summaries.
pub struct RawMatchSummary {
  pub id:             i64,
  pub confidence:     f64,
  pub status:         String,
  pub created_at:     String,
  pub matched_photo:  Option<String>,
  pub report_photo:   Option<String>,
  pub case_number:    String,
  pub full_name:      String,
  pub age:            Option<i64>,
  pub gender:         Option<String>,
  pub report_id:      String,
  pub reporter_name:  Option<String>,
  pub found_location: String,
  pub reporter_phone: Option<String>,
}

impl RawMatchSummary {
  pub fn into_summary(self) -> Result<MatchSummary> {
    Ok(MatchSummary {
      id:             self.id,
      confidence:     self.confidence,
      status:         decode_match_status(&self.status)?,
      created_at:     decode_dt(&self.created_at)?,
      matched_photo:  evidence(self.matched_photo),
      report_photo:   evidence(self.report_photo),
      case_number:    self.case_number,
      full_name:      self.full_name,
      age:            decode_age(self.age)?,
      gender:         self.gender,
      report_id:      self.report_id,
      reporter_name:  self.reporter_name,
      found_location: self.found_location,
      reporter_phone: self.reporter_phone,
    })
  }
}

pub struct RawCaseMatch {
  pub record:           RawMatch,
  pub public_report_id: String,
  pub reporter_name:    Option<String>,
  pub found_location:   String,
  pub photo_ref:        String,
}

impl RawCaseMatch {
  pub fn into_case_match(self) -> Result<CaseMatch> {
    Ok(CaseMatch {
      record:           self.record.into_match()?,
      public_report_id: self.public_report_id,
      reporter_name:    self.reporter_name,
      found_location:   self.found_location,
      photo:            EvidenceRef::new(self.photo_ref),
    })
  }
}

pub struct RawMatchReview {
  pub id:          i64,
  pub match_id:    i64,
  pub status:      String,
  pub notes:       Option<String>,
  pub reviewed_by: i64,
  pub reviewed_at: String,
}

impl RawMatchReview {
  pub fn into_review(self) -> Result<MatchReview> {
    Ok(MatchReview {
      id:          self.id,
      match_id:    self.match_id,
      status:      decode_match_status(&self.status)?,
      notes:       self.notes,
      reviewed_by: self.reviewed_by,
      reviewed_at: decode_dt(&self.reviewed_at)?,
    })
  }
}

/// Raw values read from a `videos` row.
pub struct RawVideo {
  pub id:                i64,
  pub video_ref:         String,
  pub uploaded_by:       i64,
  pub processing_status: String,
  pub created_at:        String,
}

pub const VIDEO_COLUMNS: &str =
  "v.id, v.video_ref, v.uploaded_by, v.processing_status, v.created_at";

impl RawVideo {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:                row.get(0)?,
      video_ref:         row.get(1)?,
      uploaded_by:       row.get(2)?,
      processing_status: row.get(3)?,
      created_at:        row.get(4)?,
    })
  }

  pub fn into_upload(self) -> Result<VideoUpload> {
    Ok(VideoUpload {
      id:                self.id,
      video:             EvidenceRef::new(self.video_ref),
      uploaded_by:       self.uploaded_by,
      processing_status: decode_video_status(&self.processing_status)?,
      created_at:        decode_dt(&self.created_at)?,
    })
  }
}

/// A `video_matches` row joined with the case summary.
pub struct RawVideoMatch {
  pub id:             i64,
  pub video_id:       i64,
  pub case_id:        i64,
  pub timestamp_secs: f64,
  pub frame_ref:      Option<String>,
  pub confidence:     f64,
  pub created_at:     String,
  pub case_number:    String,
  pub full_name:      String,
  pub age:            Option<i64>,
  pub gender:         Option<String>,
}

pub const VIDEO_MATCH_COLUMNS: &str = "vm.id, vm.video_id, vm.case_id,
  vm.timestamp_secs, vm.frame_ref, vm.confidence, vm.created_at,
  c.case_number, c.full_name, c.age, c.gender";

impl RawVideoMatch {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:             row.get(0)?,
      video_id:       row.get(1)?,
      case_id:        row.get(2)?,
      timestamp_secs: row.get(3)?,
      frame_ref:      row.get(4)?,
      confidence:     row.get(5)?,
      created_at:     row.get(6)?,
      case_number:    row.get(7)?,
      full_name:      row.get(8)?,
      age:            row.get(9)?,
      gender:         row.get(10)?,
    })
  }

  pub fn into_video_match(self) -> Result<VideoMatch> {
    Ok(VideoMatch {
      id:             self.id,
      video_id:       self.video_id,
      case_id:        self.case_id,
      timestamp_secs: self.timestamp_secs,
      frame:          evidence(self.frame_ref),
      confidence:     self.confidence,
      created_at:     decode_dt(&self.created_at)?,
      case_number:    self.case_number,
      full_name:      self.full_name,
      age:            decode_age(self.age)?,
      gender:         self.gender,
    })
  }
}

#[cfg(test)]
mod tests {
  use chrono::{Duration, TimeZone};

  use super::*;

  #[test]
  fn encoded_timestamps_sort_chronologically() {
    let base = Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap();
    let whole = encode_dt(base);
    let fractional = encode_dt(base + Duration::microseconds(1500));
    assert!(whole < fractional, "{whole} vs {fractional}");
    assert_eq!(decode_dt(&fractional).unwrap(), base + Duration::microseconds(1500));
  }

  #[test]
  fn unreadable_token_degrades_to_unavailable() {
    let vault = Vault::new(&reunite_vault::VaultKey::generate());
    assert_eq!(decode_sensitive(None, &vault, 1), SensitiveField::Absent);
    assert_eq!(
      decode_sensitive(Some("garbage".into()), &vault, 1),
      SensitiveField::Unavailable
    );
    let token = vault.encrypt("4455").unwrap();
    assert_eq!(
      decode_sensitive(Some(token), &vault, 1),
      SensitiveField::Present("4455".into())
    );
  }

  #[test]
  fn negative_age_is_corrupt() {
    assert!(decode_age(Some(-3)).is_err());
    assert_eq!(decode_age(Some(31)).unwrap(), Some(31));
  }
}
