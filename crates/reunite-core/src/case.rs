//! Missing-person cases.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::{
  Error, Result,
  evidence::{EvidenceRef, MAX_CASE_PHOTOS},
  lifecycle::CaseStatus,
};

// ─── Sensitive field ─────────────────────────────────────────────────────────

/// The read-side state of the encrypted national-ID field.
///
/// `Unavailable` means ciphertext is stored but could not be decrypted with
/// the current key. It is distinct from `Absent`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", content = "value", rename_all = "snake_case")]
pub enum SensitiveField {
  Absent,
  Present(String),
  Unavailable,
}

// ─── Input ───────────────────────────────────────────────────────────────────

/// Input to [`crate::store::LedgerStore::register_case`].
///
/// The photos must already be durably stored; only their references travel
/// here. `national_id` is plaintext and is encrypted by the store before it is
/// written.
#[derive(Debug, Clone, Default)]
pub struct NewCase {
  /// Caller-supplied case number; generated when `None`.
  pub case_number:          Option<String>,
  pub full_name:            String,
  pub age:                  Option<u32>,
  pub gender:               Option<String>,
  pub national_id:          Option<String>,
  pub phone:                Option<String>,
  pub email:                Option<String>,
  pub last_seen_location:   Option<String>,
  pub last_seen_date:       Option<NaiveDate>,
  pub physical_description: Option<String>,
  pub photos:               Vec<EvidenceRef>,
}

impl NewCase {
  /// Check the registration invariants: a non-blank name and 1–10 photos.
  pub fn validate(&self) -> Result<()> {
    if self.full_name.trim().is_empty() {
      return Err(Error::validation("full name is required"));
    }
    if self.photos.is_empty() {
      return Err(Error::validation("at least one photo is required"));
    }
    if self.photos.len() > MAX_CASE_PHOTOS {
      return Err(Error::validation(format!(
        "at most {MAX_CASE_PHOTOS} photos are allowed, got {}",
        self.photos.len()
      )));
    }
    if let Some(number) = &self.case_number
      && number.trim().is_empty()
    {
      return Err(Error::validation("case number must not be blank"));
    }
    Ok(())
  }
}

// ─── Output ──────────────────────────────────────────────────────────────────

/// Returned by a successful registration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaseReceipt {
  pub id:          i64,
  pub case_number: String,
}

/// Listing projection. Carries neither the sensitive field nor the photos.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaseSummary {
  pub id:                 i64,
  pub case_number:        String,
  pub full_name:          String,
  pub age:                Option<u32>,
  pub gender:             Option<String>,
  pub last_seen_location: Option<String>,
  pub last_seen_date:     Option<NaiveDate>,
  pub status:             CaseStatus,
  pub created_at:         DateTime<Utc>,
}

/// The full case record, with the national ID decrypted (or marked
/// unavailable). Ciphertext never leaves the store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaseRecord {
  pub id:                   i64,
  pub case_number:          String,
  pub full_name:            String,
  pub age:                  Option<u32>,
  pub gender:               Option<String>,
  pub national_id:          SensitiveField,
  pub phone:                Option<String>,
  pub email:                Option<String>,
  pub last_seen_location:   Option<String>,
  pub last_seen_date:       Option<NaiveDate>,
  pub physical_description: Option<String>,
  /// In upload order.
  pub photos:               Vec<EvidenceRef>,
  pub status:               CaseStatus,
  pub created_at:           DateTime<Utc>,
  pub updated_at:           DateTime<Utc>,
}

#[cfg(test)]
mod tests {
  use super::*;

  fn case_with_photos(count: usize) -> NewCase {
    NewCase {
      full_name: "Asha Verma".into(),
      photos: (0..count)
        .map(|i| EvidenceRef::new(format!("/uploads/cases/{i}.jpg")))
        .collect(),
      ..NewCase::default()
    }
  }

  #[test]
  fn photo_count_bounds() {
    assert!(case_with_photos(0).validate().is_err());
    assert!(case_with_photos(1).validate().is_ok());
    assert!(case_with_photos(10).validate().is_ok());
    assert!(case_with_photos(11).validate().is_err());
  }

  #[test]
  fn blank_name_is_rejected() {
    let mut input = case_with_photos(1);
    input.full_name = "   ".into();
    assert!(matches!(input.validate(), Err(Error::Validation(_))));
  }

  #[test]
  fn sensitive_field_serialises_with_state_tag() {
    let json = serde_json::to_value(SensitiveField::Unavailable).unwrap();
    assert_eq!(json, serde_json::json!({ "state": "unavailable" }));
    let json = serde_json::to_value(SensitiveField::Absent).unwrap();
    assert_eq!(json, serde_json::json!({ "state": "absent" }));
    let json = serde_json::to_value(SensitiveField::Present("42".into())).unwrap();
    assert_eq!(json, serde_json::json!({ "state": "present", "value": "42" }));
  }
}
