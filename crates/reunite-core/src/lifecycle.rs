//! Status lifecycles for cases, matches, and video uploads.
//!
//! Statuses only change through explicit operations; nothing transitions on a
//! timer. The transition tables below list every permitted edge, and stores
//! check each case or match status write against them with
//! [`Lifecycle::ensure_transition`]. Today every edge is permitted, including
//! edges out of terminal-looking states such as `closed` or `confirmed`.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

// ─── Case status ─────────────────────────────────────────────────────────────

/// Where a missing-person case stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CaseStatus {
  #[default]
  Active,
  Found,
  Closed,
}

impl CaseStatus {
  pub const ALL: [CaseStatus; 3] = [Self::Active, Self::Found, Self::Closed];

  pub fn as_str(self) -> &'static str {
    match self {
      Self::Active => "active",
      Self::Found => "found",
      Self::Closed => "closed",
    }
  }
}

/// Permitted `(from, to)` edges for [`CaseStatus`].
pub const CASE_TRANSITIONS: &[(CaseStatus, CaseStatus)] = &[
  (CaseStatus::Active, CaseStatus::Active),
  (CaseStatus::Active, CaseStatus::Found),
  (CaseStatus::Active, CaseStatus::Closed),
  (CaseStatus::Found, CaseStatus::Active),
  (CaseStatus::Found, CaseStatus::Found),
  (CaseStatus::Found, CaseStatus::Closed),
  (CaseStatus::Closed, CaseStatus::Active),
  (CaseStatus::Closed, CaseStatus::Found),
  (CaseStatus::Closed, CaseStatus::Closed),
];

// ─── Match status ────────────────────────────────────────────────────────────

/// Review state of a candidate match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchStatus {
  #[default]
  Pending,
  Confirmed,
  Rejected,
}

impl MatchStatus {
  pub const ALL: [MatchStatus; 3] =
    [Self::Pending, Self::Confirmed, Self::Rejected];

  pub fn as_str(self) -> &'static str {
    match self {
      Self::Pending => "pending",
      Self::Confirmed => "confirmed",
      Self::Rejected => "rejected",
    }
  }
}

/// Permitted `(from, to)` edges for [`MatchStatus`].
pub const MATCH_TRANSITIONS: &[(MatchStatus, MatchStatus)] = &[
  (MatchStatus::Pending, MatchStatus::Pending),
  (MatchStatus::Pending, MatchStatus::Confirmed),
  (MatchStatus::Pending, MatchStatus::Rejected),
  (MatchStatus::Confirmed, MatchStatus::Pending),
  (MatchStatus::Confirmed, MatchStatus::Confirmed),
  (MatchStatus::Confirmed, MatchStatus::Rejected),
  (MatchStatus::Rejected, MatchStatus::Pending),
  (MatchStatus::Rejected, MatchStatus::Confirmed),
  (MatchStatus::Rejected, MatchStatus::Rejected),
];

// ─── Video processing status ─────────────────────────────────────────────────

/// Progress of the external video processor on an uploaded video.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VideoStatus {
  #[default]
  Pending,
  Processing,
  Completed,
  Failed,
}

impl VideoStatus {
  pub const ALL: [VideoStatus; 4] =
    [Self::Pending, Self::Processing, Self::Completed, Self::Failed];

  pub fn as_str(self) -> &'static str {
    match self {
      Self::Pending => "pending",
      Self::Processing => "processing",
      Self::Completed => "completed",
      Self::Failed => "failed",
    }
  }
}

// ─── Shared behaviour ────────────────────────────────────────────────────────

/// A status with a transition table.
pub trait Lifecycle: Copy + PartialEq + 'static {
  const TRANSITIONS: &'static [(Self, Self)];

  fn can_transition_to(self, next: Self) -> bool {
    Self::TRANSITIONS.iter().any(|&(from, to)| from == self && to == next)
  }

  /// Fail with a validation error when `self -> next` is not in the table.
  fn ensure_transition(self, next: Self) -> Result<()>
  where
    Self: fmt::Display,
  {
    if self.can_transition_to(next) {
      Ok(())
    } else {
      Err(Error::validation(format!(
        "status transition {self} -> {next} is not permitted"
      )))
    }
  }
}

impl Lifecycle for CaseStatus {
  const TRANSITIONS: &'static [(Self, Self)] = CASE_TRANSITIONS;
}

impl Lifecycle for MatchStatus {
  const TRANSITIONS: &'static [(Self, Self)] = MATCH_TRANSITIONS;
}

macro_rules! status_text {
  ($ty:ty, $label:literal) => {
    impl fmt::Display for $ty {
      fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
      }
    }

    impl FromStr for $ty {
      type Err = Error;

      fn from_str(s: &str) -> Result<Self> {
        <$ty>::ALL
          .into_iter()
          .find(|status| status.as_str() == s.trim())
          .ok_or_else(|| {
            Error::validation(format!("invalid {} status: {s:?}", $label))
          })
      }
    }
  };
}

status_text!(CaseStatus, "case");
status_text!(MatchStatus, "match");
status_text!(VideoStatus, "video");
