//! The verified identity behind a mutating operation.
//!
//! Credentials are checked by whatever identity provider sits in front of the
//! ledger. The core only ever sees the result.

use serde::{Deserialize, Serialize};

/// What an actor is allowed to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
  /// Full access.
  Admin,
  /// Registers cases and reviews matches.
  Reviewer,
  /// The external scorer: records matches and video results.
  Scorer,
}

impl Role {
  pub fn can_review(self) -> bool { matches!(self, Self::Admin | Self::Reviewer) }

  pub fn can_score(self) -> bool { matches!(self, Self::Admin | Self::Scorer) }
}

/// A verified `{id, username, role}` triple.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
  pub id:       i64,
  pub username: String,
  pub role:     Role,
}
