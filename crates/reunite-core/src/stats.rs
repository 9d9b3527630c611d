//! Dashboard aggregates.

use serde::{Deserialize, Serialize};

/// Counts read from the store in one pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatCounts {
  pub total_cases:       u64,
  pub active_cases:      u64,
  pub found_cases:       u64,
  pub total_reports:     u64,
  pub pending_matches:   u64,
  pub confirmed_matches: u64,
}

/// The dashboard view; always computed, never cached.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardStats {
  pub total_cases:       u64,
  pub active_cases:      u64,
  pub total_reports:     u64,
  pub pending_matches:   u64,
  pub confirmed_matches: u64,
  /// Percentage of cases marked found, rounded to two decimals.
  pub success_rate:      f64,
}

impl From<StatCounts> for DashboardStats {
  fn from(c: StatCounts) -> Self {
    Self {
      total_cases:       c.total_cases,
      active_cases:      c.active_cases,
      total_reports:     c.total_reports,
      pending_matches:   c.pending_matches,
      confirmed_matches: c.confirmed_matches,
      success_rate:      success_rate(c.found_cases, c.total_cases),
    }
  }
}

/// `found / total * 100` rounded to two decimals; 0 when there are no cases.
pub fn success_rate(found: u64, total: u64) -> f64 {
  if total == 0 {
    return 0.0;
  }
  let rate = found as f64 / total as f64 * 100.0;
  (rate * 100.0).round() / 100.0
}
