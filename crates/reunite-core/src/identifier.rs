//! Public-facing identifiers for cases and reports.
//!
//! Both have the shape `<PREFIX>-<unix millis>-<8 uppercase hex>`. The random
//! suffix comes from the OS RNG, so two identifiers minted in the same
//! millisecond still differ with overwhelming probability; the store's UNIQUE
//! constraint catches the rest.

use chrono::Utc;
use rand_core::{OsRng, RngCore as _};

pub const CASE_PREFIX: &str = "CASE";
pub const REPORT_PREFIX: &str = "RPT";

fn generate(prefix: &str) -> String {
  let mut suffix = [0u8; 4];
  OsRng.fill_bytes(&mut suffix);
  format!(
    "{prefix}-{}-{}",
    Utc::now().timestamp_millis(),
    hex::encode_upper(suffix)
  )
}

/// A fresh case number, e.g. `CASE-1760000000000-9F3A01BC`.
pub fn generate_case_number() -> String { generate(CASE_PREFIX) }

/// A fresh report ID, e.g. `RPT-1760000000000-04D2E7AA`.
pub fn generate_report_id() -> String { generate(REPORT_PREFIX) }

#[cfg(test)]
mod tests {
  use std::collections::HashSet;

  use super::*;

  #[test]
  fn case_number_shape() {
    let number = generate_case_number();
    let parts: Vec<&str> = number.split('-').collect();
    assert_eq!(parts.len(), 3);
    assert_eq!(parts[0], "CASE");
    assert!(parts[1].parse::<i64>().is_ok());
    assert_eq!(parts[2].len(), 8);
    assert!(parts[2].chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_lowercase()));
  }

  #[test]
  fn report_ids_use_their_own_prefix() {
    assert!(generate_report_id().starts_with("RPT-"));
  }

  #[test]
  fn ten_thousand_concurrent_case_numbers_do_not_collide() {
    let handles: Vec<_> = (0..8)
      .map(|_| {
        std::thread::spawn(|| {
          (0..1250).map(|_| generate_case_number()).collect::<Vec<_>>()
        })
      })
      .collect();

    let mut seen = HashSet::new();
    for handle in handles {
      for number in handle.join().unwrap() {
        assert!(seen.insert(number.clone()), "duplicate case number {number}");
      }
    }
    assert_eq!(seen.len(), 10_000);
  }
}
