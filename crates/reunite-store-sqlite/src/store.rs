//! [`SqliteStore`] — the SQLite implementation of [`LedgerStore`].

use std::{fmt, path::Path, str::FromStr, time::Duration};

use chrono::Utc;
use rusqlite::OptionalExtension as _;
use tracing::{debug, info, warn};

use reunite_core::{
  case::{CaseReceipt, CaseRecord, CaseSummary, NewCase},
  evidence::EvidenceRef,
  identifier::{generate_case_number, generate_report_id},
  ledger::{
    CaseMatch, Match, MatchDetail, MatchQuery, MatchReview, MatchSummary,
    NewMatch, Review, validate_confidence,
  },
  lifecycle::{CaseStatus, Lifecycle, MatchStatus, VideoStatus},
  report::{NewReport, Report, ReportReceipt, ReportSummary, non_blank},
  stats::{DashboardStats, StatCounts},
  store::LedgerStore,
  video::{NewVideoMatch, VideoListing, VideoMatch, VideoUpload},
};
use reunite_vault::Vault;

use crate::{
  Error, Result,
  encode::{
    CASE_COLUMNS, MATCH_COLUMN_COUNT, MATCH_COLUMNS, REPORT_COLUMNS,
    RawCase, RawCaseMatch, RawCaseSummary, RawMatch, RawMatchReview,
    RawMatchSummary, RawReport, RawReportSummary, RawVideo, RawVideoMatch,
    VIDEO_COLUMNS, VIDEO_MATCH_COLUMNS, decode_count, encode_date, encode_dt,
  },
  schema::SCHEMA,
};

/// Upper bound on a single storage call unless overridden.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// Generated identifiers are retried this many times on a uniqueness clash.
const IDENTIFIER_ATTEMPTS: usize = 3;

// ─── Store ───────────────────────────────────────────────────────────────────

/// A Reunite ledger backed by a single SQLite file.
///
/// Cloning is cheap — the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  pub(crate) conn: tokio_rusqlite::Connection,
  vault:           Vault,
  timeout:         Duration,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>, vault: Vault) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn, vault, timeout: DEFAULT_TIMEOUT };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store — useful for testing.
  pub async fn open_in_memory(vault: Vault) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn, vault, timeout: DEFAULT_TIMEOUT };
    store.init_schema().await?;
    Ok(store)
  }

  /// Bound every subsequent call by `timeout` instead of [`DEFAULT_TIMEOUT`].
  pub fn with_timeout(mut self, timeout: Duration) -> Self {
    self.timeout = timeout;
    self
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await
  }

  /// Run `f` on the database thread, giving up after the configured timeout.
  ///
  /// A call that times out may still complete on the database thread; its
  /// result is discarded.
  async fn call<F, R>(&self, f: F) -> Result<R>
  where
    F: FnOnce(&mut rusqlite::Connection) -> tokio_rusqlite::Result<R> + Send + 'static,
    R: Send + 'static,
  {
    match tokio::time::timeout(self.timeout, self.conn.call(f)).await {
      Ok(result) => Ok(result?),
      Err(_) => {
        warn!(timeout = ?self.timeout, "storage call timed out");
        Err(Error::Timeout(self.timeout))
      }
    }
  }

  async fn insert_case(&self, row: CaseRow, case_number: String) -> Result<i64> {
    self
      .call(move |conn| {
        let tx = conn.transaction()?;
        tx.execute(
          "INSERT INTO cases (
             case_number, full_name, age, gender, national_id_encrypted, phone,
             email, last_seen_location, last_seen_date, physical_description,
             status, created_at, updated_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?12)",
          rusqlite::params![
            case_number,
            row.full_name,
            row.age,
            row.gender,
            row.national_id_encrypted,
            row.phone,
            row.email,
            row.last_seen_location,
            row.last_seen_date,
            row.physical_description,
            CaseStatus::Active.as_str(),
            row.created_at,
          ],
        )?;
        let id = tx.last_insert_rowid();

        {
          let mut stmt = tx.prepare(
            "INSERT INTO case_photos (case_id, position, photo_ref) VALUES (?1, ?2, ?3)",
          )?;
          for (position, photo) in row.photos.iter().enumerate() {
            stmt.execute(rusqlite::params![id, position as i64, photo])?;
          }
        }

        tx.commit()?;
        Ok(id)
      })
      .await
  }

  async fn insert_report(&self, row: ReportRow, report_id: String) -> Result<i64> {
    self
      .call(move |conn| {
        conn.execute(
          "INSERT INTO reports (
             report_id, photo_ref, reporter_name, reporter_phone,
             found_location, found_address, additional_notes, processed,
             created_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, 0, ?8)",
          rusqlite::params![
            report_id,
            row.photo_ref,
            row.reporter_name,
            row.reporter_phone,
            row.found_location,
            row.found_address,
            row.additional_notes,
            row.created_at,
          ],
        )?;
        Ok(conn.last_insert_rowid())
      })
      .await
  }
}

/// Column values for a case insert, prepared before the identifier is known.
#[derive(Clone)]
struct CaseRow {
  full_name:             String,
  age:                   Option<i64>,
  gender:                Option<String>,
  national_id_encrypted: Option<String>,
  phone:                 Option<String>,
  email:                 Option<String>,
  last_seen_location:    Option<String>,
  last_seen_date:        Option<String>,
  physical_description:  Option<String>,
  photos:                Vec<String>,
  created_at:            String,
}

#[derive(Clone)]
struct ReportRow {
  photo_ref:        String,
  reporter_name:    Option<String>,
  reporter_phone:   Option<String>,
  found_location:   String,
  found_address:    Option<String>,
  additional_notes: Option<String>,
  created_at:       String,
}

/// Whether `e` is a UNIQUE or PRIMARY KEY constraint failure.
fn is_unique_violation(e: &Error) -> bool {
  match e {
    Error::Database(tokio_rusqlite::Error::Rusqlite(
      rusqlite::Error::SqliteFailure(failure, _),
    )) => {
      failure.code == rusqlite::ErrorCode::ConstraintViolation
        && (failure.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
          || failure.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY)
    }
    _ => false,
  }
}

/// Check a stored status against the lifecycle's transition table before it is
/// overwritten with `next`.
pub(crate) fn check_transition<L>(current: &str, next: L) -> Result<()>
where
  L: Lifecycle + FromStr<Err = reunite_core::Error> + fmt::Display,
{
  let current: L = current
    .parse()
    .map_err(|_| Error::CorruptRow(format!("unknown status {current:?}")))?;
  current.ensure_transition(next)?;
  Ok(())
}

/// Load a case row and its ordered photos.
fn load_case(conn: &rusqlite::Connection, id: i64) -> rusqlite::Result<Option<RawCase>> {
  let raw = conn
    .query_row(
      &format!("SELECT {CASE_COLUMNS} FROM cases WHERE id = ?1"),
      rusqlite::params![id],
      RawCase::from_row,
    )
    .optional()?;

  let Some(mut raw) = raw else {
    return Ok(None);
  };

  raw.photos = conn
    .prepare(
      "SELECT photo_ref FROM case_photos WHERE case_id = ?1 ORDER BY position ASC",
    )?
    .query_map(rusqlite::params![id], |row| row.get(0))?
    .collect::<rusqlite::Result<Vec<String>>>()?;

  Ok(Some(raw))
}

fn load_report(conn: &rusqlite::Connection, id: i64) -> rusqlite::Result<Option<RawReport>> {
  conn
    .query_row(
      &format!("SELECT {REPORT_COLUMNS} FROM reports WHERE id = ?1"),
      rusqlite::params![id],
      RawReport::from_row,
    )
    .optional()
}

// ─── LedgerStore impl ────────────────────────────────────────────────────────

impl LedgerStore for SqliteStore {
  type Error = Error;

  // ── Case registry ─────────────────────────────────────────────────────────

  async fn register_case(&self, input: NewCase) -> Result<CaseReceipt> {
    input.validate()?;

    let national_id_encrypted = non_blank(input.national_id)
      .map(|id| self.vault.encrypt(id.trim()))
      .transpose()?;

    let row = CaseRow {
      full_name: input.full_name.trim().to_owned(),
      age: input.age.map(i64::from),
      gender: non_blank(input.gender),
      national_id_encrypted,
      phone: non_blank(input.phone),
      email: non_blank(input.email),
      last_seen_location: non_blank(input.last_seen_location),
      last_seen_date: input.last_seen_date.map(encode_date),
      physical_description: non_blank(input.physical_description),
      photos: input.photos.into_iter().map(EvidenceRef::into_inner).collect(),
      created_at: encode_dt(Utc::now()),
    };

    let supplied = input.case_number.map(|n| n.trim().to_owned());

    for attempt in 1..=IDENTIFIER_ATTEMPTS {
      let case_number = supplied.clone().unwrap_or_else(generate_case_number);

      match self.insert_case(row.clone(), case_number.clone()).await {
        Ok(id) => {
          info!(case_id = id, %case_number, photos = row.photos.len(), "case registered");
          return Ok(CaseReceipt { id, case_number });
        }
        Err(e) if is_unique_violation(&e) => {
          if supplied.is_some() {
            return Err(Error::DuplicateCaseNumber(case_number));
          }
          warn!(attempt, %case_number, "generated case number collided; regenerating");
        }
        Err(e) => return Err(e),
      }
    }

    Err(Error::DuplicateCaseNumber(
      "generated case numbers kept colliding".into(),
    ))
  }

  async fn list_cases(&self, status: CaseStatus) -> Result<Vec<CaseSummary>> {
    let status_str = status.as_str();

    let raws: Vec<RawCaseSummary> = self
      .call(move |conn| {
        let rows = conn
          .prepare(
            "SELECT id, case_number, full_name, age, gender, last_seen_location,
                    last_seen_date, status, created_at
             FROM cases
             WHERE status = ?1
             ORDER BY created_at DESC, id DESC",
          )?
          .query_map(rusqlite::params![status_str], |row| {
            Ok(RawCaseSummary {
              id:                 row.get(0)?,
              case_number:        row.get(1)?,
              full_name:          row.get(2)?,
              age:                row.get(3)?,
              gender:             row.get(4)?,
              last_seen_location: row.get(5)?,
              last_seen_date:     row.get(6)?,
              status:             row.get(7)?,
              created_at:         row.get(8)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawCaseSummary::into_summary).collect()
  }

  async fn get_case(&self, id: i64) -> Result<Option<CaseRecord>> {
    let raw = self.call(move |conn| Ok(load_case(conn, id)?)).await?;
    raw.map(|raw| raw.into_record(&self.vault)).transpose()
  }

  async fn update_case_status(&self, id: i64, status: CaseStatus) -> Result<()> {
    let status_str = status.as_str();
    let now = encode_dt(Utc::now());

    self
      .call(move |conn| {
        let tx = conn.transaction()?;

        let current: Option<String> = tx
          .query_row(
            "SELECT status FROM cases WHERE id = ?1",
            rusqlite::params![id],
            |row| row.get(0),
          )
          .optional()?;
        let Some(current) = current else {
          return Ok(Err(Error::CaseNotFound(id)));
        };
        if let Err(e) = check_transition(&current, status) {
          return Ok(Err(e));
        }

        tx.execute(
          "UPDATE cases SET status = ?1, updated_at = ?2 WHERE id = ?3",
          rusqlite::params![status_str, now, id],
        )?;
        tx.commit()?;
        Ok(Ok(()))
      })
      .await??;

    info!(case_id = id, %status, "case status updated");
    Ok(())
  }

  // ── Report intake ─────────────────────────────────────────────────────────

  async fn submit_report(&self, input: NewReport) -> Result<ReportReceipt> {
    input.validate()?;
    let input = input.normalized();

    let row = ReportRow {
      photo_ref:        input.photo.into_inner(),
      reporter_name:    input.reporter_name,
      reporter_phone:   input.reporter_phone,
      found_location:   input.found_location.trim().to_owned(),
      found_address:    input.found_address,
      additional_notes: input.additional_notes,
      created_at:       encode_dt(Utc::now()),
    };

    let mut last_err = None;
    for attempt in 1..=IDENTIFIER_ATTEMPTS {
      let report_id = generate_report_id();

      match self.insert_report(row.clone(), report_id.clone()).await {
        Ok(id) => {
          info!(
            report_id = %report_id,
            anonymous = row.reporter_name.is_none(),
            "found-person report submitted"
          );
          return Ok(ReportReceipt { id, report_id });
        }
        Err(e) if is_unique_violation(&e) => {
          warn!(attempt, %report_id, "generated report id collided; regenerating");
          last_err = Some(e);
        }
        Err(e) => return Err(e),
      }
    }

    Err(last_err.unwrap_or(Error::CorruptRow("report id generation failed".into())))
  }

  async fn get_report_summary(&self, report_id: String) -> Result<Option<ReportSummary>> {
    let raw = self
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT report_id, reporter_name, found_location, created_at
               FROM reports WHERE report_id = ?1",
              rusqlite::params![report_id],
              |row| {
                Ok(RawReportSummary {
                  report_id:      row.get(0)?,
                  reporter_name:  row.get(1)?,
                  found_location: row.get(2)?,
                  created_at:     row.get(3)?,
                })
              },
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawReportSummary::into_summary).transpose()
  }

  async fn list_unprocessed_reports(&self) -> Result<Vec<Report>> {
    let raws: Vec<RawReport> = self
      .call(|conn| {
        let rows = conn
          .prepare(&format!(
            "SELECT {REPORT_COLUMNS} FROM reports
             WHERE processed = 0
             ORDER BY created_at ASC, id ASC"
          ))?
          .query_map([], RawReport::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawReport::into_report).collect()
  }

  async fn mark_report_processed(&self, id: i64) -> Result<()> {
    let changed = self
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE reports SET processed = 1 WHERE id = ?1",
          rusqlite::params![id],
        )?)
      })
      .await?;

    if changed == 0 {
      return Err(Error::ReportNotFound(id));
    }
    debug!(report_id = id, "report marked processed");
    Ok(())
  }

  // ── Match ledger ──────────────────────────────────────────────────────────

  async fn record_match(&self, input: NewMatch) -> Result<Match> {
    input.validate()?;

    let now = Utc::now();
    let created_at = encode_dt(now);
    let NewMatch { case_id, report_id, confidence, matched_photo, report_photo } = input;
    let matched_photo = matched_photo.map(EvidenceRef::into_inner);
    let report_photo = report_photo.map(EvidenceRef::into_inner);

    let outcome = self
      .call(move |conn| {
        let tx = conn.transaction()?;

        let case_photo: Option<Option<String>> = tx
          .query_row(
            "SELECT (SELECT photo_ref FROM case_photos
                     WHERE case_id = c.id ORDER BY position ASC LIMIT 1)
             FROM cases c WHERE c.id = ?1",
            rusqlite::params![case_id],
            |row| row.get(0),
          )
          .optional()?;
        let Some(case_photo) = case_photo else {
          return Ok(Err(Error::MissingReference { entity: "case", id: case_id }));
        };

        let stored_report_photo: Option<String> = tx
          .query_row(
            "SELECT photo_ref FROM reports WHERE id = ?1",
            rusqlite::params![report_id],
            |row| row.get(0),
          )
          .optional()?;
        let Some(stored_report_photo) = stored_report_photo else {
          return Ok(Err(Error::MissingReference { entity: "report", id: report_id }));
        };

        let matched_photo = matched_photo.or(case_photo);
        let report_photo = report_photo.or(Some(stored_report_photo));

        tx.execute(
          "INSERT INTO matches (
             case_id, report_id, confidence, status, created_at,
             matched_photo, report_photo
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
          rusqlite::params![
            case_id,
            report_id,
            confidence,
            MatchStatus::Pending.as_str(),
            created_at,
            matched_photo,
            report_photo,
          ],
        )?;
        let id = tx.last_insert_rowid();
        tx.commit()?;

        Ok(Ok(RawMatch {
          id,
          case_id,
          report_id,
          confidence,
          status: MatchStatus::Pending.as_str().to_owned(),
          notes: None,
          reviewed_by: None,
          reviewed_at: None,
          created_at,
          matched_photo,
          report_photo,
        }))
      })
      .await??;

    info!(
      match_id = outcome.id,
      case_id,
      report_id,
      confidence,
      "match recorded"
    );
    outcome.into_match()
  }

  async fn list_matches(&self, query: MatchQuery) -> Result<Vec<MatchSummary>> {
    validate_confidence(query.min_confidence)?;
    let status_str = query.status.as_str();
    let min_confidence = query.min_confidence;

    let raws: Vec<RawMatchSummary> = self
      .call(move |conn| {
        let rows = conn
          .prepare(
            "SELECT m.id, m.confidence, m.status, m.created_at,
                    m.matched_photo, m.report_photo,
                    c.case_number, c.full_name, c.age, c.gender,
                    r.report_id, r.reporter_name, r.found_location, r.reporter_phone
             FROM matches m
             JOIN cases   c ON c.id = m.case_id
             JOIN reports r ON r.id = m.report_id
             WHERE m.status = ?1 AND m.confidence >= ?2
             ORDER BY m.confidence DESC, m.created_at DESC, m.id DESC",
          )?
          .query_map(rusqlite::params![status_str, min_confidence], |row| {
            Ok(RawMatchSummary {
              id:             row.get(0)?,
              confidence:     row.get(1)?,
              status:         row.get(2)?,
              created_at:     row.get(3)?,
              matched_photo:  row.get(4)?,
              report_photo:   row.get(5)?,
              case_number:    row.get(6)?,
              full_name:      row.get(7)?,
              age:            row.get(8)?,
              gender:         row.get(9)?,
              report_id:      row.get(10)?,
              reporter_name:  row.get(11)?,
              found_location: row.get(12)?,
              reporter_phone: row.get(13)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawMatchSummary::into_summary).collect()
  }

  async fn get_match_detail(&self, id: i64) -> Result<Option<MatchDetail>> {
    let loaded = self
      .call(move |conn| {
        let raw = conn
          .query_row(
            &format!("SELECT {MATCH_COLUMNS} FROM matches m WHERE m.id = ?1"),
            rusqlite::params![id],
            |row| RawMatch::from_row(row, 0),
          )
          .optional()?;

        let Some(raw) = raw else {
          return Ok(None);
        };
        let case = load_case(conn, raw.case_id)?;
        let report = load_report(conn, raw.report_id)?;
        Ok(Some((raw, case, report)))
      })
      .await?;

    let Some((raw, case, report)) = loaded else {
      return Ok(None);
    };

    let case = case.ok_or_else(|| {
      Error::CorruptRow(format!("match {id} points at missing case {}", raw.case_id))
    })?;
    let report = report.ok_or_else(|| {
      Error::CorruptRow(format!("match {id} points at missing report {}", raw.report_id))
    })?;

    Ok(Some(MatchDetail {
      record: raw.into_match()?,
      case:   case.into_matched_case()?,
      report: report.into_report()?,
    }))
  }

  async fn review_match(&self, id: i64, review: Review) -> Result<MatchReview> {
    let now = Utc::now();
    let reviewed_at = encode_dt(now);
    let status_str = review.status.as_str();
    let notes = non_blank(review.notes);
    let reviewer_id = review.reviewer_id;

    let next = review.status;
    let raw = self
      .call(move |conn| {
        let tx = conn.transaction()?;

        let current: Option<String> = tx
          .query_row(
            "SELECT status FROM matches WHERE id = ?1",
            rusqlite::params![id],
            |row| row.get(0),
          )
          .optional()?;
        let Some(current) = current else {
          return Ok(Err(Error::MatchNotFound(id)));
        };
        if let Err(e) = check_transition(&current, next) {
          return Ok(Err(e));
        }

        tx.execute(
          "UPDATE matches
           SET status = ?1, notes = ?2, reviewed_by = ?3, reviewed_at = ?4
           WHERE id = ?5",
          rusqlite::params![status_str, notes, reviewer_id, reviewed_at, id],
        )?;

        tx.execute(
          "INSERT INTO match_reviews (match_id, status, notes, reviewed_by, reviewed_at)
           VALUES (?1, ?2, ?3, ?4, ?5)",
          rusqlite::params![id, status_str, notes, reviewer_id, reviewed_at],
        )?;
        let review_id = tx.last_insert_rowid();
        tx.commit()?;

        Ok(Ok(RawMatchReview {
          id: review_id,
          match_id: id,
          status: status_str.to_owned(),
          notes,
          reviewed_by: reviewer_id,
          reviewed_at,
        }))
      })
      .await??;

    info!(match_id = id, status = %review.status, reviewer_id, "match reviewed");
    raw.into_review()
  }

  async fn list_match_reviews(&self, match_id: i64) -> Result<Vec<MatchReview>> {
    let raws: Vec<RawMatchReview> = self
      .call(move |conn| {
        let exists = conn
          .query_row(
            "SELECT 1 FROM matches WHERE id = ?1",
            rusqlite::params![match_id],
            |_| Ok(()),
          )
          .optional()?
          .is_some();
        if !exists {
          return Ok(None);
        }

        let rows = conn
          .prepare(
            "SELECT id, match_id, status, notes, reviewed_by, reviewed_at
             FROM match_reviews
             WHERE match_id = ?1
             ORDER BY reviewed_at ASC, id ASC",
          )?
          .query_map(rusqlite::params![match_id], |row| {
            Ok(RawMatchReview {
              id:          row.get(0)?,
              match_id:    row.get(1)?,
              status:      row.get(2)?,
              notes:       row.get(3)?,
              reviewed_by: row.get(4)?,
              reviewed_at: row.get(5)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(Some(rows))
      })
      .await?
      .ok_or(Error::MatchNotFound(match_id))?;

    raws.into_iter().map(RawMatchReview::into_review).collect()
  }

  async fn list_matches_for_case(&self, case_id: i64) -> Result<Vec<CaseMatch>> {
    let raws: Vec<RawCaseMatch> = self
      .call(move |conn| {
        let rows = conn
          .prepare(&format!(
            "SELECT {MATCH_COLUMNS},
                    r.report_id, r.reporter_name, r.found_location, r.photo_ref
             FROM matches m
             JOIN reports r ON r.id = m.report_id
             WHERE m.case_id = ?1
             ORDER BY m.confidence DESC, m.created_at DESC, m.id DESC"
          ))?
          .query_map(rusqlite::params![case_id], |row| {
            Ok(RawCaseMatch {
              record:           RawMatch::from_row(row, 0)?,
              public_report_id: row.get(MATCH_COLUMN_COUNT)?,
              reporter_name:    row.get(MATCH_COLUMN_COUNT + 1)?,
              found_location:   row.get(MATCH_COLUMN_COUNT + 2)?,
              photo_ref:        row.get(MATCH_COLUMN_COUNT + 3)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawCaseMatch::into_case_match).collect()
  }

  // ── Aggregates ────────────────────────────────────────────────────────────

  async fn compute_stats(&self) -> Result<DashboardStats> {
    // One statement, so all counts come from the same snapshot.
    let counts: [i64; 6] = self
      .call(|conn| {
        Ok(conn.query_row(
          "SELECT
             (SELECT COUNT(*) FROM cases),
             (SELECT COUNT(*) FROM cases   WHERE status = 'active'),
             (SELECT COUNT(*) FROM cases   WHERE status = 'found'),
             (SELECT COUNT(*) FROM reports),
             (SELECT COUNT(*) FROM matches WHERE status = 'pending'),
             (SELECT COUNT(*) FROM matches WHERE status = 'confirmed')",
          [],
          |row| {
            Ok([
              row.get(0)?,
              row.get(1)?,
              row.get(2)?,
              row.get(3)?,
              row.get(4)?,
              row.get(5)?,
            ])
          },
        )?)
      })
      .await?;

    let [total_cases, active_cases, found_cases, total_reports, pending, confirmed] = counts;
    Ok(DashboardStats::from(StatCounts {
      total_cases:       decode_count(total_cases)?,
      active_cases:      decode_count(active_cases)?,
      found_cases:       decode_count(found_cases)?,
      total_reports:     decode_count(total_reports)?,
      pending_matches:   decode_count(pending)?,
      confirmed_matches: decode_count(confirmed)?,
    }))
  }

  // ── Video intake ──────────────────────────────────────────────────────────

  async fn record_video(&self, video: EvidenceRef, uploaded_by: i64) -> Result<VideoUpload> {
    let now = Utc::now();
    let created_at = encode_dt(now);
    let video_ref = video.as_str().to_owned();

    let id = self
      .call(move |conn| {
        conn.execute(
          "INSERT INTO videos (video_ref, uploaded_by, processing_status, created_at)
           VALUES (?1, ?2, ?3, ?4)",
          rusqlite::params![video_ref, uploaded_by, VideoStatus::Pending.as_str(), created_at],
        )?;
        Ok(conn.last_insert_rowid())
      })
      .await?;

    info!(video_id = id, uploaded_by, "video recorded");
    Ok(VideoUpload {
      id,
      video,
      uploaded_by,
      processing_status: VideoStatus::Pending,
      created_at: now,
    })
  }

  async fn list_videos(&self) -> Result<Vec<VideoListing>> {
    let raws: Vec<(RawVideo, i64)> = self
      .call(|conn| {
        let rows = conn
          .prepare(&format!(
            "SELECT {VIDEO_COLUMNS},
                    (SELECT COUNT(*) FROM video_matches vm WHERE vm.video_id = v.id)
             FROM videos v
             ORDER BY v.created_at DESC, v.id DESC"
          ))?
          .query_map([], |row| Ok((RawVideo::from_row(row)?, row.get(5)?)))?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws
      .into_iter()
      .map(|(raw, count)| {
        Ok(VideoListing {
          upload:      raw.into_upload()?,
          match_count: decode_count(count)?,
        })
      })
      .collect()
  }

  async fn get_video(&self, id: i64) -> Result<Option<VideoUpload>> {
    let raw = self
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!("SELECT {VIDEO_COLUMNS} FROM videos v WHERE v.id = ?1"),
              rusqlite::params![id],
              RawVideo::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawVideo::into_upload).transpose()
  }

  async fn update_video_status(&self, id: i64, status: VideoStatus) -> Result<()> {
    let status_str = status.as_str();

    let changed = self
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE videos SET processing_status = ?1 WHERE id = ?2",
          rusqlite::params![status_str, id],
        )?)
      })
      .await?;

    if changed == 0 {
      return Err(Error::VideoNotFound(id));
    }
    info!(video_id = id, %status, "video status updated");
    Ok(())
  }

  async fn record_video_match(&self, input: NewVideoMatch) -> Result<VideoMatch> {
    input.validate()?;

    let created_at = encode_dt(Utc::now());
    let NewVideoMatch { video_id, case_id, timestamp_secs, frame, confidence } = input;
    let frame_ref = frame.map(EvidenceRef::into_inner);

    let raw = self
      .call(move |conn| {
        let tx = conn.transaction()?;

        let video_exists = tx
          .query_row(
            "SELECT 1 FROM videos WHERE id = ?1",
            rusqlite::params![video_id],
            |_| Ok(()),
          )
          .optional()?
          .is_some();
        if !video_exists {
          return Ok(Err(Error::MissingReference { entity: "video", id: video_id }));
        }

        let case: Option<(String, String, Option<i64>, Option<String>)> = tx
          .query_row(
            "SELECT case_number, full_name, age, gender FROM cases WHERE id = ?1",
            rusqlite::params![case_id],
            |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?)),
          )
          .optional()?;
        let Some((case_number, full_name, age, gender)) = case else {
          return Ok(Err(Error::MissingReference { entity: "case", id: case_id }));
        };

        tx.execute(
          "INSERT INTO video_matches (
             video_id, case_id, timestamp_secs, frame_ref, confidence, created_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
          rusqlite::params![video_id, case_id, timestamp_secs, frame_ref, confidence, created_at],
        )?;
        let id = tx.last_insert_rowid();
        tx.commit()?;

        Ok(Ok(RawVideoMatch {
          id,
          video_id,
          case_id,
          timestamp_secs,
          frame_ref,
          confidence,
          created_at,
          case_number,
          full_name,
          age,
          gender,
        }))
      })
      .await??;

    info!(video_id, case_id, timestamp_secs, confidence, "video match recorded");
    raw.into_video_match()
  }

  async fn list_video_matches(&self, video_id: i64) -> Result<Vec<VideoMatch>> {
    let raws: Vec<RawVideoMatch> = self
      .call(move |conn| {
        let rows = conn
          .prepare(&format!(
            "SELECT {VIDEO_MATCH_COLUMNS}
             FROM video_matches vm
             JOIN cases c ON c.id = vm.case_id
             WHERE vm.video_id = ?1
             ORDER BY vm.timestamp_secs ASC, vm.id ASC"
          ))?
          .query_map(rusqlite::params![video_id], RawVideoMatch::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawVideoMatch::into_video_match).collect()
  }
}
