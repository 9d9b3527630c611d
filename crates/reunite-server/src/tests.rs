//! Router tests against an in-memory store and a temporary evidence root.

use std::{sync::Arc, time::Duration};

use argon2::{Algorithm, Argon2, Params, PasswordHasher, Version, password_hash::SaltString};
use axum::{
  body::Body,
  http::{Request, StatusCode, header},
};
use base64::{Engine as _, engine::general_purpose::STANDARD as B64};
use rand_core::OsRng;
use reunite_core::{
  actor::Role,
  case::NewCase,
  evidence::EvidenceRef,
  lifecycle::CaseStatus,
  report::NewReport,
  store::LedgerStore,
};
use reunite_store_sqlite::{DEFAULT_TIMEOUT, SqliteStore};
use reunite_vault::{Vault, VaultKey};
use serde_json::{Value, json};
use tempfile::TempDir;
use tower::ServiceExt as _;

use crate::{AppState, auth::UserDirectory, config::UserConfig, evidence::DiskEvidenceStore, router};

const BOUNDARY: &str = "reunite-test-boundary";

const ADMIN: (&str, &str) = ("admin", "admin-pass");
const REVIEWER: (&str, &str) = ("reviewer", "review-pass");
const SCORER: (&str, &str) = ("scorer", "score-pass");

struct TestApp {
  state:    AppState<SqliteStore>,
  evidence: TempDir,
}

fn hash(password: &str) -> String {
  let salt = SaltString::generate(&mut OsRng);
  let params = Params::new(1024, 1, 1, None).unwrap();
  Argon2::new(Algorithm::Argon2id, Version::V0x13, params)
    .hash_password(password.as_bytes(), &salt)
    .unwrap()
    .to_string()
}

async fn app() -> TestApp {
  let store = SqliteStore::open_in_memory(Vault::new(&VaultKey::generate()))
    .await
    .unwrap();
  app_with(store)
}

fn app_with(store: SqliteStore) -> TestApp {
  let evidence = tempfile::tempdir().unwrap();

  let users = [(1, ADMIN, Role::Admin), (2, REVIEWER, Role::Reviewer), (3, SCORER, Role::Scorer)]
    .into_iter()
    .map(|(id, (username, password), role)| UserConfig {
      id,
      username: username.into(),
      password_hash: hash(password),
      role,
    })
    .collect();

  TestApp {
    state: AppState {
      store:    Arc::new(store),
      evidence: Arc::new(DiskEvidenceStore::new(evidence.path())),
      users:    Arc::new(UserDirectory::new(users).unwrap()),
    },
    evidence,
  }
}

fn basic((user, pass): (&str, &str)) -> String {
  format!("Basic {}", B64.encode(format!("{user}:{pass}")))
}

/// A file part for [`multipart`]: field name, filename, media type, bytes.
type FilePart<'a> = (&'a str, &'a str, &'a str, &'a [u8]);

fn multipart(text: &[(&str, &str)], files: &[FilePart<'_>]) -> Vec<u8> {
  let mut body = Vec::new();
  for (name, value) in text {
    body.extend_from_slice(
      format!(
        "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
      )
      .as_bytes(),
    );
  }
  for (name, file_name, media_type, bytes) in files {
    body.extend_from_slice(
      format!(
        "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"; \
         filename=\"{file_name}\"\r\nContent-Type: {media_type}\r\n\r\n"
      )
      .as_bytes(),
    );
    body.extend_from_slice(bytes);
    body.extend_from_slice(b"\r\n");
  }
  body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
  body
}

fn form_request(uri: &str, creds: Option<(&str, &str)>, body: Vec<u8>) -> Request<Body> {
  let mut builder = Request::builder()
    .method("POST")
    .uri(uri)
    .header(header::CONTENT_TYPE, format!("multipart/form-data; boundary={BOUNDARY}"));
  if let Some(creds) = creds {
    builder = builder.header(header::AUTHORIZATION, basic(creds));
  }
  builder.body(Body::from(body)).unwrap()
}

fn json_request(
  method: &str,
  uri: &str,
  creds: Option<(&str, &str)>,
  body: Option<Value>,
) -> Request<Body> {
  let mut builder = Request::builder().method(method).uri(uri);
  if let Some(creds) = creds {
    builder = builder.header(header::AUTHORIZATION, basic(creds));
  }
  match body {
    Some(body) => builder
      .header(header::CONTENT_TYPE, "application/json")
      .body(Body::from(body.to_string()))
      .unwrap(),
    None => builder.body(Body::empty()).unwrap(),
  }
}

async fn send(app: &TestApp, req: Request<Body>) -> (StatusCode, Value) {
  let res = router(app.state.clone()).oneshot(req).await.unwrap();
  let status = res.status();
  let bytes = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
  let body = if bytes.is_empty() {
    Value::Null
  } else {
    serde_json::from_slice(&bytes).unwrap()
  };
  (status, body)
}

fn files_in(app: &TestApp, folder: &str) -> usize {
  std::fs::read_dir(app.evidence.path().join(folder))
    .map(|dir| dir.count())
    .unwrap_or(0)
}

const JPEG: &[u8] = b"\xFF\xD8\xFF\xE0 test image bytes";

async fn seed_case_and_report(app: &TestApp) -> (i64, i64) {
  let case = app
    .state
    .store
    .register_case(NewCase {
      full_name: "Asha Verma".into(),
      photos: vec![EvidenceRef::new("/uploads/cases/seed.jpg")],
      ..NewCase::default()
    })
    .await
    .unwrap();
  let report = app
    .state
    .store
    .submit_report(NewReport {
      photo:            EvidenceRef::new("/uploads/reports/seed.jpg"),
      reporter_name:    None,
      reporter_phone:   None,
      found_location:   "Central Station".into(),
      found_address:    None,
      additional_notes: None,
    })
    .await
    .unwrap();
  (case.id, report.id)
}

// ─── Health and auth ─────────────────────────────────────────────────────────

#[tokio::test]
async fn health_is_public() {
  let app = app().await;
  let (status, body) = send(&app, json_request("GET", "/health", None, None)).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body, json!({ "status": "ok" }));
}

#[tokio::test]
async fn protected_routes_require_credentials() {
  let app = app().await;

  let res = router(app.state.clone())
    .oneshot(json_request("GET", "/cases", None, None))
    .await
    .unwrap();
  assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
  assert!(res.headers().contains_key(header::WWW_AUTHENTICATE));

  let (status, body) =
    send(&app, json_request("GET", "/cases", Some((REVIEWER.0, "nope")), None)).await;
  assert_eq!(status, StatusCode::UNAUTHORIZED);
  assert!(body["error"].is_string());
}

#[tokio::test]
async fn roles_gate_routes() {
  let app = app().await;

  let (status, _) = send(&app, json_request("GET", "/cases", Some(SCORER), None)).await;
  assert_eq!(status, StatusCode::FORBIDDEN);

  let (status, _) =
    send(&app, json_request("GET", "/reports/unprocessed", Some(REVIEWER), None)).await;
  assert_eq!(status, StatusCode::FORBIDDEN);

  let (status, _) = send(&app, json_request("GET", "/cases", Some(ADMIN), None)).await;
  assert_eq!(status, StatusCode::OK);
}

// ─── Public reports ──────────────────────────────────────────────────────────

#[tokio::test]
async fn public_report_round_trip() {
  let app = app().await;

  let body = multipart(
    &[("found_location", "Central Station"), ("reporter_name", "Ravi")],
    &[("photo", "found.jpg", "image/jpeg", JPEG)],
  );
  let (status, receipt) = send(&app, form_request("/public/report", None, body)).await;
  assert_eq!(status, StatusCode::CREATED);
  let report_id = receipt["report_id"].as_str().unwrap().to_owned();
  assert!(report_id.starts_with("RPT-"));
  assert_eq!(files_in(&app, "reports"), 1);

  let (status, summary) = send(
    &app,
    json_request("GET", &format!("/public/report/{report_id}"), None, None),
  )
  .await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(summary["found_location"], "Central Station");
  assert_eq!(summary["reporter_name"], "Ravi");
  assert!(summary.get("photo").is_none());
  assert!(summary.get("id").is_none());

  let (status, _) =
    send(&app, json_request("GET", "/public/report/RPT-0-DEADBEEF", None, None)).await;
  assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn public_report_requires_photo_and_location() {
  let app = app().await;

  let body = multipart(&[("found_location", "Central Station")], &[]);
  let (status, _) = send(&app, form_request("/public/report", None, body)).await;
  assert_eq!(status, StatusCode::BAD_REQUEST);

  let body = multipart(&[], &[("photo", "found.jpg", "image/jpeg", JPEG)]);
  let (status, body) = send(&app, form_request("/public/report", None, body)).await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
  assert!(body["error"].as_str().unwrap().contains("found location"));

  let body = multipart(
    &[("found_location", "Central Station")],
    &[("photo", "found.gif", "image/gif", JPEG)],
  );
  let (status, _) = send(&app, form_request("/public/report", None, body)).await;
  assert_eq!(status, StatusCode::BAD_REQUEST);

  assert_eq!(files_in(&app, "reports"), 0);
}

// ─── Cases ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn register_case_and_read_it_back() {
  let app = app().await;

  let body = multipart(
    &[
      ("full_name", "Asha Verma"),
      ("age", "34"),
      ("national_id", "123456789012"),
      ("last_seen_date", "2026-09-30"),
    ],
    &[
      ("photos", "one.jpg", "image/jpeg", JPEG),
      ("photos", "two.png", "image/png", JPEG),
      ("photos", "three.jpeg", "image/jpeg", JPEG),
    ],
  );
  let (status, receipt) = send(&app, form_request("/cases", Some(REVIEWER), body)).await;
  assert_eq!(status, StatusCode::CREATED);
  let id = receipt["id"].as_i64().unwrap();
  assert_eq!(files_in(&app, "cases"), 3);

  let (status, case) =
    send(&app, json_request("GET", &format!("/cases/{id}"), Some(REVIEWER), None)).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(case["national_id"], json!({ "state": "present", "value": "123456789012" }));
  assert_eq!(case["photos"].as_array().unwrap().len(), 3);
  assert_eq!(case["status"], "active");
  assert_eq!(case["age"], 34);

  let (status, list) = send(&app, json_request("GET", "/cases", Some(REVIEWER), None)).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(list.as_array().unwrap().len(), 1);
  assert!(list[0].get("national_id").is_none());
}

#[tokio::test]
async fn rejected_case_upload_leaves_no_files() {
  let app = app().await;

  let body = multipart(
    &[("full_name", "Asha Verma")],
    &[
      ("photos", "one.jpg", "image/jpeg", JPEG),
      ("photos", "clip.gif", "image/gif", JPEG),
    ],
  );
  let (status, _) = send(&app, form_request("/cases", Some(REVIEWER), body)).await;
  assert_eq!(status, StatusCode::BAD_REQUEST);

  let body = multipart(&[("full_name", "  ")], &[("photos", "one.jpg", "image/jpeg", JPEG)]);
  let (status, _) = send(&app, form_request("/cases", Some(REVIEWER), body)).await;
  assert_eq!(status, StatusCode::BAD_REQUEST);

  assert_eq!(files_in(&app, "cases"), 0);
}

#[tokio::test]
async fn timed_out_registration_keeps_its_evidence() {
  let db_dir = tempfile::tempdir().unwrap();
  let db_path = db_dir.path().join("ledger.db");
  let store = SqliteStore::open(&db_path, Vault::new(&VaultKey::generate()))
    .await
    .unwrap()
    .with_timeout(Duration::from_millis(50));
  let app = app_with(store);

  // Hold the write lock from a second connection so the insert stalls, then
  // commits once the lock is released.
  let (locked_tx, locked_rx) = std::sync::mpsc::channel();
  let blocker = std::thread::spawn(move || {
    let conn = rusqlite::Connection::open(&db_path).unwrap();
    conn.execute_batch("BEGIN EXCLUSIVE").unwrap();
    locked_tx.send(()).unwrap();
    std::thread::sleep(Duration::from_millis(300));
    conn.execute_batch("COMMIT").unwrap();
  });
  locked_rx.recv().unwrap();

  let body = multipart(
    &[("full_name", "Asha Verma")],
    &[("photos", "one.jpg", "image/jpeg", JPEG)],
  );
  let (status, _) = send(&app, form_request("/cases", Some(REVIEWER), body)).await;
  assert_eq!(status, StatusCode::GATEWAY_TIMEOUT);
  assert_eq!(files_in(&app, "cases"), 1);

  blocker.join().unwrap();

  let patient = (*app.state.store).clone().with_timeout(DEFAULT_TIMEOUT);
  let cases = patient.list_cases(CaseStatus::Active).await.unwrap();
  assert_eq!(cases.len(), 1);

  let case = patient.get_case(cases[0].id).await.unwrap().unwrap();
  for photo in &case.photos {
    assert!(app.state.evidence.path_of(photo).unwrap().exists(), "{photo}");
  }
  assert_eq!(files_in(&app, "cases"), 1);
}

#[tokio::test]
async fn case_status_updates() {
  let app = app().await;
  let (case_id, _) = seed_case_and_report(&app).await;

  let (status, body) = send(
    &app,
    json_request(
      "PUT",
      &format!("/cases/{case_id}/status"),
      Some(REVIEWER),
      Some(json!({ "status": "found" })),
    ),
  )
  .await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["status"], "found");

  let (status, found) =
    send(&app, json_request("GET", "/cases?status=found", Some(REVIEWER), None)).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(found.as_array().unwrap().len(), 1);

  let (status, _) = send(
    &app,
    json_request(
      "PUT",
      &format!("/cases/{case_id}/status"),
      Some(REVIEWER),
      Some(json!({ "status": "missing" })),
    ),
  )
  .await;
  assert_eq!(status, StatusCode::BAD_REQUEST);

  let (status, _) = send(
    &app,
    json_request("PUT", "/cases/999/status", Some(REVIEWER), Some(json!({ "status": "closed" }))),
  )
  .await;
  assert_eq!(status, StatusCode::NOT_FOUND);

  let (status, _) = send(&app, json_request("GET", "/cases/999", Some(REVIEWER), None)).await;
  assert_eq!(status, StatusCode::NOT_FOUND);
}

// ─── Match ledger ────────────────────────────────────────────────────────────

#[tokio::test]
async fn scorer_records_and_reviewer_resolves() {
  let app = app().await;
  let (case_id, report_id) = seed_case_and_report(&app).await;

  let mut ids = Vec::new();
  for confidence in [82.5, 55.0, 75.0] {
    let (status, recorded) = send(
      &app,
      json_request(
        "POST",
        "/matches",
        Some(SCORER),
        Some(json!({ "case_id": case_id, "report_id": report_id, "confidence": confidence })),
      ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(recorded["status"], "pending");
    ids.push(recorded["id"].as_i64().unwrap());
  }

  let (status, queue) = send(&app, json_request("GET", "/matches", Some(REVIEWER), None)).await;
  assert_eq!(status, StatusCode::OK);
  let confidences: Vec<f64> = queue
    .as_array()
    .unwrap()
    .iter()
    .map(|m| m["confidence"].as_f64().unwrap())
    .collect();
  assert_eq!(confidences, [82.5, 75.0]);
  assert_eq!(queue[0]["found_location"], "Central Station");

  let top = ids[0];
  let (status, logged) = send(
    &app,
    json_request(
      "PUT",
      &format!("/matches/{top}/review"),
      Some(REVIEWER),
      Some(json!({ "status": "confirmed", "notes": "same birthmark" })),
    ),
  )
  .await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(logged["reviewed_by"], 2);

  let (status, detail) =
    send(&app, json_request("GET", &format!("/matches/{top}"), Some(REVIEWER), None)).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(detail["match"]["status"], "confirmed");
  assert_eq!(detail["match"]["notes"], "same birthmark");
  assert_eq!(detail["match"]["reviewed_by"], 2);
  assert!(detail["match"]["reviewed_at"].is_string());
  assert_eq!(detail["case"]["id"], case_id);
  assert!(detail["case"].get("national_id").is_none());
  assert_eq!(detail["report"]["found_location"], "Central Station");

  let (status, history) = send(
    &app,
    json_request("GET", &format!("/matches/{top}/reviews"), Some(REVIEWER), None),
  )
  .await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(history.as_array().unwrap().len(), 1);

  let (_, for_case) = send(
    &app,
    json_request("GET", &format!("/cases/{case_id}/matches"), Some(REVIEWER), None),
  )
  .await;
  assert_eq!(for_case.as_array().unwrap().len(), 3);

  let (_, stats) = send(&app, json_request("GET", "/stats/dashboard", Some(REVIEWER), None)).await;
  assert_eq!(stats["pending_matches"], 2);
  assert_eq!(stats["confirmed_matches"], 1);
}

#[tokio::test]
async fn match_errors_map_to_status_codes() {
  let app = app().await;
  let (case_id, report_id) = seed_case_and_report(&app).await;

  let record = |body: Value| json_request("POST", "/matches", Some(SCORER), Some(body));

  let (status, _) =
    send(&app, record(json!({ "case_id": 999, "report_id": report_id, "confidence": 80 }))).await;
  assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

  let (status, _) = send(
    &app,
    record(json!({ "case_id": case_id, "report_id": report_id, "confidence": 120 })),
  )
  .await;
  assert_eq!(status, StatusCode::BAD_REQUEST);

  let (status, _) = send(&app, record(json!({ "case_id": case_id }))).await;
  assert_eq!(status, StatusCode::BAD_REQUEST);

  let (status, _) = send(
    &app,
    json_request(
      "POST",
      "/matches",
      Some(REVIEWER),
      Some(json!({ "case_id": case_id, "report_id": report_id, "confidence": 80 })),
    ),
  )
  .await;
  assert_eq!(status, StatusCode::FORBIDDEN);

  let (status, _) = send(&app, json_request("GET", "/matches/999", Some(REVIEWER), None)).await;
  assert_eq!(status, StatusCode::NOT_FOUND);

  let (status, _) = send(
    &app,
    json_request(
      "PUT",
      "/matches/999/review",
      Some(REVIEWER),
      Some(json!({ "status": "confirmed" })),
    ),
  )
  .await;
  assert_eq!(status, StatusCode::NOT_FOUND);

  let (status, _) = send(
    &app,
    json_request(
      "PUT",
      "/matches/1/review",
      Some(REVIEWER),
      Some(json!({ "status": "approved" })),
    ),
  )
  .await;
  assert_eq!(status, StatusCode::BAD_REQUEST);

  let (status, _) = send(
    &app,
    json_request("GET", "/matches?status=maybe", Some(REVIEWER), None),
  )
  .await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn empty_dashboard() {
  let app = app().await;
  let (status, stats) =
    send(&app, json_request("GET", "/stats/dashboard", Some(ADMIN), None)).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(stats["total_cases"], 0);
  assert_eq!(stats["success_rate"], 0.0);
}

// ─── Scorer work queue ───────────────────────────────────────────────────────

#[tokio::test]
async fn unprocessed_reports_drain() {
  let app = app().await;
  let (_, report_id) = seed_case_and_report(&app).await;

  let (status, queue) =
    send(&app, json_request("GET", "/reports/unprocessed", Some(SCORER), None)).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(queue[0]["id"], report_id);

  let (status, _) = send(
    &app,
    json_request("POST", &format!("/reports/{report_id}/processed"), Some(SCORER), None),
  )
  .await;
  assert_eq!(status, StatusCode::NO_CONTENT);

  let (_, queue) = send(&app, json_request("GET", "/reports/unprocessed", Some(SCORER), None)).await;
  assert!(queue.as_array().unwrap().is_empty());

  let (status, _) =
    send(&app, json_request("POST", "/reports/999/processed", Some(SCORER), None)).await;
  assert_eq!(status, StatusCode::NOT_FOUND);
}

// ─── Videos ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn video_upload_and_results() {
  let app = app().await;
  let (case_id, _) = seed_case_and_report(&app).await;

  let body = multipart(&[], &[("video", "cctv.mp4", "video/mp4", b"\x00\x00\x00\x18ftypmp42")]);
  let (status, upload) = send(&app, form_request("/videos", Some(REVIEWER), body)).await;
  assert_eq!(status, StatusCode::CREATED);
  assert_eq!(upload["processing_status"], "pending");
  assert_eq!(upload["uploaded_by"], 2);
  let video_id = upload["id"].as_i64().unwrap();
  assert_eq!(files_in(&app, "videos"), 1);

  let (status, _) = send(
    &app,
    json_request(
      "PUT",
      &format!("/videos/{video_id}/status"),
      Some(SCORER),
      Some(json!({ "status": "processing" })),
    ),
  )
  .await;
  assert_eq!(status, StatusCode::OK);

  let (status, recorded) = send(
    &app,
    json_request(
      "POST",
      &format!("/videos/{video_id}/matches"),
      Some(SCORER),
      Some(json!({ "case_id": case_id, "timestamp_secs": 12.5, "confidence": 77.0 })),
    ),
  )
  .await;
  assert_eq!(status, StatusCode::CREATED);
  assert_eq!(recorded["full_name"], "Asha Verma");

  let (_, listing) = send(&app, json_request("GET", "/videos", Some(REVIEWER), None)).await;
  assert_eq!(listing[0]["match_count"], 1);
  assert_eq!(listing[0]["processing_status"], "processing");

  let (_, matches) = send(
    &app,
    json_request("GET", &format!("/videos/{video_id}/matches"), Some(REVIEWER), None),
  )
  .await;
  assert_eq!(matches[0]["timestamp_secs"], 12.5);

  let (status, _) = send(&app, json_request("GET", "/videos/999", Some(REVIEWER), None)).await;
  assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn non_video_upload_is_rejected() {
  let app = app().await;
  let body = multipart(&[], &[("video", "notes.txt", "text/plain", b"hello")]);
  let (status, _) = send(&app, form_request("/videos", Some(REVIEWER), body)).await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
  assert_eq!(files_in(&app, "videos"), 0);
}
