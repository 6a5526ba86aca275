//! Router tests driven through `tower::ServiceExt::oneshot`.

use std::sync::Arc;

use argon2::{Argon2, PasswordHasher, password_hash::SaltString};
use axum::{
  Router,
  body::Body,
  http::{Request, StatusCode, header},
};
use base64::{Engine as _, engine::general_purpose::STANDARD as B64};
use chrono::Utc;
use podium_core::{candidate::AthleteProfile, score::EvaluationMetrics};
use podium_engine::{EngineConfig, Feed, RankingEngine};
use podium_store_sqlite::SqliteStore;
use rand_core::OsRng;
use serde_json::{Value, json};
use tower::ServiceExt as _;
use uuid::Uuid;

use crate::{AuthConfig, router};

struct Harness {
  app:   Router,
  store: SqliteStore,
}

async fn harness() -> Harness {
  let store = SqliteStore::open_in_memory().await.unwrap();
  let salt = SaltString::generate(&mut OsRng);
  let hash = Argon2::default()
    .hash_password(b"secret", &salt)
    .unwrap()
    .to_string();
  let engine =
    RankingEngine::new(store.clone(), store.clone(), Feed::Unconfigured, EngineConfig::default());
  let auth = AuthConfig { username: "admin".into(), password_hash: hash };
  Harness { app: router(Arc::new(engine), auth), store }
}

fn auth_header() -> String { format!("Basic {}", B64.encode("admin:secret")) }

async fn call(h: &Harness, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
  let builder = Request::builder()
    .method(method)
    .uri(uri)
    .header(header::AUTHORIZATION, auth_header());
  let req = match body {
    Some(v) => builder
      .header(header::CONTENT_TYPE, "application/json")
      .body(Body::from(v.to_string()))
      .unwrap(),
    None => builder.body(Body::empty()).unwrap(),
  };
  let resp = h.app.clone().oneshot(req).await.unwrap();
  let status = resp.status();
  let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
  let json = if bytes.is_empty() { Value::Null } else { serde_json::from_slice(&bytes).unwrap() };
  (status, json)
}

fn manual(name: &str) -> Value {
  json!({ "external_name": name, "sport": "Football", "graduation_year": 2026, "composite_score": 80.0 })
}

// ── Auth ─────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn health_needs_no_auth() {
  let h = harness().await;
  let req = Request::builder().uri("/health").body(Body::empty()).unwrap();
  let resp = h.app.clone().oneshot(req).await.unwrap();
  assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
async fn api_requires_basic_auth() {
  let h = harness().await;
  let req = Request::builder().uri("/api/rankings").body(Body::empty()).unwrap();
  let resp = h.app.clone().oneshot(req).await.unwrap();
  assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
  assert!(resp.headers().contains_key(header::WWW_AUTHENTICATE));

  let req = Request::builder()
    .uri("/api/rankings")
    .header(header::AUTHORIZATION, format!("Basic {}", B64.encode("admin:wrong")))
    .body(Body::empty())
    .unwrap();
  assert_eq!(h.app.clone().oneshot(req).await.unwrap().status(), StatusCode::UNAUTHORIZED);
}

// ── Rankings CRUD ────────────────────────────────────────────────────────────

#[tokio::test]
async fn create_get_and_duplicate() {
  let h = harness().await;
  let (status, created) = call(&h, "POST", "/api/rankings", Some(manual("Casey Lee"))).await;
  assert_eq!(status, StatusCode::CREATED);
  assert_eq!(created["identity"]["kind"], "external_only");
  let id = created["entry_id"].as_str().unwrap().to_owned();

  let (status, fetched) = call(&h, "GET", &format!("/api/rankings/{id}"), None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(fetched, created);

  let (status, body) = call(&h, "POST", "/api/rankings", Some(manual("Casey Lee"))).await;
  assert_eq!(status, StatusCode::CONFLICT);
  assert!(body.get("retryable").is_none());
}

#[tokio::test]
async fn create_rejects_bad_input() {
  let h = harness().await;
  let mut out_of_range = manual("Casey Lee");
  out_of_range["composite_score"] = json!(140.0);
  let (status, _) = call(&h, "POST", "/api/rankings", Some(out_of_range)).await;
  assert_eq!(status, StatusCode::BAD_REQUEST);

  let both = json!({ "athlete_id": Uuid::new_v4(), "external_name": "Casey Lee", "sport": "Football" });
  let (status, _) = call(&h, "POST", "/api/rankings", Some(both)).await;
  assert_eq!(status, StatusCode::BAD_REQUEST);

  let (status, _) = call(&h, "POST", "/api/rankings", Some(json!({ "sport": "Football" }))).await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn patch_sets_and_clears_fields() {
  let h = harness().await;
  let mut body = manual("Casey Lee");
  body["position"] = json!("WR");
  body["lock"] = json!(true);
  let (_, created) = call(&h, "POST", "/api/rankings", Some(body)).await;
  let uri = format!("/api/rankings/{}", created["entry_id"].as_str().unwrap());

  let (status, edited) =
    call(&h, "PATCH", &uri, Some(json!({ "position": null, "overall_rank": 4 }))).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(edited["position"], Value::Null);
  assert_eq!(edited["ranks"]["overall"], 4);
  assert_eq!(edited["composite_score"], 80.0);
  assert_eq!(edited["is_manual_override"], true);

  let (status, _) = call(&h, "PATCH", &uri, Some(json!({ "national_rank": 0 }))).await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn delete_then_not_found() {
  let h = harness().await;
  let (_, created) = call(&h, "POST", "/api/rankings", Some(manual("Casey Lee"))).await;
  let uri = format!("/api/rankings/{}", created["entry_id"].as_str().unwrap());

  assert_eq!(call(&h, "DELETE", &uri, None).await.0, StatusCode::NO_CONTENT);
  assert_eq!(call(&h, "GET", &uri, None).await.0, StatusCode::NOT_FOUND);
  assert_eq!(call(&h, "DELETE", &uri, None).await.0, StatusCode::NOT_FOUND);
}

// ── Overrides ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn lock_and_unlock_record_actor() {
  let h = harness().await;
  let (_, created) = call(&h, "POST", "/api/rankings", Some(manual("Casey Lee"))).await;
  let id = created["entry_id"].as_str().unwrap();

  let (status, locked) = call(&h, "POST", &format!("/api/rankings/{id}/lock"), None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(locked["is_manual_override"], true);
  assert_eq!(locked["overridden_by"], "admin");

  let (_, unlocked) = call(&h, "POST", &format!("/api/rankings/{id}/unlock"), None).await;
  assert_eq!(unlocked["is_manual_override"], false);
  assert_eq!(unlocked["composite_score"], 80.0);

  let missing = format!("/api/rankings/{}/lock", Uuid::new_v4());
  assert_eq!(call(&h, "POST", &missing, None).await.0, StatusCode::NOT_FOUND);
}

// ── Jobs ─────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn recalculate_job_ranks_evaluated_athletes() {
  let h = harness().await;
  for (name, score) in [("Ava Stone", 92.0), ("Ben Ortiz", 85.0)] {
    let profile = AthleteProfile {
      athlete_id:      Uuid::new_v4(),
      full_name:       name.into(),
      sport:           "Football".into(),
      graduation_year: Some(2026),
      position:        None,
      state:           None,
    };
    h.store.upsert_athlete(&profile, 0).await.unwrap();
    let metrics = EvaluationMetrics { athleticism: Some(score), ..Default::default() };
    h.store.record_evaluation(profile.athlete_id, &metrics, Utc::now()).await.unwrap();
  }

  let (status, summary) =
    call(&h, "POST", "/api/jobs/recalculate", Some(json!({ "sport": "Football" }))).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(summary["kind"], "recalculate");
  assert_eq!(summary["scored"], 2);
  assert_eq!(summary["merge"]["inserted"], 2);

  let (_, list) = call(&h, "GET", "/api/rankings?sport=Football", None).await;
  let scores: Vec<f64> = list.as_array().unwrap().iter().map(|e| e["composite_score"].as_f64().unwrap()).collect();
  assert_eq!(scores, vec![92.0, 85.0]);
  assert_eq!(list[0]["ranks"]["overall"], 1);
}

#[tokio::test]
async fn import_without_feed_is_retryable() {
  let h = harness().await;
  let (status, body) = call(
    &h,
    "POST",
    "/api/jobs/import",
    Some(json!({ "sport": "Football", "season": "2025" })),
  )
  .await;
  assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
  assert_eq!(body["retryable"], true);
}

#[tokio::test]
async fn merge_defaults_to_preserving_overrides() {
  let h = harness().await;
  let (status, summary) =
    call(&h, "POST", "/api/jobs/merge", Some(json!({ "sport": "Football" }))).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(summary["preserve_overrides"], true);
  assert_eq!(summary["merge"]["candidates"], 0);

  let (status, _) = call(&h, "POST", "/api/jobs/merge", Some(json!({ "sport": " " }))).await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
}
