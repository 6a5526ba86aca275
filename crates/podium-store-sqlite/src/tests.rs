//! Integration tests for `SqliteStore` against an in-memory database.

use chrono::{Duration, Utc};
use podium_core::{
  candidate::{AthleteProfile, Candidate, CandidateOrigin},
  entry::{AthleteIdentity, EntryPatch, NewEntry, RankingEntry},
  score::EvaluationMetrics,
  source::EvaluationSource,
  store::{EntryQuery, MergeRequest, RankingStore, StoreError},
};
use uuid::Uuid;

use crate::SqliteStore;

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

fn candidate(identity: &AthleteIdentity, score: f64, origin: CandidateOrigin) -> Candidate {
  Candidate {
    identity:        identity.clone(),
    sport:           "Football".into(),
    graduation_year: Some(2026),
    position:        Some("QB".into()),
    state:           Some("TX".into()),
    composite_score: score,
    origin,
  }
}

fn internal(identity: &AthleteIdentity, score: f64) -> Candidate {
  candidate(identity, score, CandidateOrigin::Internal)
}

async fn merge_internal(s: &SqliteStore, candidates: Vec<Candidate>) -> podium_core::summary::MergeSummary {
  s.run_merge(MergeRequest {
    sport:    "Football".into(),
    snapshot: Some((CandidateOrigin::Internal, candidates)),
    at:       Utc::now(),
  })
  .await
  .unwrap()
}

async fn football(s: &SqliteStore) -> Vec<RankingEntry> {
  s.list_entries(&EntryQuery { sport: Some("Football".into()), ..Default::default() })
    .await
    .unwrap()
}

fn find<'a>(entries: &'a [RankingEntry], id: &AthleteIdentity) -> &'a RankingEntry {
  entries.iter().find(|e| &e.identity == id).expect("entry for identity")
}

// ─── Admin CRUD ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn create_and_get_manual_entry() {
  let s = store().await;
  let input = NewEntry {
    graduation_year: Some(2026),
    composite_score: Some(77.5),
    ..NewEntry::new(AthleteIdentity::external("Morgan Diaz").unwrap(), "Football")
  };

  let created = s.create_manual_entry(input, "admin").await.unwrap();
  assert!(created.is_external_only());
  assert!(!created.is_manual_override);

  let fetched = s.get_entry(created.entry_id).await.unwrap().unwrap();
  assert_eq!(fetched, created);
}

#[tokio::test]
async fn get_missing_entry_returns_none() {
  let s = store().await;
  assert!(s.get_entry(Uuid::new_v4()).await.unwrap().is_none());
}

#[tokio::test]
async fn duplicate_identity_in_cohort_is_rejected() {
  let s = store().await;
  let id = AthleteIdentity::external("Morgan Diaz").unwrap();

  // An unknown graduation year is still one cohort.
  s.create_manual_entry(NewEntry::new(id.clone(), "Football"), "admin").await.unwrap();
  let err = s
    .create_manual_entry(NewEntry::new(id.clone(), "Football"), "admin")
    .await
    .unwrap_err();
  assert!(err.is_duplicate());

  // Another cohort is fine.
  let other_year = NewEntry { graduation_year: Some(2027), ..NewEntry::new(id, "Football") };
  s.create_manual_entry(other_year, "admin").await.unwrap();
}

#[tokio::test]
async fn invalid_manual_entry_is_input_error() {
  let s = store().await;
  let input = NewEntry {
    composite_score: Some(101.0),
    ..NewEntry::new(AthleteIdentity::internal(Uuid::new_v4()), "Football")
  };
  let err = s.create_manual_entry(input, "admin").await.unwrap_err();
  assert!(err.is_invalid_input());
}

#[tokio::test]
async fn admin_edit_ignores_lock() {
  let s = store().await;
  let created = s
    .create_manual_entry(
      NewEntry { lock: true, ..NewEntry::new(AthleteIdentity::internal(Uuid::new_v4()), "Football") },
      "admin",
    )
    .await
    .unwrap();

  let patch = EntryPatch {
    composite_score: Some(Some(91.0)),
    overall_rank: Some(Some(1)),
    ..Default::default()
  };
  let edited = s.update_entry(created.entry_id, &patch).await.unwrap();
  assert!(edited.is_manual_override);
  assert_eq!(edited.composite_score, Some(91.0));
  assert_eq!(edited.ranks.overall, Some(1));
  assert_eq!(s.get_entry(created.entry_id).await.unwrap().unwrap(), edited);
}

#[tokio::test]
async fn admin_edit_rejects_zero_rank() {
  let s = store().await;
  let created = s
    .create_manual_entry(NewEntry::new(AthleteIdentity::internal(Uuid::new_v4()), "Football"), "admin")
    .await
    .unwrap();
  let patch = EntryPatch { state_rank: Some(Some(0)), ..Default::default() };
  let err = s.update_entry(created.entry_id, &patch).await.unwrap_err();
  assert!(err.is_invalid_input());
}

#[tokio::test]
async fn delete_entry_and_missing_delete() {
  let s = store().await;
  let created = s
    .create_manual_entry(
      NewEntry { lock: true, ..NewEntry::new(AthleteIdentity::internal(Uuid::new_v4()), "Football") },
      "admin",
    )
    .await
    .unwrap();

  s.delete_entry(created.entry_id).await.unwrap();
  assert!(s.get_entry(created.entry_id).await.unwrap().is_none());

  let err = s.delete_entry(created.entry_id).await.unwrap_err();
  assert!(err.is_not_found());
}

// ─── Override store ──────────────────────────────────────────────────────────

#[tokio::test]
async fn lock_and_unlock_record_audit_fields() {
  let s = store().await;
  let created = s
    .create_manual_entry(
      NewEntry {
        composite_score: Some(60.0),
        ..NewEntry::new(AthleteIdentity::internal(Uuid::new_v4()), "Football")
      },
      "admin",
    )
    .await
    .unwrap();

  let locked = s.lock(created.entry_id, "alice").await.unwrap();
  assert!(locked.is_manual_override);
  assert_eq!(locked.overridden_by.as_deref(), Some("alice"));
  let first_lock_at = locked.overridden_at.unwrap();

  // Locking again refreshes the audit fields.
  let relocked = s.lock(created.entry_id, "bob").await.unwrap();
  assert!(relocked.is_manual_override);
  assert_eq!(relocked.overridden_by.as_deref(), Some("bob"));
  assert!(relocked.overridden_at.unwrap() >= first_lock_at);

  let unlocked = s.unlock(created.entry_id, "carol").await.unwrap();
  assert!(!unlocked.is_manual_override);
  assert_eq!(unlocked.overridden_by.as_deref(), Some("carol"));
  // Unlocking leaves the values as they were.
  assert_eq!(unlocked.composite_score, Some(60.0));
  assert_eq!(unlocked.last_calculated, created.last_calculated);
}

#[tokio::test]
async fn lock_missing_entry_is_not_found() {
  let s = store().await;
  let err = s.lock(Uuid::new_v4(), "alice").await.unwrap_err();
  assert!(err.is_not_found());
  let err = s.unlock(Uuid::new_v4(), "alice").await.unwrap_err();
  assert!(err.is_not_found());
}

// ─── Merge ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn merge_inserts_and_ranks() {
  let s = store().await;
  let (a, b, c) = (
    AthleteIdentity::internal(Uuid::new_v4()),
    AthleteIdentity::internal(Uuid::new_v4()),
    AthleteIdentity::internal(Uuid::new_v4()),
  );

  let summary = merge_internal(&s, vec![internal(&a, 92.0), internal(&b, 85.0)]).await;
  assert_eq!(summary.inserted, 2);

  let summary =
    merge_internal(&s, vec![internal(&a, 92.0), internal(&b, 85.0), internal(&c, 88.0)]).await;
  assert_eq!(summary.inserted, 1);
  assert_eq!(summary.updated, 1);

  let entries = football(&s).await;
  assert_eq!(find(&entries, &a).ranks.overall, Some(1));
  assert_eq!(find(&entries, &c).ranks.overall, Some(2));
  assert_eq!(find(&entries, &b).ranks.overall, Some(3));
  // Listing is ordered by overall rank.
  let order: Vec<Option<u32>> = entries.iter().map(|e| e.ranks.overall).collect();
  assert_eq!(order, vec![Some(1), Some(2), Some(3)]);
}

#[tokio::test]
async fn repeated_merge_is_byte_identical() {
  let s = store().await;
  let ids: Vec<AthleteIdentity> = (0..5).map(|_| AthleteIdentity::internal(Uuid::new_v4())).collect();
  let cands: Vec<Candidate> =
    ids.iter().zip([70.0, 80.0, 80.0, 65.5, 99.0]).map(|(id, sc)| internal(id, sc)).collect();

  merge_internal(&s, cands.clone()).await;
  let first = football(&s).await;

  let summary = merge_internal(&s, cands).await;
  assert_eq!(summary.written(), 0);
  assert_eq!(summary.unchanged, 5);
  assert_eq!(football(&s).await, first);
}

#[tokio::test]
async fn locked_entry_survives_merges() {
  let s = store().await;
  let (x, y) = (
    AthleteIdentity::internal(Uuid::new_v4()),
    AthleteIdentity::internal(Uuid::new_v4()),
  );
  merge_internal(&s, vec![internal(&x, 95.0), internal(&y, 80.0)]).await;
  let x_id = find(&football(&s).await, &x).entry_id;
  let frozen = s.lock(x_id, "admin").await.unwrap();

  for score in [10.0, 50.0, 99.0] {
    let summary = merge_internal(&s, vec![internal(&x, score), internal(&y, 80.0)]).await;
    assert_eq!(summary.preserved, 1);
    assert_eq!(s.get_entry(x_id).await.unwrap().unwrap(), frozen);
  }
}

#[tokio::test]
async fn merge_matches_sport_ignoring_case() {
  let s = store().await;
  let (x, y) = (
    AthleteIdentity::internal(Uuid::new_v4()),
    AthleteIdentity::internal(Uuid::new_v4()),
  );
  merge_internal(&s, vec![internal(&x, 95.0), internal(&y, 80.0)]).await;
  let x_id = find(&football(&s).await, &x).entry_id;
  let frozen = s.lock(x_id, "admin").await.unwrap();

  let lower = |id: &AthleteIdentity, score| Candidate { sport: "football".into(), ..internal(id, score) };
  let summary = s
    .run_merge(MergeRequest {
      sport:    " football ".into(),
      snapshot: Some((CandidateOrigin::Internal, vec![lower(&x, 10.0), lower(&y, 81.0)])),
      at:       Utc::now(),
    })
    .await
    .unwrap();
  assert_eq!(summary.inserted, 0);
  assert_eq!(summary.preserved, 1);
  assert_eq!(summary.updated, 1);

  let entries = football(&s).await;
  assert_eq!(entries.len(), 2);
  assert!(entries.iter().all(|e| e.sport == "Football"));
  assert_eq!(s.get_entry(x_id).await.unwrap().unwrap(), frozen);
  assert_eq!(find(&entries, &y).composite_score, Some(81.0));

  // Manual entries adopt the stored spelling too.
  let z = AthleteIdentity::internal(Uuid::new_v4());
  let created = s.create_manual_entry(NewEntry::new(z, "FOOTBALL"), "admin").await.unwrap();
  assert_eq!(created.sport, "Football");
  assert_eq!(football(&s).await.len(), 3);
}

#[tokio::test]
async fn merge_without_snapshot_reuses_stored_candidates() {
  let s = store().await;
  let a = AthleteIdentity::internal(Uuid::new_v4());
  merge_internal(&s, vec![internal(&a, 70.0)]).await;

  // An admin clobbers the score; a plain re-merge restores it from the
  // stored snapshot.
  let id = find(&football(&s).await, &a).entry_id;
  s.update_entry(id, &EntryPatch { composite_score: Some(Some(12.0)), ..Default::default() })
    .await
    .unwrap();

  let summary = s
    .run_merge(MergeRequest { sport: "Football".into(), snapshot: None, at: Utc::now() })
    .await
    .unwrap();
  assert_eq!(summary.candidates, 1);
  assert_eq!(summary.updated, 1);
  assert_eq!(s.get_entry(id).await.unwrap().unwrap().composite_score, Some(70.0));
}

#[tokio::test]
async fn internal_snapshot_supersedes_external_for_same_athlete() {
  let s = store().await;
  let athlete = AthleteIdentity::internal(Uuid::new_v4());
  let outsider = AthleteIdentity::external("Taylor Brooks").unwrap();

  merge_internal(&s, vec![internal(&athlete, 72.0)]).await;
  let summary = s
    .run_merge(MergeRequest {
      sport:    "Football".into(),
      snapshot: Some((CandidateOrigin::External, vec![
        candidate(&athlete, 100.0, CandidateOrigin::External),
        candidate(&outsider, 60.0, CandidateOrigin::External),
      ])),
      at:       Utc::now(),
    })
    .await
    .unwrap();

  assert_eq!(summary.superseded, 1);
  assert_eq!(summary.inserted, 1);

  let entries = football(&s).await;
  assert_eq!(find(&entries, &athlete).composite_score, Some(72.0));
  let ext = find(&entries, &outsider);
  assert!(ext.is_external_only());
  assert_eq!(ext.ranks.overall, Some(2));
}

#[tokio::test]
async fn entries_missing_from_candidates_are_kept() {
  let s = store().await;
  let (a, b) = (
    AthleteIdentity::internal(Uuid::new_v4()),
    AthleteIdentity::internal(Uuid::new_v4()),
  );
  merge_internal(&s, vec![internal(&a, 70.0), internal(&b, 60.0)]).await;
  merge_internal(&s, vec![internal(&b, 61.0)]).await;

  let entries = football(&s).await;
  assert_eq!(entries.len(), 2);
  assert_eq!(find(&entries, &a).composite_score, Some(70.0));
}

#[tokio::test]
async fn list_filters_by_year_and_lock() {
  let s = store().await;
  let a = AthleteIdentity::internal(Uuid::new_v4());
  let mut other_year = internal(&AthleteIdentity::internal(Uuid::new_v4()), 50.0);
  other_year.graduation_year = Some(2027);
  merge_internal(&s, vec![internal(&a, 70.0), other_year]).await;
  s.lock(find(&football(&s).await, &a).entry_id, "admin").await.unwrap();

  let year = s
    .list_entries(&EntryQuery { graduation_year: Some(2027), ..Default::default() })
    .await
    .unwrap();
  assert_eq!(year.len(), 1);

  let locked = s
    .list_entries(&EntryQuery { locked_only: true, ..Default::default() })
    .await
    .unwrap();
  assert_eq!(locked.len(), 1);
  assert_eq!(locked[0].identity, a);

  let limited = s
    .list_entries(&EntryQuery { limit: Some(1), ..Default::default() })
    .await
    .unwrap();
  assert_eq!(limited.len(), 1);
}

// ─── Evaluation source ───────────────────────────────────────────────────────

#[tokio::test]
async fn athletes_carry_latest_evaluation() {
  let s = store().await;
  let evaluated = AthleteProfile {
    athlete_id:      Uuid::new_v4(),
    full_name:       "Jordan Avery".into(),
    sport:           "Football".into(),
    graduation_year: Some(2026),
    position:        Some("QB".into()),
    state:           Some("TX".into()),
  };
  let fresh = AthleteProfile {
    athlete_id: Uuid::new_v4(),
    full_name: "Sam Cole".into(),
    ..evaluated.clone()
  };
  s.upsert_athlete(&evaluated, 3).await.unwrap();
  s.upsert_athlete(&fresh, 0).await.unwrap();

  let old = EvaluationMetrics { technical_skill: Some(40.0), ..Default::default() };
  let new = EvaluationMetrics { technical_skill: Some(90.0), mental_game: Some(80.0), ..Default::default() };
  let now = Utc::now();
  s.record_evaluation(evaluated.athlete_id, &old, now - Duration::days(30)).await.unwrap();
  s.record_evaluation(evaluated.athlete_id, &new, now).await.unwrap();

  let records = s.athletes("football").await.unwrap();
  assert_eq!(records.len(), 2);

  let jordan = records.iter().find(|r| r.profile.athlete_id == evaluated.athlete_id).unwrap();
  let metrics = jordan.metrics.unwrap();
  assert_eq!(metrics.technical_skill, Some(90.0));
  assert_eq!(metrics.mental_game, Some(80.0));
  assert_eq!(metrics.courses_completed, 3);

  let sam = records.iter().find(|r| r.profile.athlete_id == fresh.athlete_id).unwrap();
  assert!(sam.metrics.is_none());

  assert!(s.athletes("Soccer").await.unwrap().is_empty());
}
