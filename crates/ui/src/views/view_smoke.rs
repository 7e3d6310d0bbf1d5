use std::sync::Arc;

use chrono::Duration;
use dioxus::prelude::ReadableExt;
use practice_core::model::RawRow;
use practice_core::time::fixed_now;
use serde_json::json;
use storage::identity::StaticIdentityProvider;
use storage::repository::{InMemoryRepository, TableSchema};

use super::test_harness::{
    TEST_USER, ViewKind, setup_view_harness, setup_view_harness_with_identity,
};
use crate::vm::{HINT_SCHEMA, PracticeIntent};

const PROGRESS_TABLE: &str = "user_progress";

fn row(value: serde_json::Value) -> RawRow {
    serde_json::from_value(value).expect("row object")
}

#[tokio::test(flavor = "current_thread")]
async fn practice_view_smoke_renders_sample_questions() {
    let repo = InMemoryRepository::new();
    let mut harness = setup_view_harness(ViewKind::Practice, &repo);
    harness.settle().await;

    let html = harness.render();
    assert!(html.contains("Question 1 of 31"), "missing position in {html}");
    assert!(html.contains("This is question 1"), "missing text in {html}");
    assert!(html.contains("A. Option A"), "missing option in {html}");
    assert!(html.contains("Time: 00:00"), "missing timer in {html}");
    assert!(
        html.contains("Showing sample questions instead."),
        "missing fallback warning in {html}"
    );
    assert!(html.contains("grid-cell current"), "missing grid in {html}");
}

#[tokio::test(flavor = "current_thread")]
async fn practice_view_smoke_records_answer_and_moves_on() {
    let repo = InMemoryRepository::new();
    let mut harness = setup_view_harness(ViewKind::Practice, &repo);
    harness.settle().await;

    harness.dispatch(PracticeIntent::SelectOption("Option B".into()));
    harness.dispatch(PracticeIntent::Next);

    let html = harness.render();
    assert!(html.contains("Question 2 of 31"), "missing position in {html}");
    assert!(html.contains("Answered 1 of 31"), "missing progress in {html}");
    assert!(html.contains("grid-cell answered"), "missing answered cell in {html}");

    let session = harness.practice_handles().session();
    let answered = harness
        .dom
        .in_runtime(|| session.peek().as_ref().map(|s| s.answers().len()));
    assert_eq!(answered, Some(1));
}

#[tokio::test(flavor = "current_thread")]
async fn practice_view_smoke_shows_schema_hint_after_failed_save() {
    let repo = InMemoryRepository::new();
    repo.set_schema(
        PROGRESS_TABLE,
        TableSchema::new(["id"]).with_required(["student"]),
    )
    .expect("set schema");
    let mut harness = setup_view_harness(ViewKind::Practice, &repo);
    harness.settle().await;

    harness.dispatch(PracticeIntent::SelectOption("Option A".into()));
    harness.dispatch(PracticeIntent::Finish);
    let html = harness.render();
    assert!(html.contains("Test summary"), "missing summary in {html}");
    assert!(html.contains("Accuracy: 100%"), "missing accuracy in {html}");

    harness.dispatch(PracticeIntent::Save);
    for _ in 0..4 {
        harness.drive_async().await;
    }

    let html = harness.render();
    assert!(
        html.contains("Could not save your results after 26 attempts."),
        "missing failure title in {html}"
    );
    assert!(html.contains(HINT_SCHEMA), "missing schema hint in {html}");
    assert!(html.contains("kept on this device"), "missing cache note in {html}");
    assert_eq!(repo.insert_attempts().expect("attempt log").len(), 26);
}

#[tokio::test(flavor = "current_thread")]
async fn history_view_smoke_renders_saved_results() {
    let repo = InMemoryRepository::new();
    repo.seed_rows(
        PROGRESS_TABLE,
        vec![
            row(json!({
                "user_id": TEST_USER,
                "created_at": fixed_now().to_rfc3339(),
                "correct_count": 18,
                "total_count": 30,
                "score": 60,
                "time_taken_seconds": 600
            })),
            row(json!({
                "user_id": TEST_USER,
                "created_at": (fixed_now() - Duration::days(1)).to_rfc3339(),
                "score": 40
            })),
        ],
    )
    .expect("seed rows");

    let mut harness = setup_view_harness(ViewKind::History, &repo);
    harness.settle().await;

    let html = harness.render();
    assert!(html.contains("18 / 30"), "missing score in {html}");
    assert!(html.contains("60%"), "missing accuracy in {html}");
    assert!(html.contains("10:00"), "missing duration in {html}");
    assert!(html.contains("trend-bar"), "missing trend in {html}");
}

#[tokio::test(flavor = "current_thread")]
async fn history_view_smoke_prompts_signed_out_users() {
    let repo = InMemoryRepository::new();
    let mut harness = setup_view_harness_with_identity(
        ViewKind::History,
        &repo,
        Arc::new(StaticIdentityProvider::anonymous()),
    );
    harness.settle().await;

    let html = harness.render();
    assert!(html.contains("Sign in to see your saved results."), "missing prompt in {html}");
    assert!(html.contains("No results yet."), "missing empty state in {html}");
    assert!(repo.select_log().expect("select log").is_empty());
}
