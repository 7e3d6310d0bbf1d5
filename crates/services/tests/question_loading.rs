use std::sync::Arc;

use practice_core::model::{AnswerSource, BUILTIN_QUESTION_COUNT, RawRow, score};
use practice_core::time::fixed_clock;
use serde_json::json;
use services::{LoadError, PracticeService, QuestionBankLoader, QuestionTables};
use storage::identity::StaticIdentityProvider;
use storage::repository::{InMemoryRepository, Storage};

fn row(value: serde_json::Value) -> RawRow {
    serde_json::from_value(value).unwrap()
}

fn loader(repo: &InMemoryRepository) -> QuestionBankLoader {
    QuestionBankLoader::new(Arc::new(repo.clone()))
}

#[tokio::test]
async fn empty_primary_falls_through_to_alternate() {
    let repo = InMemoryRepository::new();
    repo.seed_rows("questions", Vec::new()).unwrap();
    repo.seed_rows(
        "asvab_questions",
        vec![row(json!({
            "id": 11,
            "question_text": "2 + 2 = ?",
            "category": "Arithmetic Reasoning",
            "answer": "4"
        }))],
    )
    .unwrap();
    repo.seed_rows(
        "options",
        vec![
            row(json!({ "question_id": 11, "option_text": "5" })),
            row(json!({ "question_id": 11, "option_text": "3" })),
            row(json!({ "question_id": 11, "option_text": "4" })),
            row(json!({ "question_id": 11, "option_text": "22" })),
        ],
    )
    .unwrap();

    let questions = loader(&repo).load().await.unwrap();
    assert_eq!(questions.len(), 1);
    let q = &questions[0];
    assert_eq!(q.options(), ["22", "3", "4", "5"]);
    // "4" is literal option text, not a position.
    assert_eq!(q.correct_answer(), "4");
    assert_eq!(q.answer_source(), AnswerSource::Literal);
    assert_eq!(q.category(), Some("Arithmetic Reasoning"));
}

#[tokio::test]
async fn option_table_failure_is_absorbed() {
    let repo = InMemoryRepository::new();
    repo.seed_rows(
        "questions",
        vec![row(json!({
            "id": 1,
            "question": "Pick the second",
            "option1": "first", "option2": "second", "option3": "third", "option4": "fourth",
            "correctAnswer": "2"
        }))],
    )
    .unwrap();
    repo.set_unreachable("options").unwrap();

    let questions = loader(&repo).load().await.unwrap();
    assert_eq!(questions[0].correct_answer(), "second");
}

#[tokio::test]
async fn missing_tables_report_no_questions() {
    let repo = InMemoryRepository::new();
    let err = loader(&repo).load().await.unwrap_err();
    let LoadError::NoQuestionsAvailable { tables, .. } = err else {
        panic!("unexpected error");
    };
    assert_eq!(tables, vec!["questions", "asvab_questions"]);

    let loaded = loader(&repo).load_or_fallback().await;
    assert!(loaded.is_fallback());
    assert_eq!(loaded.questions.len(), BUILTIN_QUESTION_COUNT);
    assert!(loaded.questions.iter().all(|q| q.correct_answer() == "Option A"));
}

#[tokio::test]
async fn custom_table_names_are_honored() {
    let repo = InMemoryRepository::new();
    repo.seed_rows(
        "bank",
        vec![row(json!({ "prompt": "Custom?", "a": "yes", "b": "no" }))],
    )
    .unwrap();
    let tables = QuestionTables {
        primary: "bank".into(),
        alternate: "bank_v2".into(),
        options: "bank_options".into(),
    };
    let questions = loader(&repo).with_tables(tables).load().await.unwrap();
    assert_eq!(questions[0].options(), ["yes", "no", "Option A", "Option B"]);
    assert!(questions[0].answer_source().is_low_confidence());
}

#[tokio::test]
async fn fallback_session_with_no_answers_scores_zero() {
    let service = PracticeService::new(
        fixed_clock(),
        &Storage::in_memory(),
        Arc::new(StaticIdentityProvider::anonymous()),
    );
    let started = service.start_session().await.unwrap();
    assert!(started.warning.is_some());

    let mut session = started.session;
    let summary = service.finish(&mut session);
    assert_eq!(summary, score(&session));
    assert_eq!(summary.total_count, 31);
    assert_eq!(summary.answered_count, 0);
    assert_eq!(summary.correct_count, 0);
    assert_eq!(summary.percent_answered, 0);
    assert_eq!(summary.percent_correct, 0);
}
