use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use practice_core::model::{AuthIdentity, PracticeSession, RawRow, SaveState, UserId};
use practice_core::time::{fixed_clock, fixed_now};
use services::{MAX_ATTEMPTS, PracticeService, SaveError};
use storage::identity::{IdentityProvider, StaticIdentityProvider};
use storage::repository::{
    InMemoryRepository, LocalProgressCache, ProgressStore, QuestionSource, RowQuery, Storage,
    StorageError, TableSchema,
};

const TABLE: &str = "user_progress";

fn signed_in() -> Arc<dyn IdentityProvider> {
    Arc::new(StaticIdentityProvider::new(Some(AuthIdentity::new(
        UserId::new("user-1").unwrap(),
        Some("user@example.com".into()),
    ))))
}

async fn finished_session(service: &PracticeService) -> PracticeSession {
    let mut session = service.start_session().await.unwrap().session;
    session.record_answer(0, "Option A").unwrap();
    session.record_answer(1, "Option B").unwrap();
    session.tick();
    service.finish(&mut session);
    session
}

#[tokio::test]
async fn logged_out_save_writes_nothing() {
    let repo = InMemoryRepository::new();
    let service = PracticeService::new(
        fixed_clock(),
        &Storage::from_memory(&repo),
        Arc::new(StaticIdentityProvider::anonymous()),
    );
    let mut session = finished_session(&service).await;

    let err = service.save(&mut session).await.unwrap_err();
    assert_eq!(err, SaveError::NotAuthenticated);
    assert!(repo.insert_attempts().unwrap().is_empty());
    assert!(repo.select_log().unwrap().is_empty());
    assert_eq!(session.answers().len(), 2);
}

#[tokio::test]
async fn refusing_schema_stops_after_every_shape_and_caches_locally() {
    let repo = InMemoryRepository::new();
    repo.set_schema(TABLE, TableSchema::new(["id"]).with_required(["student"]))
        .unwrap();
    let service = PracticeService::new(fixed_clock(), &Storage::from_memory(&repo), signed_in());
    let mut session = finished_session(&service).await;

    let err = service.save(&mut session).await.unwrap_err();
    match &err {
        SaveError::SchemaMismatch {
            attempts,
            last_error,
            cached_locally,
        } => {
            assert_eq!(*attempts, MAX_ATTEMPTS);
            assert!(last_error.contains("schema cache"), "{last_error}");
            assert!(*cached_locally);
        }
        other => panic!("unexpected error: {other:?}"),
    }

    let attempts = repo.insert_attempts().unwrap();
    assert_eq!(attempts.len(), 26);
    assert!(attempts.iter().all(|a| !a.accepted));
    assert_eq!(session.save_state(), SaveState::Failed);
    assert_eq!(session.answers().len(), 2);

    let local = repo
        .list_records(&UserId::new("user-1").unwrap(), 10)
        .await
        .unwrap();
    assert_eq!(local.len(), 1);
    assert!(local[0].is_local);
    assert_eq!(local[0].correct_count, 1);
    assert_eq!(local[0].time_taken_seconds, 1);
}

#[tokio::test]
async fn first_accepted_shape_is_final() {
    let repo = InMemoryRepository::new();
    repo.set_schema(
        TABLE,
        TableSchema::new(["id"]).with_required(["user_id", "test_date"]),
    )
    .unwrap();
    let service = PracticeService::new(fixed_clock(), &Storage::from_memory(&repo), signed_in());
    let mut session = finished_session(&service).await;

    let saved = service.save(&mut session).await.unwrap();
    assert_eq!(saved.receipt.attempt, 3);
    assert_eq!(saved.receipt.shape.describe(), "{user_id, test_date}");

    let attempts = repo.insert_attempts().unwrap();
    assert_eq!(attempts.len(), 3);
    assert_eq!(attempts.iter().filter(|a| a.accepted).count(), 1);
    assert_eq!(repo.rows(TABLE).unwrap().len(), 1);
    assert_eq!(session.save_state(), SaveState::Saved);

    let err = service.save(&mut session).await.unwrap_err();
    assert!(matches!(err, SaveError::Session(_)));
    assert_eq!(repo.insert_attempts().unwrap().len(), 3);
}

#[tokio::test]
async fn unreachable_store_stops_early() {
    let repo = InMemoryRepository::new();
    repo.set_unreachable(TABLE).unwrap();
    let service = PracticeService::new(fixed_clock(), &Storage::from_memory(&repo), signed_in());
    let mut session = finished_session(&service).await;

    let err = service.save(&mut session).await.unwrap_err();
    assert!(
        matches!(err, SaveError::Unavailable { attempts: 1, .. }),
        "{err:?}"
    );
    assert!(err.cached_locally());
}

#[tokio::test]
async fn unfinished_sessions_cannot_be_saved() {
    let repo = InMemoryRepository::new();
    let service = PracticeService::new(fixed_clock(), &Storage::from_memory(&repo), signed_in());
    let mut session = service.start_session().await.unwrap().session;
    assert!(matches!(
        service.save(&mut session).await,
        Err(SaveError::Session(_))
    ));
    assert!(repo.insert_attempts().unwrap().is_empty());
}

#[derive(Default)]
struct CountingStore {
    inserts: Mutex<Vec<RawRow>>,
    selects: Mutex<Vec<RowQuery>>,
}

#[async_trait]
impl ProgressStore for CountingStore {
    async fn insert_row(&self, _table: &str, row: &RawRow) -> Result<(), StorageError> {
        self.inserts.lock().unwrap().push(row.clone());
        Ok(())
    }

    async fn select_rows(&self, query: &RowQuery) -> Result<Vec<RawRow>, StorageError> {
        self.selects.lock().unwrap().push(query.clone());
        Ok(self.inserts.lock().unwrap().clone())
    }
}

#[tokio::test]
async fn first_attempt_success_reloads_history_once() {
    let store = Arc::new(CountingStore::default());
    let questions: Arc<dyn QuestionSource> = Arc::new(InMemoryRepository::new());
    let progress: Arc<dyn ProgressStore> = store.clone();
    let storage = Storage {
        questions,
        progress,
        local_cache: None,
    };
    let service = PracticeService::new(fixed_clock(), &storage, signed_in());
    let mut session = finished_session(&service).await;

    let saved = service.save(&mut session).await.unwrap();
    assert_eq!(saved.receipt.attempt, 1);
    assert_eq!(store.inserts.lock().unwrap().len(), 1);

    let selects = store.selects.lock().unwrap().clone();
    assert_eq!(selects.len(), 1);
    assert_eq!(
        selects[0].filter,
        Some(("user_id".to_string(), "user-1".to_string()))
    );
    assert_eq!(selects[0].order_desc.as_deref(), Some("created_at"));
    assert_eq!(selects[0].limit, Some(10));
    assert_eq!(saved.history.len(), 1);
    assert_eq!(saved.receipt.record.recorded_at, fixed_now());
}

#[tokio::test]
async fn reopened_failed_session_can_retry() {
    let repo = InMemoryRepository::new();
    repo.set_unreachable(TABLE).unwrap();
    let service = PracticeService::new(
        fixed_clock(),
        &Storage::from_memory(&repo).with_local_cache(None),
        signed_in(),
    );
    let mut session = finished_session(&service).await;
    let err = service.save(&mut session).await.unwrap_err();
    assert!(!err.cached_locally());

    assert!(session.reopen());
    session.record_answer(2, "Option A").unwrap();
    service.finish(&mut session);
    assert_eq!(session.save_state(), SaveState::Idle);
    assert!(service.save(&mut session).await.is_err());
    assert_eq!(repo.insert_attempts().unwrap().len(), 0);
}

#[tokio::test]
async fn saved_session_cannot_be_reopened_and_changed() {
    let repo = InMemoryRepository::new();
    let service = PracticeService::new(fixed_clock(), &Storage::from_memory(&repo), signed_in());
    let mut session = finished_session(&service).await;
    service.save(&mut session).await.unwrap();
    let saved = repo.rows(TABLE).unwrap();
    assert_eq!(saved.len(), 1);

    assert!(!session.reopen());
    assert!(session.is_finished());
    for index in 2..10 {
        assert!(session.record_answer(index, "Option A").is_err());
    }
    assert_eq!(session.answers().len(), 2);
    assert_eq!(session.save_state(), SaveState::Saved);
    assert_eq!(repo.rows(TABLE).unwrap(), saved);
}
