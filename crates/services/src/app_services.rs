use std::sync::Arc;

use log::info;
use practice_core::model::AuthIdentity;
use storage::identity::{IdentityProvider, StaticIdentityProvider};
use storage::repository::{InMemoryRepository, ProgressStore, QuestionSource, Storage, TableSchema};
use storage::rest::{RestConfig, RestRepository};

use crate::error::AppServicesError;
use crate::practice_service::PracticeService;
use crate::progress::{DEFAULT_HISTORY_LIMIT, ProgressTable};
use crate::question_bank::QuestionTables;
use crate::Clock;

/// Where remote data lives.
#[derive(Debug, Clone)]
pub enum Backend {
    /// Hosted REST backend.
    Rest(RestConfig),
    /// In-process demo data with a strict progress schema.
    Demo,
}

/// Everything needed to assemble the services.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub backend: Backend,
    pub local_db_url: Option<String>,
    pub identity: Option<AuthIdentity>,
    pub history_limit: u32,
    pub question_tables: QuestionTables,
    pub progress_table: ProgressTable,
}

impl AppConfig {
    #[must_use]
    pub fn new(backend: Backend) -> Self {
        Self {
            backend,
            local_db_url: None,
            identity: None,
            history_limit: DEFAULT_HISTORY_LIMIT,
            question_tables: QuestionTables::default(),
            progress_table: ProgressTable::default(),
        }
    }
}

/// Assembles app-facing services from configuration.
#[derive(Clone)]
pub struct AppServices {
    practice: Arc<PracticeService>,
    identity: Arc<StaticIdentityProvider>,
    backend_label: String,
}

impl AppServices {
    /// Build storage, identity and the practice service.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if the local cache cannot be opened or the
    /// demo backend cannot be seeded.
    pub async fn bootstrap(config: AppConfig, clock: Clock) -> Result<Self, AppServicesError> {
        let (storage, backend_label) = match &config.backend {
            Backend::Rest(rest) => {
                let repo = Arc::new(RestRepository::new(rest.clone()));
                let questions: Arc<dyn QuestionSource> = repo.clone();
                let progress: Arc<dyn ProgressStore> = repo;
                let storage = Storage {
                    questions,
                    progress,
                    local_cache: None,
                };
                (storage, rest.base_url.to_string())
            }
            Backend::Demo => {
                let repo = demo_repository(&config.progress_table)?;
                (Storage::from_memory(&repo), "demo".to_string())
            }
        };

        let storage = match &config.local_db_url {
            Some(url) => storage.with_sqlite_cache(url).await?,
            None => storage,
        };

        let identity = Arc::new(StaticIdentityProvider::new(config.identity.clone()));
        let provider: Arc<dyn IdentityProvider> = identity.clone();
        let practice = PracticeService::with_tables(
            clock,
            &storage,
            provider,
            config.question_tables.clone(),
            config.progress_table.clone(),
        )
        .with_history_limit(config.history_limit);

        info!("practice services ready (backend: {backend_label})");
        Ok(Self {
            practice: Arc::new(practice),
            identity,
            backend_label,
        })
    }

    #[must_use]
    pub fn practice(&self) -> Arc<PracticeService> {
        Arc::clone(&self.practice)
    }

    #[must_use]
    pub fn identity(&self) -> Arc<StaticIdentityProvider> {
        Arc::clone(&self.identity)
    }

    #[must_use]
    pub fn backend_label(&self) -> &str {
        &self.backend_label
    }
}

/// Demo data: no question tables (so the built-in set is used) and a progress
/// table that only accepts a timestamped score row.
fn demo_repository(table: &ProgressTable) -> Result<InMemoryRepository, AppServicesError> {
    let repo = InMemoryRepository::new();
    repo.set_schema(
        table.name(),
        TableSchema::new(["id"]).with_required(["user_id", "created_at", "score", "time"]),
    )?;
    Ok(repo)
}

#[cfg(test)]
mod tests {
    use super::*;
    use practice_core::model::UserId;
    use practice_core::time::fixed_clock;

    #[tokio::test]
    async fn demo_backend_falls_back_to_builtin_questions() {
        let services = AppServices::bootstrap(AppConfig::new(Backend::Demo), fixed_clock())
            .await
            .unwrap();
        assert_eq!(services.backend_label(), "demo");
        let started = services.practice().start_session().await.unwrap();
        assert!(started.warning.is_some());
        assert_eq!(started.session.len(), 31);
    }

    #[tokio::test]
    async fn demo_backend_accepts_timestamped_score_rows() {
        let mut config = AppConfig::new(Backend::Demo);
        config.identity = Some(AuthIdentity::new(UserId::new("demo").unwrap(), None));
        let services = AppServices::bootstrap(config, fixed_clock()).await.unwrap();
        let practice = services.practice();

        let mut session = practice.start_session().await.unwrap().session;
        session.record_answer(0, "Option A").unwrap();
        practice.finish(&mut session);
        let saved = practice.save(&mut session).await.unwrap();
        assert_eq!(saved.receipt.attempt, 7);
        assert_eq!(saved.history.len(), 1);
        assert_eq!(saved.history[0].accuracy_percentage, Some(100));
    }
}
