use std::sync::Arc;

use practice_core::model::{AuthIdentity, PracticeSession, ProgressRecord, ScoreSummary, score};
use storage::identity::IdentityProvider;
use storage::repository::Storage;

use crate::Clock;
use crate::error::{PracticeError, SaveError};
use crate::identity::IdentityWatch;
use crate::progress::{
    DEFAULT_HISTORY_LIMIT, HistoryEntry, HistoryReader, ProgressSaver, ProgressTable, SaveReceipt,
};
use crate::question_bank::{QuestionBankLoader, QuestionTables};

/// A session ready to run, with the loader's warning if the built-in set was used.
#[derive(Debug, Clone)]
pub struct StartedSession {
    pub session: PracticeSession,
    pub warning: Option<String>,
}

/// Outcome of a successful save: the receipt and the reloaded history.
#[derive(Debug, Clone)]
pub struct SavedProgress {
    pub receipt: SaveReceipt,
    pub history: Vec<HistoryEntry>,
}

/// Orchestrates loading, finishing, saving and history for practice sessions.
#[derive(Clone)]
pub struct PracticeService {
    clock: Clock,
    loader: QuestionBankLoader,
    saver: ProgressSaver,
    history: HistoryReader,
    identity: IdentityWatch,
    history_limit: u32,
}

impl PracticeService {
    #[must_use]
    pub fn new(clock: Clock, storage: &Storage, identity: Arc<dyn IdentityProvider>) -> Self {
        Self::with_tables(
            clock,
            storage,
            identity,
            QuestionTables::default(),
            ProgressTable::default(),
        )
    }

    #[must_use]
    pub fn with_tables(
        clock: Clock,
        storage: &Storage,
        identity: Arc<dyn IdentityProvider>,
        questions: QuestionTables,
        progress: ProgressTable,
    ) -> Self {
        let loader =
            QuestionBankLoader::new(Arc::clone(&storage.questions)).with_tables(questions);
        let saver = ProgressSaver::new(
            Arc::clone(&storage.progress),
            storage.local_cache.clone(),
            progress.clone(),
        );
        let history = HistoryReader::new(
            Arc::clone(&storage.progress),
            storage.local_cache.clone(),
            progress,
        );
        Self {
            clock,
            loader,
            saver,
            history,
            identity: IdentityWatch::new(identity),
            history_limit: DEFAULT_HISTORY_LIMIT,
        }
    }

    #[must_use]
    pub fn with_history_limit(mut self, limit: u32) -> Self {
        self.history_limit = limit.max(1);
        self
    }

    #[must_use]
    pub fn history_limit(&self) -> u32 {
        self.history_limit
    }

    #[must_use]
    pub fn identity(&self) -> Option<AuthIdentity> {
        self.identity.current()
    }

    /// A fresh handle for awaiting identity changes.
    #[must_use]
    pub fn identity_watch(&self) -> IdentityWatch {
        self.identity.clone()
    }

    /// Load questions (or the built-in set) and start a running session.
    ///
    /// # Errors
    ///
    /// Returns `PracticeError::Session` only if no questions could be produced at all.
    pub async fn start_session(&self) -> Result<StartedSession, PracticeError> {
        let loaded = self.loader.load_or_fallback().await;
        let session = PracticeSession::new(loaded.questions, self.clock.now())?;
        Ok(StartedSession {
            session,
            warning: loaded.warning,
        })
    }

    /// Finish the session and return its score. Finishing twice is harmless.
    pub fn finish(&self, session: &mut PracticeSession) -> ScoreSummary {
        session.finish(self.clock.now());
        score(session)
    }

    /// Claim the session's save slot, persist, and record the outcome on it.
    ///
    /// # Errors
    ///
    /// Returns `SaveError::Session` if the session is not finished, already
    /// saving, or already saved; otherwise see [`PracticeService::save_claimed`].
    pub async fn save(&self, session: &mut PracticeSession) -> Result<SavedProgress, SaveError> {
        session.begin_save()?;
        let result = self.save_claimed(session).await;
        match &result {
            Ok(_) => session.complete_save(),
            Err(_) => session.fail_save(),
        }
        result
    }

    /// Persist a session whose save slot the caller already claimed.
    ///
    /// On success history is reloaded exactly once. Answers and score stay in
    /// the session whatever the outcome.
    ///
    /// # Errors
    ///
    /// Returns `SaveError::NotAuthenticated` when signed out,
    /// `SaveError::SchemaMismatch` when no row shape is accepted and
    /// `SaveError::Unavailable` when the store cannot be reached.
    pub async fn save_claimed(&self, session: &PracticeSession) -> Result<SavedProgress, SaveError> {
        let identity = self.identity.refresh().await;
        let Some(user) = identity.as_ref() else {
            return Err(SaveError::NotAuthenticated);
        };

        let summary = score(session);
        let recorded_at = session.finished_at().unwrap_or_else(|| self.clock.now());
        let record = ProgressRecord::from_summary(
            user.user_id().clone(),
            recorded_at,
            &summary,
            session.elapsed_seconds(),
        );

        let receipt = self.saver.save(&record, identity.as_ref()).await?;
        let history = self
            .history
            .load_history(user.user_id(), self.history_limit)
            .await;
        Ok(SavedProgress { receipt, history })
    }

    /// History for the signed-in user; empty when signed out or unreadable.
    pub async fn load_history(&self) -> Vec<HistoryEntry> {
        match self.identity.current() {
            Some(user) => {
                self.history
                    .load_history(user.user_id(), self.history_limit)
                    .await
            }
            None => Vec::new(),
        }
    }
}
