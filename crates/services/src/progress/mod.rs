//! Best-effort persistence of practice results.
//!
//! The remote progress table's schema is not known in advance, so a save
//! walks an ordered list of row shapes (see [`strategies`]) until one insert
//! is accepted. Each failed attempt is an independent write; nothing is
//! rolled back.

use std::sync::Arc;

use log::{debug, info, warn};
use practice_core::model::{AuthIdentity, ProgressRecord};
use storage::repository::{LocalProgressCache, ProgressStore};

use crate::error::SaveError;

pub mod history;
pub mod strategies;

pub use history::{DEFAULT_HISTORY_LIMIT, HistoryEntry, HistoryReader};
pub use strategies::{AttemptShape, MAX_ATTEMPTS, attempt_shapes};

/// Name of the remote progress table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressTable(String);

impl ProgressTable {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.0
    }
}

impl Default for ProgressTable {
    fn default() -> Self {
        Self::new("user_progress")
    }
}

/// Proof of a successful save.
#[derive(Debug, Clone, PartialEq)]
pub struct SaveReceipt {
    /// 1-based index of the accepted attempt.
    pub attempt: usize,
    pub shape: AttemptShape,
    pub record: ProgressRecord,
}

/// Runs the adaptive insert protocol.
#[derive(Clone)]
pub struct ProgressSaver {
    store: Arc<dyn ProgressStore>,
    local_cache: Option<Arc<dyn LocalProgressCache>>,
    table: ProgressTable,
}

impl ProgressSaver {
    #[must_use]
    pub fn new(
        store: Arc<dyn ProgressStore>,
        local_cache: Option<Arc<dyn LocalProgressCache>>,
        table: ProgressTable,
    ) -> Self {
        Self {
            store,
            local_cache,
            table,
        }
    }

    #[must_use]
    pub fn table(&self) -> &ProgressTable {
        &self.table
    }

    /// Persist `record` for `identity`.
    ///
    /// Attempts run strictly in order and stop at the first accepted insert.
    /// When every shape is refused, or the store cannot be reached, the record
    /// is appended to the local cache (if any) before the error is returned.
    ///
    /// # Errors
    ///
    /// - `SaveError::NotAuthenticated` when `identity` is `None`; nothing is written.
    /// - `SaveError::SchemaMismatch` after all [`MAX_ATTEMPTS`] shapes are refused.
    /// - `SaveError::Unavailable` when an attempt fails for a reason other
    ///   than a schema rejection.
    pub async fn save(
        &self,
        record: &ProgressRecord,
        identity: Option<&AuthIdentity>,
    ) -> Result<SaveReceipt, SaveError> {
        if identity.is_none() {
            return Err(SaveError::NotAuthenticated);
        }
        let table = self.table.name();

        let mut last_error = String::new();
        let mut attempts = 0;
        for shape in attempt_shapes() {
            attempts += 1;
            debug!("save attempt {attempts}/{MAX_ATTEMPTS} on {table}: {}", shape.describe());
            match self.store.insert_row(table, &shape.build_row(record)).await {
                Ok(()) => {
                    info!(
                        "saved result to {table} on attempt {attempts} with {}",
                        shape.describe()
                    );
                    return Ok(SaveReceipt {
                        attempt: attempts,
                        shape,
                        record: record.clone(),
                    });
                }
                Err(e) if e.is_rejection() => {
                    debug!("attempt {attempts} rejected: {e}");
                    last_error = e.to_string();
                }
                Err(e) => {
                    warn!("progress store unavailable: {e}");
                    let cached_locally = self.cache_locally(record).await;
                    return Err(SaveError::Unavailable {
                        attempts,
                        message: e.to_string(),
                        cached_locally,
                    });
                }
            }
        }

        warn!("no row shape accepted by {table} after {attempts} attempts: {last_error}");
        let cached_locally = self.cache_locally(record).await;
        Err(SaveError::SchemaMismatch {
            attempts,
            last_error,
            cached_locally,
        })
    }

    async fn cache_locally(&self, record: &ProgressRecord) -> bool {
        let Some(cache) = &self.local_cache else {
            return false;
        };
        match cache.append_record(&record.clone().into_local()).await {
            Ok(id) => {
                info!("kept result in local cache as #{id}");
                true
            }
            Err(e) => {
                warn!("local cache write failed: {e}");
                false
            }
        }
    }
}
