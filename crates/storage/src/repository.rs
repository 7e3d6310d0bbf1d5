use async_trait::async_trait;
use chrono::{DateTime, Utc};
use practice_core::model::{ProgressRecord, RawRow, UserId};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// Errors surfaced by storage adapters.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum StorageError {
    /// The backend answered but refused the request (unknown column,
    /// constraint violation, row-level security).
    #[error("rejected by backend: {message}")]
    Rejected { status: Option<u16>, message: String },

    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

impl StorageError {
    #[must_use]
    pub fn rejected(message: impl Into<String>) -> Self {
        Self::Rejected {
            status: None,
            message: message.into(),
        }
    }

    /// True when the backend was reached and refused the request.
    #[must_use]
    pub fn is_rejection(&self) -> bool {
        matches!(self, StorageError::Rejected { .. })
    }
}

//
// ─── QUERIES ──────────────────────────────────────────────────────────────────
//

/// Read request against a table-like resource.
///
/// Mirrors what a PostgREST endpoint can express: one equality filter,
/// an optional descending order column and a row limit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowQuery {
    pub table: String,
    pub filter: Option<(String, String)>,
    pub order_desc: Option<String>,
    pub limit: Option<u32>,
}

impl RowQuery {
    #[must_use]
    pub fn table(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            filter: None,
            order_desc: None,
            limit: None,
        }
    }

    #[must_use]
    pub fn eq(mut self, column: impl Into<String>, value: impl Into<String>) -> Self {
        self.filter = Some((column.into(), value.into()));
        self
    }

    #[must_use]
    pub fn order_desc(mut self, column: impl Into<String>) -> Self {
        self.order_desc = Some(column.into());
        self
    }

    #[must_use]
    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }
}

//
// ─── CONTRACTS ────────────────────────────────────────────────────────────────
//

/// Read-only access to question and option tables.
#[async_trait]
pub trait QuestionSource: Send + Sync {
    /// Fetch every row of `table`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the table cannot be read.
    async fn fetch_rows(&self, table: &str) -> Result<Vec<RawRow>, StorageError>;
}

/// Write/read access to the remote progress table.
#[async_trait]
pub trait ProgressStore: Send + Sync {
    /// Insert one open-map row.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Rejected` if the backend refuses the row shape,
    /// or `StorageError::Connection` if it cannot be reached.
    async fn insert_row(&self, table: &str, row: &RawRow) -> Result<(), StorageError>;

    /// Run a filtered, ordered, limited read.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the query is refused or the backend is unreachable.
    async fn select_rows(&self, query: &RowQuery) -> Result<Vec<RawRow>, StorageError>;
}

/// On-device cache for results the remote store did not accept.
#[async_trait]
pub trait LocalProgressCache: Send + Sync {
    /// Append a record and return its local row id.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the record cannot be stored.
    async fn append_record(&self, record: &ProgressRecord) -> Result<i64, StorageError>;

    /// Most recent records for a user, newest first.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on read failures.
    async fn list_records(
        &self,
        user_id: &UserId,
        limit: u32,
    ) -> Result<Vec<ProgressRecord>, StorageError>;
}

//
// ─── IN-MEMORY BACKEND ────────────────────────────────────────────────────────
//

/// Column set a fake table accepts, used to emulate an unknown remote schema.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TableSchema {
    columns: HashSet<String>,
    required: HashSet<String>,
}

impl TableSchema {
    #[must_use]
    pub fn new<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            columns: columns.into_iter().map(Into::into).collect(),
            required: HashSet::new(),
        }
    }

    /// Columns that must be present on every insert (NOT NULL without default).
    #[must_use]
    pub fn with_required<I, S>(mut self, required: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for column in required {
            let column = column.into();
            self.columns.insert(column.clone());
            self.required.insert(column);
        }
        self
    }

    #[must_use]
    pub fn has_column(&self, column: &str) -> bool {
        self.columns.contains(column)
    }

    fn check(&self, row: &RawRow) -> Result<(), StorageError> {
        if let Some(unknown) = row.columns().find(|c| !self.columns.contains(*c)) {
            return Err(StorageError::Rejected {
                status: Some(400),
                message: format!("Could not find the '{unknown}' column in the schema cache"),
            });
        }
        let mut missing: Vec<&str> = self
            .required
            .iter()
            .map(String::as_str)
            .filter(|c| !row.contains(c))
            .collect();
        missing.sort_unstable();
        if let Some(first) = missing.first() {
            return Err(StorageError::Rejected {
                status: Some(400),
                message: format!("null value in column \"{first}\" violates not-null constraint"),
            });
        }
        Ok(())
    }
}

/// One recorded insert, accepted or not.
#[derive(Debug, Clone, PartialEq)]
pub struct InsertAttempt {
    pub table: String,
    pub row: RawRow,
    pub accepted: bool,
}

#[derive(Default)]
struct MemoryState {
    tables: HashMap<String, Vec<RawRow>>,
    schemas: HashMap<String, TableSchema>,
    unreachable: HashSet<String>,
    attempts: Vec<InsertAttempt>,
    selects: Vec<RowQuery>,
    local: Vec<(i64, ProgressRecord)>,
}

/// Simple in-memory repository implementation for testing and prototyping.
///
/// Tables without a registered [`TableSchema`] accept any row shape.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    state: Arc<Mutex<MemoryState>>,
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, MemoryState>, StorageError> {
        self.state
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))
    }

    /// Replace the contents of `table`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Connection` if the state lock is poisoned.
    pub fn seed_rows(&self, table: &str, rows: Vec<RawRow>) -> Result<(), StorageError> {
        self.lock()?.tables.insert(table.to_string(), rows);
        Ok(())
    }

    /// Restrict which row shapes `table` accepts.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Connection` if the state lock is poisoned.
    pub fn set_schema(&self, table: &str, schema: TableSchema) -> Result<(), StorageError> {
        self.lock()?.schemas.insert(table.to_string(), schema);
        Ok(())
    }

    /// Make every read and write against `table` fail with a connection error.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Connection` if the state lock is poisoned.
    pub fn set_unreachable(&self, table: &str) -> Result<(), StorageError> {
        self.lock()?.unreachable.insert(table.to_string());
        Ok(())
    }

    /// Current rows of `table`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Connection` if the state lock is poisoned.
    pub fn rows(&self, table: &str) -> Result<Vec<RawRow>, StorageError> {
        Ok(self.lock()?.tables.get(table).cloned().unwrap_or_default())
    }

    /// Every insert attempted so far, in order.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Connection` if the state lock is poisoned.
    pub fn insert_attempts(&self) -> Result<Vec<InsertAttempt>, StorageError> {
        Ok(self.lock()?.attempts.clone())
    }

    /// Every select issued so far, in order.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Connection` if the state lock is poisoned.
    pub fn select_log(&self) -> Result<Vec<RowQuery>, StorageError> {
        Ok(self.lock()?.selects.clone())
    }
}

fn ensure_reachable(state: &MemoryState, table: &str) -> Result<(), StorageError> {
    if state.unreachable.contains(table) {
        return Err(StorageError::Connection(format!("{table}: connection refused")));
    }
    Ok(())
}

fn sort_key(row: &RawRow, column: &str) -> (Option<DateTime<Utc>>, Option<String>) {
    (row.first_timestamp(&[column]), row.text(column))
}

#[async_trait]
impl QuestionSource for InMemoryRepository {
    async fn fetch_rows(&self, table: &str) -> Result<Vec<RawRow>, StorageError> {
        let guard = self.lock()?;
        ensure_reachable(&guard, table)?;
        guard
            .tables
            .get(table)
            .cloned()
            .ok_or_else(|| StorageError::rejected(format!("relation \"{table}\" does not exist")))
    }
}

#[async_trait]
impl ProgressStore for InMemoryRepository {
    async fn insert_row(&self, table: &str, row: &RawRow) -> Result<(), StorageError> {
        let mut guard = self.lock()?;
        ensure_reachable(&guard, table)?;
        let outcome = guard
            .schemas
            .get(table)
            .map_or(Ok(()), |schema| schema.check(row));
        guard.attempts.push(InsertAttempt {
            table: table.to_string(),
            row: row.clone(),
            accepted: outcome.is_ok(),
        });
        outcome?;
        guard
            .tables
            .entry(table.to_string())
            .or_default()
            .push(row.clone());
        Ok(())
    }

    async fn select_rows(&self, query: &RowQuery) -> Result<Vec<RawRow>, StorageError> {
        let mut guard = self.lock()?;
        guard.selects.push(query.clone());
        ensure_reachable(&guard, &query.table)?;

        if let (Some(schema), Some(column)) =
            (guard.schemas.get(&query.table), query.order_desc.as_deref())
        {
            if !schema.has_column(column) {
                return Err(StorageError::Rejected {
                    status: Some(400),
                    message: format!("column {}.{column} does not exist", query.table),
                });
            }
        }

        let mut rows: Vec<RawRow> = guard
            .tables
            .get(&query.table)
            .cloned()
            .unwrap_or_default()
            .into_iter()
            .filter(|row| match &query.filter {
                Some((column, value)) => row.text(column).as_deref() == Some(value.as_str()),
                None => true,
            })
            .collect();

        if let Some(column) = query.order_desc.as_deref() {
            rows.sort_by(|a, b| sort_key(b, column).cmp(&sort_key(a, column)));
        }
        if let Some(limit) = query.limit {
            rows.truncate(usize::try_from(limit).unwrap_or(usize::MAX));
        }
        Ok(rows)
    }
}

#[async_trait]
impl LocalProgressCache for InMemoryRepository {
    async fn append_record(&self, record: &ProgressRecord) -> Result<i64, StorageError> {
        let mut guard = self.lock()?;
        let id = i64::try_from(guard.local.len()).unwrap_or(i64::MAX) + 1;
        guard.local.push((id, record.clone().into_local()));
        Ok(id)
    }

    async fn list_records(
        &self,
        user_id: &UserId,
        limit: u32,
    ) -> Result<Vec<ProgressRecord>, StorageError> {
        let guard = self.lock()?;
        let mut records: Vec<(i64, ProgressRecord)> = guard
            .local
            .iter()
            .filter(|(_, r)| &r.user_id == user_id)
            .cloned()
            .collect();
        records.sort_by(|(a_id, a), (b_id, b)| {
            b.recorded_at.cmp(&a.recorded_at).then_with(|| b_id.cmp(a_id))
        });
        records.truncate(usize::try_from(limit).unwrap_or(usize::MAX));
        Ok(records.into_iter().map(|(_, r)| r).collect())
    }
}

//
// ─── AGGREGATE ────────────────────────────────────────────────────────────────
//

/// Aggregates the data collaborators behind trait objects for easy backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub questions: Arc<dyn QuestionSource>,
    pub progress: Arc<dyn ProgressStore>,
    pub local_cache: Option<Arc<dyn LocalProgressCache>>,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        Self::from_memory(&InMemoryRepository::new())
    }

    /// Wire every collaborator to the same in-memory repository.
    #[must_use]
    pub fn from_memory(repo: &InMemoryRepository) -> Self {
        let questions: Arc<dyn QuestionSource> = Arc::new(repo.clone());
        let progress: Arc<dyn ProgressStore> = Arc::new(repo.clone());
        let local_cache: Arc<dyn LocalProgressCache> = Arc::new(repo.clone());
        Self {
            questions,
            progress,
            local_cache: Some(local_cache),
        }
    }

    #[must_use]
    pub fn with_local_cache(mut self, cache: Option<Arc<dyn LocalProgressCache>>) -> Self {
        self.local_cache = cache;
        self
    }
}
