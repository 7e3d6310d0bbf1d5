use std::cmp::Reverse;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use log::{debug, warn};
use practice_core::model::{ProgressRecord, RawRow, UserId};
use storage::repository::{LocalProgressCache, ProgressStore, RowQuery};

use super::ProgressTable;
use super::strategies::TIMESTAMP_FIELDS;
use crate::error::HistoryError;

pub const DEFAULT_HISTORY_LIMIT: u32 = 10;

const ACCURACY_FIELDS: &[&str] = &[
    "accuracy_percentage",
    "score",
    "score_percentage",
    "correct_percentage",
];
const COMPLETION_FIELDS: &[&str] = &["completion_percentage"];
const CORRECT_FIELDS: &[&str] = &["correct_count", "correct_answers"];
const TOTAL_FIELDS: &[&str] = &["total_count", "total_questions"];
const DURATION_FIELDS: &[&str] = &["time_taken_seconds", "time_seconds", "total_time", "time"];

/// One past result as far as the stored row could be interpreted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryEntry {
    pub recorded_at: Option<DateTime<Utc>>,
    pub correct_count: Option<u32>,
    pub total_count: Option<u32>,
    pub completion_percentage: Option<u8>,
    pub accuracy_percentage: Option<u8>,
    pub time_taken_seconds: Option<u32>,
    pub is_local: bool,
}

impl HistoryEntry {
    /// Interpret a remote row using the same alias lists the save protocol writes.
    #[must_use]
    pub fn from_row(row: &RawRow) -> Self {
        let correct_count = row.first_integer(CORRECT_FIELDS).and_then(to_u32);
        let total_count = row.first_integer(TOTAL_FIELDS).and_then(to_u32);
        let accuracy_percentage = row
            .first_number(ACCURACY_FIELDS)
            .and_then(to_percent)
            .or_else(|| match (correct_count, total_count) {
                (Some(correct), Some(total)) if total > 0 => {
                    to_percent(f64::from(correct) * 100.0 / f64::from(total))
                }
                _ => None,
            });

        // `time` is both a timestamp and a duration candidate: a number there
        // is a duration and only text is a timestamp.
        let recorded_at = TIMESTAMP_FIELDS
            .iter()
            .filter(|field| **field != "time" || row.get(field).is_some_and(|v| v.is_string()))
            .find_map(|field| row.first_timestamp(&[*field]));
        let time_taken_seconds = DURATION_FIELDS
            .iter()
            .find_map(|field| {
                row.get(field)
                    .filter(|v| v.is_number())
                    .and_then(|_| row.integer(field))
            })
            .and_then(to_u32);

        Self {
            recorded_at,
            correct_count,
            total_count,
            completion_percentage: row.first_number(COMPLETION_FIELDS).and_then(to_percent),
            accuracy_percentage,
            time_taken_seconds,
            is_local: false,
        }
    }
}

impl From<ProgressRecord> for HistoryEntry {
    fn from(record: ProgressRecord) -> Self {
        Self {
            recorded_at: Some(record.recorded_at),
            correct_count: Some(record.correct_count),
            total_count: Some(record.total_count),
            completion_percentage: Some(record.completion_percentage),
            accuracy_percentage: Some(record.accuracy_percentage),
            time_taken_seconds: Some(record.time_taken_seconds),
            is_local: record.is_local,
        }
    }
}

fn to_u32(v: i64) -> Option<u32> {
    u32::try_from(v).ok()
}

fn to_percent(v: f64) -> Option<u8> {
    if !v.is_finite() {
        return None;
    }
    // Clamped to 0..=100, so the cast is exact.
    Some(v.round().clamp(0.0, 100.0) as u8)
}

/// Reads past results from the remote table and the local cache.
#[derive(Clone)]
pub struct HistoryReader {
    store: Arc<dyn ProgressStore>,
    local_cache: Option<Arc<dyn LocalProgressCache>>,
    table: ProgressTable,
}

impl HistoryReader {
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

    /// Most recent results for `user_id`, newest first, at most `limit`.
    ///
    /// Never fails: an unreadable remote table yields only local entries.
    pub async fn load_history(&self, user_id: &UserId, limit: u32) -> Vec<HistoryEntry> {
        let mut entries = match self.fetch_remote(user_id, limit).await {
            Ok(rows) => rows.iter().map(HistoryEntry::from_row).collect(),
            Err(e) => {
                warn!("{e}");
                Vec::new()
            }
        };

        if let Some(cache) = &self.local_cache {
            match cache.list_records(user_id, limit).await {
                Ok(records) => entries.extend(records.into_iter().map(HistoryEntry::from)),
                Err(e) => warn!("local history unavailable: {e}"),
            }
        }

        // Stable sort keeps remote order for rows without a timestamp.
        entries.sort_by_key(|entry| Reverse(entry.recorded_at));
        entries.truncate(usize::try_from(limit).unwrap_or(usize::MAX));
        entries
    }

    /// Try each timestamp column as the order key, then an unordered read.
    ///
    /// # Errors
    ///
    /// Returns `HistoryError::Unavailable` with the last backend error when
    /// every variant fails.
    pub async fn fetch_remote(
        &self,
        user_id: &UserId,
        limit: u32,
    ) -> Result<Vec<RawRow>, HistoryError> {
        let base = RowQuery::table(self.table.name())
            .eq("user_id", user_id.as_str())
            .limit(limit);

        for column in TIMESTAMP_FIELDS {
            match self.store.select_rows(&base.clone().order_desc(column)).await {
                Ok(rows) => return Ok(rows),
                Err(e) => debug!("history ordered by {column} failed: {e}"),
            }
        }

        self.store
            .select_rows(&base)
            .await
            .map_err(HistoryError::Unavailable)
    }
}
