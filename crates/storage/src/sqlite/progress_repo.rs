use practice_core::model::{ProgressRecord, UserId};

use super::SqliteRepository;
use super::mapping::map_progress_row;
use crate::repository::{LocalProgressCache, StorageError};

#[async_trait::async_trait]
impl LocalProgressCache for SqliteRepository {
    async fn append_record(&self, record: &ProgressRecord) -> Result<i64, StorageError> {
        let res = sqlx::query(
            r"
                INSERT INTO local_progress (
                    user_id, recorded_at, correct_count, total_count,
                    completion_percentage, accuracy_percentage, time_taken_seconds
                )
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            ",
        )
        .bind(record.user_id.as_str())
        .bind(record.recorded_at)
        .bind(i64::from(record.correct_count))
        .bind(i64::from(record.total_count))
        .bind(i64::from(record.completion_percentage))
        .bind(i64::from(record.accuracy_percentage))
        .bind(i64::from(record.time_taken_seconds))
        .execute(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        Ok(res.last_insert_rowid())
    }

    async fn list_records(
        &self,
        user_id: &UserId,
        limit: u32,
    ) -> Result<Vec<ProgressRecord>, StorageError> {
        let rows = sqlx::query(
            r"
                SELECT
                    user_id, recorded_at, correct_count, total_count,
                    completion_percentage, accuracy_percentage, time_taken_seconds
                FROM local_progress
                WHERE user_id = ?1
                ORDER BY recorded_at DESC, id DESC
                LIMIT ?2
            ",
        )
        .bind(user_id.as_str())
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            out.push(map_progress_row(&row)?);
        }
        Ok(out)
    }
}
