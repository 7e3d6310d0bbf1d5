use practice_core::model::{ProgressRecord, UserId};
use sqlx::Row;

use crate::repository::StorageError;

pub(crate) fn ser<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Serialization(e.to_string())
}

fn u32_from_i64(field: &'static str, v: i64) -> Result<u32, StorageError> {
    u32::try_from(v).map_err(|_| StorageError::Serialization(format!("invalid {field}: {v}")))
}

fn percent_from_i64(field: &'static str, v: i64) -> Result<u8, StorageError> {
    u8::try_from(v)
        .ok()
        .filter(|p| *p <= 100)
        .ok_or_else(|| StorageError::Serialization(format!("invalid {field}: {v}")))
}

pub(crate) fn map_progress_row(
    row: &sqlx::sqlite::SqliteRow,
) -> Result<ProgressRecord, StorageError> {
    let user_id = UserId::new(row.try_get::<String, _>("user_id").map_err(ser)?).map_err(ser)?;
    let recorded_at = row.try_get("recorded_at").map_err(ser)?;

    Ok(ProgressRecord {
        user_id,
        recorded_at,
        correct_count: u32_from_i64(
            "correct_count",
            row.try_get::<i64, _>("correct_count").map_err(ser)?,
        )?,
        total_count: u32_from_i64(
            "total_count",
            row.try_get::<i64, _>("total_count").map_err(ser)?,
        )?,
        completion_percentage: percent_from_i64(
            "completion_percentage",
            row.try_get::<i64, _>("completion_percentage").map_err(ser)?,
        )?,
        accuracy_percentage: percent_from_i64(
            "accuracy_percentage",
            row.try_get::<i64, _>("accuracy_percentage").map_err(ser)?,
        )?,
        time_taken_seconds: u32_from_i64(
            "time_taken_seconds",
            row.try_get::<i64, _>("time_taken_seconds").map_err(ser)?,
        )?,
        is_local: true,
    })
}
