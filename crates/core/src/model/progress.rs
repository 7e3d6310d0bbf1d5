use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::ids::UserId;
use crate::model::score::ScoreSummary;

/// One persisted practice result.
///
/// `is_local` marks a record kept only in the on-device cache because the
/// remote store did not accept it; `false` means the remote insert succeeded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressRecord {
    pub user_id: UserId,
    pub recorded_at: DateTime<Utc>,
    pub correct_count: u32,
    pub total_count: u32,
    pub completion_percentage: u8,
    pub accuracy_percentage: u8,
    pub time_taken_seconds: u32,
    pub is_local: bool,
}

impl ProgressRecord {
    #[must_use]
    pub fn from_summary(
        user_id: UserId,
        recorded_at: DateTime<Utc>,
        summary: &ScoreSummary,
        time_taken_seconds: u32,
    ) -> Self {
        Self {
            user_id,
            recorded_at,
            correct_count: summary.correct_count,
            total_count: summary.total_count,
            completion_percentage: summary.percent_answered,
            accuracy_percentage: summary.percent_correct,
            time_taken_seconds,
            is_local: false,
        }
    }

    #[must_use]
    pub fn into_local(mut self) -> Self {
        self.is_local = true;
        self
    }
}
