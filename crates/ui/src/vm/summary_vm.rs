use practice_core::model::ScoreSummary;
use services::{MAX_ATTEMPTS, SaveError, SavedProgress};

use crate::vm::time_fmt::format_duration;

pub const HINT_PERMISSIONS: &str =
    "Check that your account is allowed to insert rows into the progress table.";
pub const HINT_SCHEMA: &str =
    "Check that the progress table has a user id column and a score or timestamp column.";
pub const HINT_CONNECTION: &str = "Check your network connection and try again.";

const PERMISSION_MARKERS: &[&str] = &[
    "permission",
    "row-level security",
    "policy",
    "unauthorized",
    "forbidden",
    "401",
    "403",
];
const SCHEMA_MARKERS: &[&str] = &["column", "schema", "null value", "not-null", "pgrst"];

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SummaryVm {
    pub score_label: String,
    pub answered_label: String,
    pub accuracy_label: String,
    pub time_label: String,
    pub percent_answered: u8,
    pub percent_correct: u8,
    pub unanswered_count: u32,
}

#[must_use]
pub fn map_summary(summary: &ScoreSummary, elapsed_seconds: u32) -> SummaryVm {
    SummaryVm {
        score_label: format!(
            "{} correct out of {} answered",
            summary.correct_count, summary.answered_count
        ),
        answered_label: format!(
            "Answered {} of {} ({}%)",
            summary.answered_count, summary.total_count, summary.percent_answered
        ),
        accuracy_label: format!("Accuracy: {}%", summary.percent_correct),
        time_label: format!("Time taken: {}", format_duration(Some(elapsed_seconds))),
        percent_answered: summary.percent_answered,
        percent_correct: summary.percent_correct,
        unanswered_count: summary.unanswered_count(),
    }
}

/// Save status shown under the summary.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub enum SaveStatusVm {
    #[default]
    Idle,
    Saving,
    Saved(String),
    Failed(SaveFeedbackVm),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SaveFeedbackVm {
    pub title: String,
    pub detail: Option<String>,
    pub hints: Vec<&'static str>,
    pub cached_locally: bool,
}

#[must_use]
pub fn map_save_success(saved: &SavedProgress) -> SaveStatusVm {
    SaveStatusVm::Saved(format!(
        "Results saved (attempt {} of {MAX_ATTEMPTS}).",
        saved.receipt.attempt
    ))
}

#[must_use]
pub fn map_save_error(err: &SaveError) -> SaveFeedbackVm {
    let (title, hints) = match err {
        SaveError::NotAuthenticated => ("Sign in to save your results.".to_string(), Vec::new()),
        SaveError::SchemaMismatch { attempts, .. } => (
            format!("Could not save your results after {attempts} attempts."),
            diagnostic_hints(err.last_error().unwrap_or_default()),
        ),
        SaveError::Unavailable { .. } => (
            "The progress store could not be reached.".to_string(),
            vec![HINT_CONNECTION],
        ),
        other => (other.to_string(), Vec::new()),
    };
    SaveFeedbackVm {
        title,
        detail: err.last_error().map(str::to_string),
        hints,
        cached_locally: err.cached_locally(),
    }
}

/// Hints derived from the last raw store error; both when it is inconclusive.
#[must_use]
pub fn diagnostic_hints(last_error: &str) -> Vec<&'static str> {
    let lower = last_error.to_lowercase();
    let permission = PERMISSION_MARKERS.iter().any(|m| lower.contains(m));
    let schema = SCHEMA_MARKERS.iter().any(|m| lower.contains(m));
    match (permission, schema) {
        (true, false) => vec![HINT_PERMISSIONS],
        (false, true) => vec![HINT_SCHEMA],
        _ => vec![HINT_PERMISSIONS, HINT_SCHEMA],
    }
}
