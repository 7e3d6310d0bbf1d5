use services::HistoryEntry;

use crate::vm::time_fmt::{MISSING_VALUE, format_datetime, format_duration};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HistoryRowVm {
    pub date_label: String,
    pub score_label: String,
    pub accuracy_label: String,
    pub completion_label: String,
    pub time_label: String,
    pub is_local: bool,
}

/// One point of the accuracy trend, oldest first.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TrendPointVm {
    pub label: String,
    pub accuracy: u8,
}

#[must_use]
pub fn map_history_rows(entries: &[HistoryEntry]) -> Vec<HistoryRowVm> {
    entries
        .iter()
        .map(|entry| HistoryRowVm {
            date_label: entry
                .recorded_at
                .map_or_else(|| MISSING_VALUE.to_string(), format_datetime),
            score_label: match (entry.correct_count, entry.total_count) {
                (Some(correct), Some(total)) => format!("{correct} / {total}"),
                _ => MISSING_VALUE.to_string(),
            },
            accuracy_label: percent_label(entry.accuracy_percentage),
            completion_label: percent_label(entry.completion_percentage),
            time_label: format_duration(entry.time_taken_seconds),
            is_local: entry.is_local,
        })
        .collect()
}

/// Accuracy over time for the chart. Entries without an accuracy are skipped.
#[must_use]
pub fn map_history_trend(entries: &[HistoryEntry]) -> Vec<TrendPointVm> {
    entries
        .iter()
        .rev()
        .enumerate()
        .filter_map(|(i, entry)| {
            entry.accuracy_percentage.map(|accuracy| TrendPointVm {
                label: entry
                    .recorded_at
                    .map_or_else(|| format!("#{}", i + 1), |at| at.format("%m/%d").to_string()),
                accuracy,
            })
        })
        .collect()
}

fn percent_label(value: Option<u8>) -> String {
    value.map_or_else(|| MISSING_VALUE.to_string(), |p| format!("{p}%"))
}
