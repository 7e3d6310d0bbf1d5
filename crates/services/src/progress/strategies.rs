//! Ordered row shapes tried against a progress table of unknown schema.
//!
//! Shapes go from minimal to rich so the first accepted insert stores as
//! little guesswork as possible. Every function here is pure.

use practice_core::model::{ProgressRecord, RawRow};

/// Candidate timestamp columns, most common first.
pub const TIMESTAMP_FIELDS: [&str; 5] = ["created_at", "test_date", "timestamp", "date", "time"];

/// What a score column pair carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScoreKind {
    /// Accuracy percentage plus elapsed seconds.
    PercentAndSeconds,
    /// Raw correct count plus question count.
    Counts,
}

/// A pair of score columns tried together.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScoreFields {
    pub first: &'static str,
    pub second: &'static str,
    pub kind: ScoreKind,
}

pub const SCORE_FIELD_SETS: [ScoreFields; 4] = [
    ScoreFields {
        first: "score",
        second: "time",
        kind: ScoreKind::PercentAndSeconds,
    },
    ScoreFields {
        first: "score_percentage",
        second: "time_seconds",
        kind: ScoreKind::PercentAndSeconds,
    },
    ScoreFields {
        first: "correct_percentage",
        second: "total_time",
        kind: ScoreKind::PercentAndSeconds,
    },
    ScoreFields {
        first: "correct_answers",
        second: "total_questions",
        kind: ScoreKind::Counts,
    },
];

/// One row shape in the attempt order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptShape {
    UserOnly,
    WithTimestamp {
        timestamp: &'static str,
    },
    WithScore {
        timestamp: &'static str,
        score: ScoreFields,
    },
}

impl AttemptShape {
    /// Column names this shape writes, in insertion order.
    #[must_use]
    pub fn columns(&self) -> Vec<&'static str> {
        match self {
            AttemptShape::UserOnly => vec!["user_id"],
            AttemptShape::WithTimestamp { timestamp } => vec!["user_id", *timestamp],
            AttemptShape::WithScore { timestamp, score } => {
                vec!["user_id", *timestamp, score.first, score.second]
            }
        }
    }

    #[must_use]
    pub fn describe(&self) -> String {
        format!("{{{}}}", self.columns().join(", "))
    }

    /// Build the row for `record`.
    ///
    /// Timestamps are written as RFC 3339 text; a `time` column that is used
    /// as a timestamp still holds the timestamp, not the duration.
    #[must_use]
    pub fn build_row(&self, record: &ProgressRecord) -> RawRow {
        let row = RawRow::new().with("user_id", record.user_id.as_str());
        match self {
            AttemptShape::UserOnly => row,
            AttemptShape::WithTimestamp { timestamp } => {
                row.with(*timestamp, record.recorded_at.to_rfc3339())
            }
            AttemptShape::WithScore { timestamp, score } => {
                let (first, second) = match score.kind {
                    ScoreKind::PercentAndSeconds => (
                        u32::from(record.accuracy_percentage),
                        record.time_taken_seconds,
                    ),
                    ScoreKind::Counts => (record.correct_count, record.total_count),
                };
                // A `time` timestamp column overwrites the duration.
                row.with(score.first, first)
                    .with(score.second, second)
                    .with(*timestamp, record.recorded_at.to_rfc3339())
            }
        }
    }
}

/// The full attempt order: 1 + 5 + 4 x 5 = 26 shapes.
#[must_use]
pub fn attempt_shapes() -> Vec<AttemptShape> {
    let mut shapes = vec![AttemptShape::UserOnly];
    shapes.extend(
        TIMESTAMP_FIELDS
            .into_iter()
            .map(|timestamp| AttemptShape::WithTimestamp { timestamp }),
    );
    for score in SCORE_FIELD_SETS {
        shapes.extend(
            TIMESTAMP_FIELDS
                .into_iter()
                .map(|timestamp| AttemptShape::WithScore { timestamp, score }),
        );
    }
    shapes
}

/// Upper bound on inserts a single save can issue.
pub const MAX_ATTEMPTS: usize = 1 + TIMESTAMP_FIELDS.len() * (1 + SCORE_FIELD_SETS.len());
