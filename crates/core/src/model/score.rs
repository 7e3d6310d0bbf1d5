use serde::{Deserialize, Serialize};

use crate::model::session::PracticeSession;

/// Completion and accuracy statistics derived from a session.
///
/// `percent_correct` is measured over *answered* questions only, so a sparse
/// early attempt can read 100% correct at low completion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ScoreSummary {
    pub correct_count: u32,
    pub answered_count: u32,
    pub total_count: u32,
    pub percent_answered: u8,
    pub percent_correct: u8,
}

impl ScoreSummary {
    /// Build a summary from raw counts, clamping inconsistent input.
    #[must_use]
    pub fn from_counts(correct: u32, answered: u32, total: u32) -> Self {
        let answered = answered.min(total);
        let correct = correct.min(answered);
        Self {
            correct_count: correct,
            answered_count: answered,
            total_count: total,
            percent_answered: percent(answered, total),
            percent_correct: percent(correct, answered),
        }
    }

    #[must_use]
    pub fn unanswered_count(&self) -> u32 {
        self.total_count - self.answered_count
    }

    #[must_use]
    pub fn incorrect_count(&self) -> u32 {
        self.answered_count - self.correct_count
    }
}

/// Score a session. Pure and total.
#[must_use]
pub fn score(session: &PracticeSession) -> ScoreSummary {
    let correct = session
        .answers()
        .iter()
        .filter(|(index, option)| {
            session
                .question(**index)
                .is_some_and(|q| q.is_correct(option))
        })
        .count();

    ScoreSummary::from_counts(
        count_u32(correct),
        count_u32(session.answers().len()),
        count_u32(session.len()),
    )
}

fn count_u32(n: usize) -> u32 {
    u32::try_from(n).unwrap_or(u32::MAX)
}

/// Rounded half-up integer percentage; zero when `whole` is zero.
fn percent(part: u32, whole: u32) -> u8 {
    if whole == 0 {
        return 0;
    }
    let part = u64::from(part.min(whole));
    let whole = u64::from(whole);
    let value = (part * 100 + whole / 2) / whole;
    u8::try_from(value).unwrap_or(100)
}
