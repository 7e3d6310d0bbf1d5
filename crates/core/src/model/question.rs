use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::ids::QuestionId;

//
// ─── ERRORS ───────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuestionError {
    #[error("question text cannot be empty")]
    EmptyText,

    #[error("question needs at least {min} options, got {len}")]
    TooFewOptions { len: usize, min: usize },

    #[error("correct answer {answer:?} is not one of the options")]
    CorrectAnswerNotAnOption { answer: String },
}

//
// ─── ANSWER SOURCE ────────────────────────────────────────────────────────────
//

/// Where a question's correct answer came from during normalization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AnswerSource {
    /// An option row carried an explicit correct flag.
    Flagged,
    /// The raw correct-answer value matched an option's text.
    Literal,
    /// A digit interpreted as a 1-based option position.
    OneBasedIndex,
    /// `0` interpreted as a 0-based option position.
    ZeroBasedIndex,
    /// A letter `A`..`D` mapped to an option position.
    Letter,
    /// Nothing usable was found; the first option was designated correct.
    Defaulted,
    /// Part of the built-in sample set.
    Builtin,
}

impl AnswerSource {
    /// True when the answer is the first-option safety net rather than data.
    #[must_use]
    pub fn is_low_confidence(self) -> bool {
        matches!(self, AnswerSource::Defaulted)
    }
}

//
// ─── QUESTION ─────────────────────────────────────────────────────────────────
//

/// A normalized multiple-choice question.
///
/// Immutable once built: `options` has at least [`Question::MIN_OPTIONS`]
/// entries in display order and `correct_answer` is one of them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    id: QuestionId,
    text: String,
    options: Vec<String>,
    correct_answer: String,
    category: Option<String>,
    answer_source: AnswerSource,
}

impl Question {
    /// Every question is displayed with at least this many choices.
    pub const MIN_OPTIONS: usize = 4;

    /// Build a question whose correct answer is given as option text.
    ///
    /// # Errors
    ///
    /// Returns `QuestionError` if the text is blank, there are fewer than
    /// four options, or the correct answer is not one of the options.
    pub fn new(
        id: QuestionId,
        text: impl Into<String>,
        options: Vec<String>,
        correct_answer: impl Into<String>,
        category: Option<String>,
    ) -> Result<Self, QuestionError> {
        Self::with_source(
            id,
            text,
            options,
            correct_answer,
            category,
            AnswerSource::Literal,
        )
    }

    /// Build a question recording how its correct answer was resolved.
    ///
    /// # Errors
    ///
    /// Same as [`Question::new`].
    pub fn with_source(
        id: QuestionId,
        text: impl Into<String>,
        options: Vec<String>,
        correct_answer: impl Into<String>,
        category: Option<String>,
        answer_source: AnswerSource,
    ) -> Result<Self, QuestionError> {
        let text = text.into().trim().to_string();
        if text.is_empty() {
            return Err(QuestionError::EmptyText);
        }
        if options.len() < Self::MIN_OPTIONS {
            return Err(QuestionError::TooFewOptions {
                len: options.len(),
                min: Self::MIN_OPTIONS,
            });
        }
        let correct_answer = correct_answer.into();
        if !options.iter().any(|o| *o == correct_answer) {
            return Err(QuestionError::CorrectAnswerNotAnOption {
                answer: correct_answer,
            });
        }
        let category = category
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty());

        Ok(Self {
            id,
            text,
            options,
            correct_answer,
            category,
            answer_source,
        })
    }

    #[must_use]
    pub fn id(&self) -> QuestionId {
        self.id
    }

    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    #[must_use]
    pub fn options(&self) -> &[String] {
        &self.options
    }

    #[must_use]
    pub fn correct_answer(&self) -> &str {
        &self.correct_answer
    }

    #[must_use]
    pub fn category(&self) -> Option<&str> {
        self.category.as_deref()
    }

    #[must_use]
    pub fn answer_source(&self) -> AnswerSource {
        self.answer_source
    }

    #[must_use]
    pub fn has_option(&self, option: &str) -> bool {
        self.options.iter().any(|o| o == option)
    }

    #[must_use]
    pub fn is_correct(&self, option: &str) -> bool {
        self.correct_answer == option
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn opts(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| (*s).to_string()).collect()
    }

    #[test]
    fn builds_valid_question() {
        let q = Question::new(
            QuestionId::new(1),
            " Which is a noun? ",
            opts(&["run", "blue", "house", "quickly"]),
            "house",
            Some("Word Knowledge".into()),
        )
        .unwrap();
        assert_eq!(q.text(), "Which is a noun?");
        assert!(q.is_correct("house"));
        assert!(q.has_option("blue"));
        assert_eq!(q.answer_source(), AnswerSource::Literal);
        assert!(!q.answer_source().is_low_confidence());
    }

    #[test]
    fn rejects_short_option_lists() {
        let err = Question::new(QuestionId::new(1), "Q", opts(&["a", "b", "c"]), "a", None)
            .unwrap_err();
        assert_eq!(err, QuestionError::TooFewOptions { len: 3, min: 4 });
    }

    #[test]
    fn rejects_foreign_correct_answer() {
        let err = Question::new(
            QuestionId::new(1),
            "Q",
            opts(&["a", "b", "c", "d"]),
            "e",
            None,
        )
        .unwrap_err();
        assert!(matches!(err, QuestionError::CorrectAnswerNotAnOption { .. }));
    }

    #[test]
    fn blank_category_is_dropped() {
        let q = Question::new(
            QuestionId::new(1),
            "Q",
            opts(&["a", "b", "c", "d"]),
            "a",
            Some("  ".into()),
        )
        .unwrap();
        assert_eq!(q.category(), None);
    }
}
