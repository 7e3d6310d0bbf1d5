use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::model::ids::SessionId;
use crate::model::question::Question;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SessionStateError {
    #[error("a practice session needs at least one question")]
    Empty,

    #[error("question index {index} is out of range (len {len})")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("{option:?} is not an option of question {index}")]
    UnknownOption { index: usize, option: String },

    #[error("session is already finished")]
    Finished,

    #[error("session is not finished yet")]
    NotFinished,

    #[error("a save is already in progress")]
    SaveInFlight,

    #[error("session results were already saved")]
    AlreadySaved,
}

//
// ─── STATE ────────────────────────────────────────────────────────────────────
//

/// Lifecycle phase of a loaded session. Loading happens before a session exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    Active,
    Finished,
}

/// Persistence status of a finished session, used to guard duplicate saves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SaveState {
    #[default]
    Idle,
    Saving,
    Saved,
    Failed,
}

/// Per-question status for the navigation grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuestionStatus {
    Current,
    Answered,
    Unanswered,
}

/// Which questions the navigation grid shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnswerFilter {
    pub show_answered: bool,
    pub show_unanswered: bool,
}

impl Default for AnswerFilter {
    fn default() -> Self {
        Self {
            show_answered: true,
            show_unanswered: true,
        }
    }
}

//
// ─── SESSION ──────────────────────────────────────────────────────────────────
//

/// In-memory state of one practice-test attempt.
///
/// The session is mutated only through discrete operations (navigation,
/// answer selection, timer ticks, pause toggles, finish). `current_index`
/// always addresses a valid question and `answers` only holds valid indices.
#[derive(Debug, Clone)]
pub struct PracticeSession {
    id: SessionId,
    questions: Vec<Question>,
    current: usize,
    answers: BTreeMap<usize, String>,
    elapsed_seconds: u32,
    paused: bool,
    phase: SessionPhase,
    save_state: SaveState,
    filter: AnswerFilter,
    started_at: DateTime<Utc>,
    finished_at: Option<DateTime<Utc>>,
}

impl PracticeSession {
    /// Start a running session over `questions`.
    ///
    /// # Errors
    ///
    /// Returns `SessionStateError::Empty` if no questions are provided.
    pub fn new(
        questions: Vec<Question>,
        started_at: DateTime<Utc>,
    ) -> Result<Self, SessionStateError> {
        if questions.is_empty() {
            return Err(SessionStateError::Empty);
        }
        Ok(Self {
            id: SessionId::random(),
            questions,
            current: 0,
            answers: BTreeMap::new(),
            elapsed_seconds: 0,
            paused: false,
            phase: SessionPhase::Active,
            save_state: SaveState::Idle,
            filter: AnswerFilter::default(),
            started_at,
            finished_at: None,
        })
    }

    #[must_use]
    pub fn id(&self) -> SessionId {
        self.id
    }

    #[must_use]
    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    #[must_use]
    pub fn question(&self, index: usize) -> Option<&Question> {
        self.questions.get(index)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.questions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    #[must_use]
    pub fn current_index(&self) -> usize {
        self.current
    }

    #[must_use]
    pub fn current_question(&self) -> &Question {
        &self.questions[self.current]
    }

    #[must_use]
    pub fn answers(&self) -> &BTreeMap<usize, String> {
        &self.answers
    }

    #[must_use]
    pub fn answer_for(&self, index: usize) -> Option<&str> {
        self.answers.get(&index).map(String::as_str)
    }

    #[must_use]
    pub fn elapsed_seconds(&self) -> u32 {
        self.elapsed_seconds
    }

    #[must_use]
    pub fn is_paused(&self) -> bool {
        self.paused
    }

    #[must_use]
    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.phase == SessionPhase::Finished
    }

    #[must_use]
    pub fn save_state(&self) -> SaveState {
        self.save_state
    }

    #[must_use]
    pub fn filter(&self) -> AnswerFilter {
        self.filter
    }

    #[must_use]
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    #[must_use]
    pub fn finished_at(&self) -> Option<DateTime<Utc>> {
        self.finished_at
    }

    /// Move to `index`. Out-of-range targets are ignored.
    ///
    /// Returns `true` if the current question changed.
    pub fn go_to(&mut self, index: usize) -> bool {
        if index >= self.questions.len() || index == self.current {
            return false;
        }
        self.current = index;
        true
    }

    /// Move to the following question; stays put on the last one.
    pub fn next(&mut self) -> bool {
        self.go_to(self.current.saturating_add(1))
    }

    /// Move to the preceding question; stays put on the first one.
    pub fn previous(&mut self) -> bool {
        match self.current.checked_sub(1) {
            Some(index) => self.go_to(index),
            None => false,
        }
    }

    #[must_use]
    pub fn has_next(&self) -> bool {
        self.current + 1 < self.questions.len()
    }

    #[must_use]
    pub fn has_previous(&self) -> bool {
        self.current > 0
    }

    /// Record `option` as the answer for question `index`. Last write wins.
    ///
    /// # Errors
    ///
    /// Returns `SessionStateError::Finished` after finish,
    /// `IndexOutOfRange` for an invalid index, and `UnknownOption` if `option`
    /// is not one of that question's options.
    pub fn record_answer(&mut self, index: usize, option: &str) -> Result<(), SessionStateError> {
        if self.is_finished() {
            return Err(SessionStateError::Finished);
        }
        let question = self
            .questions
            .get(index)
            .ok_or(SessionStateError::IndexOutOfRange {
                index,
                len: self.questions.len(),
            })?;
        if !question.has_option(option) {
            return Err(SessionStateError::UnknownOption {
                index,
                option: option.to_string(),
            });
        }
        self.answers.insert(index, option.to_string());
        Ok(())
    }

    /// Remove the answer for `index`, if any.
    pub fn clear_answer(&mut self, index: usize) -> bool {
        if self.is_finished() {
            return false;
        }
        self.answers.remove(&index).is_some()
    }

    /// Advance the elapsed timer by exactly one second.
    ///
    /// No-op while paused or finished. Returns `true` if time advanced.
    pub fn tick(&mut self) -> bool {
        if self.paused || self.is_finished() {
            return false;
        }
        self.elapsed_seconds = self.elapsed_seconds.saturating_add(1);
        true
    }

    /// Flip the paused flag and return the new value.
    ///
    /// Answers and the current question are untouched. Finished sessions
    /// keep their flag.
    pub fn toggle_pause(&mut self) -> bool {
        if !self.is_finished() {
            self.paused = !self.paused;
        }
        self.paused
    }

    /// End the attempt. Only an explicit user action calls this.
    ///
    /// Returns `false` if the session was already finished.
    pub fn finish(&mut self, at: DateTime<Utc>) -> bool {
        if self.is_finished() {
            return false;
        }
        self.phase = SessionPhase::Finished;
        self.finished_at = Some(at);
        true
    }

    /// Whether the summary can be dismissed to continue answering.
    ///
    /// Finished is terminal once a save is in flight or has succeeded.
    #[must_use]
    pub fn can_reopen(&self) -> bool {
        self.is_finished() && matches!(self.save_state, SaveState::Idle | SaveState::Failed)
    }

    /// Dismiss the summary and continue answering.
    ///
    /// A failed save can be retried after finishing again.
    pub fn reopen(&mut self) -> bool {
        if !self.can_reopen() {
            return false;
        }
        self.phase = SessionPhase::Active;
        self.finished_at = None;
        if self.save_state == SaveState::Failed {
            self.save_state = SaveState::Idle;
        }
        true
    }

    /// Claim the save slot for a finished session.
    ///
    /// # Errors
    ///
    /// Returns `NotFinished` before finish, `SaveInFlight` while another save
    /// is outstanding and `AlreadySaved` once a save has succeeded.
    pub fn begin_save(&mut self) -> Result<(), SessionStateError> {
        if !self.is_finished() {
            return Err(SessionStateError::NotFinished);
        }
        match self.save_state {
            SaveState::Saving => Err(SessionStateError::SaveInFlight),
            SaveState::Saved => Err(SessionStateError::AlreadySaved),
            SaveState::Idle | SaveState::Failed => {
                self.save_state = SaveState::Saving;
                Ok(())
            }
        }
    }

    pub fn complete_save(&mut self) {
        self.save_state = SaveState::Saved;
    }

    pub fn fail_save(&mut self) {
        self.save_state = SaveState::Failed;
    }

    #[must_use]
    pub fn is_saving(&self) -> bool {
        self.save_state == SaveState::Saving
    }

    pub fn set_filter(&mut self, filter: AnswerFilter) {
        self.filter = filter;
    }

    #[must_use]
    pub fn status(&self, index: usize) -> Option<QuestionStatus> {
        if index >= self.questions.len() {
            return None;
        }
        Some(if index == self.current {
            QuestionStatus::Current
        } else if self.answers.contains_key(&index) {
            QuestionStatus::Answered
        } else {
            QuestionStatus::Unanswered
        })
    }

    /// Move to the nearest later question the filter shows.
    ///
    /// Falls back to plain `next` when every filter is off.
    pub fn next_visible(&mut self) -> bool {
        if !self.filter.show_answered && !self.filter.show_unanswered {
            return self.next();
        }
        match (self.current + 1..self.questions.len()).find(|i| self.passes_filter(*i)) {
            Some(index) => self.go_to(index),
            None => false,
        }
    }

    /// Move to the nearest earlier question the filter shows.
    pub fn previous_visible(&mut self) -> bool {
        if !self.filter.show_answered && !self.filter.show_unanswered {
            return self.previous();
        }
        match (0..self.current).rev().find(|i| self.passes_filter(*i)) {
            Some(index) => self.go_to(index),
            None => false,
        }
    }

    fn passes_filter(&self, index: usize) -> bool {
        if self.answers.contains_key(&index) {
            self.filter.show_answered
        } else {
            self.filter.show_unanswered
        }
    }

    /// Indices the navigation grid should show under the current filter.
    ///
    /// The current question is always visible so the grid never loses focus.
    #[must_use]
    pub fn visible_indices(&self) -> Vec<usize> {
        (0..self.questions.len())
            .filter(|index| *index == self.current || self.passes_filter(*index))
            .collect()
    }
}
