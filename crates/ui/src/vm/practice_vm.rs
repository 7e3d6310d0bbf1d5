use practice_core::model::{
    AnswerFilter, PracticeSession, QuestionStatus, ScoreSummary, SessionStateError,
};
use services::{PracticeService, SaveError, SavedProgress};

use crate::vm::time_fmt::format_timer;

const OPTION_LETTERS: [&str; 6] = ["A", "B", "C", "D", "E", "F"];

/// User actions on the practice screen.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PracticeIntent {
    SelectOption(String),
    GoTo(usize),
    Next,
    Previous,
    TogglePause,
    Finish,
    Save,
    DismissSummary,
    ToggleShowAnswered,
    ToggleShowUnanswered,
}

/// What the view has to do after an intent was applied to the session.
#[derive(Clone, Debug)]
pub enum IntentOutcome {
    Updated,
    Unchanged,
    Finished(ScoreSummary),
    /// The save slot was claimed; persist this snapshot off the event loop.
    SaveClaimed(Box<PracticeSession>),
}

/// Apply a synchronous intent to the session.
///
/// # Errors
///
/// Returns `SessionStateError` when the session refuses the action, e.g.
/// selecting an option after finish or saving twice.
pub fn apply_intent(
    practice: &PracticeService,
    session: &mut PracticeSession,
    intent: &PracticeIntent,
) -> Result<IntentOutcome, SessionStateError> {
    let changed = match intent {
        PracticeIntent::SelectOption(option) => {
            session.record_answer(session.current_index(), option)?;
            true
        }
        PracticeIntent::GoTo(index) => session.go_to(*index),
        PracticeIntent::Next => session.next_visible(),
        PracticeIntent::Previous => session.previous_visible(),
        PracticeIntent::TogglePause => {
            if session.is_finished() {
                false
            } else {
                session.toggle_pause();
                true
            }
        }
        PracticeIntent::Finish => {
            if session.is_finished() {
                return Ok(IntentOutcome::Unchanged);
            }
            return Ok(IntentOutcome::Finished(practice.finish(session)));
        }
        PracticeIntent::Save => {
            session.begin_save()?;
            return Ok(IntentOutcome::SaveClaimed(Box::new(session.clone())));
        }
        PracticeIntent::DismissSummary => session.reopen(),
        PracticeIntent::ToggleShowAnswered => {
            let filter = session.filter();
            session.set_filter(AnswerFilter {
                show_answered: !filter.show_answered,
                ..filter
            });
            true
        }
        PracticeIntent::ToggleShowUnanswered => {
            let filter = session.filter();
            session.set_filter(AnswerFilter {
                show_unanswered: !filter.show_unanswered,
                ..filter
            });
            true
        }
    };
    Ok(if changed {
        IntentOutcome::Updated
    } else {
        IntentOutcome::Unchanged
    })
}

/// Record the result of a claimed save on the live session.
pub fn settle_save(session: &mut PracticeSession, result: &Result<SavedProgress, SaveError>) {
    match result {
        Ok(_) => session.complete_save(),
        Err(_) => session.fail_save(),
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OptionVm {
    pub letter: String,
    pub text: String,
    pub selected: bool,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GridCellVm {
    pub index: usize,
    pub label: String,
    pub status: QuestionStatus,
}

impl GridCellVm {
    #[must_use]
    pub fn class(&self) -> &'static str {
        match self.status {
            QuestionStatus::Current => "grid-cell current",
            QuestionStatus::Answered => "grid-cell answered",
            QuestionStatus::Unanswered => "grid-cell",
        }
    }
}

/// Everything the practice screen renders for one frame.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PracticeScreenVm {
    pub position_label: String,
    pub question_text: String,
    pub category: Option<String>,
    pub options: Vec<OptionVm>,
    pub grid: Vec<GridCellVm>,
    pub timer_label: String,
    pub progress_label: String,
    pub paused: bool,
    pub finished: bool,
    pub saving: bool,
    pub has_previous: bool,
    pub has_next: bool,
    pub filter: AnswerFilter,
}

#[must_use]
pub fn map_practice_screen(session: &PracticeSession) -> PracticeScreenVm {
    let index = session.current_index();
    let question = session.current_question();
    let selected = session.answer_for(index);

    let options = question
        .options()
        .iter()
        .enumerate()
        .map(|(i, text)| OptionVm {
            letter: OPTION_LETTERS
                .get(i)
                .map_or_else(|| (i + 1).to_string(), |l| (*l).to_string()),
            text: text.clone(),
            selected: selected == Some(text.as_str()),
        })
        .collect();

    let grid = session
        .visible_indices()
        .into_iter()
        .filter_map(|i| {
            session.status(i).map(|status| GridCellVm {
                index: i,
                label: (i + 1).to_string(),
                status,
            })
        })
        .collect();

    PracticeScreenVm {
        position_label: format!("Question {} of {}", index + 1, session.len()),
        question_text: question.text().to_string(),
        category: question.category().map(str::to_string),
        options,
        grid,
        timer_label: format_timer(session.elapsed_seconds()),
        progress_label: format!("Answered {} of {}", session.answers().len(), session.len()),
        paused: session.is_paused(),
        finished: session.is_finished(),
        saving: session.is_saving(),
        has_previous: session.has_previous(),
        has_next: session.has_next(),
        filter: session.filter(),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use practice_core::model::{SaveState, builtin_questions};
    use practice_core::time::{fixed_clock, fixed_now};
    use storage::identity::StaticIdentityProvider;
    use storage::repository::Storage;

    use super::*;

    fn service() -> PracticeService {
        PracticeService::new(
            fixed_clock(),
            &Storage::in_memory(),
            Arc::new(StaticIdentityProvider::anonymous()),
        )
    }

    fn session() -> PracticeSession {
        PracticeSession::new(builtin_questions(), fixed_now()).unwrap()
    }

    #[test]
    fn select_records_answer_for_current_question() {
        let practice = service();
        let mut session = session();
        session.go_to(2);

        let outcome = apply_intent(
            &practice,
            &mut session,
            &PracticeIntent::SelectOption("Option C".into()),
        )
        .unwrap();
        assert!(matches!(outcome, IntentOutcome::Updated));
        assert_eq!(session.answer_for(2), Some("Option C"));

        let vm = map_practice_screen(&session);
        assert_eq!(vm.position_label, "Question 3 of 31");
        assert_eq!(vm.progress_label, "Answered 1 of 31");
        let selected: Vec<_> = vm.options.iter().filter(|o| o.selected).collect();
        assert_eq!(selected.len(), 1);
        assert_eq!(selected[0].letter, "C");
    }

    #[test]
    fn unknown_option_is_refused() {
        let practice = service();
        let mut session = session();
        let err = apply_intent(
            &practice,
            &mut session,
            &PracticeIntent::SelectOption("Option Z".into()),
        )
        .unwrap_err();
        assert!(matches!(err, SessionStateError::UnknownOption { .. }));
        assert!(session.answers().is_empty());
    }

    #[test]
    fn grid_marks_current_and_answered() {
        let mut session = session();
        session.record_answer(1, "Option B").unwrap();
        let vm = map_practice_screen(&session);
        assert_eq!(vm.grid.len(), 31);
        assert_eq!(vm.grid[0].status, QuestionStatus::Current);
        assert_eq!(vm.grid[1].status, QuestionStatus::Answered);
        assert_eq!(vm.grid[1].class(), "grid-cell answered");
        assert_eq!(vm.grid[2].status, QuestionStatus::Unanswered);
    }

    #[test]
    fn hiding_answered_questions_shrinks_grid_and_skips_them() {
        let practice = service();
        let mut session = session();
        session.record_answer(1, "Option A").unwrap();
        apply_intent(&practice, &mut session, &PracticeIntent::ToggleShowAnswered).unwrap();

        let vm = map_practice_screen(&session);
        assert!(!vm.filter.show_answered);
        assert_eq!(vm.grid.len(), 30);

        apply_intent(&practice, &mut session, &PracticeIntent::Next).unwrap();
        assert_eq!(session.current_index(), 2);
    }

    #[test]
    fn pause_stops_the_timer() {
        let practice = service();
        let mut session = session();
        session.tick();
        apply_intent(&practice, &mut session, &PracticeIntent::TogglePause).unwrap();
        session.tick();
        let vm = map_practice_screen(&session);
        assert!(vm.paused);
        assert_eq!(vm.timer_label, "Time: 00:01");
    }

    #[test]
    fn finish_scores_once_and_save_claims_the_slot() {
        let practice = service();
        let mut session = session();
        session.record_answer(0, "Option A").unwrap();

        let outcome = apply_intent(&practice, &mut session, &PracticeIntent::Finish).unwrap();
        let IntentOutcome::Finished(summary) = outcome else {
            panic!("expected finished outcome");
        };
        assert_eq!(summary.correct_count, 1);
        assert!(matches!(
            apply_intent(&practice, &mut session, &PracticeIntent::Finish),
            Ok(IntentOutcome::Unchanged)
        ));

        let outcome = apply_intent(&practice, &mut session, &PracticeIntent::Save).unwrap();
        assert!(matches!(outcome, IntentOutcome::SaveClaimed(_)));
        assert!(session.is_saving());
        assert!(matches!(
            apply_intent(&practice, &mut session, &PracticeIntent::Save),
            Err(SessionStateError::SaveInFlight)
        ));
        assert!(matches!(
            apply_intent(&practice, &mut session, &PracticeIntent::DismissSummary),
            Ok(IntentOutcome::Unchanged)
        ));

        settle_save(&mut session, &Err(SaveError::NotAuthenticated));
        assert_eq!(session.save_state(), SaveState::Failed);
        assert!(matches!(
            apply_intent(&practice, &mut session, &PracticeIntent::DismissSummary),
            Ok(IntentOutcome::Updated)
        ));
        assert!(!session.is_finished());
        assert_eq!(session.answers().len(), 1);
    }

    #[test]
    fn dismiss_is_refused_after_a_successful_save() {
        let practice = service();
        let mut session = session();
        session.record_answer(0, "Option A").unwrap();
        apply_intent(&practice, &mut session, &PracticeIntent::Finish).unwrap();
        apply_intent(&practice, &mut session, &PracticeIntent::Save).unwrap();
        session.complete_save();

        assert!(matches!(
            apply_intent(&practice, &mut session, &PracticeIntent::DismissSummary),
            Ok(IntentOutcome::Unchanged)
        ));
        assert!(session.is_finished());
        assert!(matches!(
            apply_intent(&practice, &mut session, &PracticeIntent::SelectOption("Option B".into())),
            Err(SessionStateError::Finished)
        ));
        assert_eq!(session.save_state(), SaveState::Saved);
    }
}
