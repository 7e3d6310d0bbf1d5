use std::time::Duration;

use dioxus::prelude::*;
use practice_core::model::{PracticeSession, score};
use services::HistoryEntry;

use crate::context::AppContext;
use crate::views::history::HistoryTable;
use crate::views::{ViewError, ViewState, view_state_from_resource};
use crate::vm::{
    GridCellVm, IntentOutcome, OptionVm, PracticeIntent, PracticeScreenVm, SaveFeedbackVm,
    SaveStatusVm, SummaryVm, apply_intent, map_history_rows, map_practice_screen, map_save_error,
    map_save_success, map_summary, settle_save,
};

#[cfg(test)]
use std::cell::RefCell;
#[cfg(test)]
use std::rc::Rc;

const TICK: Duration = Duration::from_secs(1);

#[component]
pub fn PracticeView() -> Element {
    let ctx = use_context::<AppContext>();
    let practice = ctx.practice();

    let session = use_signal(|| None::<PracticeSession>);
    let warning = use_signal(|| None::<String>);
    let notice = use_signal(|| None::<String>);
    let save_status = use_signal(SaveStatusVm::default);
    let history = use_signal(Vec::<HistoryEntry>::new);

    let resource = {
        let practice = practice.clone();
        use_resource(move || {
            let practice = practice.clone();
            let mut session = session;
            let mut warning = warning;
            async move {
                let started = practice
                    .start_session()
                    .await
                    .map_err(|_| ViewError::NoQuestions)?;
                warning.set(started.warning);
                session.set(Some(started.session));
                Ok::<_, ViewError>(())
            }
        })
    };

    // One tick per second while the session is running.
    use_future(move || {
        let mut session = session;
        async move {
            loop {
                tokio::time::sleep(TICK).await;
                let running = session
                    .peek()
                    .as_ref()
                    .is_some_and(|s| !s.is_paused() && !s.is_finished());
                if running {
                    if let Some(active) = session.write().as_mut() {
                        active.tick();
                    }
                }
            }
        }
    });

    let dispatch_intent = {
        let practice = practice.clone();
        use_callback(move |intent: PracticeIntent| {
            let mut session = session;
            let mut notice = notice;
            let mut save_status = save_status;
            let mut history = history;

            let outcome = {
                let mut guard = session.write();
                let Some(active) = guard.as_mut() else {
                    return;
                };
                apply_intent(&practice, active, &intent)
            };

            match outcome {
                Ok(IntentOutcome::Finished(_)) => {
                    notice.set(None);
                    save_status.set(SaveStatusVm::Idle);
                }
                Ok(IntentOutcome::SaveClaimed(snapshot)) => {
                    notice.set(None);
                    save_status.set(SaveStatusVm::Saving);
                    let practice = practice.clone();
                    spawn(async move {
                        let result = practice.save_claimed(&snapshot).await;
                        if let Some(active) = session.write().as_mut() {
                            settle_save(active, &result);
                        }
                        match result {
                            Ok(saved) => {
                                save_status.set(map_save_success(&saved));
                                history.set(saved.history);
                            }
                            Err(err) => {
                                save_status.set(SaveStatusVm::Failed(map_save_error(&err)));
                            }
                        }
                    });
                }
                Ok(IntentOutcome::Updated | IntentOutcome::Unchanged) => notice.set(None),
                Err(err) => notice.set(Some(err.to_string())),
            }
        })
    };

    #[cfg(test)]
    {
        let mut registered = use_signal(|| false);
        if !registered() {
            registered.set(true);
            if let Some(handles) = try_consume_context::<PracticeTestHandles>() {
                handles.register(dispatch_intent, session);
            }
        }
    }

    let state = view_state_from_resource(&resource);
    let screen = session.read().as_ref().map(map_practice_screen);
    let summary = session.read().as_ref().filter(|s| s.is_finished()).map(|s| {
        (
            map_summary(&score(s), s.elapsed_seconds()),
            s.can_reopen(),
        )
    });
    let warning_text = warning();
    let notice_text = notice();
    let history_rows = map_history_rows(&history.read());

    rsx! {
        div { class: "page practice",
            h2 { "Practice Test" }

            if let Some(text) = warning_text {
                p { class: "warning", "{text}" }
            }

            match (state, screen) {
                (ViewState::Error(err), _) => rsx! {
                    p { class: "error", "{err.message()}" }
                },
                (ViewState::Ready(()), Some(screen)) => rsx! {
                    PracticeHeader { screen: screen.clone(), on_intent: dispatch_intent }
                    if let Some(text) = notice_text {
                        p { class: "notice", "{text}" }
                    }
                    match summary {
                        Some((summary, open)) => rsx! {
                            SummaryPanel {
                                summary,
                                status: save_status(),
                                open,
                                on_intent: dispatch_intent,
                            }
                            if !history_rows.is_empty() {
                                h3 { "Recent results" }
                                HistoryTable { rows: history_rows.clone() }
                            }
                        },
                        None => rsx! {
                            QuestionCard { screen: screen.clone(), on_intent: dispatch_intent }
                        },
                    }
                    QuestionGrid { cells: screen.grid.clone(), on_intent: dispatch_intent }
                },
                _ => rsx! {
                    p { "Loading questions..." }
                },
            }
        }
    }
}

#[component]
fn PracticeHeader(screen: PracticeScreenVm, on_intent: Callback<PracticeIntent>) -> Element {
    let pause_label = if screen.paused { "Resume" } else { "Pause" };
    let show_answered = screen.filter.show_answered;
    let show_unanswered = screen.filter.show_unanswered;

    rsx! {
        header { class: "practice-header",
            span { class: "position", "{screen.position_label}" }
            span { class: "progress", "{screen.progress_label}" }
            span { class: "timer", "{screen.timer_label}" }
            if screen.paused {
                span { class: "paused", "Paused" }
            }
            button {
                r#type: "button",
                disabled: screen.finished,
                onclick: move |_| on_intent.call(PracticeIntent::TogglePause),
                "{pause_label}"
            }
            label {
                input {
                    r#type: "checkbox",
                    checked: show_answered,
                    onchange: move |_| on_intent.call(PracticeIntent::ToggleShowAnswered),
                }
                "Answered"
            }
            label {
                input {
                    r#type: "checkbox",
                    checked: show_unanswered,
                    onchange: move |_| on_intent.call(PracticeIntent::ToggleShowUnanswered),
                }
                "Unanswered"
            }
        }
    }
}

#[component]
fn QuestionCard(screen: PracticeScreenVm, on_intent: Callback<PracticeIntent>) -> Element {
    rsx! {
        section { class: "question",
            if let Some(category) = screen.category.clone() {
                p { class: "category", "{category}" }
            }
            p { class: "question-text", "{screen.question_text}" }
            div { class: "options",
                for option in screen.options.clone() {
                    OptionButton { key: "{option.letter}", option, on_intent }
                }
            }
            div { class: "question-nav",
                button {
                    r#type: "button",
                    disabled: !screen.has_previous,
                    onclick: move |_| on_intent.call(PracticeIntent::Previous),
                    "Previous"
                }
                button {
                    r#type: "button",
                    disabled: !screen.has_next,
                    onclick: move |_| on_intent.call(PracticeIntent::Next),
                    "Next"
                }
                button {
                    r#type: "button",
                    class: "finish",
                    onclick: move |_| on_intent.call(PracticeIntent::Finish),
                    "Finish test"
                }
            }
        }
    }
}

#[component]
fn OptionButton(option: OptionVm, on_intent: Callback<PracticeIntent>) -> Element {
    let class = if option.selected {
        "option selected"
    } else {
        "option"
    };
    let text = option.text.clone();

    rsx! {
        button {
            r#type: "button",
            class,
            onclick: move |_| on_intent.call(PracticeIntent::SelectOption(text.clone())),
            "{option.letter}. {option.text}"
        }
    }
}

#[component]
fn QuestionGrid(cells: Vec<GridCellVm>, on_intent: Callback<PracticeIntent>) -> Element {
    rsx! {
        nav { class: "question-grid",
            for cell in cells {
                GridCell { key: "{cell.index}", cell, on_intent }
            }
        }
    }
}

#[component]
fn GridCell(cell: GridCellVm, on_intent: Callback<PracticeIntent>) -> Element {
    let index = cell.index;
    rsx! {
        button {
            r#type: "button",
            class: cell.class(),
            onclick: move |_| on_intent.call(PracticeIntent::GoTo(index)),
            "{cell.label}"
        }
    }
}

#[component]
fn SummaryPanel(
    summary: SummaryVm,
    status: SaveStatusVm,
    open: bool,
    on_intent: Callback<PracticeIntent>,
) -> Element {
    let saving = status == SaveStatusVm::Saving;

    rsx! {
        section { class: "summary",
            h3 { "Test summary" }
            p { class: "score", "{summary.score_label}" }
            p { "{summary.answered_label}" }
            p { "{summary.accuracy_label}" }
            p { "{summary.time_label}" }
            if summary.unanswered_count > 0 {
                p { class: "unanswered", "{summary.unanswered_count} questions left unanswered." }
            }

            match status {
                SaveStatusVm::Idle => rsx! {},
                SaveStatusVm::Saving => rsx! {
                    p { class: "saving", "Saving results..." }
                },
                SaveStatusVm::Saved(message) => rsx! {
                    p { class: "saved", "{message}" }
                },
                SaveStatusVm::Failed(feedback) => rsx! {
                    SaveFailure { feedback }
                },
            }

            div { class: "summary-actions",
                button {
                    r#type: "button",
                    disabled: !open || saving,
                    onclick: move |_| on_intent.call(PracticeIntent::Save),
                    "Save results"
                }
                button {
                    r#type: "button",
                    disabled: !open || saving,
                    onclick: move |_| on_intent.call(PracticeIntent::DismissSummary),
                    "Back to questions"
                }
            }
        }
    }
}

#[component]
fn SaveFailure(feedback: SaveFeedbackVm) -> Element {
    rsx! {
        div { class: "save-error",
            p { "{feedback.title}" }
            if let Some(detail) = feedback.detail.clone() {
                pre { "{detail}" }
            }
            if !feedback.hints.is_empty() {
                ul { class: "hints",
                    for hint in feedback.hints.iter() {
                        li { "{hint}" }
                    }
                }
            }
            if feedback.cached_locally {
                p { class: "cached", "Your result was kept on this device and appears in your history." }
            }
        }
    }
}

#[cfg(test)]
#[derive(Clone, Default)]
pub(crate) struct PracticeTestHandles {
    dispatch: Rc<RefCell<Option<Callback<PracticeIntent>>>>,
    session: Rc<RefCell<Option<Signal<Option<PracticeSession>>>>>,
}

#[cfg(test)]
impl PracticeTestHandles {
    pub(crate) fn register(
        &self,
        dispatch: Callback<PracticeIntent>,
        session: Signal<Option<PracticeSession>>,
    ) {
        *self.dispatch.borrow_mut() = Some(dispatch);
        *self.session.borrow_mut() = Some(session);
    }

    pub(crate) fn dispatch(&self) -> Callback<PracticeIntent> {
        (*self.dispatch.borrow()).expect("practice dispatch registered")
    }

    pub(crate) fn session(&self) -> Signal<Option<PracticeSession>> {
        (*self.session.borrow()).expect("practice session registered")
    }
}
