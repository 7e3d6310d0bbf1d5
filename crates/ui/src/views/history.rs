use dioxus::prelude::*;

use crate::context::AppContext;
use crate::views::{ViewError, ViewState, view_state_from_resource};
use crate::vm::{HistoryRowVm, TrendPointVm, map_history_rows, map_history_trend};

#[derive(Clone, Debug, PartialEq)]
struct HistoryData {
    rows: Vec<HistoryRowVm>,
    trend: Vec<TrendPointVm>,
}

#[component]
pub fn HistoryView() -> Element {
    let ctx = use_context::<AppContext>();
    let practice = ctx.practice();
    let signed_in = ctx.signed_in_as().is_some();

    let resource = use_resource(move || {
        let practice = practice.clone();
        async move {
            // Unreadable history is absorbed by the service and arrives empty.
            let entries = practice.load_history().await;
            Ok::<_, ViewError>(HistoryData {
                rows: map_history_rows(&entries),
                trend: map_history_trend(&entries),
            })
        }
    });

    let state = view_state_from_resource(&resource);

    rsx! {
        div { class: "page",
            h2 { "History" }

            if !signed_in {
                p { class: "notice", "Sign in to see your saved results." }
            }

            match state {
                ViewState::Idle => rsx! {
                    p { "Idle" }
                },
                ViewState::Loading => rsx! {
                    p { "Loading..." }
                },
                ViewState::Ready(data) => rsx! {
                    if data.rows.is_empty() {
                        p { "No results yet." }
                    } else {
                        TrendChart { points: data.trend }
                        HistoryTable { rows: data.rows }
                    }
                },
                ViewState::Error(err) => rsx! {
                    p { "{err.message()}" }
                },
            }
        }
    }
}

#[component]
pub(crate) fn HistoryTable(rows: Vec<HistoryRowVm>) -> Element {
    rsx! {
        table { class: "history",
            thead {
                tr {
                    th { "Date" }
                    th { "Score" }
                    th { "Accuracy" }
                    th { "Completion" }
                    th { "Time" }
                }
            }
            tbody {
                for row in rows {
                    tr {
                        td {
                            "{row.date_label}"
                            if row.is_local {
                                span { class: "local-badge", " (this device)" }
                            }
                        }
                        td { "{row.score_label}" }
                        td { "{row.accuracy_label}" }
                        td { "{row.completion_label}" }
                        td { "{row.time_label}" }
                    }
                }
            }
        }
    }
}

#[component]
fn TrendChart(points: Vec<TrendPointVm>) -> Element {
    if points.len() < 2 {
        return rsx! {};
    }

    rsx! {
        figure { class: "trend",
            for point in points {
                div {
                    class: "trend-bar",
                    title: "{point.label}: {point.accuracy}%",
                    style: "height: {point.accuracy}%",
                }
            }
        }
    }
}
