use dioxus::prelude::*;
use dioxus_router::{Link, Outlet, Routable};

use crate::context::AppContext;
use crate::views::{HistoryView, PracticeView};

#[derive(Clone, Routable, PartialEq)]
#[rustfmt::skip]
pub enum Route {
    #[layout(Layout)]
        #[route("/", PracticeView)] Practice {},
        #[route("/history", HistoryView)] History {},
}

#[component]
fn Layout() -> Element {
    rsx! {
        div { class: "app",
            Sidebar {}
            main { class: "content",
                Outlet::<Route> {}
            }
        }
    }
}

#[component]
fn Sidebar() -> Element {
    let ctx = use_context::<AppContext>();
    let mut account = use_signal(|| ctx.signed_in_as());
    let practice = ctx.practice();
    use_future(move || {
        let mut watch = practice.identity_watch();
        async move {
            while let Some(identity) = watch.changed().await {
                account.set(identity.map(|i| i.display_name().to_string()));
            }
        }
    });
    let account_label = account
        .read()
        .clone()
        .unwrap_or_else(|| "Not signed in".to_string());
    let backend = ctx.backend_label().to_string();

    rsx! {
        nav { class: "sidebar",
            h1 { "ASVAB Practice" }
            ul {
                li { Link { to: Route::Practice {}, "Practice test" } }
                li { Link { to: Route::History {}, "History" } }
            }
            footer { class: "sidebar-footer",
                p { class: "account", "{account_label}" }
                p { class: "backend", "Data: {backend}" }
            }
        }
    }
}
