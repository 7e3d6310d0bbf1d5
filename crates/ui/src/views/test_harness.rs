use std::sync::Arc;

use dioxus::core::{NoOpMutations, ScopeId};
use dioxus::prelude::*;
use dioxus_router::{Routable, Router};
use practice_core::model::{AuthIdentity, UserId};
use practice_core::time::fixed_clock;
use services::PracticeService;
use storage::identity::{IdentityProvider, StaticIdentityProvider};
use storage::repository::{InMemoryRepository, Storage};

use crate::context::{UiApp, build_app_context};
use crate::views::practice::PracticeTestHandles;
use crate::views::{HistoryView, PracticeView};

pub const TEST_USER: &str = "user-1";

#[derive(Clone)]
struct TestApp {
    practice: Arc<PracticeService>,
}

impl UiApp for TestApp {
    fn practice(&self) -> Arc<PracticeService> {
        Arc::clone(&self.practice)
    }

    fn backend_label(&self) -> String {
        "test".to_string()
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
pub enum ViewKind {
    Practice,
    History,
}

#[derive(Props, Clone)]
struct ViewHarnessProps {
    app: Arc<TestApp>,
    view: ViewKind,
    practice_handles: Option<PracticeTestHandles>,
}

impl PartialEq for ViewHarnessProps {
    fn eq(&self, _other: &Self) -> bool {
        true
    }
}

impl Eq for ViewHarnessProps {}

#[component]
fn ViewRouterHarness(props: ViewHarnessProps) -> Element {
    let app: Arc<dyn UiApp> = props.app.clone();
    use_context_provider(|| build_app_context(&app));
    use_context_provider(|| props.view);
    if let Some(handles) = props.practice_handles.clone() {
        use_context_provider(|| handles);
    }
    rsx! { Router::<TestRoute> {} }
}

#[derive(Clone, Routable, PartialEq)]
#[rustfmt::skip]
enum TestRoute {
    #[route("/")]
    Root {},
}

#[component]
fn Root() -> Element {
    let view = use_context::<ViewKind>();
    match view {
        ViewKind::Practice => rsx! { PracticeView {} },
        ViewKind::History => rsx! { HistoryView {} },
    }
}

pub struct ViewHarness {
    pub dom: VirtualDom,
    pub practice_handles: Option<PracticeTestHandles>,
}

impl ViewHarness {
    pub fn rebuild(&mut self) {
        self.dom.rebuild_in_place();
        drive_dom(&mut self.dom);
    }

    pub async fn drive_async(&mut self) {
        let _ = tokio::time::timeout(
            std::time::Duration::from_millis(50),
            self.dom.wait_for_work(),
        )
        .await;
        self.dom.render_immediate(&mut NoOpMutations);
        self.dom.process_events();
    }

    /// Rebuild and let pending resources settle.
    pub async fn settle(&mut self) {
        self.rebuild();
        for _ in 0..4 {
            self.drive_async().await;
        }
    }

    pub fn dispatch(&mut self, intent: crate::vm::PracticeIntent) {
        let handles = self
            .practice_handles
            .clone()
            .expect("practice handles registered");
        self.dom
            .in_scope(ScopeId::ROOT, || handles.dispatch().call(intent));
        drive_dom(&mut self.dom);
    }

    pub fn practice_handles(&self) -> PracticeTestHandles {
        self.practice_handles
            .clone()
            .expect("practice handles registered")
    }

    pub fn render(&self) -> String {
        dioxus_ssr::render(&self.dom)
    }
}

pub fn drive_dom(dom: &mut VirtualDom) {
    dom.process_events();
    dom.render_immediate(&mut NoOpMutations);
    dom.process_events();
}

pub fn signed_in() -> Arc<dyn IdentityProvider> {
    Arc::new(StaticIdentityProvider::new(Some(AuthIdentity::new(
        UserId::new(TEST_USER).expect("valid user id"),
        Some("user@example.com".into()),
    ))))
}

pub fn setup_view_harness(view: ViewKind, repo: &InMemoryRepository) -> ViewHarness {
    setup_view_harness_with_identity(view, repo, signed_in())
}

pub fn setup_view_harness_with_identity(
    view: ViewKind,
    repo: &InMemoryRepository,
    identity: Arc<dyn IdentityProvider>,
) -> ViewHarness {
    let storage = Storage::from_memory(repo);
    let practice = Arc::new(PracticeService::new(fixed_clock(), &storage, identity));
    let practice_handles = match view {
        ViewKind::Practice => Some(PracticeTestHandles::default()),
        ViewKind::History => None,
    };

    let dom = VirtualDom::new_with_props(
        ViewRouterHarness,
        ViewHarnessProps {
            app: Arc::new(TestApp { practice }),
            view,
            practice_handles: practice_handles.clone(),
        },
    );

    ViewHarness {
        dom,
        practice_handles,
    }
}
