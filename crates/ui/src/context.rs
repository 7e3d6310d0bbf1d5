use std::sync::Arc;

use services::PracticeService;

pub trait UiApp: Send + Sync {
    fn practice(&self) -> Arc<PracticeService>;

    /// Where data is read from, shown in the sidebar.
    fn backend_label(&self) -> String;
}

#[derive(Clone)]
pub struct AppContext {
    practice: Arc<PracticeService>,
    backend_label: String,
}

impl AppContext {
    #[must_use]
    pub fn new(app: &Arc<dyn UiApp>) -> Self {
        Self {
            practice: app.practice(),
            backend_label: app.backend_label(),
        }
    }

    #[must_use]
    pub fn practice(&self) -> Arc<PracticeService> {
        Arc::clone(&self.practice)
    }

    #[must_use]
    pub fn backend_label(&self) -> &str {
        &self.backend_label
    }

    /// Display name of the signed-in user, if any.
    #[must_use]
    pub fn signed_in_as(&self) -> Option<String> {
        self.practice
            .identity()
            .map(|identity| identity.display_name().to_string())
    }
}

// Provided by the composition root in `crates/app`.

/// Build an `AppContext` from a UI-facing app implementation.
#[must_use]
pub fn build_app_context(app: &Arc<dyn UiApp>) -> AppContext {
    AppContext::new(app)
}
