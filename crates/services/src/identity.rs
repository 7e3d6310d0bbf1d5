use std::sync::Arc;

use practice_core::model::AuthIdentity;
use storage::identity::IdentityProvider;
use tokio::sync::watch;

/// Cached view of the signed-in user, refreshed by provider notifications.
#[derive(Clone)]
pub struct IdentityWatch {
    provider: Arc<dyn IdentityProvider>,
    rx: watch::Receiver<Option<AuthIdentity>>,
}

impl IdentityWatch {
    #[must_use]
    pub fn new(provider: Arc<dyn IdentityProvider>) -> Self {
        let rx = provider.subscribe();
        Self { provider, rx }
    }

    /// Latest identity snapshot without waiting.
    #[must_use]
    pub fn current(&self) -> Option<AuthIdentity> {
        self.rx.borrow().clone()
    }

    /// Wait for the next sign-in or sign-out and return the new snapshot.
    ///
    /// Returns `None` once the provider has been dropped.
    pub async fn changed(&mut self) -> Option<Option<AuthIdentity>> {
        self.rx.changed().await.ok()?;
        Some(self.rx.borrow_and_update().clone())
    }

    /// Ask the provider to re-validate, falling back to the cached snapshot.
    pub async fn refresh(&self) -> Option<AuthIdentity> {
        match self.provider.refresh().await {
            Ok(identity) => identity,
            Err(e) => {
                log::warn!("identity refresh failed: {e}");
                self.current()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use practice_core::model::UserId;
    use storage::identity::StaticIdentityProvider;

    #[tokio::test]
    async fn snapshot_follows_provider() {
        let provider = Arc::new(StaticIdentityProvider::anonymous());
        let mut watch = IdentityWatch::new(provider.clone());
        assert!(watch.current().is_none());

        provider.sign_in(AuthIdentity::new(UserId::new("u1").unwrap(), None));
        let next = watch.changed().await.expect("provider alive");
        assert_eq!(next.unwrap().user_id().as_str(), "u1");
        assert!(watch.current().is_some());

        provider.sign_out();
        assert!(watch.changed().await.expect("provider alive").is_none());
        assert!(watch.refresh().await.is_none());
    }
}
