use async_trait::async_trait;
use practice_core::model::AuthIdentity;
use tokio::sync::watch;

use crate::repository::StorageError;

/// Source of the current signed-in user.
///
/// Consumers only read identity; change notifications arrive through the
/// `watch` receiver returned by [`IdentityProvider::subscribe`].
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Latest known identity, `None` when signed out.
    fn current(&self) -> Option<AuthIdentity>;

    /// Subscribe to sign-in / sign-out changes.
    fn subscribe(&self) -> watch::Receiver<Option<AuthIdentity>>;

    /// Ask the provider to re-validate the identity and return the result.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the provider cannot be reached.
    async fn refresh(&self) -> Result<Option<AuthIdentity>, StorageError>;
}

/// Identity provider whose state is set programmatically.
///
/// Used by the desktop shell (identity from configuration) and by tests.
#[derive(Clone)]
pub struct StaticIdentityProvider {
    tx: watch::Sender<Option<AuthIdentity>>,
}

impl StaticIdentityProvider {
    #[must_use]
    pub fn new(initial: Option<AuthIdentity>) -> Self {
        let (tx, _rx) = watch::channel(initial);
        Self { tx }
    }

    #[must_use]
    pub fn anonymous() -> Self {
        Self::new(None)
    }

    pub fn sign_in(&self, identity: AuthIdentity) {
        self.tx.send_replace(Some(identity));
    }

    pub fn sign_out(&self) {
        self.tx.send_replace(None);
    }
}

#[async_trait]
impl IdentityProvider for StaticIdentityProvider {
    fn current(&self) -> Option<AuthIdentity> {
        self.tx.borrow().clone()
    }

    fn subscribe(&self) -> watch::Receiver<Option<AuthIdentity>> {
        self.tx.subscribe()
    }

    async fn refresh(&self) -> Result<Option<AuthIdentity>, StorageError> {
        Ok(self.current())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use practice_core::model::UserId;

    #[tokio::test]
    async fn subscribers_see_sign_in_and_out() {
        let provider = StaticIdentityProvider::anonymous();
        let mut rx = provider.subscribe();
        assert!(provider.current().is_none());

        let identity = AuthIdentity::new(UserId::new("u1").unwrap(), Some("a@b.c".into()));
        provider.sign_in(identity.clone());
        rx.changed().await.unwrap();
        assert_eq!(rx.borrow_and_update().as_ref(), Some(&identity));

        provider.sign_out();
        rx.changed().await.unwrap();
        assert!(rx.borrow().is_none());
        assert!(provider.refresh().await.unwrap().is_none());
    }
}
