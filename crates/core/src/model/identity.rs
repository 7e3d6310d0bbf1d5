use serde::{Deserialize, Serialize};

use crate::model::ids::UserId;

/// A logged-in user as reported by the identity provider.
///
/// "Anonymous" is modelled as `Option<AuthIdentity>::None` throughout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthIdentity {
    user_id: UserId,
    email: Option<String>,
}

impl AuthIdentity {
    #[must_use]
    pub fn new(user_id: UserId, email: Option<String>) -> Self {
        let email = email
            .map(|e| e.trim().to_string())
            .filter(|e| !e.is_empty());
        Self { user_id, email }
    }

    #[must_use]
    pub fn user_id(&self) -> &UserId {
        &self.user_id
    }

    #[must_use]
    pub fn email(&self) -> Option<&str> {
        self.email.as_deref()
    }

    /// Short label for navigation chrome: the email, else the user id.
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.email().unwrap_or_else(|| self.user_id.as_str())
    }
}
