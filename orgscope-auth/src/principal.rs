use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// The authenticated user behind a request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    pub user_id: String,
    pub email: String,
    pub name: String,
}

impl Principal {
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            email: String::new(),
            name: String::new(),
        }
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = email.into();
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Display name, falling back to the email, then to `"User"`.
    pub fn display_name(&self) -> &str {
        if !self.name.is_empty() {
            &self.name
        } else if !self.email.is_empty() {
            &self.email
        } else {
            "User"
        }
    }
}

/// Session lookup. `Ok(None)` means the request carries no valid session;
/// `Err` is reserved for the lookup itself failing.
#[async_trait]
pub trait PrincipalResolver: Send + Sync {
    async fn current(&self) -> anyhow::Result<Option<Principal>>;
}
