//! Per-request identity and client information.

use serde::{Deserialize, Serialize};

/// Integer user identifier, matching the user-record store's primary key.
pub type UserId = i64;

/// Identity and client details for one logical operation.
///
/// The identity is given by whatever authenticated the request upstream;
/// nothing here verifies it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestContext {
    pub user_id: Option<UserId>,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
}

impl RequestContext {
    /// Context with no identity and no client information.
    pub fn anonymous() -> Self {
        Self::default()
    }

    /// Context for an authenticated user.
    pub fn for_user(user_id: UserId) -> Self {
        Self {
            user_id: Some(user_id),
            ..Self::default()
        }
    }

    pub fn with_ip(mut self, ip: impl Into<String>) -> Self {
        self.ip_address = Some(ip.into());
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    pub fn is_authenticated(&self) -> bool {
        self.user_id.is_some()
    }

    /// Explicit id wins, otherwise the authenticated identity.
    pub fn resolve_user(&self, explicit: Option<UserId>) -> Option<UserId> {
        explicit.or(self.user_id)
    }
}
