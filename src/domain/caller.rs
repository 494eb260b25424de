//! Explicit caller context.
//!
//! Every core operation receives a [`Caller`] instead of reading ambient
//! session state. Role checks happen inside the services, not per-route.

use super::{DomainError, DomainResult};

/// Identity and role of the party invoking an operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Caller {
    /// No authenticated identity.
    Anonymous,
    /// Regular signed-in user.
    User { id: String, username: String },
    /// Administrator.
    Admin { id: String, username: String },
}

impl Caller {
    pub fn user(id: impl Into<String>, username: impl Into<String>) -> Self {
        Self::User {
            id: id.into(),
            username: username.into(),
        }
    }

    pub fn admin(id: impl Into<String>, username: impl Into<String>) -> Self {
        Self::Admin {
            id: id.into(),
            username: username.into(),
        }
    }

    pub fn is_admin(&self) -> bool {
        matches!(self, Self::Admin { .. })
    }

    /// Identity of any non-anonymous caller.
    pub fn user_id(&self) -> Option<&str> {
        match self {
            Self::Anonymous => None,
            Self::User { id, .. } | Self::Admin { id, .. } => Some(id),
        }
    }

    pub fn username(&self) -> Option<&str> {
        match self {
            Self::Anonymous => None,
            Self::User { username, .. } | Self::Admin { username, .. } => Some(username),
        }
    }

    /// Require any signed-in caller, returning its id and display name.
    pub fn require_user(&self) -> DomainResult<(&str, &str)> {
        match self {
            Self::Anonymous => Err(DomainError::Unauthorized("sign-in required".into())),
            Self::User { id, username } | Self::Admin { id, username } => {
                Ok((id.as_str(), username.as_str()))
            }
        }
    }

    /// Require an administrator.
    pub fn require_admin(&self) -> DomainResult<(&str, &str)> {
        match self {
            Self::Admin { id, username } => Ok((id.as_str(), username.as_str())),
            Self::Anonymous => Err(DomainError::Unauthorized("sign-in required".into())),
            Self::User { .. } => Err(DomainError::Forbidden("admin role required".into())),
        }
    }
}

// ── Tests ──────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn anonymous_is_rejected() {
        assert!(Caller::Anonymous.require_user().is_err());
        assert!(Caller::Anonymous.require_admin().is_err());
        assert!(Caller::Anonymous.user_id().is_none());
    }

    #[test]
    fn user_passes_user_check_but_not_admin() {
        let c = Caller::user("u1", "alice");
        assert_eq!(c.require_user().unwrap(), ("u1", "alice"));
        assert!(matches!(
            c.require_admin(),
            Err(DomainError::Forbidden(_))
        ));
        assert!(!c.is_admin());
    }

    #[test]
    fn admin_passes_both_checks() {
        let c = Caller::admin("a1", "root");
        assert_eq!(c.require_user().unwrap(), ("a1", "root"));
        assert_eq!(c.require_admin().unwrap(), ("a1", "root"));
        assert!(c.is_admin());
    }
}
