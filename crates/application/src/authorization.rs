//! Who is calling, and what they may do.

use std::fmt;

use domain::{Role, UserId};

use crate::error::AppError;

/// The caller of a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Actor {
    /// No credentials were presented.
    Anonymous,
    /// An authenticated user.
    User { id: UserId, role: Role },
    /// The application itself (startup seeding, event handlers).
    System,
}

impl Actor {
    pub fn user(id: UserId, role: Role) -> Self {
        Actor::User { id, role }
    }

    pub fn user_id(&self) -> Option<UserId> {
        match self {
            Actor::User { id, .. } => Some(*id),
            _ => None,
        }
    }

    pub fn is_admin(&self) -> bool {
        match self {
            Actor::User { role, .. } => role.is_admin(),
            Actor::System => true,
            Actor::Anonymous => false,
        }
    }

    /// Returns the caller's user id, failing for anonymous and system callers.
    pub fn require_user(&self) -> Result<UserId, AppError> {
        self.user_id()
            .ok_or_else(|| AppError::Unauthorized("Authentication required".to_string()))
    }

    /// Allows the resource owner and administrators.
    pub fn ensure_owner_or_admin(&self, owner: UserId) -> Result<(), AppError> {
        if self.is_admin() || self.user_id() == Some(owner) {
            Ok(())
        } else {
            Err(AppError::forbidden())
        }
    }
}

impl fmt::Display for Actor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Actor::Anonymous => f.write_str("anonymous"),
            Actor::User { id, role } => write!(f, "{role}:{id}"),
            Actor::System => f.write_str("system"),
        }
    }
}

/// Access policy of a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Policy {
    Public,
    Authenticated,
    Admin,
}

impl Policy {
    pub fn authorize(&self, actor: &Actor) -> Result<(), AppError> {
        match (self, actor) {
            (Policy::Public, _) | (_, Actor::System) => Ok(()),
            (_, Actor::Anonymous) => Err(AppError::Unauthorized(
                "Authentication required".to_string(),
            )),
            (Policy::Authenticated, Actor::User { .. }) => Ok(()),
            (Policy::Admin, Actor::User { role, .. }) if role.is_admin() => Ok(()),
            (Policy::Admin, Actor::User { .. }) => Err(AppError::Forbidden(
                "Administrator role required".to_string(),
            )),
        }
    }
}
