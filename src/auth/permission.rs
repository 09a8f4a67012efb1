//! Resource-level permission evaluation
//!
//! Maps a decoded claims set to an allow/deny decision for a (resource, action)
//! pair. Global flags are checked first, then the per-resource rule.

use crate::{auth::jwt::Claims, error::AppError};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

/// CRUD action guarded on a resource
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    Read,
    Write,
    Delete,
}

impl Action {
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Read => "read",
            Action::Write => "write",
            Action::Delete => "delete",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Action {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "read" => Ok(Action::Read),
            "write" => Ok(Action::Write),
            "delete" => Ok(Action::Delete),
            other => Err(AppError::BadRequest(format!("Unknown action: {}", other))),
        }
    }
}

/// Why a request was denied
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DenyReason {
    ResourceNotListed,
    InsufficientPermission,
}

impl DenyReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            DenyReason::ResourceNotListed => "resource not in access list",
            DenyReason::InsufficientPermission => "insufficient permission for action",
        }
    }
}

impl fmt::Display for DenyReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Deny(DenyReason),
}

impl Decision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Decision::Allow)
    }
}

/// Evaluate `action` on `resource` for the given claims.
///
/// `write_all` grants write and delete everywhere but never read; read is
/// governed only by `read_all` and the per-resource read flag.
pub fn evaluate(claims: &Claims, resource: &str, action: Action) -> Decision {
    let global = &claims.global_permissions;

    match action {
        Action::Read if global.read_all => return Decision::Allow,
        Action::Write | Action::Delete if global.write_all => return Decision::Allow,
        _ => {}
    }

    let Some(rule) = claims.resource_access.get(resource) else {
        return Decision::Deny(DenyReason::ResourceNotListed);
    };

    let granted = match action {
        Action::Read => rule.read,
        Action::Write => rule.write,
        Action::Delete => rule.delete,
    };

    if granted {
        Decision::Allow
    } else {
        Decision::Deny(DenyReason::InsufficientPermission)
    }
}

/// Permission check bound to one `(resource, action)` pair.
///
/// Built once per route when the router is assembled and shared by every
/// request hitting that route.
#[derive(Debug, Clone)]
pub struct AccessGuard {
    resource: &'static str,
    action: Action,
}

impl AccessGuard {
    pub const fn new(resource: &'static str, action: Action) -> Self {
        Self { resource, action }
    }

    /// Check the claims, mapping a deny decision to `AppError::Forbidden`
    pub fn check(&self, claims: &Claims) -> Result<(), AppError> {
        match evaluate(claims, self.resource, self.action) {
            Decision::Allow => Ok(()),
            Decision::Deny(reason) => {
                tracing::warn!(
                    user_id = %claims.subject,
                    resource = %self.resource,
                    action = %self.action,
                    reason = %reason,
                    "Permission denied"
                );
                Err(AppError::Forbidden {
                    resource: self.resource.to_string(),
                    action: self.action,
                    reason,
                })
            }
        }
    }
}
