//! Role and resource access models

use crate::auth::jwt::{GlobalPermissions, ResourcePermissions};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;
use validator::Validate;

/// Role
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Role {
    pub id: Uuid,
    pub name: String,
    pub can_read_all: bool,
    pub can_write_all: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Per-resource CRUD rule of a role, unique by (role_id, resource)
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct ResourceAccessRule {
    pub id: Uuid,
    pub role_id: Uuid,
    pub resource: String,
    pub can_read: bool,
    pub can_write: bool,
    pub can_delete: bool,
}

/// Role with its access rules
#[derive(Debug, Clone, Serialize)]
pub struct RoleWithAccess {
    #[serde(flatten)]
    pub role: Role,
    pub access: Vec<ResourceAccessRule>,
}

impl RoleWithAccess {
    pub fn global_permissions(&self) -> GlobalPermissions {
        GlobalPermissions {
            read_all: self.role.can_read_all,
            write_all: self.role.can_write_all,
        }
    }

    /// Rules keyed by resource name, as carried in access tokens
    pub fn resource_access(&self) -> BTreeMap<String, ResourcePermissions> {
        self.access
            .iter()
            .map(|rule| {
                (
                    rule.resource.clone(),
                    ResourcePermissions {
                        read: rule.can_read,
                        write: rule.can_write,
                        delete: rule.can_delete,
                    },
                )
            })
            .collect()
    }
}

/// Create role request
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateRoleRequest {
    #[validate(length(min = 1, max = 64, message = "Role name must be 1-64 characters"))]
    pub name: String,
    #[serde(default)]
    pub can_read_all: bool,
    #[serde(default)]
    pub can_write_all: bool,
}

/// Upsert resource access rule request
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct SetPermissionRequest {
    #[validate(length(min = 1, max = 64, message = "Resource name must be 1-64 characters"))]
    pub resource: String,
    #[serde(default)]
    pub can_read: bool,
    #[serde(default)]
    pub can_write: bool,
    #[serde(default)]
    pub can_delete: bool,
}
