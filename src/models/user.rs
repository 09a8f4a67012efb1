//! User domain models

use crate::models::role::RoleWithAccess;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::{Validate, ValidationError};

/// User account
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,

    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub middle_name: Option<String>,

    // Soft delete flag
    pub is_active: bool,
    pub role_id: Option<Uuid>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// User with its role and the role's access rules loaded
#[derive(Debug, Clone)]
pub struct UserWithRole {
    pub user: User,
    pub role: Option<RoleWithAccess>,
}

/// New user row
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub password_hash: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub middle_name: Option<String>,
    pub role_id: Option<Uuid>,
}

/// Partial update applied to a user row; `None` leaves the column unchanged
#[derive(Debug, Clone, Default)]
pub struct UserChanges {
    pub email: Option<String>,
    pub password_hash: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub middle_name: Option<String>,
    pub is_active: Option<bool>,
}

/// Registration request
#[derive(Debug, Deserialize, Validate)]
#[validate(schema(function = "validate_password_confirmation"))]
pub struct RegisterRequest {
    #[validate(email(message = "Invalid email address"))]
    pub email: String,
    pub password: String,
    pub password_confirm: String,
    #[validate(length(max = 100))]
    pub first_name: Option<String>,
    #[validate(length(max = 100))]
    pub last_name: Option<String>,
    #[validate(length(max = 100))]
    pub middle_name: Option<String>,
}

fn validate_password_confirmation(req: &RegisterRequest) -> Result<(), ValidationError> {
    if req.password != req.password_confirm {
        let mut err = ValidationError::new("password_mismatch");
        err.message = Some("Passwords do not match".into());
        return Err(err);
    }
    Ok(())
}

/// Update user request
#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateUserRequest {
    #[validate(email(message = "Invalid email address"))]
    pub email: Option<String>,
    pub password: Option<String>,
    #[validate(length(max = 100))]
    pub first_name: Option<String>,
    #[validate(length(max = 100))]
    pub last_name: Option<String>,
    #[validate(length(max = 100))]
    pub middle_name: Option<String>,
    /// Only honoured on the admin endpoint
    pub is_active: Option<bool>,
}

/// Assign role request
#[derive(Debug, Deserialize)]
pub struct AssignRoleRequest {
    pub role_name: String,
}

/// User response (without sensitive data)
#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub id: Uuid,
    pub email: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub middle_name: Option<String>,
    pub is_active: bool,
    pub role: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<UserWithRole> for UserResponse {
    fn from(value: UserWithRole) -> Self {
        let UserWithRole { user, role } = value;
        Self {
            id: user.id,
            email: user.email,
            first_name: user.first_name,
            last_name: user.last_name,
            middle_name: user.middle_name,
            is_active: user.is_active,
            role: role.map(|r| r.role.name),
            created_at: user.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn register(password: &str, confirm: &str) -> RegisterRequest {
        RegisterRequest {
            email: "a@b.com".to_string(),
            password: password.to_string(),
            password_confirm: confirm.to_string(),
            first_name: None,
            last_name: None,
            middle_name: None,
        }
    }

    #[test]
    fn test_register_request_validation() {
        assert!(register("Secret123!", "Secret123!").validate().is_ok());
        assert!(register("Secret123!", "Secret123?").validate().is_err());

        let mut req = register("Secret123!", "Secret123!");
        req.email = "not-an-email".to_string();
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_password_hash_not_serialized() {
        let user = User {
            id: Uuid::new_v4(),
            email: "a@b.com".to_string(),
            password_hash: "$argon2id$secret".to_string(),
            first_name: None,
            last_name: None,
            middle_name: None,
            is_active: true,
            role_id: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        let json = serde_json::to_string(&user).unwrap();
        assert!(!json.contains("password_hash"));
        assert!(!json.contains("argon2id"));
    }
}
