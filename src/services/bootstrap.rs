//! 初始数据：admin / user 角色与管理员账户

use crate::{
    auth::password::PasswordHasher,
    config::BootstrapConfig,
    error::AppError,
    models::{
        role::{CreateRoleRequest, RoleWithAccess, SetPermissionRequest},
        user::{NewUser, UserChanges},
    },
    repository::{RoleStore, UserStore},
};
use secrecy::ExposeSecret;

pub const ADMIN_ROLE: &str = "admin";
pub const USER_ROLE: &str = "user";

/// 写入初始数据，可重复执行
///
/// 管理员已存在时不改动密码
pub async fn seed(
    users: &dyn UserStore,
    roles: &dyn RoleStore,
    hasher: &PasswordHasher,
    config: &BootstrapConfig,
) -> Result<(), AppError> {
    let admin_role = ensure_role(
        roles,
        CreateRoleRequest {
            name: ADMIN_ROLE.to_string(),
            can_read_all: true,
            can_write_all: true,
        },
        None,
    )
    .await?;

    ensure_role(
        roles,
        CreateRoleRequest {
            name: USER_ROLE.to_string(),
            can_read_all: false,
            can_write_all: false,
        },
        Some(SetPermissionRequest {
            resource: "orders".to_string(),
            can_read: true,
            can_write: true,
            can_delete: false,
        }),
    )
    .await?;

    match users.find_by_email(&config.admin_email).await? {
        Some(existing) => {
            // 已有管理员保留现有密码，只恢复启用状态与角色
            let id = existing.user.id;
            if !existing.user.is_active {
                users
                    .update(
                        id,
                        &UserChanges {
                            is_active: Some(true),
                            ..Default::default()
                        },
                    )
                    .await?;
            }
            users.set_role(id, Some(admin_role.role.id)).await?;
            tracing::info!(email = %config.admin_email, "Seeding: admin user already present");
        }
        None => {
            let password_hash = hasher.hash(config.admin_password.expose_secret())?;
            let user = users
                .create(&NewUser {
                    email: config.admin_email.clone(),
                    password_hash,
                    first_name: Some("Super".to_string()),
                    last_name: Some("Admin".to_string()),
                    middle_name: None,
                    role_id: Some(admin_role.role.id),
                })
                .await?;
            tracing::info!(user_id = %user.id, email = %config.admin_email, "Seeding: admin user created");
        }
    }

    Ok(())
}

/// 角色不存在时创建，并写入初始访问规则
async fn ensure_role(
    roles: &dyn RoleStore,
    req: CreateRoleRequest,
    initial_access: Option<SetPermissionRequest>,
) -> Result<RoleWithAccess, AppError> {
    if let Some(role) = roles.find_by_name(&req.name).await? {
        return Ok(role);
    }

    tracing::info!(role = %req.name, "Seeding: creating role");
    let role = roles.create(&req).await?;

    let mut access = Vec::new();
    if let Some(rule) = initial_access {
        access.push(roles.upsert_access(role.id, &rule).await?);
    }

    Ok(RoleWithAccess { role, access })
}
