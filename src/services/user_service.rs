//! 用户服务：注册、资料维护、软删除、角色分配

use crate::{
    auth::password::PasswordHasher,
    config::SecurityConfig,
    error::AppError,
    models::{role::RoleWithAccess, user::*},
    repository::{RoleStore, UserStore},
};
use std::{collections::HashMap, sync::Arc};
use uuid::Uuid;
use validator::Validate;

/// 单页最大条数
const MAX_PAGE_SIZE: i64 = 500;

pub struct UserService {
    users: Arc<dyn UserStore>,
    roles: Arc<dyn RoleStore>,
    hasher: Arc<PasswordHasher>,
    policy: SecurityConfig,
}

impl UserService {
    pub fn new(
        users: Arc<dyn UserStore>,
        roles: Arc<dyn RoleStore>,
        hasher: Arc<PasswordHasher>,
        policy: SecurityConfig,
    ) -> Self {
        Self {
            users,
            roles,
            hasher,
            policy,
        }
    }

    /// 注册新用户（无角色，令牌中为 guest）
    pub async fn register(&self, req: RegisterRequest) -> Result<UserWithRole, AppError> {
        req.validate()?;
        PasswordHasher::validate_password_policy(&req.password, &self.policy)?;

        if self.users.find_by_email(&req.email).await?.is_some() {
            return Err(AppError::Conflict("Email already registered".to_string()));
        }

        let user = self
            .users
            .create(&NewUser {
                email: req.email,
                password_hash: self.hasher.hash(&req.password)?,
                first_name: req.first_name,
                last_name: req.last_name,
                middle_name: req.middle_name,
                role_id: None,
            })
            .await?;

        tracing::info!(user_id = %user.id, "User registered");

        Ok(UserWithRole { user, role: None })
    }

    /// 获取用户（管理端，不存在返回 404）
    pub async fn get(&self, id: Uuid) -> Result<UserWithRole, AppError> {
        self.users
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found("User not found"))
    }

    /// 获取当前登录用户，不存在或已停用均视为认证失败
    pub async fn current(&self, id: &str) -> Result<UserWithRole, AppError> {
        let id = Uuid::parse_str(id).map_err(|_| AppError::UserNotFound)?;
        let user = self
            .users
            .find_by_id(id)
            .await?
            .ok_or(AppError::UserNotFound)?;

        if !user.user.is_active {
            return Err(AppError::Inactive);
        }

        Ok(user)
    }

    /// 列出用户，附带各自的角色
    ///
    /// 角色表一次读出后按 id 关联，不逐个查询
    pub async fn list(&self, skip: i64, limit: i64) -> Result<Vec<UserWithRole>, AppError> {
        let skip = skip.max(0);
        let limit = limit.clamp(1, MAX_PAGE_SIZE);
        let users = self.users.list(skip, limit).await?;

        let roles: HashMap<Uuid, RoleWithAccess> = if users.iter().any(|u| u.role_id.is_some()) {
            self.roles
                .list()
                .await?
                .into_iter()
                .map(|role| (role.role.id, role))
                .collect()
        } else {
            HashMap::new()
        };

        Ok(users
            .into_iter()
            .map(|user| UserWithRole {
                role: user.role_id.and_then(|id| roles.get(&id).cloned()),
                user,
            })
            .collect())
    }

    /// 更新用户资料
    ///
    /// `allow_status` 为 false 时忽略 is_active（用户自助修改）
    pub async fn update(
        &self,
        id: Uuid,
        req: UpdateUserRequest,
        allow_status: bool,
    ) -> Result<UserWithRole, AppError> {
        req.validate()?;

        let current = self.get(id).await?;

        if let Some(email) = req.email.as_deref() {
            if email != current.user.email && self.users.find_by_email(email).await?.is_some() {
                return Err(AppError::Conflict("Email already in use".to_string()));
            }
        }

        let password_hash = match req.password.as_deref() {
            Some(password) => {
                PasswordHasher::validate_password_policy(password, &self.policy)?;
                Some(self.hasher.hash(password)?)
            }
            None => None,
        };

        let changes = UserChanges {
            email: req.email,
            password_hash,
            first_name: req.first_name,
            last_name: req.last_name,
            middle_name: req.middle_name,
            is_active: if allow_status { req.is_active } else { None },
        };

        let user = self
            .users
            .update(id, &changes)
            .await?
            .ok_or_else(|| AppError::not_found("User not found"))?;

        tracing::info!(user_id = %id, "User updated");

        Ok(UserWithRole {
            user,
            role: current.role,
        })
    }

    /// 软删除：仅标记 is_active = false
    pub async fn soft_delete(&self, id: Uuid) -> Result<(), AppError> {
        let changes = UserChanges {
            is_active: Some(false),
            ..Default::default()
        };

        self.users
            .update(id, &changes)
            .await?
            .ok_or_else(|| AppError::not_found("User not found"))?;

        tracing::info!(user_id = %id, "User deactivated");
        Ok(())
    }

    /// 为用户分配角色
    pub async fn assign_role(&self, id: Uuid, role_name: &str) -> Result<UserWithRole, AppError> {
        let role = self
            .roles
            .find_by_name(role_name)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Role '{}' not found", role_name)))?;

        let user = self
            .users
            .set_role(id, Some(role.role.id))
            .await?
            .ok_or_else(|| AppError::not_found("User not found"))?;

        tracing::info!(user_id = %id, role = %role_name, "Role assigned");

        Ok(UserWithRole {
            user,
            role: Some(role),
        })
    }
}
