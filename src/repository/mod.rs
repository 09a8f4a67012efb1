//! Database repository layer
//!
//! 服务层只依赖 `UserStore` / `RoleStore` trait，PostgreSQL 实现位于子模块

pub mod role_repo;
pub mod user_repo;

pub use role_repo::PgRoleRepository;
pub use user_repo::PgUserRepository;

use crate::{
    error::AppError,
    models::{
        role::{CreateRoleRequest, ResourceAccessRule, Role, RoleWithAccess, SetPermissionRequest},
        user::{NewUser, User, UserChanges, UserWithRole},
    },
};
use async_trait::async_trait;
use uuid::Uuid;

/// 用户存储
#[async_trait]
pub trait UserStore: Send + Sync {
    /// 根据邮箱查找用户（含角色与访问规则）
    async fn find_by_email(&self, email: &str) -> Result<Option<UserWithRole>, AppError>;

    /// 根据 ID 查找用户（含角色与访问规则）
    async fn find_by_id(&self, id: Uuid) -> Result<Option<UserWithRole>, AppError>;

    /// 分页列出用户
    async fn list(&self, offset: i64, limit: i64) -> Result<Vec<User>, AppError>;

    async fn create(&self, new_user: &NewUser) -> Result<User, AppError>;

    /// 部分更新，用户不存在时返回 None
    async fn update(&self, id: Uuid, changes: &UserChanges) -> Result<Option<User>, AppError>;

    async fn set_role(&self, id: Uuid, role_id: Option<Uuid>) -> Result<Option<User>, AppError>;
}

/// 角色存储
#[async_trait]
pub trait RoleStore: Send + Sync {
    async fn list(&self) -> Result<Vec<RoleWithAccess>, AppError>;

    async fn find_by_name(&self, name: &str) -> Result<Option<RoleWithAccess>, AppError>;

    async fn create(&self, req: &CreateRoleRequest) -> Result<Role, AppError>;

    /// 按 (role_id, resource) 插入或更新访问规则，单条语句完成
    async fn upsert_access(
        &self,
        role_id: Uuid,
        req: &SetPermissionRequest,
    ) -> Result<ResourceAccessRule, AppError>;

    /// 删除角色，级联删除访问规则并解除用户关联
    async fn delete(&self, id: Uuid) -> Result<bool, AppError>;
}

/// 将唯一约束冲突映射为 Conflict
pub(crate) fn map_unique_violation(e: sqlx::Error, message: &str) -> AppError {
    match &e {
        sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
            AppError::Conflict(message.to_string())
        }
        _ => AppError::Database(e),
    }
}
