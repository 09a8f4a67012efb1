//! 角色管理服务

use crate::{
    error::AppError,
    models::role::*,
    repository::RoleStore,
};
use std::sync::Arc;
use validator::Validate;

pub struct RbacService {
    roles: Arc<dyn RoleStore>,
}

impl RbacService {
    pub fn new(roles: Arc<dyn RoleStore>) -> Self {
        Self { roles }
    }

    /// 创建角色，名称重复返回 Conflict
    pub async fn create_role(&self, req: CreateRoleRequest) -> Result<RoleWithAccess, AppError> {
        req.validate()?;

        if self.roles.find_by_name(&req.name).await?.is_some() {
            return Err(AppError::Conflict(format!("Role '{}' already exists", req.name)));
        }

        let role = self.roles.create(&req).await?;
        tracing::info!(role = %role.name, "Role created");

        Ok(RoleWithAccess {
            role,
            access: Vec::new(),
        })
    }

    pub async fn get_role(&self, name: &str) -> Result<RoleWithAccess, AppError> {
        self.roles
            .find_by_name(name)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Role '{}' not found", name)))
    }

    pub async fn list_roles(&self) -> Result<Vec<RoleWithAccess>, AppError> {
        self.roles.list().await
    }

    /// 设置角色对某资源的访问权限（UPSERT）
    pub async fn set_access(
        &self,
        role_name: &str,
        req: SetPermissionRequest,
    ) -> Result<RoleWithAccess, AppError> {
        req.validate()?;

        let role = self.get_role(role_name).await?;
        self.roles.upsert_access(role.role.id, &req).await?;

        tracing::info!(
            role = %role_name,
            resource = %req.resource,
            read = req.can_read,
            write = req.can_write,
            delete = req.can_delete,
            "Role access updated"
        );

        // 重新读取以返回最新规则
        self.get_role(role_name).await
    }

    /// 删除角色
    pub async fn delete_role(&self, name: &str) -> Result<(), AppError> {
        let role = self.get_role(name).await?;

        if !self.roles.delete(role.role.id).await? {
            return Err(AppError::NotFound(format!("Role '{}' not found", name)));
        }

        tracing::info!(role = %name, "Role deleted");
        Ok(())
    }
}
