//! Role repository (角色数据访问)

use super::{map_unique_violation, RoleStore};
use crate::{error::AppError, models::role::*};
use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

pub struct PgRoleRepository {
    db: PgPool,
}

impl PgRoleRepository {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// 查询角色的全部访问规则
    async fn access_rules(&self, role_id: Uuid) -> Result<Vec<ResourceAccessRule>, AppError> {
        let rules = sqlx::query_as::<_, ResourceAccessRule>(
            r#"
            SELECT id, role_id, resource, can_read, can_write, can_delete
            FROM role_access
            WHERE role_id = $1
            ORDER BY resource
            "#,
        )
        .bind(role_id)
        .fetch_all(&self.db)
        .await?;

        Ok(rules)
    }

    /// 根据 ID 加载角色及其访问规则
    pub async fn load_with_access(&self, role_id: Uuid) -> Result<Option<RoleWithAccess>, AppError> {
        let role = sqlx::query_as::<_, Role>("SELECT * FROM roles WHERE id = $1")
            .bind(role_id)
            .fetch_optional(&self.db)
            .await?;

        match role {
            Some(role) => {
                let access = self.access_rules(role.id).await?;
                Ok(Some(RoleWithAccess { role, access }))
            }
            None => Ok(None),
        }
    }
}

#[async_trait]
impl RoleStore for PgRoleRepository {
    /// 列出所有角色
    async fn list(&self) -> Result<Vec<RoleWithAccess>, AppError> {
        let roles = sqlx::query_as::<_, Role>("SELECT * FROM roles ORDER BY name")
            .fetch_all(&self.db)
            .await?;

        let rules = sqlx::query_as::<_, ResourceAccessRule>(
            r#"
            SELECT id, role_id, resource, can_read, can_write, can_delete
            FROM role_access
            ORDER BY resource
            "#,
        )
        .fetch_all(&self.db)
        .await?;

        let result = roles
            .into_iter()
            .map(|role| {
                let access = rules
                    .iter()
                    .filter(|rule| rule.role_id == role.id)
                    .cloned()
                    .collect();
                RoleWithAccess { role, access }
            })
            .collect();

        Ok(result)
    }

    /// 根据名称查找角色
    async fn find_by_name(&self, name: &str) -> Result<Option<RoleWithAccess>, AppError> {
        let role = sqlx::query_as::<_, Role>("SELECT * FROM roles WHERE name = $1")
            .bind(name)
            .fetch_optional(&self.db)
            .await?;

        match role {
            Some(role) => {
                let access = self.access_rules(role.id).await?;
                Ok(Some(RoleWithAccess { role, access }))
            }
            None => Ok(None),
        }
    }

    /// 创建角色
    async fn create(&self, req: &CreateRoleRequest) -> Result<Role, AppError> {
        sqlx::query_as::<_, Role>(
            r#"
            INSERT INTO roles (id, name, can_read_all, can_write_all)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&req.name)
        .bind(req.can_read_all)
        .bind(req.can_write_all)
        .fetch_one(&self.db)
        .await
        .map_err(|e| map_unique_violation(e, &format!("Role '{}' already exists", req.name)))
    }

    async fn upsert_access(
        &self,
        role_id: Uuid,
        req: &SetPermissionRequest,
    ) -> Result<ResourceAccessRule, AppError> {
        let rule = sqlx::query_as::<_, ResourceAccessRule>(
            r#"
            INSERT INTO role_access (id, role_id, resource, can_read, can_write, can_delete)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT ON CONSTRAINT uq_role_resource DO UPDATE SET
                can_read = EXCLUDED.can_read,
                can_write = EXCLUDED.can_write,
                can_delete = EXCLUDED.can_delete
            RETURNING id, role_id, resource, can_read, can_write, can_delete
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(role_id)
        .bind(&req.resource)
        .bind(req.can_read)
        .bind(req.can_write)
        .bind(req.can_delete)
        .fetch_one(&self.db)
        .await?;

        Ok(rule)
    }

    /// 删除角色
    async fn delete(&self, id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM roles WHERE id = $1")
            .bind(id)
            .execute(&self.db)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
