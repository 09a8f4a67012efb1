//! User repository (数据库访问层)

use super::{map_unique_violation, PgRoleRepository, UserStore};
use crate::{error::AppError, models::user::*};
use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

pub struct PgUserRepository {
    db: PgPool,
    roles: PgRoleRepository,
}

impl PgUserRepository {
    pub fn new(db: PgPool) -> Self {
        Self {
            roles: PgRoleRepository::new(db.clone()),
            db,
        }
    }

    /// 附加角色与访问规则
    async fn with_role(&self, user: Option<User>) -> Result<Option<UserWithRole>, AppError> {
        let Some(user) = user else {
            return Ok(None);
        };

        let role = match user.role_id {
            Some(role_id) => self.roles.load_with_access(role_id).await?,
            None => None,
        };

        Ok(Some(UserWithRole { user, role }))
    }
}

#[async_trait]
impl UserStore for PgUserRepository {
    /// 根据邮箱查找用户
    async fn find_by_email(&self, email: &str) -> Result<Option<UserWithRole>, AppError> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = $1")
            .bind(email)
            .fetch_optional(&self.db)
            .await?;

        self.with_role(user).await
    }

    /// 根据 ID 查找用户
    async fn find_by_id(&self, id: Uuid) -> Result<Option<UserWithRole>, AppError> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.db)
            .await?;

        self.with_role(user).await
    }

    /// 列出用户
    async fn list(&self, offset: i64, limit: i64) -> Result<Vec<User>, AppError> {
        let users = sqlx::query_as::<_, User>(
            r#"
            SELECT * FROM users
            ORDER BY created_at
            OFFSET $1 LIMIT $2
            "#,
        )
        .bind(offset)
        .bind(limit)
        .fetch_all(&self.db)
        .await?;

        Ok(users)
    }

    /// 创建用户
    async fn create(&self, new_user: &NewUser) -> Result<User, AppError> {
        sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (id, email, password_hash, first_name, last_name, middle_name, role_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&new_user.email)
        .bind(&new_user.password_hash)
        .bind(&new_user.first_name)
        .bind(&new_user.last_name)
        .bind(&new_user.middle_name)
        .bind(new_user.role_id)
        .fetch_one(&self.db)
        .await
        .map_err(|e| map_unique_violation(e, "Email already registered"))
    }

    /// 更新用户
    async fn update(&self, id: Uuid, changes: &UserChanges) -> Result<Option<User>, AppError> {
        sqlx::query_as::<_, User>(
            r#"
            UPDATE users
            SET
                email = COALESCE($2, email),
                password_hash = COALESCE($3, password_hash),
                first_name = COALESCE($4, first_name),
                last_name = COALESCE($5, last_name),
                middle_name = COALESCE($6, middle_name),
                is_active = COALESCE($7, is_active),
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&changes.email)
        .bind(&changes.password_hash)
        .bind(&changes.first_name)
        .bind(&changes.last_name)
        .bind(&changes.middle_name)
        .bind(changes.is_active)
        .fetch_optional(&self.db)
        .await
        .map_err(|e| map_unique_violation(e, "Email already in use"))
    }

    /// 设置用户角色
    async fn set_role(&self, id: Uuid, role_id: Option<Uuid>) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            UPDATE users
            SET role_id = $2, updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(role_id)
        .fetch_optional(&self.db)
        .await?;

        Ok(user)
    }
}
