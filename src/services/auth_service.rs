//! 认证服务：登录、登出、令牌刷新（轮换）

use crate::{
    auth::{
        jwt::{Claims, ClaimsPayload, TokenCodec, TokenKind, TokenPair, DEFAULT_ROLE},
        password::PasswordHasher,
    },
    denylist::RevocationList,
    error::AppError,
    models::user::UserWithRole,
    repository::UserStore,
};
use std::sync::Arc;
use uuid::Uuid;

pub struct AuthService {
    users: Arc<dyn UserStore>,
    codec: Arc<TokenCodec>,
    hasher: Arc<PasswordHasher>,
    revocations: RevocationList,
}

impl AuthService {
    pub fn new(
        users: Arc<dyn UserStore>,
        codec: Arc<TokenCodec>,
        hasher: Arc<PasswordHasher>,
        revocations: RevocationList,
    ) -> Self {
        Self {
            users,
            codec,
            hasher,
            revocations,
        }
    }

    /// 根据用户当前角色构建访问令牌载荷
    pub fn build_payload(user: &UserWithRole) -> ClaimsPayload {
        let (role_name, global_permissions, resource_access) = match &user.role {
            Some(role) => (
                role.role.name.clone(),
                role.global_permissions(),
                role.resource_access(),
            ),
            None => (DEFAULT_ROLE.to_string(), Default::default(), Default::default()),
        };

        ClaimsPayload {
            subject: user.user.id.to_string(),
            email: Some(user.user.email.clone()),
            role_name: Some(role_name),
            global_permissions: Some(global_permissions),
            resource_access,
        }
    }

    /// 用户登录
    ///
    /// 用户不存在、已停用或密码错误均返回同一错误
    pub async fn login(&self, email: &str, password: &str) -> Result<TokenPair, AppError> {
        let user = match self.users.find_by_email(email).await? {
            Some(user) => user,
            None => {
                // 保持与密码错误分支相同的耗时
                self.hasher.verify_dummy(password);
                tracing::warn!("Login failed: unknown account");
                return Err(AppError::InvalidCredentials);
            }
        };

        let password_ok = self.hasher.verify(password, &user.user.password_hash);
        if !password_ok || !user.user.is_active {
            tracing::warn!(
                user_id = %user.user.id,
                inactive = !user.user.is_active,
                "Login failed"
            );
            return Err(AppError::InvalidCredentials);
        }

        let pair = self.codec.issue_pair(&Self::build_payload(&user))?;

        tracing::info!(user_id = %user.user.id, role = ?user.role.as_ref().map(|r| &r.role.name), "User logged in");

        Ok(pair)
    }

    /// 登出：撤销当前访问令牌，可选同时撤销同一用户的刷新令牌
    pub async fn logout(&self, claims: &Claims, refresh_token: Option<&str>) -> Result<(), AppError> {
        self.revoke_claims(claims).await?;

        if let Some(token) = refresh_token {
            match self.codec.decode(token) {
                Ok(refresh)
                    if refresh.token_kind == TokenKind::Refresh
                        && refresh.subject == claims.subject =>
                {
                    self.revoke_claims(&refresh).await?;
                }
                Ok(_) => {
                    tracing::warn!(user_id = %claims.subject, "Ignoring foreign refresh token on logout");
                }
                Err(e) => {
                    tracing::debug!(user_id = %claims.subject, "Refresh token not revocable: {}", e);
                }
            }
        }

        tracing::info!(user_id = %claims.subject, "User logged out");
        Ok(())
    }

    /// 刷新令牌
    ///
    /// 旧刷新令牌先写入撤销列表，再签发新令牌对
    pub async fn refresh(&self, refresh_token: &str) -> Result<TokenPair, AppError> {
        let claims = self.codec.decode(refresh_token)?;

        if claims.token_kind != TokenKind::Refresh {
            tracing::warn!(user_id = %claims.subject, "Non-refresh token presented for refresh");
            return Err(AppError::WrongTokenKind);
        }

        if let Some(token_id) = claims.token_id.as_deref() {
            if self.revocations.is_revoked(token_id).await? {
                tracing::warn!(user_id = %claims.subject, jti = %token_id, "Revoked refresh token reused");
                return Err(AppError::Revoked);
            }
        }

        self.revoke_claims(&claims).await?;

        let user_id = Uuid::parse_str(&claims.subject).map_err(|_| AppError::UserNotFound)?;
        let user = self
            .users
            .find_by_id(user_id)
            .await?
            .ok_or(AppError::UserNotFound)?;

        if !user.user.is_active {
            tracing::warn!(user_id = %user_id, "Refresh rejected: account inactive");
            return Err(AppError::Inactive);
        }

        let pair = self.codec.issue_pair(&Self::build_payload(&user))?;

        tracing::info!(user_id = %user_id, "Token pair rotated");

        Ok(pair)
    }

    async fn revoke_claims(&self, claims: &Claims) -> Result<(), AppError> {
        match claims.token_id.as_deref() {
            Some(token_id) => {
                self.revocations
                    .revoke(token_id, claims.remaining_ttl_secs())
                    .await
            }
            None => Ok(()),
        }
    }
}
