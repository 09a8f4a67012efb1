//! JWT 认证中间件

use crate::{
    auth::{
        jwt::{Claims, TokenCodec, TokenKind},
        permission::AccessGuard,
    },
    denylist::RevocationList,
    error::AppError,
};
use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header, HeaderMap},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;

/// 请求认证：解码令牌并检查撤销列表
pub struct Authenticator {
    codec: Arc<TokenCodec>,
    revocations: RevocationList,
}

impl Authenticator {
    pub fn new(codec: Arc<TokenCodec>, revocations: RevocationList) -> Self {
        Self { codec, revocations }
    }

    /// 验证 bearer 令牌，返回声明
    ///
    /// 不区分令牌类型；撤销列表不可用时拒绝请求
    pub async fn authenticate(&self, token: &str) -> Result<Claims, AppError> {
        let claims = self.codec.decode(token)?;

        if let Some(token_id) = claims.token_id.as_deref() {
            if self.revocations.is_revoked(token_id).await? {
                tracing::warn!(user_id = %claims.subject, jti = %token_id, "Revoked token presented");
                return Err(AppError::Revoked);
            }
        }

        Ok(claims)
    }
}

// 实现 FromRequestParts 以便在 handler 中直接提取 Claims
impl<S> FromRequestParts<S> for Claims
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut axum::http::request::Parts,
        _state: &S,
    ) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Claims>()
            .cloned()
            .ok_or(AppError::Unauthorized)
    }
}

/// 从 Authorization 头提取令牌
pub fn extract_token(headers: &HeaderMap) -> Result<String, AppError> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(str::to_string)
        .ok_or(AppError::Unauthorized)
}

/// JWT 认证中间件 - 必须认证，且只接受访问令牌
pub async fn jwt_auth_middleware(
    State(authenticator): State<Arc<Authenticator>>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    // 从 Authorization 头提取令牌
    let token = extract_token(req.headers())?;

    // 验证令牌并检查撤销状态
    let claims = authenticator.authenticate(&token).await?;

    // 刷新令牌只能用于 /auth/refresh
    if claims.token_kind != TokenKind::Access {
        tracing::warn!(user_id = %claims.subject, "Refresh token presented as bearer credential");
        return Err(AppError::WrongTokenKind);
    }

    tracing::debug!(user_id = %claims.subject, role = %claims.role_name, "Request authenticated");

    // 附加到请求扩展
    req.extensions_mut().insert(claims);

    Ok(next.run(req).await)
}

/// 资源权限中间件，须位于 jwt_auth_middleware 之后
pub async fn require_access(
    State(guard): State<AccessGuard>,
    req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let claims = req
        .extensions()
        .get::<Claims>()
        .ok_or(AppError::Unauthorized)?;

    guard.check(claims)?;

    Ok(next.run(req).await)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_token_valid() {
        let mut headers = HeaderMap::new();
        headers.insert("authorization", "Bearer test_token_123".parse().unwrap());

        let token = extract_token(&headers).unwrap();
        assert_eq!(token, "test_token_123");
    }

    #[test]
    fn test_extract_token_missing() {
        let headers = HeaderMap::new();
        assert!(matches!(extract_token(&headers), Err(AppError::Unauthorized)));
    }

    #[test]
    fn test_extract_token_invalid_format() {
        let mut headers = HeaderMap::new();
        headers.insert("authorization", "InvalidFormat".parse().unwrap());
        assert!(extract_token(&headers).is_err());

        let mut headers = HeaderMap::new();
        headers.insert("authorization", "Basic dXNlcjpwYXNz".parse().unwrap());
        assert!(extract_token(&headers).is_err());

        let mut headers = HeaderMap::new();
        headers.insert("authorization", "Bearer ".parse().unwrap());
        assert!(extract_token(&headers).is_err());
    }
}
