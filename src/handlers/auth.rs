//! 认证相关的 HTTP 处理器

use crate::{
    auth::jwt::Claims,
    error::AppError,
    middleware::AppState,
    models::{auth::*, user::RegisterRequest, user::UserResponse},
};
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde_json::json;
use std::sync::Arc;

/// 注册
pub async fn register(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RegisterRequest>,
) -> Result<impl IntoResponse, AppError> {
    let user = state.user_service.register(req).await?;

    Ok((StatusCode::CREATED, Json(UserResponse::from(user))))
}

/// 登录，签发访问令牌与刷新令牌
pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(req): Json<LoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    let pair = state.auth_service.login(&req.email, &req.password).await?;

    Ok(Json(pair))
}

/// 登出
pub async fn logout(
    State(state): State<Arc<AppState>>,
    claims: Claims,
    body: Option<Json<LogoutRequest>>,
) -> Result<impl IntoResponse, AppError> {
    let req = body.map(|Json(req)| req).unwrap_or_default();

    state
        .auth_service
        .logout(&claims, req.refresh_token.as_deref())
        .await?;

    Ok(Json(json!({"message": "Successfully logged out"})))
}

/// 刷新令牌（轮换）
pub async fn refresh_token(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RefreshRequest>,
) -> Result<impl IntoResponse, AppError> {
    let pair = state.auth_service.refresh(&req.refresh_token).await?;

    Ok(Json(pair))
}
