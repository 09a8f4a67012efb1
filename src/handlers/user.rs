//! 用户管理的 HTTP 处理器

use crate::{
    auth::jwt::Claims,
    error::AppError,
    middleware::AppState,
    models::user::*,
};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use uuid::Uuid;

/// 分页参数
#[derive(Debug, Deserialize)]
pub struct Pagination {
    #[serde(default)]
    pub skip: i64,
    #[serde(default = "default_limit")]
    pub limit: i64,
}

fn default_limit() -> i64 {
    100
}

// ==================== 当前用户 ====================

/// 获取当前用户资料
pub async fn get_me(
    State(state): State<Arc<AppState>>,
    claims: Claims,
) -> Result<impl IntoResponse, AppError> {
    let user = state.user_service.current(&claims.subject).await?;

    Ok(Json(UserResponse::from(user)))
}

/// 更新当前用户资料（不允许修改 is_active）
pub async fn update_me(
    State(state): State<Arc<AppState>>,
    claims: Claims,
    Json(req): Json<UpdateUserRequest>,
) -> Result<impl IntoResponse, AppError> {
    let current = state.user_service.current(&claims.subject).await?;
    let user = state
        .user_service
        .update(current.user.id, req, false)
        .await?;

    Ok(Json(UserResponse::from(user)))
}

/// 注销当前账户（软删除）
pub async fn delete_me(
    State(state): State<Arc<AppState>>,
    claims: Claims,
) -> Result<impl IntoResponse, AppError> {
    let current = state.user_service.current(&claims.subject).await?;
    state.user_service.soft_delete(current.user.id).await?;

    Ok(StatusCode::NO_CONTENT)
}

// ==================== 管理端 ====================

/// 列出用户
pub async fn list_users(
    State(state): State<Arc<AppState>>,
    Query(page): Query<Pagination>,
) -> Result<impl IntoResponse, AppError> {
    let users = state.user_service.list(page.skip, page.limit).await?;

    let items: Vec<UserResponse> = users.into_iter().map(UserResponse::from).collect();

    Ok(Json(json!({
        "users": items,
        "count": items.len()
    })))
}

/// 获取用户
pub async fn get_user(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let user = state.user_service.get(id).await?;

    Ok(Json(UserResponse::from(user)))
}

/// 更新用户
pub async fn update_user(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateUserRequest>,
) -> Result<impl IntoResponse, AppError> {
    let user = state.user_service.update(id, req, true).await?;

    Ok(Json(UserResponse::from(user)))
}

/// 软删除用户
pub async fn delete_user(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    state.user_service.soft_delete(id).await?;

    Ok(StatusCode::NO_CONTENT)
}

/// 分配角色
pub async fn assign_role(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(req): Json<AssignRoleRequest>,
) -> Result<impl IntoResponse, AppError> {
    let user = state.user_service.assign_role(id, &req.role_name).await?;

    Ok(Json(UserResponse::from(user)))
}
