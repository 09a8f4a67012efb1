//! 角色管理的 HTTP 处理器

use crate::{error::AppError, middleware::AppState, models::role::*};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use std::sync::Arc;

/// 列出所有角色及其访问规则
pub async fn list_roles(State(state): State<Arc<AppState>>) -> Result<impl IntoResponse, AppError> {
    let roles = state.rbac_service.list_roles().await?;

    Ok(Json(roles))
}

/// 创建角色
pub async fn create_role(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateRoleRequest>,
) -> Result<impl IntoResponse, AppError> {
    let role = state.rbac_service.create_role(req).await?;

    Ok((StatusCode::CREATED, Json(role)))
}

/// 角色详情
pub async fn get_role(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let role = state.rbac_service.get_role(&name).await?;

    Ok(Json(role))
}

/// 设置角色对资源的访问权限
pub async fn set_permission(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
    Json(req): Json<SetPermissionRequest>,
) -> Result<impl IntoResponse, AppError> {
    let role = state.rbac_service.set_access(&name, req).await?;

    Ok(Json(role))
}

/// 删除角色
pub async fn delete_role(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    state.rbac_service.delete_role(&name).await?;

    Ok(StatusCode::NO_CONTENT)
}
