//! 演示业务资源 orders 的 HTTP 处理器

use crate::{
    auth::jwt::Claims, error::AppError, middleware::AppState, models::order::CreateOrderRequest,
};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde_json::json;
use std::sync::Arc;

/// 订单列表
pub async fn list_orders(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(state.order_service.list())
}

/// 创建订单
pub async fn create_order(
    State(state): State<Arc<AppState>>,
    claims: Claims,
    Json(req): Json<CreateOrderRequest>,
) -> Result<impl IntoResponse, AppError> {
    let order = state.order_service.create(req, &claims.subject)?;

    Ok((
        StatusCode::CREATED,
        Json(json!({"message": "Order created", "order": order})),
    ))
}

/// 删除订单
pub async fn delete_order(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let order = state.order_service.delete(id)?;

    Ok(Json(json!({"message": format!("Order {} deleted", order.id)})))
}
