//! 路由注册
//! 创建所有 API 路由并应用中间件

use axum::{
    middleware::from_fn_with_state,
    routing::{delete, get, post, put, MethodRouter},
    Router,
};
use std::sync::Arc;
use tower_http::{limit::RequestBodyLimitLayer, trace::TraceLayer};

use crate::{
    auth::{
        middleware::{jwt_auth_middleware, require_access},
        permission::{AccessGuard, Action},
    },
    handlers,
    middleware::AppState,
};

/// 请求体上限
const MAX_BODY_BYTES: usize = 64 * 1024;

/// 为单个方法路由绑定 (resource, action) 权限检查
fn guarded(
    route: MethodRouter<Arc<AppState>>,
    resource: &'static str,
    action: Action,
) -> MethodRouter<Arc<AppState>> {
    route.route_layer(from_fn_with_state(
        AccessGuard::new(resource, action),
        require_access,
    ))
}

/// 创建应用路由
pub fn create_router(state: Arc<AppState>) -> Router {
    // 公开端点（健康检查）
    let public_routes = Router::new()
        .route("/health", get(handlers::health::health_check))
        .route("/ready", get(handlers::health::readiness_check));

    // 认证路由（无需令牌）
    let auth_routes = Router::new()
        .route("/auth/register", post(handlers::auth::register))
        .route("/auth/token", post(handlers::auth::login))
        .route("/auth/refresh", post(handlers::auth::refresh_token));

    // 需要认证的路由
    let authenticated_routes = Router::new()
        .route("/auth/logout", post(handlers::auth::logout))
        // 当前用户
        .route(
            "/user/me",
            get(handlers::user::get_me)
                .put(handlers::user::update_me)
                .delete(handlers::user::delete_me),
        )
        // 用户管理
        .route(
            "/user",
            guarded(get(handlers::user::list_users), "users", Action::Read),
        )
        .route(
            "/user/{id}",
            guarded(get(handlers::user::get_user), "users", Action::Read)
                .merge(guarded(put(handlers::user::update_user), "users", Action::Write))
                .merge(guarded(delete(handlers::user::delete_user), "users", Action::Delete)),
        )
        .route(
            "/user/{id}/role",
            guarded(put(handlers::user::assign_role), "users", Action::Write),
        )
        // 角色管理
        .route(
            "/admin/roles",
            guarded(get(handlers::role::list_roles), "roles", Action::Read)
                .merge(guarded(post(handlers::role::create_role), "roles", Action::Write)),
        )
        .route(
            "/admin/roles/{name}",
            guarded(get(handlers::role::get_role), "roles", Action::Read)
                .merge(guarded(delete(handlers::role::delete_role), "roles", Action::Delete)),
        )
        .route(
            "/admin/roles/{name}/permissions",
            guarded(post(handlers::role::set_permission), "roles", Action::Write),
        )
        // 演示业务资源
        .route(
            "/business/orders",
            guarded(get(handlers::business::list_orders), "orders", Action::Read)
                .merge(guarded(post(handlers::business::create_order), "orders", Action::Write)),
        )
        .route(
            "/business/orders/{id}",
            guarded(delete(handlers::business::delete_order), "orders", Action::Delete),
        )
        .route_layer(from_fn_with_state(
            state.authenticator.clone(),
            jwt_auth_middleware,
        ));

    // 组合所有路由
    Router::new()
        .merge(public_routes)
        .merge(auth_routes)
        .merge(authenticated_routes)
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
        .layer(TraceLayer::new_for_http())
        .layer(axum::middleware::from_fn(crate::middleware::request_tracking_middleware))
        .with_state(state)
}
