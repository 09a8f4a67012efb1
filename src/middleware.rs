//! 应用状态与请求追踪中间件

use crate::{
    auth::{jwt::TokenCodec, middleware::Authenticator, password::PasswordHasher},
    config::AppConfig,
    denylist::{DenylistStore, RevocationList},
    error::AppError,
    repository::{RoleStore, UserStore},
    services::{AuthService, OrderService, RbacService, UserService},
};
use axum::{
    extract::Request,
    http::{HeaderMap, HeaderValue},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;
use std::time::Instant;
use tracing::Instrument;
use uuid::Uuid;

/// 应用状态
///
/// 所有服务以 Arc 共享，Clone 只拷贝指针
#[derive(Clone)]
pub struct AppState {
    pub db: sqlx::PgPool,
    pub denylist: Arc<dyn DenylistStore>,
    pub authenticator: Arc<Authenticator>,
    pub auth_service: Arc<AuthService>,
    pub user_service: Arc<UserService>,
    pub rbac_service: Arc<RbacService>,
    pub order_service: Arc<OrderService>,
}

impl AppState {
    /// 组装服务；存储实现由调用方注入
    pub fn build(
        config: AppConfig,
        db: sqlx::PgPool,
        users: Arc<dyn UserStore>,
        roles: Arc<dyn RoleStore>,
        denylist: Arc<dyn DenylistStore>,
    ) -> Result<Self, AppError> {
        let codec = Arc::new(TokenCodec::from_config(&config.security)?);
        let hasher = Arc::new(PasswordHasher::from_config(&config.security)?);
        let revocations = RevocationList::new(denylist.clone());

        let authenticator = Arc::new(Authenticator::new(codec.clone(), revocations.clone()));
        let auth_service = Arc::new(AuthService::new(
            users.clone(),
            codec,
            hasher.clone(),
            revocations,
        ));
        let user_service = Arc::new(UserService::new(
            users,
            roles.clone(),
            hasher,
            config.security,
        ));
        let rbac_service = Arc::new(RbacService::new(roles));

        Ok(Self {
            db,
            denylist,
            authenticator,
            auth_service,
            user_service,
            rbac_service,
            order_service: Arc::new(OrderService::with_demo_data()),
        })
    }
}

/// 请求追踪中间件
/// 为每个请求生成 trace_id 和 request_id，并记录指标
pub async fn request_tracking_middleware(req: Request, next: Next) -> Response {
    let trace_id = extract_or_generate_trace_id(req.headers());
    let request_id = Uuid::new_v4().to_string();

    let method = req.method().clone();
    let path = req.uri().path().to_string();

    let span = tracing::info_span!(
        "http_request",
        trace_id = %trace_id,
        request_id = %request_id,
        method = %method,
        path = %path,
    );

    async move {
        let start = Instant::now();

        let mut response = next.run(req).await;

        let elapsed = start.elapsed();
        let status = response.status().as_u16();

        // 指标标签只使用有限取值
        let method_name = match method.as_str() {
            "GET" => "GET",
            "POST" => "POST",
            "PUT" => "PUT",
            "DELETE" => "DELETE",
            "PATCH" => "PATCH",
            _ => "OTHER",
        };
        let status_class = match status {
            200..=299 => "2xx",
            300..=399 => "3xx",
            401 => "401",
            403 => "403",
            400..=499 => "4xx",
            503 => "503",
            _ => "5xx",
        };

        metrics::counter!("http_requests_total", "method" => method_name, "status" => status_class)
            .increment(1);
        metrics::histogram!("http_request_duration_seconds").record(elapsed.as_secs_f64());

        tracing::info!(
            status = status,
            elapsed_ms = elapsed.as_millis() as u64,
            "Request completed"
        );

        if let Ok(value) = HeaderValue::from_str(&trace_id) {
            response.headers_mut().insert("x-trace-id", value);
        }
        if let Ok(value) = HeaderValue::from_str(&request_id) {
            response.headers_mut().insert("x-request-id", value);
        }

        response
    }
    .instrument(span)
    .await
}

/// 从请求头中提取或生成 trace_id
fn extract_or_generate_trace_id(headers: &HeaderMap) -> String {
    headers
        .get("x-trace-id")
        .and_then(|v| v.to_str().ok())
        .filter(|s| !s.is_empty() && s.len() <= 128)
        .map(|s| s.to_string())
        .unwrap_or_else(|| Uuid::new_v4().to_string())
}
