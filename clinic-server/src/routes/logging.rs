//! 请求日志中间件
//!
//! 每个请求结束时记一条日志。路径用匹配到的路由模式，和权限 token 里的
//! 路由一致，便于对照拒绝记录。

use axum::{
    extract::{MatchedPath, Request},
    middleware::Next,
    response::Response,
};
use http::StatusCode;
use std::time::Instant;

use crate::auth::CurrentUser;

/// 请求日志中间件
///
/// | 状态码 | 级别 |
/// |--------|------|
/// | 5xx | error |
/// | 401 / 403 | warn |
/// | 其他 | info |
pub async fn logging_middleware(req: Request, next: Next) -> Response {
    let start = Instant::now();

    let request_id = req
        .headers()
        .get("x-request-id")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("-")
        .to_string();
    let method = req.method().clone();
    let route = req
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_string())
        .unwrap_or_else(|| req.uri().path().to_string());
    let (user_id, legacy_role) = req
        .extensions()
        .get::<CurrentUser>()
        .map(|u| (u.id.clone(), u.role.as_str()))
        .unwrap_or_else(|| ("-".to_string(), "-"));

    let response = next.run(req).await;

    let latency_ms = start.elapsed().as_millis() as u64;
    let status = response.status();

    if status.is_server_error() {
        tracing::error!(
            request_id = %request_id,
            method = %method,
            route = %route,
            user_id = %user_id,
            legacy_role,
            status = status.as_u16(),
            latency_ms,
            "Request failed"
        );
    } else if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        tracing::warn!(
            request_id = %request_id,
            method = %method,
            route = %route,
            user_id = %user_id,
            legacy_role,
            status = status.as_u16(),
            latency_ms,
            "Request rejected"
        );
    } else {
        tracing::info!(
            request_id = %request_id,
            method = %method,
            route = %route,
            user_id = %user_id,
            legacy_role,
            status = status.as_u16(),
            latency_ms,
            "Request completed"
        );
    }

    response
}
