//! 认证与授权中间件
//!
//! - [`require_auth`] - 验证 JWT，注入 [`CurrentUser`]
//! - [`require_route_permission`] - 按匹配到的路由模式调用权限检查器
//! - [`require_admin`] - 按数据库中的旧版角色 (`admin` / `super_admin`) 放行

use axum::{
    extract::{MatchedPath, Request, State},
    middleware::Next,
    response::Response,
};
use shared::models::HttpMethod;

use crate::AppError;
use crate::auth::{CurrentUser, JwtError, JwtService};
use crate::core::ServerState;
use crate::security_log;

/// 认证中间件 - 要求用户登录
///
/// 从 `Authorization: Bearer <token>` 头提取并验证 JWT。
/// 验证成功后将 [`CurrentUser`] 注入请求扩展。
///
/// # 跳过认证的路径
///
/// - `OPTIONS *` (CORS 预检)
/// - 非 `/api/` 路径 (`/health` 等)
///
/// # 错误处理
///
/// | 错误 | HTTP 状态码 |
/// |------|------------|
/// | 无 Authorization 头 | 401 NotAuthenticated |
/// | 令牌过期 | 401 TokenExpired |
/// | 无效令牌 | 401 TokenInvalid |
pub async fn require_auth(
    State(state): State<ServerState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    if req.method() == http::Method::OPTIONS || !req.uri().path().starts_with("/api/") {
        return Ok(next.run(req).await);
    }

    let auth_header = req
        .headers()
        .get(http::header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok());

    let token = match auth_header {
        Some(header) => JwtService::extract_from_header(header)
            .ok_or_else(|| AppError::invalid_token("Invalid authorization header"))?,
        None => {
            security_log!("WARN", "auth_missing", uri = format!("{:?}", req.uri()));
            return Err(AppError::unauthorized());
        }
    };

    let user = state
        .get_jwt_service()
        .validate_token(token)
        .and_then(CurrentUser::try_from);

    match user {
        Ok(user) => {
            req.extensions_mut().insert(user);
            Ok(next.run(req).await)
        }
        Err(e) => {
            security_log!(
                "WARN",
                "auth_failed",
                error = format!("{}", e),
                uri = format!("{:?}", req.uri())
            );

            match e {
                JwtError::ExpiredToken => Err(AppError::token_expired()),
                _ => Err(AppError::invalid_token("Invalid token")),
            }
        }
    }
}

/// 路由权限中间件
///
/// 取匹配到的路由模式 (`/api/roles/{id}`)，规范化后与请求方法组成
/// `{route}:{method}` 交给 [`crate::rbac::PermissionChecker`]。
/// 必须用 `route_layer` 挂载，否则拿不到 [`MatchedPath`]。
///
/// # 错误
///
/// 拒绝时返回 403，`message` 为拒绝原因，`details.required_permission`
/// 为所需权限。
pub async fn require_route_permission(
    State(state): State<ServerState>,
    req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let user = req.current_user()?.clone();

    let pattern = req
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_string())
        .unwrap_or_else(|| req.uri().path().to_string());

    // HEAD 视同 GET
    let method = if req.method() == http::Method::HEAD {
        HttpMethod::Get
    } else {
        HttpMethod::try_from(req.method()).map_err(AppError::invalid_request)?
    };

    let result = state
        .checker
        .check_user_permission(&user.id, &pattern, method)
        .await;

    if !result.allowed {
        let reason = result.reason.clone().unwrap_or_default();
        security_log!(
            "WARN",
            "permission_denied",
            user_id = user.id.clone(),
            username = user.username.clone(),
            required_permission = result.required_permission.clone(),
            reason = reason.clone()
        );
        return Err(AppError::forbidden(reason)
            .with_detail("required_permission", result.required_permission));
    }

    Ok(next.run(req).await)
}

/// 管理员中间件 - 要求旧版角色 `admin` 或 `super_admin`
///
/// 角色取自数据库中的用户记录，不信任令牌里的 `role`。
/// 用户不存在或查询失败一律拒绝。
///
/// # 错误
///
/// 非管理员返回 403 AdminRequired
pub async fn require_admin(
    State(state): State<ServerState>,
    req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let user = req.current_user()?.clone();
    let stored = state.checker.legacy_role(&user.id).await;

    if !stored.is_some_and(|role| role.is_admin()) {
        security_log!(
            "WARN",
            "admin_required",
            user_id = user.id.clone(),
            username = user.username.clone(),
            token_role = user.role.as_str(),
            stored_role = stored.map(|r| r.as_str()).unwrap_or("unknown")
        );
        return Err(AppError::new(shared::ErrorCode::AdminRequired));
    }

    Ok(next.run(req).await)
}

/// 从请求中提取 CurrentUser 的扩展方法
pub trait CurrentUserExt {
    /// 从请求扩展中获取 CurrentUser
    ///
    /// # 错误
    ///
    /// 未认证返回 401 NotAuthenticated
    fn current_user(&self) -> Result<&CurrentUser, AppError>;
}

impl CurrentUserExt for Request {
    fn current_user(&self) -> Result<&CurrentUser, AppError> {
        self.extensions()
            .get::<CurrentUser>()
            .ok_or(AppError::unauthorized())
    }
}
