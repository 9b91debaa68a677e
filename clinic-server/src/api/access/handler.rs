use axum::Json;
use axum::extract::State;
use shared::models::{AccessProfile, PermissionCheckRequest, PermissionCheckResult};

use crate::auth::CurrentUser;
use crate::core::ServerState;
use crate::utils::{ApiResponse, AppError, AppResult, ErrorCode, ok};

/// GET /api/access/me
pub async fn me(
    State(state): State<ServerState>,
    current_user: CurrentUser,
) -> AppResult<ApiResponse<AccessProfile>> {
    let profile = state
        .checker
        .access_profile(&current_user.id)
        .await
        .ok_or_else(|| AppError::new(ErrorCode::UserNotFound))?;
    Ok(ok(profile))
}

/// POST /api/access/check - 拒绝也返回 200，结果在 body 里
pub async fn check(
    State(state): State<ServerState>,
    Json(request): Json<PermissionCheckRequest>,
) -> ApiResponse<PermissionCheckResult> {
    let result = state
        .checker
        .check_user_permission(&request.user_id, &request.route, request.method)
        .await;
    ok(result)
}
