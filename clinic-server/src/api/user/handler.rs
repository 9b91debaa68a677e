//! User API Handlers

use axum::Json;
use axum::extract::{Path, State};

use crate::auth::CurrentUser;
use crate::core::ServerState;
use crate::db::repository::user;
use crate::utils::{ApiResponse, AppError, AppResult, ErrorCode, not_found_as, ok};
use shared::models::{LegacyRoleUpdate, User, UserCreate, UserRolesUpdate};

/// POST /api/users
pub async fn create(
    State(state): State<ServerState>,
    current_user: CurrentUser,
    Json(payload): Json<UserCreate>,
) -> AppResult<ApiResponse<User>> {
    tracing::info!(
        user_id = %current_user.id,
        new_username = %payload.username,
        legacy_role = %payload.role,
        "Creating user"
    );

    let u = user::create(state.pool(), payload).await?;
    Ok(ok(u))
}

/// GET /api/users/{id}
pub async fn get_by_id(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
) -> AppResult<ApiResponse<User>> {
    let u = user::find_by_id(state.pool(), id).await?.ok_or_else(|| {
        AppError::with_message(ErrorCode::UserNotFound, format!("User {} not found", id))
    })?;
    Ok(ok(u))
}

/// PUT /api/users/{id}/roles - 整体替换
pub async fn set_roles(
    State(state): State<ServerState>,
    current_user: CurrentUser,
    Path(id): Path<i64>,
    Json(payload): Json<UserRolesUpdate>,
) -> AppResult<ApiResponse<User>> {
    tracing::info!(
        user_id = %current_user.id,
        target_user_id = %id,
        role_ids = ?payload.role_ids,
        "Replacing user roles"
    );

    let u = user::set_roles(state.pool(), id, &payload.role_ids)
        .await
        .map_err(not_found_as(ErrorCode::UserNotFound))?;
    Ok(ok(u))
}

/// PUT /api/users/{id}/legacy-role
///
/// 授予 `super_admin` 会绕过全部权限检查，单独记一条安全日志。
pub async fn set_legacy_role(
    State(state): State<ServerState>,
    current_user: CurrentUser,
    Path(id): Path<i64>,
    Json(payload): Json<LegacyRoleUpdate>,
) -> AppResult<ApiResponse<User>> {
    let u = user::set_legacy_role(state.pool(), id, payload.role)
        .await
        .map_err(not_found_as(ErrorCode::UserNotFound))?;

    if payload.role.is_super_admin() {
        crate::security_log!(
            "WARN",
            "super_admin_granted",
            user_id = current_user.id.clone(),
            target_user_id = id
        );
    }
    tracing::info!(
        user_id = %current_user.id,
        target_user_id = %id,
        legacy_role = %payload.role,
        "Legacy role changed"
    );
    Ok(ok(u))
}
