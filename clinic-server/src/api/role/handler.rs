//! Role API Handlers

use axum::Json;
use axum::extract::{Path, Query, State};
use serde::Deserialize;

use crate::auth::CurrentUser;
use crate::core::ServerState;
use crate::db::repository::role;
use crate::utils::{ApiResponse, AppError, AppResult, ErrorCode, not_found_as, ok};
use shared::models::{Role, RoleCreate, RolePermissionsUpdate, RoleUpdate};

/// Query filter for role listing
#[derive(Debug, Deserialize)]
pub struct RoleQuery {
    /// If true, return all roles (including inactive)
    /// If false or not specified, return only active roles
    all: Option<bool>,
}

/// Query flags for role deletion
#[derive(Debug, Deserialize)]
pub struct DeleteQuery {
    /// 强制删除：同时移除用户分配
    #[serde(default)]
    force: bool,
}

fn role_not_found(id: i64) -> AppError {
    AppError::with_message(ErrorCode::RoleNotFound, format!("Role {} not found", id))
}

/// GET /api/roles - Get all roles
pub async fn list(
    State(state): State<ServerState>,
    Query(query): Query<RoleQuery>,
) -> ApiResponse<Vec<Role>> {
    let roles = if query.all.unwrap_or(false) {
        role::find_all_with_inactive(state.pool()).await
    } else {
        role::find_all(state.pool()).await
    };

    match roles {
        Ok(roles) => ok(roles),
        Err(e) => {
            tracing::warn!(error = %e, "Failed to list roles, returning empty list");
            ok(Vec::new())
        }
    }
}

/// GET /api/roles/{id} - Get role by ID
pub async fn get_by_id(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
) -> AppResult<ApiResponse<Role>> {
    let role = role::find_by_id(state.pool(), id)
        .await?
        .ok_or_else(|| role_not_found(id))?;

    Ok(ok(role))
}

/// POST /api/roles - Create a new role
pub async fn create(
    State(state): State<ServerState>,
    current_user: CurrentUser,
    Json(payload): Json<RoleCreate>,
) -> AppResult<ApiResponse<Role>> {
    tracing::info!(
        user_id = %current_user.id,
        username = %current_user.username,
        role_name = %payload.name,
        "Creating role"
    );

    let r = role::create(state.pool(), payload).await?;
    Ok(ok(r))
}

/// PUT /api/roles/{id} - Update a role
pub async fn update(
    State(state): State<ServerState>,
    current_user: CurrentUser,
    Path(id): Path<i64>,
    Json(payload): Json<RoleUpdate>,
) -> AppResult<ApiResponse<Role>> {
    tracing::info!(
        user_id = %current_user.id,
        username = %current_user.username,
        role_id = %id,
        "Updating role"
    );

    let r = role::update(state.pool(), id, payload)
        .await
        .map_err(not_found_as(ErrorCode::RoleNotFound))?;
    Ok(ok(r))
}

/// PUT /api/roles/{id}/permissions - Replace the role's permission set
pub async fn set_permissions(
    State(state): State<ServerState>,
    current_user: CurrentUser,
    Path(id): Path<i64>,
    Json(payload): Json<RolePermissionsUpdate>,
) -> AppResult<ApiResponse<Role>> {
    tracing::info!(
        user_id = %current_user.id,
        role_id = %id,
        count = payload.permission_ids.len(),
        "Replacing role permissions"
    );

    let r = role::set_permissions(state.pool(), id, &payload.permission_ids)
        .await
        .map_err(not_found_as(ErrorCode::RoleNotFound))?;
    Ok(ok(r))
}

/// DELETE /api/roles/{id} - Delete a role
pub async fn delete(
    State(state): State<ServerState>,
    current_user: CurrentUser,
    Path(id): Path<i64>,
    Query(query): Query<DeleteQuery>,
) -> AppResult<ApiResponse<bool>> {
    tracing::info!(
        user_id = %current_user.id,
        username = %current_user.username,
        role_id = %id,
        force = query.force,
        "Deleting role"
    );

    let result = role::delete(state.pool(), id, query.force)
        .await
        .map_err(not_found_as(ErrorCode::RoleNotFound))?;
    Ok(ok(result))
}
