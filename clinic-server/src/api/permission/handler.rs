//! Permission Registry API Handlers

use std::collections::BTreeMap;

use axum::Json;
use axum::extract::{Path, Query, State};
use serde::Deserialize;
use shared::models::{
    Permission, PermissionActiveUpdate, PermissionCategory, PermissionQuery, ReconcileReport,
    ReconcileRequest, RouteInfo, RouteSourceKind,
};

use crate::auth::CurrentUser;
use crate::core::ServerState;
use crate::db::repository::permission;
use crate::rbac::{group_by_category, reconcile};
use crate::routes::ROUTE_MANIFEST;
use crate::utils::{ApiResponse, AppError, AppResult, ErrorCode, ok, ok_with_message};

/// Load routes from the requested source
///
/// The file-system walk runs on the blocking pool.
async fn collect_routes(state: &ServerState, source: RouteSourceKind) -> AppResult<Vec<RouteInfo>> {
    match source {
        RouteSourceKind::Manifest => Ok(ROUTE_MANIFEST.routes()),
        RouteSourceKind::Filesystem => {
            let scanner = state.scanner.clone();
            if !scanner.root().is_dir() {
                return Err(AppError::with_message(
                    ErrorCode::RouteScanFailed,
                    format!("Route root {} is not a directory", scanner.root().display()),
                ));
            }
            tokio::task::spawn_blocking(move || scanner.scan())
                .await
                .map_err(|e| AppError::with_message(ErrorCode::RouteScanFailed, e.to_string()))
        }
    }
}

/// GET /api/permissions - 列表，失败时返回空列表
pub async fn list(
    State(state): State<ServerState>,
    Query(query): Query<PermissionQuery>,
) -> ApiResponse<Vec<Permission>> {
    let permissions = match permission::find_all(state.pool(), &query).await {
        Ok(permissions) => permissions,
        Err(e) => {
            tracing::warn!(error = %e, "Failed to list permissions, returning empty list");
            Vec::new()
        }
    };
    ok(permissions)
}

/// GET /api/permissions/{id}
pub async fn get_by_id(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
) -> AppResult<ApiResponse<Permission>> {
    let permission = permission::find_by_id(state.pool(), id)
        .await?
        .ok_or_else(|| {
            AppError::with_message(ErrorCode::PermissionNotFound, format!("Permission {id} not found"))
        })?;
    Ok(ok(permission))
}

/// PUT /api/permissions/{id}/active
pub async fn set_active(
    State(state): State<ServerState>,
    current_user: CurrentUser,
    Path(id): Path<i64>,
    Json(payload): Json<PermissionActiveUpdate>,
) -> AppResult<ApiResponse<Permission>> {
    let permission = permission::set_active(state.pool(), id, payload.is_active).await?;

    tracing::info!(
        user_id = %current_user.id,
        permission = %permission.token(),
        is_active = payload.is_active,
        "Permission active flag changed"
    );
    Ok(ok(permission))
}

/// POST /api/permissions/scan - 对账
pub async fn scan(
    State(state): State<ServerState>,
    current_user: CurrentUser,
    Json(request): Json<ReconcileRequest>,
) -> AppResult<ApiResponse<ReconcileReport>> {
    let routes = collect_routes(&state, request.source).await?;
    let report = reconcile(
        state.pool(),
        &routes,
        request.source,
        request.deactivate_stale,
    )
    .await?;

    tracing::info!(
        user_id = %current_user.id,
        source = ?request.source,
        created = report.created,
        updated = report.updated,
        deactivated = report.deactivated,
        "Permission scan completed"
    );
    Ok(ok_with_message(
        report,
        format!(
            "{} routes: {} created, {} updated, {} deactivated",
            report.routes, report.created, report.updated, report.deactivated
        ),
    ))
}

#[derive(Debug, Deserialize)]
pub struct RoutesQuery {
    #[serde(default)]
    source: RouteSourceKind,
}

/// GET /api/permissions/routes - 扫描结果按分类分组 (不写库)
pub async fn routes(
    State(state): State<ServerState>,
    Query(query): Query<RoutesQuery>,
) -> AppResult<ApiResponse<BTreeMap<PermissionCategory, Vec<RouteInfo>>>> {
    let routes = collect_routes(&state, query.source).await?;
    Ok(ok(group_by_category(&routes)))
}
