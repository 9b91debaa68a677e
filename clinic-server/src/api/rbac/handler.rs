use axum::extract::State;
use shared::models::SeedReport;

use crate::auth::CurrentUser;
use crate::core::ServerState;
use crate::rbac::seed_defaults;
use crate::routes::ROUTE_MANIFEST;
use crate::utils::{ApiResponse, AppResult, ok};

/// POST /api/rbac/seed - 幂等，已有角色原样保留
pub async fn seed(
    State(state): State<ServerState>,
    current_user: CurrentUser,
) -> AppResult<ApiResponse<SeedReport>> {
    let report = seed_defaults(state.pool(), &ROUTE_MANIFEST.routes()).await?;

    tracing::info!(
        user_id = %current_user.id,
        roles_created = report.roles_created.len(),
        "Default roles seeded"
    );
    Ok(ok(report))
}
