//! Permission reconciliation
//!
//! Brings the permission registry in line with a set of discovered routes.
//! One upsert per `(route, method)`; existing rows keep their name,
//! description and active flag.

use super::normalize::normalize_route;
use super::scanner::{permission_description, permission_name};
use crate::db::repository::RepoResult;
use crate::db::repository::permission::{self, NewPermission, UpsertOutcome};
use shared::models::{HttpMethod, ReconcileReport, RouteInfo, RouteSourceKind};
use sqlx::SqlitePool;
use std::collections::HashSet;

/// Upsert a permission for every route and method
///
/// Every row written is tagged with `source`. With `deactivate_stale`, active
/// permissions of the same source that no route produced in this run are
/// switched off. Nothing is ever deleted.
pub async fn reconcile(
    pool: &SqlitePool,
    routes: &[RouteInfo],
    source: RouteSourceKind,
    deactivate_stale: bool,
) -> RepoResult<ReconcileReport> {
    let mut report = ReconcileReport {
        routes: routes.len(),
        ..Default::default()
    };
    let mut seen: HashSet<(String, HttpMethod)> = HashSet::new();

    for route in routes {
        let path = normalize_route(&route.path);
        for &method in &route.methods {
            if !seen.insert((path.clone(), method)) {
                continue;
            }
            let data = NewPermission {
                name: permission_name(&path, &[method]),
                description: permission_description(&path, &[method]),
                route: path.clone(),
                method,
                category: route.category,
                source,
            };
            match permission::upsert(pool, &data).await? {
                UpsertOutcome::Created => report.created += 1,
                UpsertOutcome::Updated => report.updated += 1,
            }
        }
    }

    if deactivate_stale {
        report.deactivated = permission::deactivate_missing(pool, source, &seen).await?;
    }

    tracing::info!(
        source = ?source,
        routes = report.routes,
        created = report.created,
        updated = report.updated,
        deactivated = report.deactivated,
        "Permission registry reconciled"
    );
    Ok(report)
}
