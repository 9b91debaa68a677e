//! Default RBAC seeding
//!
//! | Role | Grants |
//! |------|--------|
//! | `Administrator` | every registered permission |
//! | `ClinicalStaff` | dashboard, patients, appointments, prescriptions, ehr, profile |
//! | `FrontDesk` | dashboard, patients (read), appointments, billing, profile |
//! | `Client` | dashboard (read), profile |
//!
//! Roles that already exist are left untouched.

use super::reconcile::reconcile;
use crate::db::repository::permission;
use crate::db::repository::{RepoResult, role};
use shared::models::{PermissionCategory, RoleCreate, RouteInfo, RouteSourceKind, SeedReport};
use sqlx::SqlitePool;

use PermissionCategory::*;

enum Grant {
    Everything,
    Categories {
        full: &'static [PermissionCategory],
        read_only: &'static [PermissionCategory],
    },
}

struct SystemRole {
    name: &'static str,
    description: &'static str,
    grant: Grant,
}

const SYSTEM_ROLES: &[SystemRole] = &[
    SystemRole {
        name: "Administrator",
        description: "Full access to every registered route",
        grant: Grant::Everything,
    },
    SystemRole {
        name: "ClinicalStaff",
        description: "Doctors and nurses: patient care and records",
        grant: Grant::Categories {
            full: &[Dashboard, Patients, Appointments, Prescriptions, Ehr, Profile],
            read_only: &[],
        },
    },
    SystemRole {
        name: "FrontDesk",
        description: "Reception: scheduling and billing",
        grant: Grant::Categories {
            full: &[Dashboard, Appointments, Billing, Profile],
            read_only: &[Patients],
        },
    },
    SystemRole {
        name: "Client",
        description: "End clients: own dashboard and profile",
        grant: Grant::Categories {
            full: &[Profile],
            read_only: &[Dashboard],
        },
    },
];

async fn granted_ids(pool: &SqlitePool, grant: &Grant) -> RepoResult<Vec<i64>> {
    match grant {
        Grant::Everything => permission::find_all_ids(pool).await,
        Grant::Categories { full, read_only } => {
            let mut ids = permission::find_ids_by_category(pool, full).await?;
            ids.extend(permission::find_read_ids_by_category(pool, read_only).await?);
            ids.sort_unstable();
            ids.dedup();
            Ok(ids)
        }
    }
}

/// Reconcile the declared routes, then create any missing system role
pub async fn seed_defaults(pool: &SqlitePool, manifest: &[RouteInfo]) -> RepoResult<SeedReport> {
    let permissions = reconcile(pool, manifest, RouteSourceKind::Manifest, false).await?;
    let mut report = SeedReport {
        permissions,
        ..Default::default()
    };

    for def in SYSTEM_ROLES {
        if role::find_by_name(pool, def.name).await?.is_some() {
            report.roles_existing.push(def.name.to_string());
            continue;
        }
        let permission_ids = granted_ids(pool, &def.grant).await?;
        let created = role::create_with_flag(
            pool,
            RoleCreate {
                name: def.name.to_string(),
                description: Some(def.description.to_string()),
                permission_ids,
            },
            true,
        )
        .await?;
        tracing::info!(
            role = %created.name,
            permissions = created.permission_ids.len(),
            "System role created"
        );
        report.roles_created.push(def.name.to_string());
    }

    Ok(report)
}
