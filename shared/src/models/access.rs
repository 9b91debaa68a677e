//! Access decisions, route manifests and reconciliation reports

use serde::{Deserialize, Serialize};

use super::permission::{HttpMethod, PermissionCategory};

/// A routable path discovered by a scan or declared in a manifest
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteInfo {
    /// Logical route pattern with `:param` placeholders
    pub path: String,
    /// Implemented verbs in canonical order
    pub methods: Vec<HttpMethod>,
    /// Source file for scanned routes; `None` for declared routes
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_path: Option<String>,
    pub category: PermissionCategory,
}

/// Why a check was denied
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DenyReason {
    UserNotFound,
    MissingPermission,
    /// Infrastructure failure while resolving access (fail-closed)
    LookupFailed,
}

impl DenyReason {
    pub const fn message(&self) -> &'static str {
        match self {
            DenyReason::UserNotFound => "user not found",
            DenyReason::MissingPermission => "user does not have required permission",
            DenyReason::LookupFailed => "error checking permissions",
        }
    }
}

/// How an allowed check was satisfied
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "via", rename_all = "snake_case")]
pub enum GrantSource {
    /// Highest-privilege legacy role
    SuperAdmin,
    /// First active role (by name) carrying the token
    Role { name: String },
}

/// Outcome of a single permission check
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum AccessDecision {
    Allowed { grant: GrantSource },
    Denied { reason: DenyReason },
}

impl AccessDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, AccessDecision::Allowed { .. })
    }

    /// Human-readable deny reason, `None` when allowed
    pub fn reason(&self) -> Option<&'static str> {
        match self {
            AccessDecision::Allowed { .. } => None,
            AccessDecision::Denied { reason } => Some(reason.message()),
        }
    }
}

/// Structured result returned by the permission checker
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionCheckResult {
    pub allowed: bool,
    pub decision: AccessDecision,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    /// Legacy role label followed by active assigned role names
    pub user_roles: Vec<String>,
    /// The `{route}:{method}` token this request required
    pub required_permission: String,
}

impl PermissionCheckResult {
    pub fn new(
        decision: AccessDecision,
        user_roles: Vec<String>,
        required_permission: String,
    ) -> Self {
        Self {
            allowed: decision.is_allowed(),
            reason: decision.reason().map(str::to_string),
            decision,
            user_roles,
            required_permission,
        }
    }
}

/// Ad-hoc check request for the admin console
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PermissionCheckRequest {
    pub user_id: String,
    pub route: String,
    #[serde(default = "default_method")]
    pub method: HttpMethod,
}

fn default_method() -> HttpMethod {
    HttpMethod::Get
}

/// "What can I do" view of the current user
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessProfile {
    pub user_id: i64,
    pub roles: Vec<String>,
    pub permissions: Vec<String>,
    pub is_super_admin: bool,
}

/// Where a reconciliation run takes its routes from
///
/// Also stored on each permission row; stale deactivation only looks at rows
/// of the source being reconciled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "db", sqlx(rename_all = "snake_case"))]
pub enum RouteSourceKind {
    /// Walk the configured route tree on disk
    #[default]
    Filesystem,
    /// Use the server's declared route table
    Manifest,
}

/// Reconciliation trigger payload
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReconcileRequest {
    #[serde(default)]
    pub source: RouteSourceKind,
    #[serde(default)]
    pub deactivate_stale: bool,
}

/// Counts reported by a reconciliation run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ReconcileReport {
    pub routes: usize,
    pub created: usize,
    pub updated: usize,
    pub deactivated: usize,
}

/// Counts reported by default role seeding
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SeedReport {
    pub permissions: ReconcileReport,
    pub roles_created: Vec<String>,
    pub roles_existing: Vec<String>,
}
