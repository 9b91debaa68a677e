//! Domain models shared between the server and its clients

pub mod access;
pub mod permission;
pub mod role;
pub mod user;

pub use access::{
    AccessDecision, AccessProfile, DenyReason, GrantSource, PermissionCheckRequest,
    PermissionCheckResult, ReconcileReport, ReconcileRequest, RouteInfo, RouteSourceKind,
    SeedReport,
};
pub use permission::{
    HttpMethod, Permission, PermissionActiveUpdate, PermissionCategory, PermissionQuery,
    permission_token,
};
pub use role::{Role, RoleCreate, RolePermissionsUpdate, RoleUpdate};
pub use user::{LegacyRole, LegacyRoleUpdate, User, UserCreate, UserRolesUpdate};
