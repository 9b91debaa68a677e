//! 路由清单 - 受路由权限保护的服务端接口
//!
//! 每新增一个挂 `require_route_permission` 的路由，都要在这里登记，
//! 否则对账时不会生成对应权限，只有 super_admin 能访问。

use shared::models::HttpMethod::{Delete, Get, Post, Put};
use shared::models::PermissionCategory::{Admin, Profile};

use crate::rbac::{ManifestEntry, RouteManifest};

const ENTRIES: &[ManifestEntry] = &[
    // Permission registry
    ManifestEntry::new("/api/permissions", &[Get], Admin),
    ManifestEntry::new("/api/permissions/routes", &[Get], Admin),
    ManifestEntry::new("/api/permissions/scan", &[Post], Admin),
    ManifestEntry::new("/api/permissions/{id}", &[Get], Admin),
    ManifestEntry::new("/api/permissions/{id}/active", &[Put], Admin),
    // Seeding
    ManifestEntry::new("/api/rbac/seed", &[Post], Admin),
    // Roles
    ManifestEntry::new("/api/roles", &[Get, Post], Admin),
    ManifestEntry::new("/api/roles/{id}", &[Get, Put, Delete], Admin),
    ManifestEntry::new("/api/roles/{id}/permissions", &[Put], Admin),
    // Users
    ManifestEntry::new("/api/users", &[Post], Admin),
    ManifestEntry::new("/api/users/{id}", &[Get], Admin),
    ManifestEntry::new("/api/users/{id}/roles", &[Put], Admin),
    ManifestEntry::new("/api/users/{id}/legacy-role", &[Put], Admin),
    // Self-service
    ManifestEntry::new("/api/access/me", &[Get], Profile),
];

pub const ROUTE_MANIFEST: RouteManifest = RouteManifest::new(ENTRIES);
