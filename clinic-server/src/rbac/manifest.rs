//! Declared route manifest
//!
//! The server's own routes are not discovered by scanning source text; they
//! are declared next to the router as `(pattern, methods, category)` rows
//! and turned into [`RouteInfo`] here.

use super::normalize::normalize_route;
use shared::models::{HttpMethod, PermissionCategory, RouteInfo};

/// One declared route
#[derive(Debug, Clone, Copy)]
pub struct ManifestEntry {
    /// Router pattern, e.g. `/api/roles/{id}`
    pub pattern: &'static str,
    pub methods: &'static [HttpMethod],
    pub category: PermissionCategory,
}

impl ManifestEntry {
    pub const fn new(
        pattern: &'static str,
        methods: &'static [HttpMethod],
        category: PermissionCategory,
    ) -> Self {
        Self {
            pattern,
            methods,
            category,
        }
    }
}

/// Explicit table of routes protected by route permissions
#[derive(Debug, Clone, Copy)]
pub struct RouteManifest {
    entries: &'static [ManifestEntry],
}

impl RouteManifest {
    pub const fn new(entries: &'static [ManifestEntry]) -> Self {
        Self { entries }
    }

    pub fn entries(&self) -> &'static [ManifestEntry] {
        self.entries
    }

    /// Declared routes in the same shape the scanner produces
    ///
    /// Patterns are normalized and methods reported in canonical order.
    pub fn routes(&self) -> Vec<RouteInfo> {
        self.entries
            .iter()
            .map(|entry| {
                let mut methods = entry.methods.to_vec();
                methods.sort();
                methods.dedup();
                RouteInfo {
                    path: normalize_route(entry.pattern),
                    methods,
                    file_path: None,
                    category: entry.category,
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ENTRIES: &[ManifestEntry] = &[
        ManifestEntry::new(
            "/api/roles/{id}",
            &[HttpMethod::Delete, HttpMethod::Get, HttpMethod::Put],
            PermissionCategory::Admin,
        ),
        ManifestEntry::new("/api/access/me", &[HttpMethod::Get], PermissionCategory::Profile),
    ];

    #[test]
    fn test_routes_are_normalized_and_ordered() {
        let routes = RouteManifest::new(ENTRIES).routes();
        assert_eq!(routes[0].path, "/api/roles/:id");
        assert_eq!(
            routes[0].methods,
            vec![HttpMethod::Get, HttpMethod::Put, HttpMethod::Delete]
        );
        assert_eq!(routes[1].category, PermissionCategory::Profile);
        assert!(routes.iter().all(|r| r.file_path.is_none()));
    }
}
