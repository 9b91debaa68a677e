//! Route Scanner
//!
//! Walks a file-system route tree and reports every routable path it finds.
//!
//! ```text
//! app/
//! ├── page.tsx                        → /                        [GET]
//! ├── dashboard/patients/[id]/page.tsx → /dashboard/patients/:id  [GET]
//! └── api/patients/route.ts            → /api/patients            [GET, POST]
//! ```
//!
//! Page entrypoints without exported handlers count as `GET`. Hidden
//! directories, `node_modules` and `components` are never entered.

use super::normalize::normalize_segment;
use regex::Regex;
use shared::models::{HttpMethod, PermissionCategory, RouteInfo};
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use walkdir::{DirEntry, WalkDir};

const PAGE_FILES: &[&str] = &["page.tsx", "page.ts", "page.jsx", "page.js"];
const ROUTE_FILES: &[&str] = &["route.ts", "route.js"];
const SKIPPED_DIRS: &[&str] = &["node_modules", "components"];

/// `export function GET`, `export async function POST`, `export const PUT = ...`
static EXPORTED_HANDLER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"export\s+(?:async\s+)?(?:function|const|let)\s+(GET|POST|PUT|DELETE|PATCH)\b")
        .expect("valid handler regex")
});

/// `export { handler as GET, handler as POST }`
static RE_EXPORTED_HANDLER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"export\s*\{([^}]*)\}").expect("valid re-export regex")
});

static ALIAS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\bas\s+(GET|POST|PUT|DELETE|PATCH)\b").expect("valid alias regex")
});

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EntryKind {
    Page,
    Api,
}

fn entry_kind(file_name: &str) -> Option<EntryKind> {
    if PAGE_FILES.contains(&file_name) {
        Some(EntryKind::Page)
    } else if ROUTE_FILES.contains(&file_name) {
        Some(EntryKind::Api)
    } else {
        None
    }
}

fn is_skipped_dir(entry: &DirEntry) -> bool {
    if entry.depth() == 0 || !entry.file_type().is_dir() {
        return false;
    }
    let name = entry.file_name().to_string_lossy();
    name.starts_with('.') || SKIPPED_DIRS.contains(&name.as_ref())
}

/// Verbs exported by a route module, in canonical order
pub fn detect_methods(source: &str) -> Vec<HttpMethod> {
    let mut found = BTreeSet::new();
    for caps in EXPORTED_HANDLER.captures_iter(source) {
        if let Ok(method) = caps[1].parse::<HttpMethod>() {
            found.insert(method);
        }
    }
    for block in RE_EXPORTED_HANDLER.captures_iter(source) {
        for caps in ALIAS.captures_iter(&block[1]) {
            if let Ok(method) = caps[1].parse::<HttpMethod>() {
                found.insert(method);
            }
        }
    }
    found.into_iter().collect()
}

/// Logical route for the directory holding an entrypoint
fn route_path(relative_dir: &Path) -> String {
    let segments: Vec<String> = relative_dir
        .components()
        .map(|c| normalize_segment(&c.as_os_str().to_string_lossy()))
        .collect();
    if segments.is_empty() {
        "/".to_string()
    } else {
        format!("/{}", segments.join("/"))
    }
}

/// Scanner over one route tree
#[derive(Debug, Clone)]
pub struct RouteScanner {
    root: PathBuf,
}

impl RouteScanner {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Walk the tree and collect one [`RouteInfo`] per entrypoint
    ///
    /// Unreadable directories and files are logged and skipped; the scan
    /// itself never fails. Directory entries are visited in name order.
    pub fn scan(&self) -> Vec<RouteInfo> {
        let mut routes = Vec::new();

        let walker = WalkDir::new(&self.root)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| !is_skipped_dir(e));

        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    tracing::warn!(
                        path = ?e.path(),
                        error = %e,
                        "Skipping unreadable entry in route tree"
                    );
                    continue;
                }
            };
            if !entry.file_type().is_file() {
                continue;
            }
            let Some(kind) = entry_kind(&entry.file_name().to_string_lossy()) else {
                continue;
            };
            if let Some(route) = self.route_for(entry.path(), kind) {
                routes.push(route);
            }
        }

        tracing::debug!(root = %self.root.display(), count = routes.len(), "Route scan finished");
        routes
    }

    fn route_for(&self, file: &Path, kind: EntryKind) -> Option<RouteInfo> {
        let relative = file.strip_prefix(&self.root).ok()?;
        let dir = relative.parent().unwrap_or_else(|| Path::new(""));
        let path = route_path(dir);

        let source = match std::fs::read_to_string(file) {
            Ok(source) => source,
            Err(e) => {
                tracing::warn!(file = %file.display(), error = %e, "Skipping unreadable route file");
                return None;
            }
        };

        let mut methods = detect_methods(&source);
        if methods.is_empty() && kind == EntryKind::Page {
            methods.push(HttpMethod::Get);
        }

        Some(RouteInfo {
            category: PermissionCategory::from_route(&path),
            path,
            methods,
            file_path: Some(relative.to_string_lossy().replace('\\', "/")),
        })
    }
}

/// Group routes by category, keeping scan order inside each group
pub fn group_by_category(routes: &[RouteInfo]) -> BTreeMap<PermissionCategory, Vec<RouteInfo>> {
    let mut grouped: BTreeMap<PermissionCategory, Vec<RouteInfo>> = BTreeMap::new();
    for route in routes {
        grouped.entry(route.category).or_default().push(route.clone());
    }
    grouped
}

fn title_case(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn method_list(methods: &[HttpMethod]) -> String {
    methods
        .iter()
        .map(HttpMethod::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Display name for a route: `/dashboard/patients/:id` + `[GET]`
/// → `Dashboard Patients Id (GET)`
pub fn permission_name(route: &str, methods: &[HttpMethod]) -> String {
    let words: Vec<String> = route
        .split('/')
        .filter(|s| !s.is_empty())
        .flat_map(|s| s.trim_start_matches(':').split(['-', '_']))
        .filter(|w| !w.is_empty())
        .map(title_case)
        .collect();

    let title = if words.is_empty() {
        "Home".to_string()
    } else {
        words.join(" ")
    };
    format!("{title} ({})", method_list(methods))
}

/// `Access to /dashboard/patients/:id via GET`
pub fn permission_description(route: &str, methods: &[HttpMethod]) -> String {
    format!("Access to {route} via {}", method_list(methods))
}
