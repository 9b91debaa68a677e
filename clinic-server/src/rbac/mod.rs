//! Permission resolution
//!
//! - [`normalize`] - canonical route patterns
//! - [`scanner`] - file-system route discovery
//! - [`manifest`] - declared server routes
//! - [`checker`] - `(user, route, method)` decisions
//! - [`reconcile`] - permission registry upserts
//! - [`seed`] - default system roles

pub mod checker;
pub mod manifest;
pub mod normalize;
pub mod reconcile;
pub mod scanner;
pub mod seed;

pub use checker::{AccessStore, PermissionChecker, RoleGrant};
pub use manifest::{ManifestEntry, RouteManifest};
pub use normalize::normalize_route;
pub use reconcile::reconcile;
pub use scanner::{RouteScanner, group_by_category};
pub use seed::seed_defaults;
