//! Permission Model

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// HTTP verbs a route handler can implement
///
/// Declaration order is the canonical reporting order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[serde(rename_all = "UPPERCASE")]
#[cfg_attr(feature = "db", sqlx(rename_all = "UPPERCASE"))]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
    Patch,
}

impl HttpMethod {
    pub const ALL: [HttpMethod; 5] = [
        HttpMethod::Get,
        HttpMethod::Post,
        HttpMethod::Put,
        HttpMethod::Delete,
        HttpMethod::Patch,
    ];

    pub const fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Delete => "DELETE",
            HttpMethod::Patch => "PATCH",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HttpMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        HttpMethod::ALL
            .into_iter()
            .find(|m| m.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unsupported HTTP method: {}", s))
    }
}

impl TryFrom<&http::Method> for HttpMethod {
    type Error = String;

    fn try_from(method: &http::Method) -> Result<Self, Self::Error> {
        method.as_str().parse()
    }
}

/// Functional area a permission belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "db", sqlx(rename_all = "lowercase"))]
pub enum PermissionCategory {
    Admin,
    Dashboard,
    Patients,
    Appointments,
    Billing,
    Inventory,
    Prescriptions,
    Ehr,
    Email,
    Api,
    Settings,
    Profile,
    Reports,
}

impl PermissionCategory {
    pub const ALL: [PermissionCategory; 13] = [
        PermissionCategory::Admin,
        PermissionCategory::Dashboard,
        PermissionCategory::Patients,
        PermissionCategory::Appointments,
        PermissionCategory::Billing,
        PermissionCategory::Inventory,
        PermissionCategory::Prescriptions,
        PermissionCategory::Ehr,
        PermissionCategory::Email,
        PermissionCategory::Api,
        PermissionCategory::Settings,
        PermissionCategory::Profile,
        PermissionCategory::Reports,
    ];

    pub const fn as_str(&self) -> &'static str {
        match self {
            PermissionCategory::Admin => "admin",
            PermissionCategory::Dashboard => "dashboard",
            PermissionCategory::Patients => "patients",
            PermissionCategory::Appointments => "appointments",
            PermissionCategory::Billing => "billing",
            PermissionCategory::Inventory => "inventory",
            PermissionCategory::Prescriptions => "prescriptions",
            PermissionCategory::Ehr => "ehr",
            PermissionCategory::Email => "email",
            PermissionCategory::Api => "api",
            PermissionCategory::Settings => "settings",
            PermissionCategory::Profile => "profile",
            PermissionCategory::Reports => "reports",
        }
    }

    /// Look up a category by its lowercase name (`"ehr"`, `"patients"`, ...)
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.as_str() == name)
    }

    /// Classify a logical route path
    ///
    /// `/api/...` is always `api` and `/admin/...` always `admin`. Under
    /// `/dashboard` the second segment decides; elsewhere the first one does.
    /// Anything unmatched falls back to `dashboard`.
    pub fn from_route(path: &str) -> Self {
        let mut segments = path.split('/').filter(|s| !s.is_empty());
        match segments.next() {
            None => PermissionCategory::Dashboard,
            Some("api") => PermissionCategory::Api,
            Some("admin") => PermissionCategory::Admin,
            Some("dashboard") => segments
                .next()
                .and_then(Self::from_name)
                .unwrap_or(PermissionCategory::Dashboard),
            Some(first) => Self::from_name(first).unwrap_or(PermissionCategory::Dashboard),
        }
    }
}

impl fmt::Display for PermissionCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Permission entity: one `(route, method)` access unit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Permission {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    /// Canonical route pattern, e.g. `/dashboard/patients/:id`
    pub route: String,
    pub method: HttpMethod,
    pub category: PermissionCategory,
    pub is_active: bool,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Permission {
    /// `{route}:{method}` token as stored in effective permission sets
    pub fn token(&self) -> String {
        permission_token(&self.route, self.method)
    }
}

/// Build the `{route}:{method}` token for a route pattern and verb
pub fn permission_token(route: &str, method: HttpMethod) -> String {
    format!("{}:{}", route, method)
}

/// Query filter for permission listing
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PermissionQuery {
    pub category: Option<PermissionCategory>,
    pub active: Option<bool>,
}

/// Toggle payload for a permission's active flag
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PermissionActiveUpdate {
    pub is_active: bool,
}
