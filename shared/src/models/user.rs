//! User Model

use serde::{Deserialize, Serialize};
use std::fmt;

/// The single fixed-enumeration role field that predates the role graph
///
/// Only [`LegacyRole::SuperAdmin`] carries authority on its own; every other
/// value is a label next to the user's assigned roles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "db", sqlx(rename_all = "snake_case"))]
pub enum LegacyRole {
    SuperAdmin,
    Admin,
    Doctor,
    Client,
}

impl LegacyRole {
    pub const fn as_str(&self) -> &'static str {
        match self {
            LegacyRole::SuperAdmin => "super_admin",
            LegacyRole::Admin => "admin",
            LegacyRole::Doctor => "doctor",
            LegacyRole::Client => "client",
        }
    }

    /// Highest privilege level: bypasses every permission check
    pub fn is_super_admin(&self) -> bool {
        matches!(self, LegacyRole::SuperAdmin)
    }

    /// Administrator or above
    pub fn is_admin(&self) -> bool {
        matches!(self, LegacyRole::SuperAdmin | LegacyRole::Admin)
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "super_admin" => Some(LegacyRole::SuperAdmin),
            "admin" => Some(LegacyRole::Admin),
            "doctor" => Some(LegacyRole::Doctor),
            "client" => Some(LegacyRole::Client),
            _ => None,
        }
    }
}

impl fmt::Display for LegacyRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// User entity
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct User {
    pub id: i64,
    pub username: String,
    pub display_name: String,
    /// Legacy role column
    pub role: LegacyRole,
    pub created_at: i64,
    pub updated_at: i64,
    /// Assigned role ids, loaded from `user_role`
    #[serde(default)]
    #[cfg_attr(feature = "db", sqlx(skip))]
    pub role_ids: Vec<i64>,
}

/// Create user payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserCreate {
    pub username: String,
    pub display_name: Option<String>,
    pub role: LegacyRole,
    #[serde(default)]
    pub role_ids: Vec<i64>,
}

/// Replace-all payload for a user's assigned roles
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserRolesUpdate {
    pub role_ids: Vec<i64>,
}

/// Legacy role change payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LegacyRoleUpdate {
    pub role: LegacyRole,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_legacy_role_names_round_trip() {
        for role in [
            LegacyRole::SuperAdmin,
            LegacyRole::Admin,
            LegacyRole::Doctor,
            LegacyRole::Client,
        ] {
            assert_eq!(LegacyRole::from_name(role.as_str()), Some(role));
            let json = serde_json::to_string(&role).unwrap();
            assert_eq!(json, format!("\"{}\"", role.as_str()));
        }
        assert_eq!(LegacyRole::from_name("root"), None);
    }

    #[test]
    fn test_privilege_levels() {
        assert!(LegacyRole::SuperAdmin.is_super_admin());
        assert!(LegacyRole::SuperAdmin.is_admin());
        assert!(LegacyRole::Admin.is_admin());
        assert!(!LegacyRole::Admin.is_super_admin());
        assert!(!LegacyRole::Doctor.is_admin());
    }
}
