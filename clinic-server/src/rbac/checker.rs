//! Permission Checker
//!
//! Decides whether a user may call `(route, method)`:
//!
//! 1. unknown user → deny (`user not found`)
//! 2. legacy role `super_admin` → allow without looking at permissions
//! 3. collect `{route}:{method}` tokens of active permissions of active roles
//! 4. exact token match → allow, otherwise deny
//!
//! The checker never returns an error. Any store failure is logged and turns
//! into a deny (`error checking permissions`); the listing companions return
//! an empty result instead.

use super::normalize::normalize_route;
use crate::db::repository::RepoResult;
use async_trait::async_trait;
use shared::models::{
    AccessDecision, AccessProfile, DenyReason, GrantSource, HttpMethod, LegacyRole,
    PermissionCheckResult, User, permission_token,
};
use std::collections::BTreeSet;
use std::sync::Arc;

/// An active role assigned to a user, with its active permission tokens
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleGrant {
    pub role: String,
    pub tokens: Vec<String>,
}

/// Read side of the user → role → permission graph
#[async_trait]
pub trait AccessStore: Send + Sync {
    async fn find_user(&self, user_id: i64) -> RepoResult<Option<User>>;

    /// Active roles assigned to the user, ordered by role name
    async fn active_role_grants(&self, user_id: i64) -> RepoResult<Vec<RoleGrant>>;

    /// Every active permission token, sorted
    async fn active_permission_tokens(&self) -> RepoResult<Vec<String>>;
}

#[derive(Clone)]
pub struct PermissionChecker {
    store: Arc<dyn AccessStore>,
}

impl PermissionChecker {
    pub fn new(store: Arc<dyn AccessStore>) -> Self {
        Self { store }
    }

    /// Check a single `(route, method)` for a user
    pub async fn check_user_permission(
        &self,
        user_id: &str,
        route: &str,
        method: HttpMethod,
    ) -> PermissionCheckResult {
        let required = permission_token(&normalize_route(route), method);

        match self.evaluate(user_id, &required).await {
            Ok(result) => result,
            Err(e) => {
                tracing::error!(
                    user_id = %user_id,
                    permission = %required,
                    error = %e,
                    "Permission lookup failed, denying"
                );
                PermissionCheckResult::new(
                    AccessDecision::Denied {
                        reason: DenyReason::LookupFailed,
                    },
                    Vec::new(),
                    required,
                )
            }
        }
    }

    async fn evaluate(&self, user_id: &str, required: &str) -> RepoResult<PermissionCheckResult> {
        let Some(user) = self.load_user(user_id).await? else {
            return Ok(PermissionCheckResult::new(
                AccessDecision::Denied {
                    reason: DenyReason::UserNotFound,
                },
                Vec::new(),
                required.to_string(),
            ));
        };

        if user.role.is_super_admin() {
            return Ok(PermissionCheckResult::new(
                AccessDecision::Allowed {
                    grant: GrantSource::SuperAdmin,
                },
                vec![user.role.to_string()],
                required.to_string(),
            ));
        }

        let grants = self.store.active_role_grants(user.id).await?;
        let roles = role_labels(&user, &grants);

        let decision = match grants
            .iter()
            .find(|g| g.tokens.iter().any(|t| t == required))
        {
            Some(grant) => AccessDecision::Allowed {
                grant: GrantSource::Role {
                    name: grant.role.clone(),
                },
            },
            None => AccessDecision::Denied {
                reason: DenyReason::MissingPermission,
            },
        };

        Ok(PermissionCheckResult::new(
            decision,
            roles,
            required.to_string(),
        ))
    }

    /// Effective permission tokens of a user, sorted and deduplicated
    ///
    /// Super admins get every active token. Failures yield an empty set.
    pub async fn user_permissions(&self, user_id: &str) -> Vec<String> {
        match self.collect_permissions(user_id).await {
            Ok(tokens) => tokens,
            Err(e) => {
                tracing::error!(user_id = %user_id, error = %e, "Failed to load user permissions");
                Vec::new()
            }
        }
    }

    async fn collect_permissions(&self, user_id: &str) -> RepoResult<Vec<String>> {
        let Some(user) = self.load_user(user_id).await? else {
            return Ok(Vec::new());
        };
        let tokens: BTreeSet<String> = if user.role.is_super_admin() {
            self.store
                .active_permission_tokens()
                .await?
                .into_iter()
                .collect()
        } else {
            self.store
                .active_role_grants(user.id)
                .await?
                .into_iter()
                .flat_map(|g| g.tokens)
                .collect()
        };
        Ok(tokens.into_iter().collect())
    }

    /// Legacy role label followed by active assigned role names
    ///
    /// Failures yield an empty list.
    pub async fn user_roles(&self, user_id: &str) -> Vec<String> {
        match self.collect_roles(user_id).await {
            Ok(roles) => roles,
            Err(e) => {
                tracing::error!(user_id = %user_id, error = %e, "Failed to load user roles");
                Vec::new()
            }
        }
    }

    async fn collect_roles(&self, user_id: &str) -> RepoResult<Vec<String>> {
        let Some(user) = self.load_user(user_id).await? else {
            return Ok(Vec::new());
        };
        let grants = self.store.active_role_grants(user.id).await?;
        Ok(role_labels(&user, &grants))
    }

    /// Legacy role as stored, not as claimed by the token
    ///
    /// Unknown users and lookup failures yield `None`.
    pub async fn legacy_role(&self, user_id: &str) -> Option<LegacyRole> {
        match self.load_user(user_id).await {
            Ok(user) => user.map(|u| u.role),
            Err(e) => {
                tracing::error!(user_id = %user_id, error = %e, "Failed to load legacy role");
                None
            }
        }
    }

    /// Roles and effective permissions in one view; `None` for unknown users
    pub async fn access_profile(&self, user_id: &str) -> Option<AccessProfile> {
        let user = match self.load_user(user_id).await {
            Ok(user) => user?,
            Err(e) => {
                tracing::error!(user_id = %user_id, error = %e, "Failed to load access profile");
                return None;
            }
        };
        Some(AccessProfile {
            user_id: user.id,
            roles: self.user_roles(user_id).await,
            permissions: self.user_permissions(user_id).await,
            is_super_admin: user.role.is_super_admin(),
        })
    }

    /// Non-numeric identifiers cannot name a user
    async fn load_user(&self, user_id: &str) -> RepoResult<Option<User>> {
        match user_id.trim().parse::<i64>() {
            Ok(id) => self.store.find_user(id).await,
            Err(_) => Ok(None),
        }
    }
}

fn role_labels(user: &User, grants: &[RoleGrant]) -> Vec<String> {
    let mut labels = vec![user.role.to_string()];
    for grant in grants {
        if !labels.contains(&grant.role) {
            labels.push(grant.role.clone());
        }
    }
    labels
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repository::RepoError;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct FakeStore {
        users: HashMap<i64, User>,
        grants: HashMap<i64, Vec<RoleGrant>>,
        all_tokens: Vec<String>,
        grant_lookups: AtomicUsize,
    }

    impl FakeStore {
        fn with_user(mut self, id: i64, role: LegacyRole, grants: Vec<RoleGrant>) -> Self {
            self.users.insert(
                id,
                User {
                    id,
                    username: format!("user{id}"),
                    display_name: format!("User {id}"),
                    role,
                    created_at: 0,
                    updated_at: 0,
                    role_ids: Vec::new(),
                },
            );
            self.grants.insert(id, grants);
            self
        }
    }

    #[async_trait]
    impl AccessStore for FakeStore {
        async fn find_user(&self, user_id: i64) -> RepoResult<Option<User>> {
            Ok(self.users.get(&user_id).cloned())
        }

        async fn active_role_grants(&self, user_id: i64) -> RepoResult<Vec<RoleGrant>> {
            self.grant_lookups.fetch_add(1, Ordering::SeqCst);
            Ok(self.grants.get(&user_id).cloned().unwrap_or_default())
        }

        async fn active_permission_tokens(&self) -> RepoResult<Vec<String>> {
            Ok(self.all_tokens.clone())
        }
    }

    struct BrokenStore;

    #[async_trait]
    impl AccessStore for BrokenStore {
        async fn find_user(&self, _user_id: i64) -> RepoResult<Option<User>> {
            Err(RepoError::Database("connection reset".into()))
        }

        async fn active_role_grants(&self, _user_id: i64) -> RepoResult<Vec<RoleGrant>> {
            Err(RepoError::Database("connection reset".into()))
        }

        async fn active_permission_tokens(&self) -> RepoResult<Vec<String>> {
            Err(RepoError::Database("connection reset".into()))
        }
    }

    fn grant(role: &str, tokens: &[&str]) -> RoleGrant {
        RoleGrant {
            role: role.to_string(),
            tokens: tokens.iter().map(|t| t.to_string()).collect(),
        }
    }

    fn checker(store: FakeStore) -> (PermissionChecker, Arc<FakeStore>) {
        let store = Arc::new(store);
        (PermissionChecker::new(store.clone()), store)
    }

    #[tokio::test]
    async fn test_unknown_user_denied() {
        let (checker, _) = checker(FakeStore::default());
        let result = checker
            .check_user_permission("42", "/dashboard", HttpMethod::Get)
            .await;
        assert!(!result.allowed);
        assert_eq!(result.reason.as_deref(), Some("user not found"));

        let result = checker
            .check_user_permission("not-a-number", "/dashboard", HttpMethod::Get)
            .await;
        assert_eq!(result.reason.as_deref(), Some("user not found"));
    }

    #[tokio::test]
    async fn test_super_admin_bypasses_lookup() {
        let (checker, store) =
            checker(FakeStore::default().with_user(1, LegacyRole::SuperAdmin, vec![]));
        for (route, method) in [
            ("/admin/users", HttpMethod::Delete),
            ("/never/registered", HttpMethod::Patch),
        ] {
            let result = checker.check_user_permission("1", route, method).await;
            assert!(result.allowed);
            assert_eq!(
                result.decision,
                AccessDecision::Allowed {
                    grant: GrantSource::SuperAdmin
                }
            );
        }
        assert_eq!(store.grant_lookups.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_no_roles_denied() {
        let (checker, _) = checker(FakeStore::default().with_user(2, LegacyRole::Admin, vec![]));
        let result = checker
            .check_user_permission("2", "/dashboard", HttpMethod::Get)
            .await;
        assert!(!result.allowed);
        assert_eq!(
            result.reason.as_deref(),
            Some("user does not have required permission")
        );
        assert_eq!(result.user_roles, vec!["admin"]);
    }

    #[tokio::test]
    async fn test_exact_method_match() {
        let (checker, _) = checker(FakeStore::default().with_user(
            3,
            LegacyRole::Client,
            vec![grant("Reception", &["/dashboard/patients:GET"])],
        ));
        let get = checker
            .check_user_permission("3", "/dashboard/patients", HttpMethod::Get)
            .await;
        assert!(get.allowed);
        assert_eq!(get.required_permission, "/dashboard/patients:GET");

        let post = checker
            .check_user_permission("3", "/dashboard/patients", HttpMethod::Post)
            .await;
        assert!(!post.allowed);
    }

    #[tokio::test]
    async fn test_clinical_staff_scenario() {
        let (checker, _) = checker(FakeStore::default().with_user(
            4,
            LegacyRole::Doctor,
            vec![grant(
                "ClinicalStaff",
                &["/dashboard/ehr:GET", "/dashboard/ehr:POST"],
            )],
        ));
        let result = checker
            .check_user_permission("4", "/dashboard/ehr", HttpMethod::Post)
            .await;
        assert!(result.allowed);
        assert_eq!(result.user_roles, vec!["doctor", "ClinicalStaff"]);
        assert_eq!(
            result.decision,
            AccessDecision::Allowed {
                grant: GrantSource::Role {
                    name: "ClinicalStaff".into()
                }
            }
        );

        let result = checker
            .check_user_permission("4", "/admin/users", HttpMethod::Delete)
            .await;
        assert!(!result.allowed);
        assert_eq!(
            result.reason.as_deref(),
            Some("user does not have required permission")
        );
    }

    #[tokio::test]
    async fn test_route_is_normalized_before_matching() {
        let (checker, _) = checker(FakeStore::default().with_user(
            5,
            LegacyRole::Doctor,
            vec![grant("ClinicalStaff", &["/dashboard/patients/:id:GET"])],
        ));
        let result = checker
            .check_user_permission("5", "/dashboard/patients/[id]/?tab=notes", HttpMethod::Get)
            .await;
        assert!(result.allowed);
    }

    #[tokio::test]
    async fn test_store_failure_fails_closed() {
        let checker = PermissionChecker::new(Arc::new(BrokenStore));
        let result = checker
            .check_user_permission("1", "/dashboard", HttpMethod::Get)
            .await;
        assert!(!result.allowed);
        assert_eq!(
            result.decision,
            AccessDecision::Denied {
                reason: DenyReason::LookupFailed
            }
        );
        assert_eq!(result.reason.as_deref(), Some("error checking permissions"));

        assert!(checker.user_permissions("1").await.is_empty());
        assert!(checker.user_roles("1").await.is_empty());
        assert!(checker.access_profile("1").await.is_none());
        assert!(checker.legacy_role("1").await.is_none());
    }

    #[tokio::test]
    async fn test_legacy_role_comes_from_store() {
        let (checker, _) = checker(FakeStore::default().with_user(8, LegacyRole::Client, vec![]));
        assert_eq!(checker.legacy_role("8").await, Some(LegacyRole::Client));
        assert_eq!(checker.legacy_role("999").await, None);
        assert_eq!(checker.legacy_role("admin").await, None);
    }

    #[tokio::test]
    async fn test_user_permissions_union_sorted() {
        let (checker, _) = checker(FakeStore::default().with_user(
            6,
            LegacyRole::Doctor,
            vec![
                grant("ClinicalStaff", &["/dashboard/ehr:POST", "/dashboard:GET"]),
                grant("FrontDesk", &["/dashboard:GET", "/dashboard/billing:GET"]),
            ],
        ));
        assert_eq!(
            checker.user_permissions("6").await,
            vec![
                "/dashboard/billing:GET",
                "/dashboard/ehr:POST",
                "/dashboard:GET"
            ]
        );
        assert_eq!(
            checker.user_roles("6").await,
            vec!["doctor", "ClinicalStaff", "FrontDesk"]
        );
    }

    #[tokio::test]
    async fn test_super_admin_gets_every_active_token() {
        let mut store = FakeStore::default().with_user(1, LegacyRole::SuperAdmin, vec![]);
        store.all_tokens = vec!["/admin:GET".into(), "/dashboard:GET".into()];
        let (checker, _) = checker(store);

        let profile = checker.access_profile("1").await.unwrap();
        assert!(profile.is_super_admin);
        assert_eq!(profile.permissions, vec!["/admin:GET", "/dashboard:GET"]);
        assert_eq!(profile.roles, vec!["super_admin"]);
    }

    #[tokio::test]
    async fn test_role_labels_deduplicated() {
        let (checker, _) = checker(FakeStore::default().with_user(
            7,
            LegacyRole::Client,
            vec![grant("client", &[]), grant("Patients", &[])],
        ));
        assert_eq!(checker.user_roles("7").await, vec!["client", "Patients"]);
    }
}
