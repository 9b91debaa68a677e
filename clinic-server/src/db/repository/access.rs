//! Access Repository
//!
//! SQLite-backed [`AccessStore`] used by the permission checker.

use super::{RepoResult, permission, user};
use crate::rbac::{AccessStore, RoleGrant};
use async_trait::async_trait;
use shared::models::User;
use sqlx::SqlitePool;

#[derive(Clone)]
pub struct AccessRepository {
    pool: SqlitePool,
}

impl AccessRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AccessStore for AccessRepository {
    async fn find_user(&self, user_id: i64) -> RepoResult<Option<User>> {
        user::find_by_id(&self.pool, user_id).await
    }

    async fn active_role_grants(&self, user_id: i64) -> RepoResult<Vec<RoleGrant>> {
        let rows = sqlx::query_as::<_, (String, Option<String>)>(
            "SELECT r.name, p.route || ':' || p.method \
             FROM user_role ur \
             JOIN role r ON r.id = ur.role_id AND r.is_active = 1 \
             LEFT JOIN role_permission rp ON rp.role_id = r.id \
             LEFT JOIN permission p ON p.id = rp.permission_id AND p.is_active = 1 \
             WHERE ur.user_id = ? \
             ORDER BY r.name, 2",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        let mut grants: Vec<RoleGrant> = Vec::new();
        for (role, token) in rows {
            if grants.last().is_none_or(|last| last.role != role) {
                grants.push(RoleGrant {
                    role,
                    tokens: Vec::new(),
                });
            }
            if let (Some(token), Some(grant)) = (token, grants.last_mut()) {
                grant.tokens.push(token);
            }
        }
        Ok(grants)
    }

    async fn active_permission_tokens(&self) -> RepoResult<Vec<String>> {
        permission::active_tokens(&self.pool).await
    }
}
