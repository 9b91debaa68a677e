//! User Repository
//!
//! User records only carry identity and role data; credentials live with
//! the external identity service.

use super::{RepoError, RepoResult, role};
use shared::error::ErrorCode;
use shared::models::{LegacyRole, User, UserCreate};
use shared::util::now_millis;
use sqlx::SqlitePool;
use std::collections::BTreeSet;

const COLUMNS: &str = "id, username, display_name, role, created_at, updated_at";

pub async fn find_by_id(pool: &SqlitePool, id: i64) -> RepoResult<Option<User>> {
    let sql = format!("SELECT {COLUMNS} FROM user_account WHERE id = ?");
    let user = sqlx::query_as::<_, User>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await?;

    match user {
        Some(mut user) => {
            user.role_ids = sqlx::query_scalar::<_, i64>(
                "SELECT role_id FROM user_role WHERE user_id = ? ORDER BY role_id",
            )
            .bind(id)
            .fetch_all(pool)
            .await?;
            Ok(Some(user))
        }
        None => Ok(None),
    }
}

pub async fn find_by_username(pool: &SqlitePool, username: &str) -> RepoResult<Option<User>> {
    let id = sqlx::query_scalar::<_, i64>("SELECT id FROM user_account WHERE username = ?")
        .bind(username)
        .fetch_optional(pool)
        .await?;
    match id {
        Some(id) => find_by_id(pool, id).await,
        None => Ok(None),
    }
}

pub async fn create(pool: &SqlitePool, data: UserCreate) -> RepoResult<User> {
    let username = data.username.trim().to_string();
    if username.is_empty() {
        return Err(RepoError::Validation("Username must not be empty".into()));
    }
    if find_by_username(pool, &username).await?.is_some() {
        return Err(RepoError::Business(
            ErrorCode::UsernameExists,
            format!("Username '{username}' already exists"),
        ));
    }
    role::ensure_exist(pool, &data.role_ids).await?;

    let display_name = data
        .display_name
        .filter(|n| !n.trim().is_empty())
        .unwrap_or_else(|| username.clone());

    let now = now_millis();
    let mut tx = pool.begin().await?;
    let id = sqlx::query_scalar::<_, i64>(
        "INSERT INTO user_account (username, display_name, role, created_at, updated_at) \
         VALUES (?, ?, ?, ?, ?) RETURNING id",
    )
    .bind(&username)
    .bind(&display_name)
    .bind(data.role)
    .bind(now)
    .bind(now)
    .fetch_one(&mut *tx)
    .await?;

    for role_id in data.role_ids.iter().copied().collect::<BTreeSet<i64>>() {
        sqlx::query("INSERT INTO user_role (user_id, role_id) VALUES (?, ?)")
            .bind(id)
            .bind(role_id)
            .execute(&mut *tx)
            .await?;
    }
    tx.commit().await?;

    find_by_id(pool, id)
        .await?
        .ok_or_else(|| RepoError::Database("Failed to create user".into()))
}

/// Replace the user's assigned roles
pub async fn set_roles(pool: &SqlitePool, id: i64, role_ids: &[i64]) -> RepoResult<User> {
    if find_by_id(pool, id).await?.is_none() {
        return Err(RepoError::NotFound(format!("User {id} not found")));
    }
    role::ensure_exist(pool, role_ids).await?;

    let mut tx = pool.begin().await?;
    sqlx::query("DELETE FROM user_role WHERE user_id = ?")
        .bind(id)
        .execute(&mut *tx)
        .await?;
    for role_id in role_ids.iter().copied().collect::<BTreeSet<i64>>() {
        sqlx::query("INSERT INTO user_role (user_id, role_id) VALUES (?, ?)")
            .bind(id)
            .bind(role_id)
            .execute(&mut *tx)
            .await?;
    }
    sqlx::query("UPDATE user_account SET updated_at = ? WHERE id = ?")
        .bind(now_millis())
        .bind(id)
        .execute(&mut *tx)
        .await?;
    tx.commit().await?;

    find_by_id(pool, id)
        .await?
        .ok_or_else(|| RepoError::NotFound(format!("User {id} not found")))
}

pub async fn set_legacy_role(pool: &SqlitePool, id: i64, role: LegacyRole) -> RepoResult<User> {
    let rows = sqlx::query("UPDATE user_account SET role = ?, updated_at = ? WHERE id = ?")
        .bind(role)
        .bind(now_millis())
        .bind(id)
        .execute(pool)
        .await?;

    if rows.rows_affected() == 0 {
        return Err(RepoError::NotFound(format!("User {id} not found")));
    }
    find_by_id(pool, id)
        .await?
        .ok_or_else(|| RepoError::NotFound(format!("User {id} not found")))
}
