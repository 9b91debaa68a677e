//! Permission Repository

use super::{RepoError, RepoResult, placeholders};
use shared::models::{HttpMethod, Permission, PermissionCategory, PermissionQuery, RouteSourceKind};
use shared::util::now_millis;
use sqlx::SqlitePool;
use std::collections::HashSet;

const COLUMNS: &str =
    "id, name, description, route, method, category, is_active, created_at, updated_at";

/// Insert payload produced by reconciliation
#[derive(Debug, Clone)]
pub struct NewPermission {
    pub name: String,
    pub description: String,
    pub route: String,
    pub method: HttpMethod,
    pub category: PermissionCategory,
    pub source: RouteSourceKind,
}

/// What an upsert did to the `(route, method)` row
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    Created,
    Updated,
}

pub async fn find_all(pool: &SqlitePool, query: &PermissionQuery) -> RepoResult<Vec<Permission>> {
    let sql = format!(
        "SELECT {COLUMNS} FROM permission \
         WHERE (?1 IS NULL OR category = ?1) AND (?2 IS NULL OR is_active = ?2) \
         ORDER BY category, route, method"
    );
    let permissions = sqlx::query_as::<_, Permission>(&sql)
        .bind(query.category)
        .bind(query.active)
        .fetch_all(pool)
        .await?;
    Ok(permissions)
}

pub async fn find_by_id(pool: &SqlitePool, id: i64) -> RepoResult<Option<Permission>> {
    let sql = format!("SELECT {COLUMNS} FROM permission WHERE id = ?");
    let permission = sqlx::query_as::<_, Permission>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(permission)
}

pub async fn find_by_route_method(
    pool: &SqlitePool,
    route: &str,
    method: HttpMethod,
) -> RepoResult<Option<Permission>> {
    let sql = format!("SELECT {COLUMNS} FROM permission WHERE route = ? AND method = ?");
    let permission = sqlx::query_as::<_, Permission>(&sql)
        .bind(route)
        .bind(method)
        .fetch_optional(pool)
        .await?;
    Ok(permission)
}

/// Ids of every permission in the given categories (any method)
pub async fn find_ids_by_category(
    pool: &SqlitePool,
    categories: &[PermissionCategory],
) -> RepoResult<Vec<i64>> {
    if categories.is_empty() {
        return Ok(Vec::new());
    }
    let sql = format!(
        "SELECT id FROM permission WHERE category IN ({}) ORDER BY id",
        placeholders(categories.len())
    );
    let mut query = sqlx::query_scalar::<_, i64>(&sql);
    for category in categories {
        query = query.bind(*category);
    }
    Ok(query.fetch_all(pool).await?)
}

/// Ids of every `GET` permission in the given categories
pub async fn find_read_ids_by_category(
    pool: &SqlitePool,
    categories: &[PermissionCategory],
) -> RepoResult<Vec<i64>> {
    if categories.is_empty() {
        return Ok(Vec::new());
    }
    let sql = format!(
        "SELECT id FROM permission WHERE method = 'GET' AND category IN ({}) ORDER BY id",
        placeholders(categories.len())
    );
    let mut query = sqlx::query_scalar::<_, i64>(&sql);
    for category in categories {
        query = query.bind(*category);
    }
    Ok(query.fetch_all(pool).await?)
}

pub async fn find_all_ids(pool: &SqlitePool) -> RepoResult<Vec<i64>> {
    let ids = sqlx::query_scalar::<_, i64>("SELECT id FROM permission ORDER BY id")
        .fetch_all(pool)
        .await?;
    Ok(ids)
}

/// Tokens of every active permission, sorted
pub async fn active_tokens(pool: &SqlitePool) -> RepoResult<Vec<String>> {
    let tokens = sqlx::query_scalar::<_, String>(
        "SELECT route || ':' || method FROM permission WHERE is_active = 1 ORDER BY route, method",
    )
    .fetch_all(pool)
    .await?;
    Ok(tokens)
}

/// Fail with `Validation` if any id does not name a permission
pub async fn ensure_exist(pool: &SqlitePool, ids: &[i64]) -> RepoResult<()> {
    let wanted: HashSet<i64> = ids.iter().copied().collect();
    if wanted.is_empty() {
        return Ok(());
    }
    let sql = format!(
        "SELECT id FROM permission WHERE id IN ({})",
        placeholders(wanted.len())
    );
    let mut query = sqlx::query_scalar::<_, i64>(&sql);
    for id in &wanted {
        query = query.bind(*id);
    }
    let found: HashSet<i64> = query.fetch_all(pool).await?.into_iter().collect();

    let mut missing: Vec<i64> = wanted.difference(&found).copied().collect();
    if missing.is_empty() {
        return Ok(());
    }
    missing.sort_unstable();
    Err(RepoError::Validation(format!(
        "Unknown permission ids: {missing:?}"
    )))
}

pub async fn set_active(pool: &SqlitePool, id: i64, is_active: bool) -> RepoResult<Permission> {
    let rows = sqlx::query("UPDATE permission SET is_active = ?, updated_at = ? WHERE id = ?")
        .bind(is_active)
        .bind(now_millis())
        .bind(id)
        .execute(pool)
        .await?;

    if rows.rows_affected() == 0 {
        return Err(RepoError::NotFound(format!("Permission {id} not found")));
    }
    find_by_id(pool, id)
        .await?
        .ok_or_else(|| RepoError::NotFound(format!("Permission {id} not found")))
}

/// Insert the row or refresh its structural fields
///
/// The unique `(route, method)` index decides between the two; `name`,
/// `description` and `is_active` of an existing row are never touched.
/// Both statements run in one transaction.
pub async fn upsert(pool: &SqlitePool, data: &NewPermission) -> RepoResult<UpsertOutcome> {
    let now = now_millis();
    let mut tx = pool.begin().await?;

    let inserted = sqlx::query(
        "INSERT INTO permission (name, description, route, method, category, source, is_active, created_at, updated_at) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, 1, ?7, ?7) \
         ON CONFLICT (route, method) DO NOTHING",
    )
    .bind(&data.name)
    .bind(&data.description)
    .bind(&data.route)
    .bind(data.method)
    .bind(data.category)
    .bind(data.source)
    .bind(now)
    .execute(&mut *tx)
    .await?;

    let outcome = if inserted.rows_affected() == 1 {
        UpsertOutcome::Created
    } else {
        sqlx::query(
            "UPDATE permission SET category = ?, source = ?, updated_at = ? \
             WHERE route = ? AND method = ?",
        )
        .bind(data.category)
        .bind(data.source)
        .bind(now)
        .bind(&data.route)
        .bind(data.method)
        .execute(&mut *tx)
        .await?;
        UpsertOutcome::Updated
    };

    tx.commit().await?;
    Ok(outcome)
}

/// Deactivate active permissions of `source` whose `(route, method)` is not in `keep`
///
/// Rows reconciled from another source are left alone. Returns the number of
/// rows deactivated. Rows are never deleted.
pub async fn deactivate_missing(
    pool: &SqlitePool,
    source: RouteSourceKind,
    keep: &HashSet<(String, HttpMethod)>,
) -> RepoResult<usize> {
    let active = sqlx::query_as::<_, (i64, String, HttpMethod)>(
        "SELECT id, route, method FROM permission WHERE is_active = 1 AND source = ?",
    )
    .bind(source)
    .fetch_all(pool)
    .await?;

    let now = now_millis();
    let mut tx = pool.begin().await?;
    let mut deactivated = 0;
    for (id, route, method) in active {
        if keep.contains(&(route, method)) {
            continue;
        }
        sqlx::query("UPDATE permission SET is_active = 0, updated_at = ? WHERE id = ?")
            .bind(now)
            .bind(id)
            .execute(&mut *tx)
            .await?;
        deactivated += 1;
    }
    tx.commit().await?;
    Ok(deactivated)
}
