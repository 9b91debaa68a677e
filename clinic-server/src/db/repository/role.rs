//! Role Repository

use super::{RepoError, RepoResult, permission};
use shared::error::ErrorCode;
use shared::models::{Role, RoleCreate, RoleUpdate};
use shared::util::now_millis;
use sqlx::{SqliteConnection, SqlitePool};
use std::collections::{BTreeSet, HashMap};

const COLUMNS: &str = "id, name, description, is_system, is_active, created_at, updated_at";

/// Attach `permission_ids` from `role_permission`
async fn load_permission_ids(pool: &SqlitePool, roles: &mut [Role]) -> RepoResult<()> {
    let links = sqlx::query_as::<_, (i64, i64)>(
        "SELECT role_id, permission_id FROM role_permission ORDER BY role_id, permission_id",
    )
    .fetch_all(pool)
    .await?;

    let mut by_role: HashMap<i64, Vec<i64>> = HashMap::new();
    for (role_id, permission_id) in links {
        by_role.entry(role_id).or_default().push(permission_id);
    }
    for role in roles.iter_mut() {
        role.permission_ids = by_role.remove(&role.id).unwrap_or_default();
    }
    Ok(())
}

pub async fn find_all(pool: &SqlitePool) -> RepoResult<Vec<Role>> {
    let sql = format!("SELECT {COLUMNS} FROM role WHERE is_active = 1 ORDER BY name");
    let mut roles = sqlx::query_as::<_, Role>(&sql).fetch_all(pool).await?;
    load_permission_ids(pool, &mut roles).await?;
    Ok(roles)
}

pub async fn find_all_with_inactive(pool: &SqlitePool) -> RepoResult<Vec<Role>> {
    let sql = format!("SELECT {COLUMNS} FROM role ORDER BY name");
    let mut roles = sqlx::query_as::<_, Role>(&sql).fetch_all(pool).await?;
    load_permission_ids(pool, &mut roles).await?;
    Ok(roles)
}

pub async fn find_by_id(pool: &SqlitePool, id: i64) -> RepoResult<Option<Role>> {
    let sql = format!("SELECT {COLUMNS} FROM role WHERE id = ?");
    let role = sqlx::query_as::<_, Role>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await?;

    match role {
        Some(mut role) => {
            role.permission_ids = sqlx::query_scalar::<_, i64>(
                "SELECT permission_id FROM role_permission WHERE role_id = ? ORDER BY permission_id",
            )
            .bind(id)
            .fetch_all(pool)
            .await?;
            Ok(Some(role))
        }
        None => Ok(None),
    }
}

pub async fn find_by_name(pool: &SqlitePool, name: &str) -> RepoResult<Option<Role>> {
    let id = sqlx::query_scalar::<_, i64>("SELECT id FROM role WHERE name = ? LIMIT 1")
        .bind(name)
        .fetch_optional(pool)
        .await?;
    match id {
        Some(id) => find_by_id(pool, id).await,
        None => Ok(None),
    }
}

/// Number of users the role is assigned to
async fn count_assignments(conn: &mut SqliteConnection, id: i64) -> RepoResult<i64> {
    let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM user_role WHERE role_id = ?")
        .bind(id)
        .fetch_one(conn)
        .await?;
    Ok(count)
}

/// Fail with `Validation` if any id does not name a role
pub async fn ensure_exist(pool: &SqlitePool, ids: &[i64]) -> RepoResult<()> {
    let mut missing = Vec::new();
    for id in ids.iter().copied().collect::<BTreeSet<_>>() {
        let exists = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM role WHERE id = ?")
            .bind(id)
            .fetch_one(pool)
            .await?;
        if exists == 0 {
            missing.push(id);
        }
    }
    if missing.is_empty() {
        Ok(())
    } else {
        Err(RepoError::Validation(format!("Unknown role ids: {missing:?}")))
    }
}

pub async fn create(pool: &SqlitePool, data: RoleCreate) -> RepoResult<Role> {
    create_with_flag(pool, data, false).await
}

/// Create a role, optionally flagged as system-defined
pub async fn create_with_flag(
    pool: &SqlitePool,
    data: RoleCreate,
    is_system: bool,
) -> RepoResult<Role> {
    let name = data.name.trim().to_string();
    if name.is_empty() {
        return Err(RepoError::Validation("Role name must not be empty".into()));
    }
    if find_by_name(pool, &name).await?.is_some() {
        return Err(RepoError::Business(
            ErrorCode::RoleNameExists,
            format!("Role '{name}' already exists"),
        ));
    }
    permission::ensure_exist(pool, &data.permission_ids).await?;

    let now = now_millis();
    let mut tx = pool.begin().await?;
    let id = sqlx::query_scalar::<_, i64>(
        "INSERT INTO role (name, description, is_system, is_active, created_at, updated_at) \
         VALUES (?, ?, ?, 1, ?, ?) RETURNING id",
    )
    .bind(&name)
    .bind(&data.description)
    .bind(is_system)
    .bind(now)
    .bind(now)
    .fetch_one(&mut *tx)
    .await?;

    for permission_id in data.permission_ids.iter().copied().collect::<BTreeSet<i64>>() {
        sqlx::query("INSERT INTO role_permission (role_id, permission_id) VALUES (?, ?)")
            .bind(id)
            .bind(permission_id)
            .execute(&mut *tx)
            .await?;
    }
    tx.commit().await?;

    find_by_id(pool, id)
        .await?
        .ok_or_else(|| RepoError::Database("Failed to create role".into()))
}

/// Rename, describe or (de)activate a role
///
/// System roles only accept a new description; restating their current
/// name or active flag is allowed.
pub async fn update(pool: &SqlitePool, id: i64, data: RoleUpdate) -> RepoResult<Role> {
    let existing = find_by_id(pool, id)
        .await?
        .ok_or_else(|| RepoError::NotFound(format!("Role {id} not found")))?;

    let name = data.name.map(|n| n.trim().to_string());

    let renames = name.as_deref().is_some_and(|n| n != existing.name);
    let toggles = data.is_active.is_some_and(|a| a != existing.is_active);
    if existing.is_system && (renames || toggles) {
        return Err(RepoError::Business(
            ErrorCode::RoleIsSystem,
            "Cannot rename or deactivate system role".into(),
        ));
    }

    if let Some(name) = &name {
        if name.is_empty() {
            return Err(RepoError::Validation("Role name must not be empty".into()));
        }
        if let Some(other) = find_by_name(pool, name).await?
            && other.id != id
        {
            return Err(RepoError::Business(
                ErrorCode::RoleNameExists,
                format!("Role '{name}' already exists"),
            ));
        }
    }

    sqlx::query(
        "UPDATE role SET name = COALESCE(?1, name), description = COALESCE(?2, description), \
         is_active = COALESCE(?3, is_active), updated_at = ?4 WHERE id = ?5",
    )
    .bind(name)
    .bind(data.description)
    .bind(data.is_active)
    .bind(now_millis())
    .bind(id)
    .execute(pool)
    .await?;

    find_by_id(pool, id)
        .await?
        .ok_or_else(|| RepoError::NotFound(format!("Role {id} not found")))
}

/// Replace the role's permission set
pub async fn set_permissions(
    pool: &SqlitePool,
    id: i64,
    permission_ids: &[i64],
) -> RepoResult<Role> {
    if find_by_id(pool, id).await?.is_none() {
        return Err(RepoError::NotFound(format!("Role {id} not found")));
    }
    permission::ensure_exist(pool, permission_ids).await?;

    let mut tx = pool.begin().await?;
    sqlx::query("DELETE FROM role_permission WHERE role_id = ?")
        .bind(id)
        .execute(&mut *tx)
        .await?;
    for permission_id in permission_ids.iter().copied().collect::<BTreeSet<i64>>() {
        sqlx::query("INSERT INTO role_permission (role_id, permission_id) VALUES (?, ?)")
            .bind(id)
            .bind(permission_id)
            .execute(&mut *tx)
            .await?;
    }
    sqlx::query("UPDATE role SET updated_at = ? WHERE id = ?")
        .bind(now_millis())
        .bind(id)
        .execute(&mut *tx)
        .await?;
    tx.commit().await?;

    find_by_id(pool, id)
        .await?
        .ok_or_else(|| RepoError::NotFound(format!("Role {id} not found")))
}

/// Delete a role
///
/// System roles are never deleted. A role still assigned to users is only
/// deleted with `force`, in which case the assignments cascade away.
pub async fn delete(pool: &SqlitePool, id: i64, force: bool) -> RepoResult<bool> {
    let existing = find_by_id(pool, id)
        .await?
        .ok_or_else(|| RepoError::NotFound(format!("Role {id} not found")))?;

    if existing.is_system {
        return Err(RepoError::Business(
            ErrorCode::RoleIsSystem,
            "Cannot delete system role".into(),
        ));
    }

    let mut tx = pool.begin().await?;
    let assigned = count_assignments(&mut *tx, id).await?;
    if assigned > 0 && !force {
        return Err(RepoError::Business(
            ErrorCode::RoleInUse,
            format!("Role '{}' is assigned to {assigned} user(s)", existing.name),
        ));
    }

    // 不带 force 时，删除语句自身再确认一次没有分配
    let deleted = sqlx::query(
        "DELETE FROM role WHERE id = ?1 \
         AND (?2 OR NOT EXISTS (SELECT 1 FROM user_role WHERE role_id = ?1))",
    )
    .bind(id)
    .bind(force)
    .execute(&mut *tx)
    .await?;
    if deleted.rows_affected() == 0 {
        return Err(RepoError::Business(
            ErrorCode::RoleInUse,
            format!("Role '{}' is assigned to user(s)", existing.name),
        ));
    }
    tx.commit().await?;
    Ok(true)
}
