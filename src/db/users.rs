use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::models::{Role, User};

pub async fn create<'e, E: sqlx::PgExecutor<'e>>(
    executor: E,
    email: &str,
    password_hash: &str,
    name: &str,
    role: Role,
    branch_id: Option<i64>,
) -> Result<User, sqlx::Error> {
    sqlx::query_as::<_, User>(
        "INSERT INTO users (email, password_hash, name, role, branch_id)
         VALUES ($1, $2, $3, $4, $5) RETURNING *",
    )
    .bind(email)
    .bind(password_hash)
    .bind(name)
    .bind(role.as_str())
    .bind(branch_id)
    .fetch_one(executor)
    .await
}

pub async fn find_by_email(pool: &PgPool, email: &str) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>("SELECT * FROM users WHERE lower(email) = lower($1)")
        .bind(email)
        .fetch_optional(pool)
        .await
}

pub async fn find_by_id(pool: &PgPool, id: i64) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub async fn count_all<'e, E: sqlx::PgExecutor<'e>>(executor: E) -> Result<i64, sqlx::Error> {
    let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users")
        .fetch_one(executor)
        .await?;
    Ok(row.0)
}

pub async fn list_all(pool: &PgPool) -> Result<Vec<User>, sqlx::Error> {
    sqlx::query_as::<_, User>("SELECT * FROM users ORDER BY id")
        .fetch_all(pool)
        .await
}

/// Overwrite the editable profile columns. Callers merge the patch into the
/// current record first.
pub async fn update_profile(
    pool: &PgPool,
    id: i64,
    name: &str,
    email: &str,
    role: Role,
    branch_id: Option<i64>,
    active: bool,
) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(
        "UPDATE users
         SET name = $2, email = $3, role = $4, branch_id = $5, active = $6, updated_at = now()
         WHERE id = $1 RETURNING *",
    )
    .bind(id)
    .bind(name)
    .bind(email)
    .bind(role.as_str())
    .bind(branch_id)
    .bind(active)
    .fetch_optional(pool)
    .await
}

pub async fn update_password(
    pool: &PgPool,
    id: i64,
    password_hash: &str,
) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE users SET password_hash = $2, updated_at = now() WHERE id = $1")
        .bind(id)
        .bind(password_hash)
        .execute(pool)
        .await?;
    Ok(())
}

/// Store a fresh recovery code, replacing any earlier one.
pub async fn set_recovery_code(
    pool: &PgPool,
    id: i64,
    code: &str,
    expires_at: DateTime<Utc>,
) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE users SET recovery_code = $2, recovery_expires_at = $3 WHERE id = $1")
        .bind(id)
        .bind(code)
        .bind(expires_at)
        .execute(pool)
        .await?;
    Ok(())
}

pub async fn clear_recovery_code(pool: &PgPool, id: i64) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE users SET recovery_code = NULL, recovery_expires_at = NULL WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(())
}

/// New password and cleared recovery state in one statement.
pub async fn reset_password_and_clear_code(
    pool: &PgPool,
    id: i64,
    password_hash: &str,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "UPDATE users
         SET password_hash = $2, recovery_code = NULL, recovery_expires_at = NULL, updated_at = now()
         WHERE id = $1",
    )
    .bind(id)
    .bind(password_hash)
    .execute(pool)
    .await?;
    Ok(())
}
