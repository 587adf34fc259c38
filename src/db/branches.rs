use sqlx::PgPool;

use crate::models::{Branch, BranchFields};

pub async fn list(pool: &PgPool) -> Result<Vec<Branch>, sqlx::Error> {
    sqlx::query_as::<_, Branch>("SELECT * FROM branches ORDER BY id")
        .fetch_all(pool)
        .await
}

pub async fn list_active(pool: &PgPool) -> Result<Vec<Branch>, sqlx::Error> {
    sqlx::query_as::<_, Branch>("SELECT * FROM branches WHERE status = 'active' ORDER BY name")
        .fetch_all(pool)
        .await
}

pub async fn find_by_id(pool: &PgPool, id: i64) -> Result<Option<Branch>, sqlx::Error> {
    sqlx::query_as::<_, Branch>("SELECT * FROM branches WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub async fn exists<'e, E: sqlx::PgExecutor<'e>>(executor: E, id: i64) -> Result<bool, sqlx::Error> {
    let row: (bool,) = sqlx::query_as("SELECT EXISTS (SELECT 1 FROM branches WHERE id = $1)")
        .bind(id)
        .fetch_one(executor)
        .await?;
    Ok(row.0)
}

pub async fn create(pool: &PgPool, fields: &BranchFields) -> Result<Branch, sqlx::Error> {
    sqlx::query_as::<_, Branch>(
        "INSERT INTO branches (name, address, city, phone, status, manager)
         VALUES ($1, $2, $3, $4, $5, $6) RETURNING *",
    )
    .bind(&fields.name)
    .bind(&fields.address)
    .bind(&fields.city)
    .bind(&fields.phone)
    .bind(&fields.status)
    .bind(&fields.manager)
    .fetch_one(pool)
    .await
}

pub async fn update(
    pool: &PgPool,
    id: i64,
    fields: &BranchFields,
) -> Result<Option<Branch>, sqlx::Error> {
    sqlx::query_as::<_, Branch>(
        "UPDATE branches
         SET name = $2, address = $3, city = $4, phone = $5, status = $6, manager = $7
         WHERE id = $1 RETURNING *",
    )
    .bind(id)
    .bind(&fields.name)
    .bind(&fields.address)
    .bind(&fields.city)
    .bind(&fields.phone)
    .bind(&fields.status)
    .bind(&fields.manager)
    .fetch_optional(pool)
    .await
}

pub async fn delete(pool: &PgPool, id: i64) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM branches WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

/// Products plus users still pointing at the branch.
pub async fn count_dependents(pool: &PgPool, id: i64) -> Result<i64, sqlx::Error> {
    let row: (i64,) = sqlx::query_as(
        "SELECT (SELECT COUNT(*) FROM products WHERE branch_id = $1)
              + (SELECT COUNT(*) FROM users WHERE branch_id = $1)",
    )
    .bind(id)
    .fetch_one(pool)
    .await?;
    Ok(row.0)
}
