use sqlx::PgPool;

use crate::models::{Product, ProductFields};

pub async fn list(pool: &PgPool, limit: i64, offset: i64) -> Result<Vec<Product>, sqlx::Error> {
    sqlx::query_as::<_, Product>("SELECT * FROM products ORDER BY id LIMIT $1 OFFSET $2")
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await
}

/// Every product, ordered by id. Used by export.
pub async fn list_all(pool: &PgPool) -> Result<Vec<Product>, sqlx::Error> {
    sqlx::query_as::<_, Product>("SELECT * FROM products ORDER BY id")
        .fetch_all(pool)
        .await
}

pub async fn list_recent(pool: &PgPool, limit: i64) -> Result<Vec<Product>, sqlx::Error> {
    sqlx::query_as::<_, Product>(
        "SELECT * FROM products ORDER BY created_at DESC, id DESC LIMIT $1",
    )
    .bind(limit)
    .fetch_all(pool)
    .await
}

pub async fn list_by_branch(pool: &PgPool, branch_id: i64) -> Result<Vec<Product>, sqlx::Error> {
    sqlx::query_as::<_, Product>("SELECT * FROM products WHERE branch_id = $1 ORDER BY id")
        .bind(branch_id)
        .fetch_all(pool)
        .await
}

pub async fn find_by_id(pool: &PgPool, id: i64) -> Result<Option<Product>, sqlx::Error> {
    sqlx::query_as::<_, Product>("SELECT * FROM products WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub async fn find_by_sku<'e, E: sqlx::PgExecutor<'e>>(
    executor: E,
    sku: &str,
) -> Result<Option<Product>, sqlx::Error> {
    sqlx::query_as::<_, Product>("SELECT * FROM products WHERE sku = $1")
        .bind(sku)
        .fetch_optional(executor)
        .await
}

pub async fn create<'e, E: sqlx::PgExecutor<'e>>(
    executor: E,
    fields: &ProductFields,
) -> Result<Product, sqlx::Error> {
    sqlx::query_as::<_, Product>(
        "INSERT INTO products (name, classification, product_type, status, tax_rate, sku, brand,
                               price, quantity, branch_id, unit_net_cost, total_net_cost, receiving_doc)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13) RETURNING *",
    )
    .bind(&fields.name)
    .bind(&fields.classification)
    .bind(&fields.product_type)
    .bind(&fields.status)
    .bind(fields.tax_rate)
    .bind(&fields.sku)
    .bind(&fields.brand)
    .bind(fields.price)
    .bind(fields.quantity)
    .bind(fields.branch_id)
    .bind(fields.unit_net_cost)
    .bind(fields.total_net_cost)
    .bind(&fields.receiving_doc)
    .fetch_one(executor)
    .await
}

/// Overwrite every mutable column of one product.
pub async fn update<'e, E: sqlx::PgExecutor<'e>>(
    executor: E,
    id: i64,
    fields: &ProductFields,
) -> Result<Option<Product>, sqlx::Error> {
    sqlx::query_as::<_, Product>(
        "UPDATE products
         SET name = $2, classification = $3, product_type = $4, status = $5, tax_rate = $6,
             sku = $7, brand = $8, price = $9, quantity = $10, branch_id = $11,
             unit_net_cost = $12, total_net_cost = $13, receiving_doc = $14
         WHERE id = $1 RETURNING *",
    )
    .bind(id)
    .bind(&fields.name)
    .bind(&fields.classification)
    .bind(&fields.product_type)
    .bind(&fields.status)
    .bind(fields.tax_rate)
    .bind(&fields.sku)
    .bind(&fields.brand)
    .bind(fields.price)
    .bind(fields.quantity)
    .bind(fields.branch_id)
    .bind(fields.unit_net_cost)
    .bind(fields.total_net_cost)
    .bind(&fields.receiving_doc)
    .fetch_optional(executor)
    .await
}

pub async fn delete(pool: &PgPool, id: i64) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM products WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}
