use serde::Serialize;
use sqlx::PgPool;

pub const LOW_STOCK_THRESHOLD: i32 = 5;
pub const NEW_PRODUCT_DAYS: i32 = 30;

#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct Metrics {
    pub low_stock: i64,
    pub active_branches: i64,
    pub total_products: i64,
    pub new_products: i64,
}

#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct CategoryCount {
    pub category: String,
    pub count: i64,
}

pub async fn metrics(pool: &PgPool) -> Result<Metrics, sqlx::Error> {
    sqlx::query_as::<_, Metrics>(
        "SELECT
            (SELECT COUNT(*) FROM products WHERE quantity <= $1) AS low_stock,
            (SELECT COUNT(*) FROM branches WHERE status = 'active') AS active_branches,
            (SELECT COUNT(*) FROM products) AS total_products,
            (SELECT COUNT(*) FROM products
              WHERE created_at >= now() - make_interval(days => $2)) AS new_products",
    )
    .bind(LOW_STOCK_THRESHOLD)
    .bind(NEW_PRODUCT_DAYS)
    .fetch_one(pool)
    .await
}

pub async fn categories(pool: &PgPool) -> Result<Vec<CategoryCount>, sqlx::Error> {
    sqlx::query_as::<_, CategoryCount>(
        "SELECT COALESCE(classification, 'Unclassified') AS category, COUNT(*) AS count
         FROM products
         GROUP BY 1
         ORDER BY count DESC, category",
    )
    .fetch_all(pool)
    .await
}
