use sqlx::PgPool;

use crate::models::ConnectionLog;

pub async fn insert(
    pool: &PgPool,
    user_id: Option<i64>,
    event: &str,
    ip: Option<&str>,
    user_agent: Option<&str>,
    detail: Option<&str>,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO connection_logs (user_id, event, ip, user_agent, detail)
         VALUES ($1, $2, $3, $4, $5)",
    )
    .bind(user_id)
    .bind(event)
    .bind(ip)
    .bind(user_agent)
    .bind(detail)
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn list_recent(pool: &PgPool, limit: i64) -> Result<Vec<ConnectionLog>, sqlx::Error> {
    sqlx::query_as::<_, ConnectionLog>(
        "SELECT * FROM connection_logs ORDER BY created_at DESC, id DESC LIMIT $1",
    )
    .bind(limit)
    .fetch_all(pool)
    .await
}
