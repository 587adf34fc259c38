use axum::extract::{Query, State};
use axum::Json;
use serde::Deserialize;

use crate::auth::extractor::Authorized;
use crate::auth::guard::AdminOnly;
use crate::db;
use crate::error::AppError;
use crate::models::ConnectionLog;
use crate::state::SharedState;

#[derive(Deserialize)]
pub struct LogParams {
    pub limit: Option<i64>,
}

/// Newest first.
pub async fn list(
    _auth: Authorized<AdminOnly>,
    State(state): State<SharedState>,
    Query(params): Query<LogParams>,
) -> Result<Json<Vec<ConnectionLog>>, AppError> {
    let limit = params.limit.unwrap_or(200).clamp(1, 1000);
    Ok(Json(db::connection_logs::list_recent(&state.pool, limit).await?))
}
