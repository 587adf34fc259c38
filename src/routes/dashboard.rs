use axum::extract::State;
use axum::Json;

use crate::auth::extractor::Authorized;
use crate::auth::guard::AnyStaff;
use crate::db;
use crate::db::dashboard::{CategoryCount, Metrics};
use crate::error::AppError;
use crate::models::Branch;
use crate::state::SharedState;

pub async fn metrics(
    _auth: Authorized<AnyStaff>,
    State(state): State<SharedState>,
) -> Result<Json<Metrics>, AppError> {
    Ok(Json(db::dashboard::metrics(&state.pool).await?))
}

pub async fn active_branches(
    _auth: Authorized<AnyStaff>,
    State(state): State<SharedState>,
) -> Result<Json<Vec<Branch>>, AppError> {
    Ok(Json(db::branches::list_active(&state.pool).await?))
}

pub async fn categories(
    _auth: Authorized<AnyStaff>,
    State(state): State<SharedState>,
) -> Result<Json<Vec<CategoryCount>>, AppError> {
    Ok(Json(db::dashboard::categories(&state.pool).await?))
}
