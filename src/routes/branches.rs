use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;
use serde_json::{json, Value};

use crate::auth::extractor::Authorized;
use crate::auth::guard::{AdminOnly, AnyStaff};
use crate::db;
use crate::error::{conflict_on_unique, AppError};
use crate::models::branch::is_valid_status;
use crate::models::{Branch, BranchFields, BranchPatch, Product};
use crate::state::SharedState;

const DUPLICATE_NAME: &str = "A branch with this name already exists";

#[derive(Serialize)]
pub struct BranchInventory {
    pub branch: Branch,
    pub total_products: usize,
    pub inventory: Vec<Product>,
}

fn validate(fields: &BranchFields) -> Result<(), AppError> {
    if fields.name.trim().is_empty() {
        return Err(AppError::BadRequest("Branch name is required".to_string()));
    }
    if !is_valid_status(&fields.status) {
        return Err(AppError::BadRequest(
            "Branch status must be 'active' or 'inactive'".to_string(),
        ));
    }
    Ok(())
}

async fn find(state: &SharedState, id: i64) -> Result<Branch, AppError> {
    db::branches::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Branch not found".to_string()))
}

pub async fn list(
    _auth: Authorized<AnyStaff>,
    State(state): State<SharedState>,
) -> Result<Json<Vec<Branch>>, AppError> {
    Ok(Json(db::branches::list(&state.pool).await?))
}

pub async fn get(
    _auth: Authorized<AnyStaff>,
    State(state): State<SharedState>,
    Path(id): Path<i64>,
) -> Result<Json<Branch>, AppError> {
    Ok(Json(find(&state, id).await?))
}

pub async fn create(
    auth: Authorized<AdminOnly>,
    State(state): State<SharedState>,
    Json(fields): Json<BranchFields>,
) -> Result<(StatusCode, Json<Branch>), AppError> {
    validate(&fields)?;
    let branch = db::branches::create(&state.pool, &fields)
        .await
        .map_err(|e| conflict_on_unique(e, DUPLICATE_NAME))?;

    tracing::info!(branch_id = branch.id, by = auth.user.user_id(), "Branch created");
    Ok((StatusCode::CREATED, Json(branch)))
}

pub async fn update(
    auth: Authorized<AdminOnly>,
    State(state): State<SharedState>,
    Path(id): Path<i64>,
    Json(patch): Json<BranchPatch>,
) -> Result<Json<Branch>, AppError> {
    let fields = find(&state, id).await?.apply(patch);
    validate(&fields)?;

    let branch = db::branches::update(&state.pool, id, &fields)
        .await
        .map_err(|e| conflict_on_unique(e, DUPLICATE_NAME))?
        .ok_or_else(|| AppError::NotFound("Branch not found".to_string()))?;

    tracing::info!(branch_id = id, by = auth.user.user_id(), "Branch updated");
    Ok(Json(branch))
}

/// Branches still referenced by products or users cannot be deleted.
pub async fn delete(
    auth: Authorized<AdminOnly>,
    State(state): State<SharedState>,
    Path(id): Path<i64>,
) -> Result<Json<Value>, AppError> {
    find(&state, id).await?;
    if db::branches::count_dependents(&state.pool, id).await? > 0 {
        return Err(AppError::Conflict(
            "Branch still has products or users assigned".to_string(),
        ));
    }
    db::branches::delete(&state.pool, id).await?;

    tracing::info!(branch_id = id, by = auth.user.user_id(), "Branch deleted");
    Ok(Json(json!({ "message": "Branch deleted" })))
}

pub async fn inventory(
    _auth: Authorized<AnyStaff>,
    State(state): State<SharedState>,
    Path(id): Path<i64>,
) -> Result<Json<BranchInventory>, AppError> {
    let branch = find(&state, id).await?;
    let inventory = db::products::list_by_branch(&state.pool, id).await?;
    Ok(Json(BranchInventory {
        branch,
        total_products: inventory.len(),
        inventory,
    }))
}
