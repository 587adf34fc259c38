use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::auth::extractor::Authorized;
use crate::auth::guard::{AnyStaff, StockManagers};
use crate::db;
use crate::error::{conflict_on_unique, AppError};
use crate::models::{Product, ProductFields, ProductPatch};
use crate::state::SharedState;

const DUPLICATE_SKU: &str = "A product with this SKU already exists";

#[derive(Deserialize)]
pub struct ListParams {
    pub skip: Option<i64>,
    pub limit: Option<i64>,
}

#[derive(Deserialize)]
pub struct RecentParams {
    pub limit: Option<i64>,
}

/// Blank SKUs are stored as NULL; other fields are checked before writing.
async fn validate(state: &SharedState, fields: &mut ProductFields) -> Result<(), AppError> {
    fields.sku = fields
        .sku
        .take()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty());

    if fields.name.trim().is_empty() {
        return Err(AppError::BadRequest("Product name is required".to_string()));
    }
    if fields.price < 0.0 || !fields.price.is_finite() {
        return Err(AppError::BadRequest("Price must be a non-negative number".to_string()));
    }
    if let Some(branch_id) = fields.branch_id {
        if !db::branches::exists(&state.pool, branch_id).await? {
            return Err(AppError::BadRequest(format!("Unknown branch {branch_id}")));
        }
    }
    Ok(())
}

pub async fn list(
    _auth: Authorized<AnyStaff>,
    State(state): State<SharedState>,
    Query(params): Query<ListParams>,
) -> Result<Json<Vec<Product>>, AppError> {
    let skip = params.skip.unwrap_or(0).max(0);
    let limit = params.limit.unwrap_or(100).clamp(1, 1000);
    let products = db::products::list(&state.pool, limit, skip).await?;
    Ok(Json(products))
}

pub async fn recent(
    _auth: Authorized<AnyStaff>,
    State(state): State<SharedState>,
    Query(params): Query<RecentParams>,
) -> Result<Json<Vec<Product>>, AppError> {
    let limit = params.limit.unwrap_or(5).clamp(1, 100);
    let products = db::products::list_recent(&state.pool, limit).await?;
    Ok(Json(products))
}

pub async fn get(
    _auth: Authorized<AnyStaff>,
    State(state): State<SharedState>,
    Path(id): Path<i64>,
) -> Result<Json<Product>, AppError> {
    let product = db::products::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Product not found".to_string()))?;
    Ok(Json(product))
}

pub async fn create(
    auth: Authorized<StockManagers>,
    State(state): State<SharedState>,
    Json(mut fields): Json<ProductFields>,
) -> Result<(StatusCode, Json<Product>), AppError> {
    validate(&state, &mut fields).await?;

    let product = db::products::create(&state.pool, &fields)
        .await
        .map_err(|e| conflict_on_unique(e, DUPLICATE_SKU))?;

    tracing::info!(product_id = product.id, by = auth.user.user_id(), "Product created");
    Ok((StatusCode::CREATED, Json(product)))
}

pub async fn update(
    auth: Authorized<StockManagers>,
    State(state): State<SharedState>,
    Path(id): Path<i64>,
    Json(patch): Json<ProductPatch>,
) -> Result<Json<Product>, AppError> {
    let current = db::products::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Product not found".to_string()))?;

    let mut fields = current.apply(patch);
    validate(&state, &mut fields).await?;

    let product = db::products::update(&state.pool, id, &fields)
        .await
        .map_err(|e| conflict_on_unique(e, DUPLICATE_SKU))?
        .ok_or_else(|| AppError::NotFound("Product not found".to_string()))?;

    tracing::info!(product_id = id, by = auth.user.user_id(), "Product updated");
    Ok(Json(product))
}

pub async fn delete(
    auth: Authorized<StockManagers>,
    State(state): State<SharedState>,
    Path(id): Path<i64>,
) -> Result<Json<Value>, AppError> {
    if !db::products::delete(&state.pool, id).await? {
        return Err(AppError::NotFound("Product not found".to_string()));
    }
    tracing::info!(product_id = id, by = auth.user.user_id(), "Product deleted");
    Ok(Json(json!({ "message": "Product deleted" })))
}

/// Column descriptors for clients building product forms.
pub async fn schema(_auth: Authorized<AnyStaff>) -> Json<Value> {
    Json(json!([
        { "name": "name", "type": "string", "required": true },
        { "name": "classification", "type": "string", "required": false },
        { "name": "product_type", "type": "string", "required": false },
        { "name": "status", "type": "string", "required": false, "default": "active" },
        { "name": "tax_rate", "type": "number", "required": false, "default": 19.0 },
        { "name": "sku", "type": "string", "required": false, "unique": true },
        { "name": "brand", "type": "string", "required": false },
        { "name": "price", "type": "number", "required": true },
        { "name": "quantity", "type": "integer", "required": true },
        { "name": "branch_id", "type": "integer", "required": false },
        { "name": "unit_net_cost", "type": "number", "required": false },
        { "name": "total_net_cost", "type": "number", "required": false },
        { "name": "receiving_doc", "type": "string", "required": false },
    ]))
}
