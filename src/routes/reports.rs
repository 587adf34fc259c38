use axum::body::{to_bytes, Body};
use axum::extract::{Query, State};
use axum::http::{header, HeaderMap};
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;

use crate::auth::extractor::Authorized;
use crate::auth::guard::{AnyStaff, StockManagers};
use crate::db;
use crate::error::AppError;
use crate::import::{engine, parser, upload, ExportFormat, FileKind, ImportSummary, PgProductStore};
use crate::state::SharedState;

#[derive(Deserialize)]
pub struct ExportParams {
    pub format: Option<ExportFormat>,
}

/// Full product dump. An empty inventory still produces a valid file.
pub async fn export(
    _auth: Authorized<AnyStaff>,
    State(state): State<SharedState>,
    Query(params): Query<ExportParams>,
) -> Result<impl IntoResponse, AppError> {
    let format = params.format.unwrap_or_default();
    let products = db::products::list_all(&state.pool).await?;
    let body = format.render(&products).map_err(AppError::Internal)?;

    Ok((
        [
            (header::CONTENT_TYPE, format.content_type().to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", format.filename()),
            ),
        ],
        body,
    ))
}

pub async fn import(
    auth: Authorized<StockManagers>,
    State(state): State<SharedState>,
    headers: HeaderMap,
    body: Body,
) -> Result<Json<ImportSummary>, AppError> {
    let limit = state.config.max_upload_size;
    let body = to_bytes(body, limit).await.map_err(|e| {
        tracing::debug!("Upload body rejected: {e}");
        AppError::PayloadTooLarge(format!("Upload exceeds the {limit} byte limit"))
    })?;

    let file = upload::read_file_field(&headers, body)
        .await
        .map_err(AppError::BadRequest)?;
    let kind = FileKind::from_filename(&file.filename).map_err(AppError::BadRequest)?;
    let rows = parser::parse(kind, &file.data).map_err(AppError::BadRequest)?;

    tracing::info!(
        filename = %file.filename,
        rows = rows.len(),
        by = auth.user.user_id(),
        "Product import started"
    );

    let store = PgProductStore::new(state.pool.clone());
    let summary = engine::run(&store, &rows, state.config.import_default_branch_id).await;
    Ok(Json(summary))
}
