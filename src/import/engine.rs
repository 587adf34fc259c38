use async_trait::async_trait;
use serde::Serialize;
use sqlx::PgPool;

use crate::db;
use crate::models::ProductFields;

use super::parser::{Column, ParsedRow};
use super::row;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    Inserted,
    Updated,
}

/// Where imported rows land. Each call is one committed unit: a failure
/// leaves nothing behind for that row.
#[async_trait]
pub trait ProductStore: Send + Sync {
    /// Insert the product, or overwrite the one with the same SKU. Returns
    /// the rejection reason when the row cannot be applied.
    async fn upsert_by_sku(&self, fields: &ProductFields) -> Result<UpsertOutcome, String>;
}

pub struct PgProductStore {
    pool: PgPool,
}

impl PgProductStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ProductStore for PgProductStore {
    async fn upsert_by_sku(&self, fields: &ProductFields) -> Result<UpsertOutcome, String> {
        let sku = fields.sku.as_deref().unwrap_or_default();
        let db_err = |e: sqlx::Error| {
            tracing::warn!("Import of SKU {sku} failed: {e}");
            "database error".to_string()
        };

        let mut tx = self.pool.begin().await.map_err(db_err)?;

        if let Some(branch_id) = fields.branch_id {
            if !db::branches::exists(&mut *tx, branch_id).await.map_err(db_err)? {
                return Err(format!("unknown branch {branch_id}"));
            }
        }

        let outcome = match db::products::find_by_sku(&mut *tx, sku).await.map_err(db_err)? {
            Some(existing) => {
                db::products::update(&mut *tx, existing.id, fields)
                    .await
                    .map_err(db_err)?;
                UpsertOutcome::Updated
            }
            None => {
                db::products::create(&mut *tx, fields).await.map_err(db_err)?;
                UpsertOutcome::Inserted
            }
        };

        tx.commit().await.map_err(db_err)?;
        Ok(outcome)
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct RowError {
    pub line: usize,
    pub sku: String,
    pub reason: String,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ImportSummary {
    pub message: String,
    pub inserted: u64,
    pub updated: u64,
    pub rejected: u64,
    pub errors: Vec<RowError>,
}

/// Apply every row in order. A bad row is counted and reported, never fatal.
pub async fn run<S: ProductStore + ?Sized>(
    store: &S,
    rows: &[ParsedRow],
    default_branch_id: i64,
) -> ImportSummary {
    let mut inserted = 0;
    let mut updated = 0;
    let mut errors = Vec::new();

    for parsed in rows {
        let raw = match parsed {
            Ok(raw) => raw,
            Err(unreadable) => {
                errors.push(RowError {
                    line: unreadable.line,
                    sku: unreadable.sku.clone(),
                    reason: unreadable.reason.clone(),
                });
                continue;
            }
        };

        let result = match row::normalize(raw, default_branch_id) {
            Ok(fields) => store.upsert_by_sku(&fields).await,
            Err(reason) => Err(reason),
        };

        match result {
            Ok(UpsertOutcome::Inserted) => inserted += 1,
            Ok(UpsertOutcome::Updated) => updated += 1,
            Err(reason) => errors.push(RowError {
                line: raw.line,
                sku: raw.get(Column::Sku).to_string(),
                reason,
            }),
        }
    }

    let rejected = errors.len() as u64;
    tracing::info!(inserted, updated, rejected, "Product import finished");

    ImportSummary {
        message: format!(
            "Import finished: {inserted} inserted, {updated} updated, {rejected} rejected"
        ),
        inserted,
        updated,
        rejected,
        errors,
    }
}
