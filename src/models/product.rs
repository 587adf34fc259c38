use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, sqlx::FromRow, Serialize, Deserialize)]
pub struct Product {
    pub id: i64,
    pub name: String,
    pub classification: Option<String>,
    pub product_type: Option<String>,
    pub status: String,
    pub tax_rate: f64,
    pub sku: Option<String>,
    pub brand: Option<String>,
    pub price: f64,
    pub quantity: i32,
    pub created_at: DateTime<Utc>,
    pub branch_id: Option<i64>,
    pub unit_net_cost: Option<f64>,
    pub total_net_cost: Option<f64>,
    pub receiving_doc: Option<String>,
}

/// Every mutable product column. Used for inserts and for full overwrites
/// (import upsert, PUT).
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProductFields {
    pub name: String,
    #[serde(default)]
    pub classification: Option<String>,
    #[serde(default)]
    pub product_type: Option<String>,
    #[serde(default = "default_status")]
    pub status: String,
    #[serde(default = "default_tax_rate")]
    pub tax_rate: f64,
    #[serde(default)]
    pub sku: Option<String>,
    #[serde(default)]
    pub brand: Option<String>,
    pub price: f64,
    pub quantity: i32,
    #[serde(default)]
    pub branch_id: Option<i64>,
    #[serde(default)]
    pub unit_net_cost: Option<f64>,
    #[serde(default)]
    pub total_net_cost: Option<f64>,
    #[serde(default)]
    pub receiving_doc: Option<String>,
}

pub const DEFAULT_TAX_RATE: f64 = 19.0;
pub const PRODUCT_ACTIVE: &str = "active";

fn default_status() -> String {
    PRODUCT_ACTIVE.to_string()
}

fn default_tax_rate() -> f64 {
    DEFAULT_TAX_RATE
}

/// Partial update. Absent fields keep their stored value; unknown fields are
/// rejected.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProductPatch {
    pub name: Option<String>,
    pub classification: Option<String>,
    pub product_type: Option<String>,
    pub status: Option<String>,
    pub tax_rate: Option<f64>,
    pub sku: Option<String>,
    pub brand: Option<String>,
    pub price: Option<f64>,
    pub quantity: Option<i32>,
    pub branch_id: Option<i64>,
    pub unit_net_cost: Option<f64>,
    pub total_net_cost: Option<f64>,
    pub receiving_doc: Option<String>,
}

impl Product {
    pub fn apply(&self, patch: ProductPatch) -> ProductFields {
        let current = self.fields();
        ProductFields {
            name: patch.name.unwrap_or(current.name),
            classification: patch.classification.or(current.classification),
            product_type: patch.product_type.or(current.product_type),
            status: patch.status.unwrap_or(current.status),
            tax_rate: patch.tax_rate.unwrap_or(current.tax_rate),
            sku: patch.sku.or(current.sku),
            brand: patch.brand.or(current.brand),
            price: patch.price.unwrap_or(current.price),
            quantity: patch.quantity.unwrap_or(current.quantity),
            branch_id: patch.branch_id.or(current.branch_id),
            unit_net_cost: patch.unit_net_cost.or(current.unit_net_cost),
            total_net_cost: patch.total_net_cost.or(current.total_net_cost),
            receiving_doc: patch.receiving_doc.or(current.receiving_doc),
        }
    }

    /// Copy of the mutable columns.
    pub fn fields(&self) -> ProductFields {
        ProductFields {
            name: self.name.clone(),
            classification: self.classification.clone(),
            product_type: self.product_type.clone(),
            status: self.status.clone(),
            tax_rate: self.tax_rate,
            sku: self.sku.clone(),
            brand: self.brand.clone(),
            price: self.price,
            quantity: self.quantity,
            branch_id: self.branch_id,
            unit_net_cost: self.unit_net_cost,
            total_net_cost: self.total_net_cost,
            receiving_doc: self.receiving_doc.clone(),
        }
    }
}
