use serde::Deserialize;

use crate::models::Product;

/// The first twelve columns are the long-standing export layout; the cost
/// and receiving columns follow so an export can be re-imported losslessly.
pub const CSV_HEADERS: [&str; 15] = [
    "ID",
    "Name",
    "Classification",
    "Type",
    "Status",
    "Tax",
    "SKU",
    "Brand",
    "Price",
    "Quantity",
    "BranchID",
    "CreationDate",
    "UnitNetCost",
    "TotalNetCost",
    "ReceivingDoc",
];

pub const EMPTY_TXT: &str = "No products registered.\n";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    #[default]
    Csv,
    Txt,
}

impl ExportFormat {
    pub fn content_type(self) -> &'static str {
        match self {
            ExportFormat::Csv => "text/csv; charset=utf-8",
            ExportFormat::Txt => "text/plain; charset=utf-8",
        }
    }

    pub fn filename(self) -> &'static str {
        match self {
            ExportFormat::Csv => "products.csv",
            ExportFormat::Txt => "inventory.txt",
        }
    }

    pub fn render(self, products: &[Product]) -> Result<Vec<u8>, String> {
        match self {
            ExportFormat::Csv => to_csv(products),
            ExportFormat::Txt => Ok(to_txt(products).into_bytes()),
        }
    }
}

/// Header row plus one record per product. An empty slice still yields the
/// header, so the file can be re-imported.
pub fn to_csv(products: &[Product]) -> Result<Vec<u8>, String> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer
        .write_record(CSV_HEADERS)
        .map_err(|e| format!("CSV write failed: {e}"))?;

    for p in products {
        writer
            .write_record([
                p.id.to_string(),
                p.name.clone(),
                p.classification.clone().unwrap_or_default(),
                p.product_type.clone().unwrap_or_default(),
                p.status.clone(),
                p.tax_rate.to_string(),
                p.sku.clone().unwrap_or_default(),
                p.brand.clone().unwrap_or_default(),
                p.price.to_string(),
                p.quantity.to_string(),
                p.branch_id.map(|b| b.to_string()).unwrap_or_default(),
                p.created_at.format("%Y-%m-%d %H:%M:%S").to_string(),
                p.unit_net_cost.map(|c| c.to_string()).unwrap_or_default(),
                p.total_net_cost.map(|c| c.to_string()).unwrap_or_default(),
                p.receiving_doc.clone().unwrap_or_default(),
            ])
            .map_err(|e| format!("CSV write failed: {e}"))?;
    }

    writer
        .into_inner()
        .map_err(|e| format!("CSV flush failed: {e}"))
}

pub fn to_txt(products: &[Product]) -> String {
    if products.is_empty() {
        return EMPTY_TXT.to_string();
    }

    products
        .iter()
        .map(|p| {
            format!(
                "ID: {} | {} | {} | ${} | Quantity: {}\n",
                p.id,
                p.name,
                p.brand.as_deref().filter(|b| !b.is_empty()).unwrap_or("-"),
                p.price,
                p.quantity
            )
        })
        .collect()
}
