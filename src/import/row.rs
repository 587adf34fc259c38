use crate::models::product::{DEFAULT_TAX_RATE, PRODUCT_ACTIVE};
use crate::models::ProductFields;

use super::parser::{Column, RawRow};

/// Turn one raw import row into product fields, or the reason it is rejected.
/// Empty numeric cells count as zero (tax falls back to the default rate);
/// empty optional text becomes NULL.
pub fn normalize(row: &RawRow, default_branch_id: i64) -> Result<ProductFields, String> {
    let sku = row.get(Column::Sku);
    if sku.is_empty() {
        return Err("SKU is empty".to_string());
    }

    let branch_id = match row.get(Column::BranchId) {
        "" => default_branch_id,
        raw => parse_integer(raw).map_err(|_| format!("invalid branch '{raw}'"))?,
    };

    let status = match row.get(Column::Status) {
        "" => PRODUCT_ACTIVE.to_string(),
        s => s.to_lowercase(),
    };

    let tax_rate = match row.get(Column::TaxRate) {
        "" => DEFAULT_TAX_RATE,
        raw => parse_number(raw).map_err(|_| format!("invalid tax '{raw}'"))?,
    };

    Ok(ProductFields {
        name: row.get(Column::Name).to_string(),
        classification: optional_text(row, Column::Classification),
        product_type: optional_text(row, Column::ProductType),
        status,
        tax_rate,
        sku: Some(sku.to_string()),
        brand: optional_text(row, Column::Brand),
        price: number_or_zero(row, Column::Price, "price")?,
        quantity: quantity(row.get(Column::Quantity))?,
        branch_id: Some(branch_id),
        unit_net_cost: optional_number(row, Column::UnitNetCost, "unit net cost")?,
        total_net_cost: optional_number(row, Column::TotalNetCost, "total net cost")?,
        receiving_doc: optional_text(row, Column::ReceivingDoc),
    })
}

fn optional_text(row: &RawRow, column: Column) -> Option<String> {
    match row.get(column) {
        "" => None,
        s => Some(s.to_string()),
    }
}

fn number_or_zero(row: &RawRow, column: Column, label: &str) -> Result<f64, String> {
    match row.get(column) {
        "" => Ok(0.0),
        raw => parse_number(raw).map_err(|_| format!("invalid {label} '{raw}'")),
    }
}

fn optional_number(row: &RawRow, column: Column, label: &str) -> Result<Option<f64>, String> {
    match row.get(column) {
        "" => Ok(None),
        raw => parse_number(raw)
            .map(Some)
            .map_err(|_| format!("invalid {label} '{raw}'")),
    }
}

/// Floor of the numeric value, so "12.0" and "12.7" both give 12.
fn quantity(raw: &str) -> Result<i32, String> {
    if raw.is_empty() {
        return Ok(0);
    }
    let value = parse_number(raw).map_err(|_| format!("invalid quantity '{raw}'"))?;
    let floored = value.floor();
    if floored < i32::MIN as f64 || floored > i32::MAX as f64 {
        return Err(format!("quantity '{raw}' out of range"));
    }
    Ok(floored as i32)
}

fn parse_number(raw: &str) -> Result<f64, ()> {
    match raw.parse::<f64>() {
        Ok(v) if v.is_finite() => Ok(v),
        _ => Err(()),
    }
}

/// Branch ids may arrive as "3" or, from spreadsheets, "3.0".
fn parse_integer(raw: &str) -> Result<i64, ()> {
    if let Ok(v) = raw.parse::<i64>() {
        return Ok(v);
    }
    match parse_number(raw)? {
        v if v.fract() == 0.0 && v.abs() < 9.0e15 => Ok(v as i64),
        _ => Err(()),
    }
}
