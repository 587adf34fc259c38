use std::collections::HashMap;
use std::io::Cursor;

use calamine::{open_workbook_from_rs, Data, Reader, Xlsx};

const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    Csv,
    Xlsx,
}

impl FileKind {
    /// Decide the format from the upload's file name (case-insensitive).
    pub fn from_filename(filename: &str) -> Result<Self, String> {
        let lower = filename.trim().to_lowercase();
        if lower.ends_with(".csv") {
            Ok(FileKind::Csv)
        } else if lower.ends_with(".xlsx") {
            Ok(FileKind::Xlsx)
        } else {
            Err("Only .csv and .xlsx files can be imported".to_string())
        }
    }
}

/// Product columns an import file may carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Column {
    Name,
    Classification,
    ProductType,
    Status,
    TaxRate,
    Sku,
    Brand,
    Price,
    Quantity,
    BranchId,
    UnitNetCost,
    TotalNetCost,
    ReceivingDoc,
}

impl Column {
    /// Map a header cell to a column. Matching ignores case, surrounding
    /// whitespace and accents, and treats spaces like underscores. Covers the
    /// export headers, the snake_case field names and the older Spanish names.
    pub fn from_header(header: &str) -> Option<Self> {
        let key: String = header
            .trim()
            .to_lowercase()
            .chars()
            .map(|c| match c {
                'á' => 'a',
                'é' => 'e',
                'í' => 'i',
                'ó' => 'o',
                'ú' => 'u',
                ' ' | '-' => '_',
                other => other,
            })
            .collect();

        let column = match key.as_str() {
            "name" | "nombre" => Column::Name,
            "classification" | "clasificacion" => Column::Classification,
            "type" | "product_type" | "tipo" | "tipo_producto" => Column::ProductType,
            "status" | "estado" => Column::Status,
            "tax" | "tax_rate" | "impuestos" => Column::TaxRate,
            "sku" | "codigo_sku" => Column::Sku,
            "brand" | "marca" => Column::Brand,
            "price" | "precio" => Column::Price,
            "quantity" | "cantidad" => Column::Quantity,
            "branchid" | "branch_id" | "sucursal_id" => Column::BranchId,
            "unitnetcost" | "unit_net_cost" | "costo_neto_unitario" => Column::UnitNetCost,
            "totalnetcost" | "total_net_cost" | "costo_neto_total" => Column::TotalNetCost,
            "receivingdoc" | "receiving_doc" | "doc_recepcion_ing" => Column::ReceivingDoc,
            _ => return None,
        };
        Some(column)
    }
}

/// One data row, keyed by recognized column. `line` is the 1-based line (or
/// sheet row) number, the header being line 1.
#[derive(Debug, Clone, Default)]
pub struct RawRow {
    pub line: usize,
    pub cells: HashMap<Column, String>,
}

impl RawRow {
    /// The trimmed cell, or `""` when the column or cell is missing.
    pub fn get(&self, column: Column) -> &str {
        self.cells.get(&column).map(|s| s.trim()).unwrap_or("")
    }
}

/// A data row that could not be read as text. It is reported and skipped;
/// the rest of the file still imports.
#[derive(Debug, Clone, PartialEq)]
pub struct UnreadableRow {
    pub line: usize,
    /// Best-effort SKU for the report, lossily decoded.
    pub sku: String,
    pub reason: String,
}

pub type ParsedRow = Result<RawRow, UnreadableRow>;

/// Read every data row of an import file, in file order. Only a missing or
/// unusable header fails the whole file.
pub fn parse(kind: FileKind, data: &[u8]) -> Result<Vec<ParsedRow>, String> {
    match kind {
        FileKind::Csv => parse_csv(data),
        FileKind::Xlsx => parse_xlsx(data),
    }
}

fn parse_csv(data: &[u8]) -> Result<Vec<ParsedRow>, String> {
    let data = data.strip_prefix(UTF8_BOM).unwrap_or(data);

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(data);

    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| format!("Failed to read CSV header: {e}"))?
        .iter()
        .map(str::to_string)
        .collect();
    let columns = map_columns(&headers)?;
    let sku_index = columns.iter().position(|c| *c == Some(Column::Sku));

    let mut rows = Vec::new();
    let mut last_line = 1;
    for result in reader.byte_records() {
        let record = match result {
            Ok(record) => record,
            Err(e) => {
                let line = e
                    .position()
                    .map(|p| p.line() as usize)
                    .unwrap_or(last_line + 1);
                last_line = line;
                rows.push(Err(UnreadableRow {
                    line,
                    sku: String::new(),
                    reason: format!("unreadable CSV record: {e}"),
                }));
                continue;
            }
        };
        let line = record
            .position()
            .map(|p| p.line() as usize)
            .unwrap_or(last_line + 1);
        last_line = line;

        if record.iter().all(|field| field.trim_ascii().is_empty()) {
            continue;
        }

        let mut values = Vec::with_capacity(record.len());
        let mut bad_field = None;
        for (idx, field) in record.iter().enumerate() {
            match std::str::from_utf8(field) {
                Ok(text) => values.push(text.to_string()),
                Err(_) => {
                    bad_field = Some(idx);
                    break;
                }
            }
        }

        match bad_field {
            None => rows.push(Ok(to_row(&columns, line, values))),
            Some(idx) => {
                let column = headers.get(idx).map(String::as_str).unwrap_or("?");
                let sku = sku_index
                    .and_then(|i| record.get(i))
                    .map(|b| String::from_utf8_lossy(b).trim().to_string())
                    .unwrap_or_default();
                rows.push(Err(UnreadableRow {
                    line,
                    sku,
                    reason: format!("column '{column}' is not valid UTF-8 text"),
                }));
            }
        }
    }

    Ok(rows)
}

fn parse_xlsx(data: &[u8]) -> Result<Vec<ParsedRow>, String> {
    let mut workbook: Xlsx<_> = open_workbook_from_rs(Cursor::new(data))
        .map_err(|e| format!("Failed to open XLSX file: {e}"))?;

    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| "XLSX file has no worksheets".to_string())?
        .map_err(|e| format!("Failed to read worksheet: {e}"))?;

    // The range starts at the first used cell, which is the header row.
    let header_line = range.start().map(|(row, _)| row as usize + 1).unwrap_or(1);

    let mut sheet_rows = range.rows();
    let headers: Vec<String> = match sheet_rows.next() {
        Some(header) => header.iter().map(cell_to_string).collect(),
        None => return Err("Import file has no header row".to_string()),
    };
    let columns = map_columns(&headers)?;

    let rows = sheet_rows
        .enumerate()
        .map(|(idx, cells)| (header_line + 1 + idx, cells.iter().map(cell_to_string).collect()))
        .filter(|(_, values): &(usize, Vec<String>)| values.iter().any(|v| !v.trim().is_empty()))
        .map(|(line, values)| Ok(to_row(&columns, line, values)))
        .collect();

    Ok(rows)
}

fn cell_to_string(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.clone(),
        Data::Int(i) => i.to_string(),
        // Whole numbers come back as floats; keep "1001" rather than "1001.0"
        // so numeric SKUs match across formats.
        Data::Float(f) if f.fract() == 0.0 && f.abs() < 1e15 => format!("{}", *f as i64),
        other => other.to_string(),
    }
}

/// Resolve each header cell to a column. The SKU column is mandatory and a
/// column may be named only once.
fn map_columns(headers: &[String]) -> Result<Vec<Option<Column>>, String> {
    let columns: Vec<Option<Column>> = headers.iter().map(|h| Column::from_header(h)).collect();
    if !columns.contains(&Some(Column::Sku)) {
        return Err("Import file must have a SKU column".to_string());
    }

    let mut seen: HashMap<Column, &str> = HashMap::new();
    for (header, column) in headers.iter().zip(&columns) {
        let Some(column) = column else { continue };
        if let Some(first) = seen.insert(*column, header.trim()) {
            return Err(format!(
                "Columns '{first}' and '{}' both map to the same field",
                header.trim()
            ));
        }
    }

    Ok(columns)
}

fn to_row(columns: &[Option<Column>], line: usize, values: Vec<String>) -> RawRow {
    let cells = columns
        .iter()
        .zip(values)
        .filter_map(|(column, value)| column.map(|c| (c, value)))
        .collect();
    RawRow { line, cells }
}
