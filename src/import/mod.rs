//! Bulk product import (CSV/XLSX) and export (CSV/TXT).

pub mod engine;
pub mod export;
pub mod parser;
pub mod row;
pub mod upload;

pub use engine::{ImportSummary, PgProductStore, ProductStore, RowError, UpsertOutcome};
pub use export::ExportFormat;
pub use parser::{Column, FileKind, ParsedRow, RawRow, UnreadableRow};
