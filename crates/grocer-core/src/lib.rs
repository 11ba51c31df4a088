//! Core library for grocery receipt extraction.
//!
//! This crate provides:
//! - Currency-aware money arithmetic with tolerant comparison
//! - Sainsbury's PDF receipt parsing (text layer via lopdf/pdf-extract)
//! - Waitrose order email parsing (MIME body + HTML tables)
//! - Reconciliation of parsed items against the printed totals
//! - Report export as CSV, JSON or spreadsheet rows

pub mod email;
pub mod error;
pub mod export;
pub mod models;
pub mod pdf;
pub mod receipt;

pub use error::{GrocerError, Result};
pub use export::{Cell, CsvSink, JsonSink, ReportSink, RowSink};
pub use models::amount::Amount;
pub use models::config::{ExportFormat, GrocerConfig};
pub use models::item::Item;
pub use models::report::Report;
pub use pdf::{PdfExtractor, PdfProcessor};
pub use receipt::{
    load_receipt, parse_receipt_bytes, ParsedReceipt, ReceiptParser, SainsburysParser, Vendor,
    WaitroseParser,
};
