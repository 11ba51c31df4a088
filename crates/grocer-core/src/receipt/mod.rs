//! Receipt parsing for the supported vendors.
//!
//! Each vendor parser scans its document in phases (find the item list, read
//! items, read the order summary) and then reconciles the items against the
//! totals the vendor printed. A parser either returns a report whose numbers
//! add up or fails; it never returns a partial report.

pub mod patterns;
pub mod reconcile;
mod sainsburys;
mod waitrose;

pub use sainsburys::{SainsburysParser, SainsburysSummary};
pub use waitrose::{WaitroseParser, WaitroseSummary};

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::email::extract_html_body;
use crate::error::{GrocerError, Result};
use crate::models::report::Report;
use crate::pdf::{PdfExtractor, PdfProcessor};

/// A parsed receipt: the report plus the figures read from the vendor's summary.
#[derive(Debug, Clone)]
pub struct ParsedReceipt<S> {
    pub report: Report,
    pub summary: S,
    /// Names of the reconciliation checks that held.
    pub checks: Vec<&'static str>,
}

/// Trait for vendor receipt parsers.
pub trait ReceiptParser {
    /// Totals the vendor prints in its order summary.
    type Summary;

    /// Parse the vendor's document (text or HTML) into a reconciled report.
    fn parse(&self, input: &str) -> Result<ParsedReceipt<Self::Summary>>;
}

/// Supported vendors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Vendor {
    /// PDF order confirmations.
    Sainsburys,
    /// HTML order confirmation emails.
    Waitrose,
}

impl Vendor {
    /// Guess the vendor from a file extension: `.pdf` or `.eml`.
    pub fn from_path(path: &Path) -> Option<Self> {
        let extension = path.extension()?.to_str()?.to_lowercase();
        match extension.as_str() {
            "pdf" => Some(Vendor::Sainsburys),
            "eml" => Some(Vendor::Waitrose),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Vendor::Sainsburys => "Sainsbury's",
            Vendor::Waitrose => "Waitrose",
        }
    }
}

/// Parse raw document bytes from a vendor.
///
/// Sainsbury's documents are PDFs whose text layer is parsed; Waitrose
/// documents are MIME messages whose HTML body is parsed.
pub fn parse_receipt_bytes(data: &[u8], vendor: Vendor, min_text_length: usize) -> Result<Report> {
    let report = match vendor {
        Vendor::Sainsburys => {
            let mut extractor = PdfExtractor::new();
            extractor.load(data)?;
            let text = extractor.extract_text_checked(min_text_length)?;
            SainsburysParser::new().parse(&text)?.report
        }
        Vendor::Waitrose => {
            let html = extract_html_body(data)?;
            WaitroseParser::new().parse(&html)?.report
        }
    };
    Ok(report)
}

/// Read a receipt file fully and parse it.
pub fn load_receipt(path: &Path, vendor: Vendor, min_text_length: usize) -> Result<Report> {
    info!("Loading {} receipt from {}", vendor.name(), path.display());
    let data = std::fs::read(path)?;
    if data.is_empty() {
        return Err(GrocerError::Io(std::io::Error::new(
            std::io::ErrorKind::UnexpectedEof,
            format!("{} is empty", path.display()),
        )));
    }
    parse_receipt_bytes(&data, vendor, min_text_length)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vendor_from_path() {
        assert_eq!(
            Vendor::from_path(Path::new("order.PDF")),
            Some(Vendor::Sainsburys)
        );
        assert_eq!(
            Vendor::from_path(Path::new("mail/confirmation.eml")),
            Some(Vendor::Waitrose)
        );
        assert_eq!(Vendor::from_path(Path::new("notes.txt")), None);
        assert_eq!(Vendor::from_path(Path::new("README")), None);
    }

    #[test]
    fn test_vendor_serde() {
        assert_eq!(serde_json::to_string(&Vendor::Sainsburys).unwrap(), "\"sainsburys\"");
        let vendor: Vendor = serde_json::from_str("\"waitrose\"").unwrap();
        assert_eq!(vendor, Vendor::Waitrose);
    }

    #[test]
    fn test_load_missing_file() {
        let err = load_receipt(Path::new("/nonexistent/order.pdf"), Vendor::Sainsburys, 50);
        assert!(matches!(err, Err(GrocerError::Io(_))));
    }

    #[test]
    fn test_load_empty_file() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let err = load_receipt(file.path(), Vendor::Waitrose, 50);
        assert!(matches!(err, Err(GrocerError::Io(_))));
    }
}
