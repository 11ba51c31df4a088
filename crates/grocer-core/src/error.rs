//! Error types for the grocer-core library.

use thiserror::Error;

/// Main error type for the grocer library.
#[derive(Error, Debug)]
pub enum GrocerError {
    /// Amount arithmetic or construction error.
    #[error("amount error: {0}")]
    Amount(#[from] AmountError),

    /// Receipt text/HTML did not have the expected shape.
    #[error("parse error: {0}")]
    Parse(#[from] ParseError),

    /// Derived totals disagree with the totals printed on the receipt.
    #[error("reconciliation error: {0}")]
    Reconciliation(#[from] ReconciliationError),

    /// PDF processing error.
    #[error("PDF error: {0}")]
    Pdf(#[from] PdfError),

    /// Email (MIME) processing error.
    #[error("email error: {0}")]
    Email(String),

    /// CSV export error.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// JSON export error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

/// Errors raised by [`Amount`](crate::models::amount::Amount) operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AmountError {
    /// Arithmetic or comparison between two distinct, non-null currencies.
    #[error("different currencies: {} vs {}", .left.as_deref().unwrap_or("<none>"), .right.as_deref().unwrap_or("<none>"))]
    DifferentCurrency {
        left: Option<String>,
        right: Option<String>,
    },

    /// Division of an amount by zero.
    #[error("division by zero")]
    DivisionByZero,

    /// The result does not fit in a decimal.
    #[error("amount overflow")]
    Overflow,

    /// The text is not a currency amount.
    #[error("not a currency amount: {0:?}")]
    Malformed(String),
}

/// Errors related to the shape of receipt input.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// A section marker was never found.
    #[error("missing section: {0}")]
    MissingSection(String),

    /// A line did not fit the phase it appeared in.
    #[error("unexpected line in {phase}: {line:?}")]
    UnexpectedLine { phase: &'static str, line: String },

    /// A summary label is not one the parser knows about.
    #[error("unknown label in {phase}: {label:?}")]
    UnknownLabel { phase: &'static str, label: String },

    /// Text expected to be an amount was not.
    #[error("malformed amount in {phase}: {text:?}")]
    MalformedAmount { phase: &'static str, text: String },

    /// A table or row had the wrong number of rows/cells.
    #[error("unexpected shape in {phase}: {reason}")]
    RowShape { phase: &'static str, reason: String },

    /// A required summary field was never read.
    #[error("missing required field: {0}")]
    MissingField(&'static str),

    /// Input ended while a phase was still in progress.
    #[error("unexpected end of input in {0}")]
    UnexpectedEnd(&'static str),

    /// Quantity was not a positive integer.
    #[error("invalid quantity {qty:?} for {name:?}")]
    InvalidQuantity { name: String, qty: String },
}

/// A reconciliation check that did not hold.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{check}: receipt says {declared}, items add up to {derived}")]
pub struct ReconciliationError {
    /// Name of the identity that failed.
    pub check: &'static str,
    /// Figure printed on the receipt.
    pub declared: String,
    /// Figure derived from parsed items.
    pub derived: String,
}

/// Errors related to PDF processing.
#[derive(Error, Debug)]
pub enum PdfError {
    /// Failed to open/parse the PDF file.
    #[error("failed to parse PDF: {0}")]
    Parse(String),

    /// Failed to extract text from PDF.
    #[error("failed to extract text: {0}")]
    TextExtraction(String),

    /// The PDF is encrypted and cannot be processed.
    #[error("PDF is encrypted")]
    Encrypted,

    /// The PDF is empty or has no pages.
    #[error("PDF has no pages")]
    NoPages,
}

/// Result type for the grocer library.
pub type Result<T> = std::result::Result<T, GrocerError>;
