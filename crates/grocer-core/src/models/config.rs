//! Configuration structures for parsing and export.

use serde::{Deserialize, Serialize};

use crate::error::GrocerError;
use crate::receipt::Vendor;

/// Main configuration for grocer.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GrocerConfig {
    /// Receipt parsing configuration.
    pub parsing: ParsingConfig,

    /// PDF processing configuration.
    pub pdf: PdfConfig,

    /// Report export configuration.
    pub export: ExportConfig,
}

/// Receipt parsing configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ParsingConfig {
    /// Vendor to assume when it cannot be inferred from the file extension.
    pub default_vendor: Option<Vendor>,
}

/// PDF processing configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PdfConfig {
    /// Minimum extracted text length before a PDF is treated as having no text layer.
    pub min_text_length: usize,
}

impl Default for PdfConfig {
    fn default() -> Self {
        Self {
            min_text_length: 50,
        }
    }
}

/// Output format for reports.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExportFormat {
    /// Two-section CSV, one row per unit.
    #[default]
    Csv,
    /// JSON with unit items and the shared cost.
    Json,
    /// Plain text summary.
    Text,
    /// Spreadsheet rows as JSON arrays.
    Rows,
}

/// Report export configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    /// Default output format.
    pub format: ExportFormat,

    /// CSV field delimiter.
    pub delimiter: char,

    /// Remove commas from item names in CSV output.
    pub strip_name_commas: bool,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            format: ExportFormat::Csv,
            delimiter: ',',
            strip_name_commas: true,
        }
    }
}

impl GrocerConfig {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &std::path::Path) -> Result<Self, std::io::Error> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&content).map_err(|e| {
            std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string())
        })?;
        config
            .validate()
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string()))?;
        Ok(config)
    }

    /// Check values serde cannot check on its own.
    pub fn validate(&self) -> Result<(), GrocerError> {
        if !self.export.delimiter.is_ascii() {
            return Err(GrocerError::Config(format!(
                "CSV delimiter must be ASCII, got {:?}",
                self.export.delimiter
            )));
        }
        Ok(())
    }

    /// Save configuration to a JSON file.
    pub fn save(&self, path: &std::path::Path) -> Result<(), std::io::Error> {
        let content = serde_json::to_string_pretty(self).map_err(|e| {
            std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string())
        })?;
        std::fs::write(path, content)
    }
}
