//! Report sinks: CSV, JSON and spreadsheet rows.

use std::fmt;
use std::io::Write;

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Serialize, Serializer};
use tracing::debug;

use crate::error::{GrocerError, Result};
use crate::models::config::ExportConfig;
use crate::models::report::Report;

/// A spreadsheet cell: text or a number.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Text(String),
    Number(Decimal),
}

impl Cell {
    pub fn text(s: impl Into<String>) -> Self {
        Cell::Text(s.into())
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Text(s) => f.write_str(s),
            Cell::Number(n) => write!(f, "{}", n.normalize()),
        }
    }
}

// Spreadsheet APIs want real numbers, not the string form rust_decimal uses.
impl Serialize for Cell {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            Cell::Text(s) => serializer.serialize_str(s),
            Cell::Number(n) => match n.to_f64() {
                Some(f) => serializer.serialize_f64(f),
                None => serializer.collect_str(n),
            },
        }
    }
}

/// Something that accepts a finished report.
pub trait ReportSink {
    /// Write the report out.
    fn write_report(&mut self, report: &Report) -> Result<()>;
}

/// Writes the two-section CSV layout.
pub struct CsvSink<W: Write> {
    writer: csv::Writer<W>,
    strip_name_commas: bool,
}

impl<W: Write> CsvSink<W> {
    /// Create a sink with the default layout (comma separated, commas stripped from names).
    pub fn new(output: W) -> Self {
        Self::with_config(output, &ExportConfig::default())
    }

    pub fn with_config(output: W, config: &ExportConfig) -> Self {
        // The shared cost row has two columns and the item rows three.
        let writer = csv::WriterBuilder::new()
            .delimiter(config.delimiter as u8)
            .flexible(true)
            .from_writer(output);
        Self {
            writer,
            strip_name_commas: config.strip_name_commas,
        }
    }

    /// Flush and return the underlying writer.
    pub fn into_inner(self) -> Result<W> {
        self.writer
            .into_inner()
            .map_err(|e| GrocerError::Io(e.into_error()))
    }
}

impl<W: Write> ReportSink for CsvSink<W> {
    fn write_report(&mut self, report: &Report) -> Result<()> {
        let rows = report.to_rows()?;
        debug!("Writing {} CSV rows", rows.len());

        for (index, row) in rows.iter().enumerate() {
            let record: Vec<String> = row
                .iter()
                .enumerate()
                .map(|(column, cell)| match cell {
                    // Item names live in the first column below the two header rows.
                    Cell::Text(name) if index >= 2 && column == 0 && self.strip_name_commas => {
                        name.replace(',', "")
                    }
                    other => other.to_string(),
                })
                .collect();
            self.writer.write_record(&record)?;
        }

        self.writer.flush()?;
        Ok(())
    }
}

/// Writes the report as JSON.
pub struct JsonSink<W: Write> {
    output: W,
    pretty: bool,
}

impl<W: Write> JsonSink<W> {
    pub fn new(output: W) -> Self {
        Self {
            output,
            pretty: true,
        }
    }

    pub fn compact(mut self) -> Self {
        self.pretty = false;
        self
    }

    pub fn into_inner(self) -> W {
        self.output
    }
}

impl<W: Write> ReportSink for JsonSink<W> {
    fn write_report(&mut self, report: &Report) -> Result<()> {
        if self.pretty {
            serde_json::to_writer_pretty(&mut self.output, report)?;
        } else {
            serde_json::to_writer(&mut self.output, report)?;
        }
        writeln!(self.output)?;
        Ok(())
    }
}

/// Collects the rows a spreadsheet upload needs.
#[derive(Debug, Default)]
pub struct RowSink {
    rows: Vec<Vec<Cell>>,
}

impl RowSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rows(&self) -> &[Vec<Cell>] {
        &self.rows
    }

    pub fn into_rows(self) -> Vec<Vec<Cell>> {
        self.rows
    }
}

impl ReportSink for RowSink {
    fn write_report(&mut self, report: &Report) -> Result<()> {
        self.rows = report.to_rows()?;
        Ok(())
    }
}
