//! The worksheet abstraction rows are emitted into

use crate::error::Result;
use crate::types::{Cell, CellAddress, Record};

/// A declared worksheet column
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnDefinition {
    /// Header caption
    pub header: String,
    /// Record field the column reads
    pub key: String,
    /// Width in character units, once fitted
    pub width: Option<f64>,
}

impl ColumnDefinition {
    pub fn new(header: &str, key: &str) -> Self {
        ColumnDefinition {
            header: header.to_string(),
            key: key.to_string(),
            width: None,
        }
    }
}

/// Where outline summary rows and columns are rendered
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutlineProperties {
    pub summary_below: bool,
    pub summary_right: bool,
}

impl OutlineProperties {
    /// Summaries above and left of their detail, as tree exports need
    pub const ABOVE_LEFT: OutlineProperties = OutlineProperties {
        summary_below: false,
        summary_right: false,
    };
}

impl Default for OutlineProperties {
    fn default() -> Self {
        OutlineProperties {
            summary_below: true,
            summary_right: true,
        }
    }
}

/// Spreadsheet writer the export drives
///
/// Rows and columns are 1-based. Implementations own serialization; the
/// export only appends rows and sets layout metadata.
pub trait WorksheetSink {
    /// Declare the columns; must happen before any row is appended
    fn set_columns(&mut self, columns: Vec<ColumnDefinition>) -> Result<()>;

    /// Currently declared columns
    fn columns(&self) -> &[ColumnDefinition];

    /// Append a row built from `record` by column key, returning its number
    fn add_row(&mut self, record: &Record) -> Result<u32>;

    /// Set the outline (grouping) level of a row
    fn set_row_outline_level(&mut self, row: u32, level: u32) -> Result<()>;

    /// Look up a cell
    fn cell(&self, address: CellAddress) -> Option<&Cell>;

    /// Mutable access to a cell of an existing row, creating it if blank
    fn cell_mut(&mut self, address: CellAddress) -> Result<&mut Cell>;

    /// Set the width of a declared column
    fn set_column_width(&mut self, col: u32, width: f64) -> Result<()>;

    fn set_outline_properties(&mut self, properties: OutlineProperties);

    /// Number of the first row after the header
    fn first_data_row(&self) -> u32;

    /// Number of the last row, 0 when the sheet is empty
    fn last_row(&self) -> u32;
}
