//! In-memory worksheet implementing [`WorksheetSink`]

use crate::error::{ExportError, Result};
use crate::sink::{ColumnDefinition, OutlineProperties, WorksheetSink};
use crate::types::{Cell, CellAddress, Record};

/// A row held by the in-memory worksheet
#[derive(Debug, Clone, PartialEq)]
pub struct WorksheetRow {
    /// Row number (1-based)
    pub number: u32,
    pub outline_level: u32,
    pub cells: Vec<Cell>,
}

impl WorksheetRow {
    fn new(number: u32, cells: Vec<Cell>) -> Self {
        WorksheetRow {
            number,
            outline_level: 0,
            cells,
        }
    }
}

/// Worksheet kept entirely in memory until it is saved
///
/// Declaring columns with at least one non-empty caption writes a header
/// row, so data rows then start at row 2.
///
/// # Examples
///
/// ```
/// use treesheet::sink::{ColumnDefinition, WorksheetSink};
/// use treesheet::types::{record, CellAddress, Value};
/// use treesheet::worksheet::Worksheet;
///
/// let mut sheet = Worksheet::new("Tasks");
/// sheet.set_columns(vec![ColumnDefinition::new("Name", "name")]).unwrap();
///
/// let row = sheet.add_row(&record([("name", "Alpha")])).unwrap();
/// assert_eq!(row, 2);
/// assert_eq!(sheet.cell(CellAddress::new(2, 1)).unwrap().value, Value::from("Alpha"));
/// ```
#[derive(Debug, Clone)]
pub struct Worksheet {
    name: String,
    columns: Vec<ColumnDefinition>,
    rows: Vec<WorksheetRow>,
    header_rows: u32,
    outline: OutlineProperties,
}

impl Worksheet {
    pub fn new(name: &str) -> Self {
        Worksheet {
            name: name.to_string(),
            columns: Vec::new(),
            rows: Vec::new(),
            header_rows: 0,
            outline: OutlineProperties::default(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn rows(&self) -> &[WorksheetRow] {
        &self.rows
    }

    /// Get a row by its 1-based number
    pub fn row(&self, number: u32) -> Option<&WorksheetRow> {
        let idx = number.checked_sub(1)? as usize;
        self.rows.get(idx)
    }

    /// Data rows, excluding the header
    pub fn data_rows(&self) -> &[WorksheetRow] {
        &self.rows[self.header_rows as usize..]
    }

    pub fn outline_properties(&self) -> OutlineProperties {
        self.outline
    }

    /// Look up a cell by A1-style reference
    pub fn cell_at(&self, reference: &str) -> Result<Option<&Cell>> {
        Ok(self.cell(CellAddress::parse(reference)?))
    }

    /// Deepest outline level of any row
    pub fn max_outline_level(&self) -> u32 {
        self.rows.iter().map(|r| r.outline_level).max().unwrap_or(0)
    }

    fn row_mut(&mut self, number: u32) -> Option<&mut WorksheetRow> {
        let idx = number.checked_sub(1)? as usize;
        self.rows.get_mut(idx)
    }
}

impl WorksheetSink for Worksheet {
    fn set_columns(&mut self, columns: Vec<ColumnDefinition>) -> Result<()> {
        if self.rows.len() as u32 > self.header_rows {
            return Err(ExportError::WriteError(format!(
                "columns of sheet '{}' must be declared before rows are added",
                self.name
            )));
        }

        self.rows.clear();
        self.header_rows = 0;
        if columns.iter().any(|c| !c.header.is_empty()) {
            let cells = columns
                .iter()
                .map(|c| Cell::new(c.header.as_str().into()))
                .collect();
            self.rows.push(WorksheetRow::new(1, cells));
            self.header_rows = 1;
        }
        self.columns = columns;
        Ok(())
    }

    fn columns(&self) -> &[ColumnDefinition] {
        &self.columns
    }

    fn add_row(&mut self, record: &Record) -> Result<u32> {
        let number = self.rows.len() as u32 + 1;
        let cells = self
            .columns
            .iter()
            .map(|c| Cell::new(record.get(&c.key).cloned().unwrap_or_default()))
            .collect();
        self.rows.push(WorksheetRow::new(number, cells));
        Ok(number)
    }

    fn set_row_outline_level(&mut self, row: u32, level: u32) -> Result<()> {
        let sheet = self.name.clone();
        let target = self.row_mut(row).ok_or_else(|| ExportError::WriteRowError {
            row,
            sheet,
            source: Box::new(ExportError::InvalidCell(format!("row {} does not exist", row))),
        })?;
        target.outline_level = level;
        Ok(())
    }

    fn cell(&self, address: CellAddress) -> Option<&Cell> {
        let col = address.col.checked_sub(1)? as usize;
        self.row(address.row)?.cells.get(col)
    }

    fn cell_mut(&mut self, address: CellAddress) -> Result<&mut Cell> {
        let invalid = || ExportError::InvalidCell(address.to_string());
        let col = address.col.checked_sub(1).ok_or_else(invalid)? as usize;
        let row = self.row_mut(address.row).ok_or_else(invalid)?;
        if row.cells.len() <= col {
            row.cells.resize_with(col + 1, Cell::default);
        }
        Ok(&mut row.cells[col])
    }

    fn set_column_width(&mut self, col: u32, width: f64) -> Result<()> {
        let column = col
            .checked_sub(1)
            .and_then(|idx| self.columns.get_mut(idx as usize))
            .ok_or_else(|| {
                ExportError::InvalidCell(format!("column {}", CellAddress::col_to_letter(col)))
            })?;
        column.width = Some(width);
        Ok(())
    }

    fn set_outline_properties(&mut self, properties: OutlineProperties) {
        self.outline = properties;
    }

    fn first_data_row(&self) -> u32 {
        self.header_rows + 1
    }

    fn last_row(&self) -> u32 {
        self.rows.len() as u32
    }
}
