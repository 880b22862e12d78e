//! # treesheet
//!
//! Export hierarchical tree-list data into spreadsheet worksheets.
//!
//! ## Features
//!
//! - **Both data shapes**: flat records linked by a parent field, or records
//!   nesting their children
//! - **Outlined rows**: one row per node in pre-order, grouped by depth with
//!   summaries above their detail rows
//! - **Indented first column**: the tree column is indented per level
//! - **Typed cells**: date columns parsed into dates, lookup columns resolved
//!   to display values
//! - **Fitted widths**: every column sized to its longest rendered value
//! - **XLSX output**: in-memory worksheets saved as `.xlsx` files
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use treesheet::column::ColumnDescriptor;
//! use treesheet::component::{MemorySource, TreeList};
//! use treesheet::config::ExportOptions;
//! use treesheet::types::{record, Value};
//! use treesheet::{export_tree_list, Workbook, Worksheet};
//!
//! # async fn run() -> treesheet::Result<()> {
//! let source = MemorySource::new(vec![
//!     record([("id", Value::Int(1)), ("parentId", Value::Int(0)), ("name", "Projects".into())]),
//!     record([("id", Value::Int(2)), ("parentId", Value::Int(1)), ("name", "Website".into())]),
//!     record([("id", Value::Int(3)), ("parentId", Value::Int(2)), ("name", "Launch".into())]),
//! ]);
//! let tree_list = TreeList::new(
//!     source,
//!     vec![
//!         ColumnDescriptor::new("Name", "name"),
//!         ColumnDescriptor::date("Due", "due"),
//!     ],
//!     ExportOptions::default(),
//! );
//!
//! let mut sheet = Worksheet::new("Projects");
//! export_tree_list(&tree_list, &mut sheet).await?;
//!
//! let mut workbook = Workbook::new();
//! workbook.add_worksheet(sheet)?;
//! workbook.save("projects.xlsx")?;
//! # Ok(())
//! # }
//! ```

pub mod adapter;
pub mod column;
pub mod component;
pub mod config;
pub mod emitter;
pub mod error;
pub mod exporter;
pub mod fitter;
pub mod hierarchy;
pub mod sink;
pub mod types;
pub mod worksheet;
pub mod xlsx;

pub use column::{ColumnDescriptor, ColumnKind};
pub use component::{DataSource, MemorySource, TreeList, TreeListComponent};
pub use config::{DataStructure, ExportOptions, ExportOptionsBuilder, WidthConfig};
pub use error::{ExportError, Result};
pub use exporter::{export_records, export_tree_list, ExportSummary};
pub use sink::{ColumnDefinition, OutlineProperties, WorksheetSink};
pub use types::{Cell, CellAddress, DateValue, Record, Value};
pub use worksheet::Worksheet;
pub use xlsx::Workbook;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_library_imports() {
        // Test that all public types are accessible
        let _ = std::marker::PhantomData::<ExportError>;
        let _ = std::marker::PhantomData::<Worksheet>;
        let _ = std::marker::PhantomData::<Workbook>;
        let _ = std::marker::PhantomData::<TreeList<MemorySource>>;
    }
}
