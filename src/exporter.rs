//! Export orchestration: load, normalize, annotate, emit, fit
//!
//! # Example
//!
//! ```
//! use treesheet::column::ColumnDescriptor;
//! use treesheet::component::{MemorySource, TreeList};
//! use treesheet::config::ExportOptions;
//! use treesheet::exporter::export_tree_list;
//! use treesheet::types::{record, Value};
//! use treesheet::worksheet::Worksheet;
//!
//! # async fn run() -> treesheet::Result<()> {
//! let source = MemorySource::new(vec![
//!     record([("id", Value::Int(1)), ("parentId", Value::Int(0)), ("name", "Root".into())]),
//!     record([("id", Value::Int(2)), ("parentId", Value::Int(1)), ("name", "Child".into())]),
//! ]);
//! let tree_list = TreeList::new(
//!     source,
//!     vec![ColumnDescriptor::new("Name", "name")],
//!     ExportOptions::default(),
//! );
//!
//! let mut sheet = Worksheet::new("Tree");
//! let summary = export_tree_list(&tree_list, &mut sheet).await?;
//! assert_eq!(summary.rows, 2);
//! # Ok(())
//! # }
//! ```

use crate::column::{ColumnDescriptor, ColumnPartition};
use crate::component::{DataSource, TreeListComponent};
use crate::config::ExportOptions;
use crate::emitter::RowEmitter;
use crate::error::Result;
use crate::fitter::ColumnWidthFitter;
use crate::hierarchy::{annotate, Normalizer};
use crate::sink::{ColumnDefinition, OutlineProperties, WorksheetSink};
use crate::types::Record;

/// What an export produced
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExportSummary {
    /// Data rows appended to the worksheet
    pub rows: u32,
    /// Records left out because no root reaches them
    pub dropped_records: usize,
    /// Fitted width of every column, in column order
    pub column_widths: Vec<f64>,
}

/// Hides the loading indicator when the export ends, successfully or not
struct BusyGuard<'a, C: TreeListComponent + ?Sized> {
    component: &'a C,
}

impl<'a, C: TreeListComponent + ?Sized> BusyGuard<'a, C> {
    fn begin(component: &'a C) -> Self {
        component.begin_loading();
        BusyGuard { component }
    }
}

impl<C: TreeListComponent + ?Sized> Drop for BusyGuard<'_, C> {
    fn drop(&mut self) {
        self.component.end_loading();
    }
}

/// Export a tree list component into a worksheet
///
/// Loads the records once, builds the tree, declares the visible columns,
/// appends one row per node in pre-order and fits the column widths. A load
/// failure is returned as is and nothing is written. The export is not
/// atomic: a sink error after the columns are declared leaves them in place.
pub async fn export_tree_list<C, S>(component: &C, worksheet: &mut S) -> Result<ExportSummary>
where
    C: TreeListComponent + ?Sized,
    S: WorksheetSink + ?Sized,
{
    let _busy = BusyGuard::begin(component);

    let source = component.data_source();
    let records = source.load().await?;
    log::debug!("loaded {} records", records.len());

    let columns = component.visible_columns();
    export_records(&records, &columns, component.options(), source.key(), worksheet)
}

/// Export records that are already loaded
///
/// `source_key` is the data source's declared key field, used when the
/// options do not name one.
pub fn export_records<S>(
    records: &[Record],
    columns: &[ColumnDescriptor],
    options: &ExportOptions,
    source_key: Option<&str>,
    worksheet: &mut S,
) -> Result<ExportSummary>
where
    S: WorksheetSink + ?Sized,
{
    options.validate()?;

    let normalizer = Normalizer {
        structure: options.data_structure,
        root_value: &options.root_value,
        parent_field: &options.parent_id_expr,
        key_field: options.resolve_key_expr(source_key),
        items_field: &options.items_expr,
    };
    let (tree, report) = normalizer.normalize(records);
    if report.dropped > 0 {
        log::warn!(
            "{} of {} records are not reachable from root {:?} and were skipped",
            report.dropped,
            records.len(),
            options.root_value
        );
    }

    let rows = annotate(&tree, 0);
    drop(tree);

    worksheet.set_outline_properties(OutlineProperties::ABOVE_LEFT);
    worksheet.set_columns(
        columns
            .iter()
            .map(|c| ColumnDefinition::new(&c.caption, &c.data_field))
            .collect(),
    )?;

    let partition = ColumnPartition::new(columns);
    let emitted = RowEmitter::new(&partition, options.indent_unit).emit_rows(worksheet, &rows)?;
    log::debug!("emitted {} rows across {} columns", emitted, columns.len());

    let column_widths = ColumnWidthFitter::new(&options.widths).fit(worksheet, columns)?;

    log::info!(
        "tree export finished: {} rows, {} records skipped",
        emitted,
        report.dropped
    );
    Ok(ExportSummary {
        rows: emitted,
        dropped_records: report.dropped,
        column_widths,
    })
}
