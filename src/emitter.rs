//! Pre-order row emission with outline levels and first-cell indent

use crate::adapter::adapt;
use crate::column::ColumnPartition;
use crate::error::Result;
use crate::hierarchy::{preorder, AnnotatedNode};
use crate::sink::WorksheetSink;
use crate::types::CellAddress;

/// Emits annotated nodes as worksheet rows
pub struct RowEmitter<'a> {
    partition: &'a ColumnPartition<'a>,
    indent_unit: u32,
}

impl<'a> RowEmitter<'a> {
    pub fn new(partition: &'a ColumnPartition<'a>, indent_unit: u32) -> Self {
        RowEmitter {
            partition,
            indent_unit,
        }
    }

    /// Append every node in pre-order and return the number of rows written
    ///
    /// Each row is adapted on a staging copy just before it is appended, so
    /// the tree itself is never modified.
    pub fn emit_rows<S>(&self, sink: &mut S, rows: &[AnnotatedNode]) -> Result<u32>
    where
        S: WorksheetSink + ?Sized,
    {
        let mut emitted = 0;
        for node in preorder(rows) {
            self.emit_row(sink, node)?;
            emitted += 1;
        }
        Ok(emitted)
    }

    fn emit_row<S>(&self, sink: &mut S, node: &AnnotatedNode) -> Result<u32>
    where
        S: WorksheetSink + ?Sized,
    {
        let mut staged = node.record.clone();
        adapt(
            &mut staged,
            &self.partition.date_fields,
            &self.partition.lookup_fields,
        );

        let number = sink.add_row(&staged)?;
        sink.set_row_outline_level(number, node.depth)?;
        let indent = node.depth.saturating_mul(self.indent_unit);
        sink.cell_mut(CellAddress::new(number, 1))?.indent = indent;
        Ok(number)
    }
}

/// Emit `rows` without any date or lookup columns
pub fn emit_rows<S>(sink: &mut S, rows: &[AnnotatedNode], indent_unit: u32) -> Result<u32>
where
    S: WorksheetSink + ?Sized,
{
    let partition = ColumnPartition::default();
    RowEmitter::new(&partition, indent_unit).emit_rows(sink, rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::column::ColumnDescriptor;
    use crate::hierarchy::{annotate, TreeNode};
    use crate::sink::ColumnDefinition;
    use crate::types::{record, DateValue, Value};
    use crate::worksheet::Worksheet;

    fn node(name: &str, items: Vec<TreeNode>) -> TreeNode {
        TreeNode::new(record([("name", name)])).with_items(items)
    }

    fn sheet() -> Worksheet {
        let mut ws = Worksheet::new("Sheet1");
        ws.set_columns(vec![ColumnDefinition::new("Name", "name")])
            .unwrap();
        ws
    }

    #[test]
    fn test_preorder_rows_with_outline() {
        let tree = vec![
            node("A", vec![node("A1", vec![node("A1a", vec![])]), node("A2", vec![])]),
            node("B", vec![]),
        ];
        let rows = annotate(&tree, 0);
        let mut ws = sheet();

        let count = emit_rows(&mut ws, &rows, 2).unwrap();
        assert_eq!(count, 5);

        let emitted: Vec<_> = ws
            .data_rows()
            .iter()
            .map(|r| (r.cells[0].value.as_string(), r.outline_level, r.cells[0].indent))
            .collect();
        assert_eq!(
            emitted,
            vec![
                ("A".to_string(), 0, 0),
                ("A1".to_string(), 1, 2),
                ("A1a".to_string(), 2, 4),
                ("A2".to_string(), 1, 2),
                ("B".to_string(), 0, 0),
            ]
        );
    }

    #[test]
    fn test_adapts_staged_copy_only() {
        let columns = vec![
            ColumnDescriptor::new("Name", "name"),
            ColumnDescriptor::date("Due", "due"),
        ];
        let partition = ColumnPartition::new(&columns);
        let tree = vec![TreeNode::new(record([
            ("name", Value::from("A")),
            ("due", Value::from("bogus")),
        ]))];
        let rows = annotate(&tree, 0);

        let mut ws = Worksheet::new("Sheet1");
        ws.set_columns(vec![
            ColumnDefinition::new("Name", "name"),
            ColumnDefinition::new("Due", "due"),
        ])
        .unwrap();
        RowEmitter::new(&partition, 2).emit_rows(&mut ws, &rows).unwrap();

        assert_eq!(
            ws.cell_at("B2").unwrap().unwrap().value,
            Value::Date(DateValue::Invalid)
        );
        assert_eq!(rows[0].record["due"], Value::from("bogus"));
    }

    #[test]
    fn test_huge_indent_unit_saturates() {
        let tree = vec![node("A", vec![node("B", vec![node("C", vec![])])])];
        let rows = annotate(&tree, 0);
        let mut ws = sheet();

        emit_rows(&mut ws, &rows, u32::MAX).unwrap();

        let indents: Vec<_> = ws.data_rows().iter().map(|r| r.cells[0].indent).collect();
        assert_eq!(indents, vec![0, u32::MAX, u32::MAX]);
    }

    #[test]
    fn test_empty_forest() {
        let mut ws = sheet();
        assert_eq!(emit_rows(&mut ws, &[], 2).unwrap(), 0);
        assert!(ws.data_rows().is_empty());
    }
}
