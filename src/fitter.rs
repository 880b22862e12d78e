//! Column width fitting from rendered cell content

use crate::column::ColumnDescriptor;
use crate::config::WidthConfig;
use crate::error::Result;
use crate::sink::WorksheetSink;
use crate::types::{CellAddress, Value};

/// Sizes every declared column so its content is not truncated
///
/// The first column also accounts for the indent of each cell. Date columns
/// are measured by their rendering with [`WidthConfig::date_format`].
pub struct ColumnWidthFitter<'a> {
    config: &'a WidthConfig,
}

impl<'a> ColumnWidthFitter<'a> {
    pub fn new(config: &'a WidthConfig) -> Self {
        ColumnWidthFitter { config }
    }

    /// Compute and apply widths, returning them in column order
    pub fn fit<S>(&self, sink: &mut S, columns: &[ColumnDescriptor]) -> Result<Vec<f64>>
    where
        S: WorksheetSink + ?Sized,
    {
        let count = sink.columns().len() as u32;
        let mut widths = Vec::with_capacity(count as usize);

        for col in 1..=count {
            let is_date = columns
                .get(col as usize - 1)
                .is_some_and(|c| c.kind.is_date());
            let width = self.measure_column(&*sink, col, is_date);
            sink.set_column_width(col, width)?;
            widths.push(width);
        }
        Ok(widths)
    }

    fn measure_column<S>(&self, sink: &S, col: u32, is_date: bool) -> f64
    where
        S: WorksheetSink + ?Sized,
    {
        let first = if self.config.include_header {
            1
        } else {
            sink.first_data_row()
        };

        let mut longest = self.config.min_column_width;
        for row in first..=sink.last_row() {
            let Some(cell) = sink.cell(CellAddress::new(row, col)) else {
                continue;
            };
            let mut length = text_length(&self.render(&cell.value, is_date));
            if col == 1 {
                length += self.config.indent_to_width_units(cell.indent);
            }
            longest = longest.max(length);
        }
        longest + self.config.cell_padding
    }

    fn render(&self, value: &Value, is_date: bool) -> String {
        match value {
            Value::Date(date) if is_date => date.format(&self.config.date_format),
            _ => value.as_string(),
        }
    }
}

fn text_length(text: &str) -> f64 {
    text.chars().count() as f64
}

/// Fit the widths of every column of `sink`
pub fn fit_widths<S>(
    sink: &mut S,
    columns: &[ColumnDescriptor],
    config: &WidthConfig,
) -> Result<Vec<f64>>
where
    S: WorksheetSink + ?Sized,
{
    ColumnWidthFitter::new(config).fit(sink, columns)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::ColumnDefinition;
    use crate::types::{record, DateValue, Record};
    use crate::worksheet::Worksheet;
    use chrono::NaiveDate;

    fn sheet(keys: &[&str]) -> Worksheet {
        let mut ws = Worksheet::new("Sheet1");
        ws.set_columns(keys.iter().map(|k| ColumnDefinition::new(k, k)).collect())
            .unwrap();
        ws
    }

    fn descriptors(keys: &[&str]) -> Vec<ColumnDescriptor> {
        keys.iter().map(|k| ColumnDescriptor::new(k, k)).collect()
    }

    #[test]
    fn test_plain_column_floor() {
        let mut ws = sheet(&["id", "v"]);
        for v in ["a", "bb", "ccc"] {
            ws.add_row(&record([("v", v)])).unwrap();
        }
        let widths = fit_widths(&mut ws, &descriptors(&["id", "v"]), &WidthConfig::default())
            .unwrap();
        assert_eq!(widths, vec![12.0, 12.0]);
        assert_eq!(ws.columns()[1].width, Some(12.0));
    }

    #[test]
    fn test_first_column_counts_indent() {
        let mut ws = sheet(&["name"]);
        let root = ws.add_row(&record([("name", "Root")])).unwrap();
        let child = ws.add_row(&record([("name", "Child")])).unwrap();
        ws.cell_mut(CellAddress::new(root, 1)).unwrap().indent = 0;
        ws.cell_mut(CellAddress::new(child, 1)).unwrap().indent = 2;

        let widths = fit_widths(&mut ws, &descriptors(&["name"]), &WidthConfig::default()).unwrap();
        assert_eq!(widths, vec![12.0]);

        // A deep enough indent pushes past the floor: 5 chars + 8 * 1.25
        ws.cell_mut(CellAddress::new(child, 1)).unwrap().indent = 8;
        let widths = fit_widths(&mut ws, &descriptors(&["name"]), &WidthConfig::default()).unwrap();
        assert_eq!(widths, vec![17.0]);
    }

    #[test]
    fn test_exported_tree_column_width() {
        use crate::config::ExportOptions;
        use crate::exporter::export_records;

        let records = vec![
            record([("id", Value::Int(1)), ("parentId", Value::Int(0)), ("name", "Root".into())]),
            record([("id", Value::Int(2)), ("parentId", Value::Int(1)), ("name", "Child".into())]),
        ];
        let columns = descriptors(&["name"]);
        let mut ws = Worksheet::new("Sheet1");
        let summary =
            export_records(&records, &columns, &ExportOptions::default(), None, &mut ws).unwrap();

        // Depth 1 gets indent 2, worth 2.5 width units: "Child" measures 7.5
        assert_eq!(ws.cell_at("A3").unwrap().unwrap().indent, 2);
        let config = WidthConfig::default();
        assert_eq!(config.indent_to_width_units(2), 2.5);
        assert_eq!(summary.column_widths, vec![12.0]);

        // Deep enough to pass the floor: 5 chars at depth 4 is 5 + 10
        let deep: Vec<Record> = (1..=5)
            .map(|id| {
                record([
                    ("id", Value::Int(id)),
                    ("parentId", Value::Int(id - 1)),
                    ("name", Value::from("Child")),
                ])
            })
            .collect();
        let mut ws = Worksheet::new("Sheet1");
        let summary =
            export_records(&deep, &columns, &ExportOptions::default(), None, &mut ws).unwrap();
        assert_eq!(summary.column_widths, vec![17.0]);
    }

    #[test]
    fn test_indent_ignored_outside_first_column() {
        let mut ws = sheet(&["a", "b"]);
        let n = ws.add_row(&record([("b", "xy")])).unwrap();
        ws.cell_mut(CellAddress::new(n, 2)).unwrap().indent = 40;

        let widths = fit_widths(&mut ws, &descriptors(&["a", "b"]), &WidthConfig::default()).unwrap();
        assert_eq!(widths[1], 12.0);
    }

    #[test]
    fn test_long_text_and_monotonicity() {
        let mut ws = sheet(&["text"]);
        ws.add_row(&record([("text", "x".repeat(15))])).unwrap();
        let config = WidthConfig::default();
        let before = fit_widths(&mut ws, &descriptors(&["text"]), &config).unwrap()[0];
        assert_eq!(before, 17.0);

        ws.cell_mut(CellAddress::new(2, 1)).unwrap().value = "x".repeat(16).into();
        let after = fit_widths(&mut ws, &descriptors(&["text"]), &config).unwrap()[0];
        assert!(after >= before);
        assert_eq!(after, 18.0);
    }

    #[test]
    fn test_date_columns_use_date_rendering() {
        let mut ws = sheet(&["name", "due"]);
        let date = NaiveDate::from_ymd_opt(2024, 12, 25)
            .unwrap()
            .and_hms_opt(18, 30, 0)
            .unwrap();
        ws.add_row(&record([("due", Value::from(date))])).unwrap();

        let mut columns = descriptors(&["name"]);
        columns.push(ColumnDescriptor::date("due", "due"));

        let config = WidthConfig {
            date_format: "%A, %B %-d, %Y".to_string(),
            ..WidthConfig::default()
        };
        // "Wednesday, December 25, 2024" is 28 characters
        let widths = fit_widths(&mut ws, &columns, &config).unwrap();
        assert_eq!(widths[1], 30.0);

        // The same value in a plain column is measured as "2024-12-25 18:30:00"
        let widths = fit_widths(&mut ws, &descriptors(&["name", "due"]), &config).unwrap();
        assert_eq!(widths[1], 21.0);
    }

    #[test]
    fn test_invalid_date_rendering() {
        let mut ws = sheet(&["due"]);
        ws.add_row(&record([("due", Value::Date(DateValue::Invalid))]))
            .unwrap();
        let columns = vec![ColumnDescriptor::date("due", "due")];
        let widths = fit_widths(&mut ws, &columns, &WidthConfig::default()).unwrap();
        // "Invalid Date" is 12 characters
        assert_eq!(widths, vec![14.0]);
    }

    #[test]
    fn test_header_excluded_unless_requested() {
        let mut ws = Worksheet::new("Sheet1");
        ws.set_columns(vec![ColumnDefinition::new("A very long caption here", "v")])
            .unwrap();
        let columns = vec![ColumnDescriptor::new("A very long caption here", "v")];

        let widths = fit_widths(&mut ws, &columns, &WidthConfig::default()).unwrap();
        assert_eq!(widths, vec![12.0]);

        let config = WidthConfig {
            include_header: true,
            ..WidthConfig::default()
        };
        let widths = fit_widths(&mut ws, &columns, &config).unwrap();
        assert_eq!(widths, vec![26.0]);
    }

    #[test]
    fn test_counts_characters_not_bytes() {
        let mut ws = sheet(&["v"]);
        ws.add_row(&record([("v", "ééééééééééé")])).unwrap();
        let widths = fit_widths(&mut ws, &descriptors(&["v"]), &WidthConfig::default()).unwrap();
        assert_eq!(widths, vec![13.0]);
    }
}
