//! Per-row cell value adaptation for date and lookup columns

use crate::column::ColumnDescriptor;
use crate::types::{DateValue, Record, Value};

/// Rewrite date and lookup fields of a staged row in place
///
/// Date columns are converted first, lookups second, so a field configured
/// as both ends up with the lookup result. Lookup results are stored as
/// returned.
///
/// Date policy: a missing date field stays missing and a value that is
/// already a date is kept. Text is parsed, numbers are epoch milliseconds,
/// and anything else (`Null`, booleans, nested records, unparseable text)
/// becomes [`DateValue::Invalid`].
pub fn adapt(
    row: &mut Record,
    date_fields: &[&ColumnDescriptor],
    lookup_fields: &[&ColumnDescriptor],
) {
    for column in date_fields {
        if let Some(value) = row.get_mut(&column.data_field) {
            if let Some(date) = DateValue::from_value(value) {
                *value = Value::Date(date);
            }
        }
    }

    for column in lookup_fields {
        let Some(resolver) = column.kind.lookup() else {
            continue;
        };
        let raw = row.get(&column.data_field).cloned().unwrap_or_default();
        row.insert(column.data_field.clone(), resolver(&raw));
    }
}
