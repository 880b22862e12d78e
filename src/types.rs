//! Type definitions for records, values and worksheet cells

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};
use indexmap::IndexMap;
use std::fmt;

use crate::error::{ExportError, Result};

/// A record loaded from a data source: field name to value, in insertion order
pub type Record = IndexMap<String, Value>;

/// Build a record from `(field, value)` pairs
///
/// # Examples
///
/// ```
/// use treesheet::types::{record, Value};
///
/// let row = record([("id", Value::Int(1)), ("name", "Alpha".into())]);
/// assert_eq!(row["name"], Value::String("Alpha".to_string()));
/// ```
pub fn record<I, K, V>(pairs: I) -> Record
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<Value>,
{
    pairs
        .into_iter()
        .map(|(k, v)| (k.into(), v.into()))
        .collect()
}

/// A date produced by parsing a raw field value
///
/// Parsing never fails: input that cannot be read as a date becomes
/// [`DateValue::Invalid`], which renders as `Invalid Date`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DateValue {
    Valid(NaiveDateTime),
    Invalid,
}

impl DateValue {
    const DATETIME_FORMATS: [&'static str; 4] = [
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%dT%H:%M",
        "%Y/%m/%d %H:%M:%S",
    ];
    const DATE_FORMATS: [&'static str; 3] = ["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y"];

    /// Parse a date from text; RFC 3339 timestamps are normalized to UTC
    pub fn parse_str(s: &str) -> Self {
        let s = s.trim();
        if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
            return DateValue::Valid(dt.naive_utc());
        }
        for fmt in Self::DATETIME_FORMATS {
            if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
                return DateValue::Valid(dt);
            }
        }
        for fmt in Self::DATE_FORMATS {
            if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
                return DateValue::Valid(d.and_time(NaiveTime::MIN));
            }
        }
        DateValue::Invalid
    }

    /// Interpret a number as milliseconds since the Unix epoch
    pub fn from_millis(ms: i64) -> Self {
        DateTime::from_timestamp_millis(ms)
            .map(|dt| DateValue::Valid(dt.naive_utc()))
            .unwrap_or(DateValue::Invalid)
    }

    /// Convert a raw field value the way a date constructor would
    ///
    /// Returns `None` for values that should be left untouched (missing
    /// fields and values that are already dates).
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Empty | Value::Date(_) => None,
            Value::String(s) => Some(Self::parse_str(s)),
            Value::Int(ms) => Some(Self::from_millis(*ms)),
            Value::Float(f) if f.is_finite() => Some(Self::from_millis(f.trunc() as i64)),
            _ => Some(DateValue::Invalid),
        }
    }

    pub fn is_valid(&self) -> bool {
        matches!(self, DateValue::Valid(_))
    }

    /// Render with a chrono format string
    pub fn format(&self, fmt: &str) -> String {
        match self {
            DateValue::Valid(dt) => dt.format(fmt).to_string(),
            DateValue::Invalid => "Invalid Date".to_string(),
        }
    }

    /// Excel serial number (days since 1899-12-30, fraction for time of day)
    pub fn to_excel_serial(&self) -> Option<f64> {
        let DateValue::Valid(dt) = self else {
            return None;
        };
        let epoch = NaiveDate::from_ymd_opt(1899, 12, 30)?.and_time(NaiveTime::MIN);
        let millis = dt.signed_duration_since(epoch).num_milliseconds();
        Some(millis as f64 / 86_400_000.0)
    }
}

/// Key used to match parent references against record keys
///
/// Integers and floats share the numeric variant so `1` matches `1.0`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum IdKey {
    Null,
    Bool(bool),
    Number(u64),
    Text(String),
    Date(i64),
}

/// A dynamically typed field value
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    /// Missing field or empty cell
    #[default]
    Empty,
    /// Explicit null
    Null,
    /// String value
    String(String),
    /// Integer value
    Int(i64),
    /// Float value
    Float(f64),
    /// Boolean value
    Bool(bool),
    /// Date value, possibly the invalid-date sentinel
    Date(DateValue),
    /// Nested records
    Records(Vec<Record>),
}

impl Value {
    /// Plain text rendering used for cell content and width measurement
    pub fn as_string(&self) -> String {
        match self {
            Value::Empty | Value::Null | Value::Records(_) => String::new(),
            Value::String(s) => s.clone(),
            Value::Int(i) => i.to_string(),
            Value::Float(f) => f.to_string(),
            Value::Bool(b) => b.to_string(),
            Value::Date(d) => d.format("%Y-%m-%d %H:%M:%S"),
        }
    }

    /// Check if value is empty
    pub fn is_empty(&self) -> bool {
        matches!(self, Value::Empty)
    }

    /// Hashable identity for parent/key matching
    ///
    /// `None` means the value never matches anything: missing fields, NaN,
    /// invalid dates and nested records.
    pub fn id_key(&self) -> Option<IdKey> {
        match self {
            Value::Empty | Value::Records(_) => None,
            Value::Null => Some(IdKey::Null),
            Value::Bool(b) => Some(IdKey::Bool(*b)),
            Value::Int(i) => Some(IdKey::Number((*i as f64).to_bits())),
            Value::Float(f) if f.is_nan() => None,
            // +0.0 and -0.0 compare equal
            Value::Float(f) => Some(IdKey::Number((*f + 0.0).to_bits())),
            Value::String(s) => Some(IdKey::Text(s.clone())),
            Value::Date(DateValue::Valid(dt)) => {
                Some(IdKey::Date(dt.and_utc().timestamp_millis()))
            }
            Value::Date(DateValue::Invalid) => None,
        }
    }

    /// Strict equality as used for parent matching
    pub fn strict_eq(&self, other: &Value) -> bool {
        match (self.id_key(), other.id_key()) {
            (Some(a), Some(b)) => a == b,
            _ => false,
        }
    }

    /// Try to convert to integer
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            Value::Float(f) => Some(*f as i64),
            Value::String(s) => s.parse().ok(),
            _ => None,
        }
    }

    /// Try to convert to float
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            Value::Int(i) => Some(*i as f64),
            Value::String(s) => s.parse().ok(),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_string())
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Int(i as i64)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<NaiveDateTime> for Value {
    fn from(dt: NaiveDateTime) -> Self {
        Value::Date(DateValue::Valid(dt))
    }
}

impl From<NaiveDate> for Value {
    fn from(d: NaiveDate) -> Self {
        Value::Date(DateValue::Valid(d.and_time(NaiveTime::MIN)))
    }
}

impl From<Vec<Record>> for Value {
    fn from(items: Vec<Record>) -> Self {
        Value::Records(items)
    }
}

#[cfg(feature = "serde")]
impl From<serde_json::Value> for Value {
    fn from(json: serde_json::Value) -> Self {
        use serde_json::Value as Json;
        match json {
            Json::Null => Value::Null,
            Json::Bool(b) => Value::Bool(b),
            Json::Number(n) => match n.as_i64() {
                Some(i) => Value::Int(i),
                None => Value::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            Json::String(s) => Value::String(s),
            Json::Array(items) => Value::Records(
                items
                    .into_iter()
                    .filter_map(|item| match item {
                        Json::Object(map) => Some(record(map)),
                        _ => None,
                    })
                    .collect(),
            ),
            Json::Object(map) => Value::Records(vec![record(map)]),
        }
    }
}

/// Parse a JSON array of objects into records
#[cfg(feature = "serde")]
pub fn records_from_json(json: &str) -> Result<Vec<Record>> {
    let parsed: Vec<serde_json::Map<String, serde_json::Value>> = serde_json::from_str(json)?;
    Ok(parsed.into_iter().map(record).collect())
}

/// 1-based cell address such as `A1` or `AB12`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CellAddress {
    /// Row number (1-based)
    pub row: u32,
    /// Column ordinal (1-based, `A` is 1)
    pub col: u32,
}

impl CellAddress {
    /// Create an address from 1-based row and column
    pub fn new(row: u32, col: u32) -> Self {
        CellAddress { row, col }
    }

    /// Parse an A1-style reference
    pub fn parse(reference: &str) -> Result<Self> {
        let invalid = || ExportError::InvalidCell(reference.to_string());
        let split = reference
            .find(|c: char| c.is_ascii_digit())
            .ok_or_else(invalid)?;
        let (letters, digits) = reference.split_at(split);
        if letters.is_empty() || !letters.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(invalid());
        }

        let mut col: u32 = 0;
        for c in letters.chars() {
            let n = (c.to_ascii_uppercase() as u8 - b'A') as u32 + 1;
            col = col
                .checked_mul(26)
                .and_then(|v| v.checked_add(n))
                .ok_or_else(invalid)?;
        }
        let row: u32 = digits.parse().map_err(|_| invalid())?;
        if row == 0 {
            return Err(invalid());
        }
        Ok(CellAddress { row, col })
    }

    /// Convert a column ordinal to letters (1 -> A, 26 -> Z, 27 -> AA)
    pub fn col_to_letter(col: u32) -> String {
        let mut result = String::new();
        let mut n = col;

        while n > 0 {
            let rem = (n - 1) % 26;
            result.insert(0, (b'A' + rem as u8) as char);
            n = (n - 1) / 26;
        }

        result
    }
}

impl fmt::Display for CellAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", Self::col_to_letter(self.col), self.row)
    }
}

/// A worksheet cell: its value and the alignment indent
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Cell {
    pub value: Value,
    pub indent: u32,
}

impl Cell {
    pub fn new(value: Value) -> Self {
        Cell { value, indent: 0 }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cell_address() {
        assert_eq!(CellAddress::new(1, 1).to_string(), "A1");
        assert_eq!(CellAddress::new(1, 26).to_string(), "Z1");
        assert_eq!(CellAddress::new(7, 27).to_string(), "AA7");

        assert_eq!(CellAddress::parse("A1").unwrap(), CellAddress::new(1, 1));
        assert_eq!(CellAddress::parse("ab12").unwrap(), CellAddress::new(12, 28));
        assert!(CellAddress::parse("12").is_err());
        assert!(CellAddress::parse("A0").is_err());
        assert!(CellAddress::parse("A1B").is_err());
    }

    #[test]
    fn test_strict_equality() {
        assert!(Value::Int(1).strict_eq(&Value::Float(1.0)));
        assert!(Value::Null.strict_eq(&Value::Null));
        assert!(!Value::String("1".into()).strict_eq(&Value::Int(1)));
        assert!(!Value::Empty.strict_eq(&Value::Empty));
        assert!(!Value::Float(f64::NAN).strict_eq(&Value::Float(f64::NAN)));
    }

    #[test]
    fn test_date_parsing() {
        let d = DateValue::parse_str("2024-03-05");
        assert_eq!(d.format("%-m/%-d/%Y"), "3/5/2024");

        let d = DateValue::parse_str("2024-03-05T10:30:00Z");
        assert_eq!(d.format("%H:%M"), "10:30");

        assert_eq!(DateValue::parse_str("not a date"), DateValue::Invalid);
        assert_eq!(DateValue::Invalid.format("%Y"), "Invalid Date");

        assert_eq!(DateValue::from_millis(0).format("%Y-%m-%d"), "1970-01-01");
        assert_eq!(DateValue::from_value(&Value::Empty), None);
        assert_eq!(
            DateValue::from_value(&Value::Bool(true)),
            Some(DateValue::Invalid)
        );
    }

    #[test]
    fn test_excel_serial() {
        let d = DateValue::parse_str("1900-01-01");
        assert_eq!(d.to_excel_serial(), Some(2.0));

        let d = DateValue::parse_str("2024-01-01 12:00:00");
        assert_eq!(d.to_excel_serial(), Some(45292.5));

        assert_eq!(DateValue::Invalid.to_excel_serial(), None);
    }

    #[test]
    fn test_value_rendering() {
        assert_eq!(Value::Float(2.0).as_string(), "2");
        assert_eq!(Value::Float(1.5).as_string(), "1.5");
        assert_eq!(Value::Bool(false).as_string(), "false");
        assert_eq!(Value::Null.as_string(), "");
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_records_from_json() {
        let records =
            records_from_json(r#"[{"id": 1, "name": "A", "items": [{"id": 2}]}]"#).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0]["id"], Value::Int(1));
        match &records[0]["items"] {
            Value::Records(items) => assert_eq!(items[0]["id"], Value::Int(2)),
            other => panic!("unexpected items: {:?}", other),
        }
    }
}
