//! Column metadata supplied by the component

use std::fmt;
use std::sync::Arc;

use crate::types::Value;

/// Maps a raw field value to its display value
pub type LookupResolver = Arc<dyn Fn(&Value) -> Value + Send + Sync>;

/// How values of a column are typed
#[derive(Clone, Default)]
pub enum ColumnKind {
    #[default]
    Plain,
    Date,
    DateTime,
    /// Values are replaced by the resolver's output
    Lookup(LookupResolver),
}

impl ColumnKind {
    pub fn is_date(&self) -> bool {
        matches!(self, ColumnKind::Date | ColumnKind::DateTime)
    }

    pub fn lookup(&self) -> Option<&LookupResolver> {
        match self {
            ColumnKind::Lookup(resolver) => Some(resolver),
            _ => None,
        }
    }
}

impl fmt::Debug for ColumnKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColumnKind::Plain => f.write_str("Plain"),
            ColumnKind::Date => f.write_str("Date"),
            ColumnKind::DateTime => f.write_str("DateTime"),
            ColumnKind::Lookup(_) => f.write_str("Lookup(..)"),
        }
    }
}

/// A visible column: header caption, record field and value kind
#[derive(Debug, Clone)]
pub struct ColumnDescriptor {
    pub caption: String,
    pub data_field: String,
    pub kind: ColumnKind,
}

impl ColumnDescriptor {
    pub fn new(caption: &str, data_field: &str) -> Self {
        ColumnDescriptor {
            caption: caption.to_string(),
            data_field: data_field.to_string(),
            kind: ColumnKind::Plain,
        }
    }

    pub fn date(caption: &str, data_field: &str) -> Self {
        Self::new(caption, data_field).with_kind(ColumnKind::Date)
    }

    pub fn datetime(caption: &str, data_field: &str) -> Self {
        Self::new(caption, data_field).with_kind(ColumnKind::DateTime)
    }

    /// Column whose values are displayed through `resolver`
    pub fn lookup<F>(caption: &str, data_field: &str, resolver: F) -> Self
    where
        F: Fn(&Value) -> Value + Send + Sync + 'static,
    {
        Self::new(caption, data_field).with_kind(ColumnKind::Lookup(Arc::new(resolver)))
    }

    pub fn with_kind(mut self, kind: ColumnKind) -> Self {
        self.kind = kind;
        self
    }
}

/// Columns split by kind, computed once per export
#[derive(Debug, Default)]
pub struct ColumnPartition<'a> {
    pub date_fields: Vec<&'a ColumnDescriptor>,
    pub lookup_fields: Vec<&'a ColumnDescriptor>,
}

impl<'a> ColumnPartition<'a> {
    pub fn new(columns: &'a [ColumnDescriptor]) -> Self {
        ColumnPartition {
            date_fields: columns.iter().filter(|c| c.kind.is_date()).collect(),
            lookup_fields: columns.iter().filter(|c| c.kind.lookup().is_some()).collect(),
        }
    }
}
