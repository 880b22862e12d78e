//! Collaborators the export reads from: data source and tree list component

use std::future::Future;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

use crate::column::ColumnDescriptor;
use crate::config::ExportOptions;
use crate::error::Result;
use crate::types::Record;

/// Asynchronous provider of the records to export
///
/// Retries, paging and caching are the source's business; the export calls
/// [`DataSource::load`] exactly once and propagates its error unchanged.
pub trait DataSource {
    /// Load all records
    fn load(&self) -> impl Future<Output = Result<Vec<Record>>> + Send;

    /// Key field declared by the source, used when no key option is set
    fn key(&self) -> Option<&str> {
        None
    }
}

/// Data source over records already in memory
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    records: Vec<Record>,
    key: Option<String>,
}

impl MemorySource {
    pub fn new(records: Vec<Record>) -> Self {
        MemorySource { records, key: None }
    }

    /// Declare the key field of the records
    pub fn with_key(mut self, key: &str) -> Self {
        self.key = Some(key.to_string());
        self
    }

    /// Build a source from a JSON array of objects
    #[cfg(feature = "serde")]
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(Self::new(crate::types::records_from_json(json)?))
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }
}

impl DataSource for MemorySource {
    fn load(&self) -> impl Future<Output = Result<Vec<Record>>> + Send {
        let records = self.records.clone();
        async move { Ok(records) }
    }

    fn key(&self) -> Option<&str> {
        self.key.as_deref()
    }
}

/// The UI component being exported
///
/// Supplies the data source, the resolved visible columns, the export options
/// and a busy indicator toggled around the export.
pub trait TreeListComponent {
    type Source: DataSource;

    fn data_source(&self) -> &Self::Source;

    /// Visible columns in display order, with type and lookup metadata
    fn visible_columns(&self) -> Vec<ColumnDescriptor>;

    fn options(&self) -> &ExportOptions;

    /// Show the loading indicator
    fn begin_loading(&self) {}

    /// Hide the loading indicator
    fn end_loading(&self) {}
}

/// Ready-made component holding its source, columns and options
///
/// # Examples
///
/// ```
/// use treesheet::component::{MemorySource, TreeList, TreeListComponent};
/// use treesheet::column::ColumnDescriptor;
/// use treesheet::config::ExportOptions;
///
/// let tree_list = TreeList::new(
///     MemorySource::default(),
///     vec![ColumnDescriptor::new("Name", "name")],
///     ExportOptions::default(),
/// );
/// assert!(!tree_list.is_loading());
/// assert_eq!(tree_list.visible_columns().len(), 1);
/// ```
#[derive(Debug)]
pub struct TreeList<S> {
    source: S,
    columns: Vec<ColumnDescriptor>,
    options: ExportOptions,
    loading: AtomicBool,
    loading_shown: AtomicU32,
}

impl<S: DataSource> TreeList<S> {
    pub fn new(source: S, columns: Vec<ColumnDescriptor>, options: ExportOptions) -> Self {
        TreeList {
            source,
            columns,
            options,
            loading: AtomicBool::new(false),
            loading_shown: AtomicU32::new(0),
        }
    }

    /// Whether the loading indicator is currently shown
    pub fn is_loading(&self) -> bool {
        self.loading.load(Ordering::SeqCst)
    }

    /// How many times the loading indicator has been shown
    pub fn loading_shown(&self) -> u32 {
        self.loading_shown.load(Ordering::SeqCst)
    }
}

impl<S: DataSource> TreeListComponent for TreeList<S> {
    type Source = S;

    fn data_source(&self) -> &S {
        &self.source
    }

    fn visible_columns(&self) -> Vec<ColumnDescriptor> {
        self.columns.clone()
    }

    fn options(&self) -> &ExportOptions {
        &self.options
    }

    fn begin_loading(&self) {
        self.loading.store(true, Ordering::SeqCst);
        self.loading_shown.fetch_add(1, Ordering::SeqCst);
    }

    fn end_loading(&self) {
        self.loading.store(false, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::record;

    #[tokio::test]
    async fn test_memory_source() {
        let source = MemorySource::new(vec![record([("id", 1)])]).with_key("id");
        let records = source.load().await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(source.key(), Some("id"));
    }

    #[test]
    fn test_loading_indicator() {
        let tree_list = TreeList::new(MemorySource::default(), vec![], ExportOptions::default());
        tree_list.begin_loading();
        assert!(tree_list.is_loading());
        tree_list.end_loading();
        assert!(!tree_list.is_loading());
        assert_eq!(tree_list.loading_shown(), 1);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_source_from_json() {
        let source = MemorySource::from_json(r#"[{"id": 1, "parentId": 0}]"#).unwrap();
        assert_eq!(source.records().len(), 1);
    }
}
