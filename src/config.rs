//! Export options and column-width tuning

use crate::error::{ExportError, Result};
use crate::types::Value;
use crate::xlsx::styles::MAX_INDENT;

/// Shape of the records delivered by the data source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum DataStructure {
    /// Flat records linked by a parent-reference field
    #[default]
    Plain,
    /// Records already nested through an items field
    Tree,
}

/// Constants used by the column width fitter
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct WidthConfig {
    /// Lower bound for the measured content length
    pub min_column_width: f64,
    /// Added to every column after measuring
    pub cell_padding: f64,
    /// Screen pixels per indent step
    pub pixels_per_indent: f64,
    /// Screen pixels per column width unit
    pub pixels_per_width_unit: f64,
    /// chrono format used to render date columns for measurement
    pub date_format: String,
    /// Measure the header row as well as the data rows
    pub include_header: bool,
}

impl WidthConfig {
    /// Convert a cell indent into column width units
    pub fn indent_to_width_units(&self, indent: u32) -> f64 {
        indent as f64 * self.pixels_per_indent / self.pixels_per_width_unit
    }

    /// Width given to a column with no content
    pub fn floor(&self) -> f64 {
        self.min_column_width + self.cell_padding
    }
}

impl Default for WidthConfig {
    fn default() -> Self {
        WidthConfig {
            min_column_width: 10.0,
            cell_padding: 2.0,
            pixels_per_indent: 10.0,
            pixels_per_width_unit: 8.0,
            date_format: "%-m/%-d/%Y".to_string(),
            include_header: false,
        }
    }
}

/// Options recognized by the tree export
///
/// # Examples
///
/// ```
/// use treesheet::config::{DataStructure, ExportOptions};
///
/// let options = ExportOptions::builder()
///     .root_value(0)
///     .parent_id_expr("parent")
///     .key_expr("id")
///     .data_structure(DataStructure::Plain)
///     .build();
///
/// assert_eq!(options.parent_id_expr, "parent");
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct ExportOptions {
    /// Parent reference that marks a top-level record
    pub root_value: Value,
    /// Field holding the parent reference
    pub parent_id_expr: String,
    /// Field holding the unique key; falls back to the data source's key
    pub key_expr: Option<String>,
    /// Field holding nested children in tree mode
    pub items_expr: String,
    pub data_structure: DataStructure,
    /// Indent steps applied to the first cell per depth level
    pub indent_unit: u32,
    pub widths: WidthConfig,
}

impl ExportOptions {
    /// Key field used when neither the options nor the source declare one
    pub const DEFAULT_KEY_EXPR: &'static str = "id";

    pub fn builder() -> ExportOptionsBuilder {
        ExportOptionsBuilder::new()
    }

    /// Resolve the key field: explicit option, then the source's key, then `id`
    pub fn resolve_key_expr<'a>(&'a self, source_key: Option<&'a str>) -> &'a str {
        self.key_expr
            .as_deref()
            .or(source_key)
            .unwrap_or(Self::DEFAULT_KEY_EXPR)
    }

    /// Reject options the export cannot work with
    pub fn validate(&self) -> Result<()> {
        match self.data_structure {
            DataStructure::Plain if self.parent_id_expr.is_empty() => {
                return Err(ExportError::InvalidConfig(
                    "parent_id_expr must name a field for plain data".to_string(),
                ));
            }
            DataStructure::Tree if self.items_expr.is_empty() => {
                return Err(ExportError::InvalidConfig(
                    "items_expr must name a field for tree data".to_string(),
                ));
            }
            _ => {}
        }

        if self.indent_unit > MAX_INDENT {
            return Err(ExportError::InvalidConfig(format!(
                "indent_unit must be at most {}, got {}",
                MAX_INDENT, self.indent_unit
            )));
        }

        let widths = &self.widths;
        if !(widths.pixels_per_width_unit.is_finite() && widths.pixels_per_width_unit > 0.0) {
            return Err(ExportError::InvalidConfig(format!(
                "pixels_per_width_unit must be positive, got {}",
                widths.pixels_per_width_unit
            )));
        }
        for (name, value) in [
            ("min_column_width", widths.min_column_width),
            ("cell_padding", widths.cell_padding),
            ("pixels_per_indent", widths.pixels_per_indent),
        ] {
            if !(value.is_finite() && value >= 0.0) {
                return Err(ExportError::InvalidConfig(format!(
                    "{} must be a non-negative number, got {}",
                    name, value
                )));
            }
        }
        Ok(())
    }
}

impl Default for ExportOptions {
    fn default() -> Self {
        ExportOptions {
            root_value: Value::Int(0),
            parent_id_expr: "parentId".to_string(),
            key_expr: None,
            items_expr: "items".to_string(),
            data_structure: DataStructure::Plain,
            indent_unit: 2,
            widths: WidthConfig::default(),
        }
    }
}

/// Builder for [`ExportOptions`]
#[derive(Debug, Clone, Default)]
pub struct ExportOptionsBuilder {
    options: ExportOptions,
}

impl ExportOptionsBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn root_value(mut self, value: impl Into<Value>) -> Self {
        self.options.root_value = value.into();
        self
    }

    pub fn parent_id_expr(mut self, field: &str) -> Self {
        self.options.parent_id_expr = field.to_string();
        self
    }

    pub fn key_expr(mut self, field: &str) -> Self {
        self.options.key_expr = Some(field.to_string());
        self
    }

    pub fn items_expr(mut self, field: &str) -> Self {
        self.options.items_expr = field.to_string();
        self
    }

    pub fn data_structure(mut self, structure: DataStructure) -> Self {
        self.options.data_structure = structure;
        self
    }

    pub fn indent_unit(mut self, steps: u32) -> Self {
        self.options.indent_unit = steps;
        self
    }

    pub fn widths(mut self, widths: WidthConfig) -> Self {
        self.options.widths = widths;
        self
    }

    pub fn build(self) -> ExportOptions {
        self.options
    }
}
