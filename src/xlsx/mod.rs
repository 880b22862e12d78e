//! XLSX output for in-memory worksheets
//!
//! Worksheets are rendered with inline strings, outline levels, column widths
//! and indent styles, then packed with a streaming ZIP writer.

pub mod styles;
pub mod workbook;
pub mod xml_writer;

pub use styles::{NumberFormat, StyleTable};
pub use workbook::{Workbook, MAX_OUTLINE_LEVEL};
pub use xml_writer::XmlWriter;
