//! XLSX packaging of in-memory worksheets

use chrono::Timelike;
use s_zip::StreamingZipWriter;
use std::io::Write;
use std::path::Path;

use super::styles::{NumberFormat, StyleTable};
use super::xml_writer::XmlWriter;
use crate::error::{ExportError, Result};
use crate::sink::WorksheetSink;
use crate::types::{CellAddress, DateValue, Value};
use crate::worksheet::{Worksheet, WorksheetRow};

/// Highest outline level the file format supports
pub const MAX_OUTLINE_LEVEL: u32 = 7;

const MAIN_NS: &str = "http://schemas.openxmlformats.org/spreadsheetml/2006/main";
const REL_NS: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";

/// A set of worksheets saved together as one `.xlsx` file
///
/// # Examples
///
/// ```no_run
/// use treesheet::sink::{ColumnDefinition, WorksheetSink};
/// use treesheet::types::record;
/// use treesheet::worksheet::Worksheet;
/// use treesheet::xlsx::Workbook;
///
/// let mut sheet = Worksheet::new("Tasks");
/// sheet.set_columns(vec![ColumnDefinition::new("Name", "name")])?;
/// sheet.add_row(&record([("name", "Alpha")]))?;
///
/// let mut workbook = Workbook::new();
/// workbook.add_worksheet(sheet)?;
/// workbook.save("tasks.xlsx")?;
/// # Ok::<(), treesheet::ExportError>(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct Workbook {
    worksheets: Vec<Worksheet>,
}

impl Workbook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a worksheet; names must be unique, 1-31 characters, without `[]:*?/\`
    pub fn add_worksheet(&mut self, worksheet: Worksheet) -> Result<()> {
        let name = worksheet.name();
        let length = name.chars().count();
        if length == 0 || length > 31 || name.contains(['[', ']', ':', '*', '?', '/', '\\']) {
            return Err(ExportError::WriteError(format!(
                "invalid sheet name '{}'",
                name
            )));
        }
        if self
            .worksheets
            .iter()
            .any(|ws| ws.name().eq_ignore_ascii_case(name))
        {
            return Err(ExportError::WriteError(format!(
                "duplicate sheet name '{}'",
                name
            )));
        }
        self.worksheets.push(worksheet);
        Ok(())
    }

    pub fn worksheets(&self) -> &[Worksheet] {
        &self.worksheets
    }

    pub fn worksheet_mut(&mut self, name: &str) -> Option<&mut Worksheet> {
        self.worksheets.iter_mut().find(|ws| ws.name() == name)
    }

    /// Render every package part as `(path, bytes)`
    pub fn parts(&self) -> Result<Vec<(String, Vec<u8>)>> {
        if self.worksheets.is_empty() {
            return Err(ExportError::WriteError(
                "a workbook needs at least one worksheet".to_string(),
            ));
        }

        let mut styles = StyleTable::new();
        let mut parts = Vec::with_capacity(self.worksheets.len() + 6);

        for (i, worksheet) in self.worksheets.iter().enumerate() {
            let mut xml = XmlWriter::new(Vec::new());
            write_worksheet_xml(worksheet, &mut styles, &mut xml)?;
            parts.push((format!("xl/worksheets/sheet{}.xml", i + 1), xml.into_inner()?));
        }

        let mut xml = XmlWriter::new(Vec::new());
        styles.write_xml(&mut xml)?;
        parts.push(("xl/styles.xml".to_string(), xml.into_inner()?));

        parts.push(("[Content_Types].xml".to_string(), self.content_types()));
        parts.push(("_rels/.rels".to_string(), ROOT_RELS.as_bytes().to_vec()));
        parts.push(("docProps/core.xml".to_string(), core_props()));
        parts.push(("docProps/app.xml".to_string(), APP_PROPS.as_bytes().to_vec()));
        parts.push(("xl/workbook.xml".to_string(), self.workbook_xml()?));
        parts.push((
            "xl/_rels/workbook.xml.rels".to_string(),
            self.workbook_rels()?,
        ));

        // Package readers expect the content types first
        parts.rotate_right(6);
        Ok(parts)
    }

    /// Write the workbook to `path`
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let parts = self.parts()?;
        let mut zip = StreamingZipWriter::new(path.as_ref()).map_err(zip_error)?;
        for (name, data) in &parts {
            zip.start_entry(name).map_err(zip_error)?;
            zip.write_data(data).map_err(zip_error)?;
        }
        zip.finish().map_err(zip_error)?;
        log::debug!(
            "saved {} worksheet(s) to {}",
            self.worksheets.len(),
            path.as_ref().display()
        );
        Ok(())
    }

    fn content_types(&self) -> Vec<u8> {
        let mut xml = String::from(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/xl/workbook.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml"/>"#,
        );
        for i in 1..=self.worksheets.len() {
            xml.push_str(&format!(
                r#"<Override PartName="/xl/worksheets/sheet{}.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml"/>"#,
                i
            ));
        }
        xml.push_str(
            r#"<Override PartName="/xl/styles.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.styles+xml"/><Override PartName="/docProps/core.xml" ContentType="application/vnd.openxmlformats-package.core-properties+xml"/><Override PartName="/docProps/app.xml" ContentType="application/vnd.openxmlformats-officedocument.extended-properties+xml"/></Types>"#,
        );
        xml.into_bytes()
    }

    fn workbook_xml(&self) -> Result<Vec<u8>> {
        let mut xml = XmlWriter::new(Vec::new());
        xml.declaration()?;
        xml.open("workbook")?;
        xml.attr("xmlns", MAIN_NS)?;
        xml.attr("xmlns:r", REL_NS)?;
        xml.close()?;
        xml.open("sheets")?;
        xml.close()?;
        for (i, worksheet) in self.worksheets.iter().enumerate() {
            xml.open("sheet")?;
            xml.attr("name", worksheet.name())?;
            xml.attr_int("sheetId", i + 1)?;
            xml.attr("r:id", &format!("rId{}", i + 1))?;
            xml.close_empty()?;
        }
        xml.end("sheets")?;
        xml.end("workbook")?;
        xml.into_inner()
    }

    fn workbook_rels(&self) -> Result<Vec<u8>> {
        let mut xml = XmlWriter::new(Vec::new());
        xml.declaration()?;
        xml.open("Relationships")?;
        xml.attr(
            "xmlns",
            "http://schemas.openxmlformats.org/package/2006/relationships",
        )?;
        xml.close()?;

        let count = self.worksheets.len();
        for i in 1..=count {
            relationship(&mut xml, i, "worksheet", &format!("worksheets/sheet{}.xml", i))?;
        }
        relationship(&mut xml, count + 1, "styles", "styles.xml")?;

        xml.end("Relationships")?;
        xml.into_inner()
    }
}

fn relationship<W: Write>(xml: &mut XmlWriter<W>, id: usize, kind: &str, target: &str) -> Result<()> {
    xml.open("Relationship")?;
    xml.attr("Id", &format!("rId{}", id))?;
    xml.attr("Type", &format!("{}/{}", REL_NS, kind))?;
    xml.attr("Target", target)?;
    xml.close_empty()
}

fn zip_error<E: std::fmt::Display>(err: E) -> ExportError {
    ExportError::ZipError(err.to_string())
}

/// Write one worksheet part, registering the cell formats it needs
pub fn write_worksheet_xml<W: Write>(
    worksheet: &Worksheet,
    styles: &mut StyleTable,
    xml: &mut XmlWriter<W>,
) -> Result<()> {
    xml.declaration()?;
    xml.open("worksheet")?;
    xml.attr("xmlns", MAIN_NS)?;
    xml.attr("xmlns:r", REL_NS)?;
    xml.close()?;

    let outline = worksheet.outline_properties();
    xml.raw(b"<sheetPr><outlinePr")?;
    xml.attr("summaryBelow", if outline.summary_below { "1" } else { "0" })?;
    xml.attr("summaryRight", if outline.summary_right { "1" } else { "0" })?;
    xml.raw(b"/></sheetPr>")?;

    xml.open("sheetFormatPr")?;
    xml.attr("defaultRowHeight", "15")?;
    let max_level = worksheet.max_outline_level().min(MAX_OUTLINE_LEVEL);
    if max_level > 0 {
        xml.attr_int("outlineLevelRow", max_level)?;
    }
    xml.close_empty()?;

    write_cols(worksheet, xml)?;

    xml.open("sheetData")?;
    xml.close()?;
    for row in worksheet.rows() {
        write_row(row, styles, xml)?;
    }
    xml.end("sheetData")?;
    xml.end("worksheet")?;
    xml.flush()
}

fn write_cols<W: Write>(worksheet: &Worksheet, xml: &mut XmlWriter<W>) -> Result<()> {
    let sized: Vec<(usize, f64)> = worksheet
        .columns()
        .iter()
        .enumerate()
        .filter_map(|(i, c)| c.width.map(|w| (i + 1, w)))
        .collect();
    if sized.is_empty() {
        return Ok(());
    }

    xml.open("cols")?;
    xml.close()?;
    for (col, width) in sized {
        xml.open("col")?;
        xml.attr_int("min", col)?;
        xml.attr_int("max", col)?;
        xml.attr_f64("width", width)?;
        xml.attr("customWidth", "1")?;
        xml.close_empty()?;
    }
    xml.end("cols")
}

fn write_row<W: Write>(
    row: &WorksheetRow,
    styles: &mut StyleTable,
    xml: &mut XmlWriter<W>,
) -> Result<()> {
    xml.open("row")?;
    xml.attr_int("r", row.number)?;
    let level = row.outline_level.min(MAX_OUTLINE_LEVEL);
    if level > 0 {
        xml.attr_int("outlineLevel", level)?;
    }
    xml.close()?;

    for (i, cell) in row.cells.iter().enumerate() {
        let address = CellAddress::new(row.number, i as u32 + 1);
        let number_format = match &cell.value {
            Value::Date(DateValue::Valid(dt)) if dt.num_seconds_from_midnight() == 0 => {
                NumberFormat::Date
            }
            Value::Date(DateValue::Valid(_)) => NumberFormat::DateTime,
            _ => NumberFormat::General,
        };
        let style = styles.style_index(cell.indent, number_format);
        let blank = matches!(cell.value, Value::Empty | Value::Null | Value::Records(_));
        if blank && style == 0 {
            continue;
        }

        xml.open("c")?;
        xml.attr("r", &address.to_string())?;
        if style > 0 {
            xml.attr_int("s", style)?;
        }
        write_cell_value(&cell.value, xml)?;
    }

    xml.end("row")
}

fn write_cell_value<W: Write>(value: &Value, xml: &mut XmlWriter<W>) -> Result<()> {
    match value {
        Value::Empty | Value::Null | Value::Records(_) => xml.close_empty(),
        Value::String(s) => {
            xml.attr("t", "inlineStr")?;
            xml.close()?;
            xml.raw(b"<is>")?;
            xml.text_element("t", s)?;
            xml.raw(b"</is></c>")
        }
        Value::Int(i) => {
            xml.close()?;
            xml.text_element("v", &i.to_string())?;
            xml.end("c")
        }
        Value::Float(f) if f.is_finite() => {
            xml.close()?;
            xml.text_element("v", &f.to_string())?;
            xml.end("c")
        }
        Value::Float(_) => write_error_value("#NUM!", xml),
        Value::Bool(b) => {
            xml.attr("t", "b")?;
            xml.close()?;
            xml.text_element("v", if *b { "1" } else { "0" })?;
            xml.end("c")
        }
        Value::Date(date) => match date.to_excel_serial() {
            Some(serial) => {
                xml.close()?;
                xml.text_element("v", &serial.to_string())?;
                xml.end("c")
            }
            None => write_error_value("#VALUE!", xml),
        },
    }
}

fn write_error_value<W: Write>(code: &str, xml: &mut XmlWriter<W>) -> Result<()> {
    xml.attr("t", "e")?;
    xml.close()?;
    xml.text_element("v", code)?;
    xml.end("c")
}

const ROOT_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="xl/workbook.xml"/><Relationship Id="rId2" Type="http://schemas.openxmlformats.org/package/2006/relationships/metadata/core-properties" Target="docProps/core.xml"/><Relationship Id="rId3" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/extended-properties" Target="docProps/app.xml"/></Relationships>"#;

const APP_PROPS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Properties xmlns="http://schemas.openxmlformats.org/officeDocument/2006/extended-properties"><Application>treesheet</Application><DocSecurity>0</DocSecurity><ScaleCrop>false</ScaleCrop><LinksUpToDate>false</LinksUpToDate><SharedDoc>false</SharedDoc><HyperlinksChanged>false</HyperlinksChanged><AppVersion>1.0</AppVersion></Properties>"#;

fn core_props() -> Vec<u8> {
    let now = chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ");
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<cp:coreProperties xmlns:cp="http://schemas.openxmlformats.org/package/2006/metadata/core-properties" xmlns:dc="http://purl.org/dc/elements/1.1/" xmlns:dcterms="http://purl.org/dc/terms/" xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance"><dc:creator>treesheet</dc:creator><dcterms:created xsi:type="dcterms:W3CDTF">{now}</dcterms:created><dcterms:modified xsi:type="dcterms:W3CDTF">{now}</dcterms:modified></cp:coreProperties>"#
    )
    .into_bytes()
}
