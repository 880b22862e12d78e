//! Cell format registry for indent and date formats

use indexmap::IndexSet;
use std::io::Write;

use super::xml_writer::XmlWriter;
use crate::error::Result;

/// Built-in number formats used for cells
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NumberFormat {
    General,
    /// `m/d/yyyy`
    Date,
    /// `m/d/yy h:mm`
    DateTime,
}

impl NumberFormat {
    fn builtin_id(self) -> u32 {
        match self {
            NumberFormat::General => 0,
            NumberFormat::Date => 14,
            NumberFormat::DateTime => 22,
        }
    }
}

/// Largest indent Excel accepts in an alignment
pub const MAX_INDENT: u32 = 250;

/// Distinct cell formats, indexed in `cellXfs` order
///
/// Index 0 is always the default format.
#[derive(Debug, Clone)]
pub struct StyleTable {
    formats: IndexSet<(u32, NumberFormat)>,
}

impl StyleTable {
    pub fn new() -> Self {
        let mut formats = IndexSet::new();
        formats.insert((0, NumberFormat::General));
        StyleTable { formats }
    }

    /// Index of the format with `indent` and `number_format`, registering it if new
    pub fn style_index(&mut self, indent: u32, number_format: NumberFormat) -> u32 {
        let (index, _) = self
            .formats
            .insert_full((indent.min(MAX_INDENT), number_format));
        index as u32
    }

    pub fn len(&self) -> usize {
        self.formats.len()
    }

    pub fn is_empty(&self) -> bool {
        self.formats.is_empty()
    }

    /// Write `xl/styles.xml`
    pub fn write_xml<W: Write>(&self, xml: &mut XmlWriter<W>) -> Result<()> {
        xml.declaration()?;
        xml.open("styleSheet")?;
        xml.attr(
            "xmlns",
            "http://schemas.openxmlformats.org/spreadsheetml/2006/main",
        )?;
        xml.close()?;

        xml.raw(
            br#"<fonts count="1"><font><sz val="11"/><name val="Calibri"/></font></fonts><fills count="2"><fill><patternFill patternType="none"/></fill><fill><patternFill patternType="gray125"/></fill></fills><borders count="1"><border><left/><right/><top/><bottom/><diagonal/></border></borders><cellStyleXfs count="1"><xf numFmtId="0" fontId="0" fillId="0" borderId="0"/></cellStyleXfs>"#,
        )?;

        xml.open("cellXfs")?;
        xml.attr_int("count", self.formats.len())?;
        xml.close()?;
        for &(indent, number_format) in &self.formats {
            xml.open("xf")?;
            xml.attr_int("numFmtId", number_format.builtin_id())?;
            xml.raw(br#" fontId="0" fillId="0" borderId="0" xfId="0""#)?;
            if number_format != NumberFormat::General {
                xml.attr("applyNumberFormat", "1")?;
            }
            if indent == 0 {
                xml.close_empty()?;
                continue;
            }
            xml.attr("applyAlignment", "1")?;
            xml.close()?;
            xml.open("alignment")?;
            xml.attr("horizontal", "left")?;
            xml.attr_int("indent", indent)?;
            xml.close_empty()?;
            xml.end("xf")?;
        }
        xml.end("cellXfs")?;

        xml.raw(br#"<cellStyles count="1"><cellStyle name="Normal" xfId="0" builtinId="0"/></cellStyles>"#)?;
        xml.end("styleSheet")?;
        xml.flush()
    }
}

impl Default for StyleTable {
    fn default() -> Self {
        Self::new()
    }
}
