//! Small XML writer for SpreadsheetML parts

use crate::error::Result;
use std::io::Write;

/// Buffered XML writer producing one part at a time
pub struct XmlWriter<W: Write> {
    writer: W,
    buffer: Vec<u8>,
    numbers: itoa::Buffer,
}

impl<W: Write> XmlWriter<W> {
    const FLUSH_THRESHOLD: usize = 8192;

    pub fn new(writer: W) -> Self {
        XmlWriter {
            writer,
            buffer: Vec::with_capacity(Self::FLUSH_THRESHOLD * 2),
            numbers: itoa::Buffer::new(),
        }
    }

    /// Standalone XML declaration
    pub fn declaration(&mut self) -> Result<()> {
        self.raw(b"<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\n")
    }

    #[inline]
    pub fn raw(&mut self, data: &[u8]) -> Result<()> {
        self.buffer.extend_from_slice(data);
        if self.buffer.len() >= Self::FLUSH_THRESHOLD {
            self.flush()?;
        }
        Ok(())
    }

    /// Open a start tag; follow with attributes and `close` or `close_empty`
    #[inline]
    pub fn open(&mut self, name: &str) -> Result<()> {
        self.buffer.push(b'<');
        self.raw(name.as_bytes())
    }

    #[inline]
    pub fn close(&mut self) -> Result<()> {
        self.raw(b">")
    }

    #[inline]
    pub fn close_empty(&mut self) -> Result<()> {
        self.raw(b"/>")
    }

    #[inline]
    pub fn end(&mut self, name: &str) -> Result<()> {
        self.buffer.extend_from_slice(b"</");
        self.buffer.extend_from_slice(name.as_bytes());
        self.raw(b">")
    }

    /// Attribute with an escaped string value
    pub fn attr(&mut self, name: &str, value: &str) -> Result<()> {
        self.attr_start(name);
        self.escape_into_buffer(value);
        self.raw(b"\"")
    }

    /// Attribute with an integer value
    pub fn attr_int<I: itoa::Integer>(&mut self, name: &str, value: I) -> Result<()> {
        self.attr_start(name);
        let digits = self.numbers.format(value);
        self.buffer.extend_from_slice(digits.as_bytes());
        self.raw(b"\"")
    }

    /// Attribute with a float value
    pub fn attr_f64(&mut self, name: &str, value: f64) -> Result<()> {
        self.attr_start(name);
        self.buffer.extend_from_slice(value.to_string().as_bytes());
        self.raw(b"\"")
    }

    /// Element holding only escaped text
    pub fn text_element(&mut self, name: &str, text: &str) -> Result<()> {
        self.open(name)?;
        self.close()?;
        self.text(text)?;
        self.end(name)
    }

    /// Escaped character data
    pub fn text(&mut self, text: &str) -> Result<()> {
        self.escape_into_buffer(text);
        if self.buffer.len() >= Self::FLUSH_THRESHOLD {
            self.flush()?;
        }
        Ok(())
    }

    fn attr_start(&mut self, name: &str) {
        self.buffer.push(b' ');
        self.buffer.extend_from_slice(name.as_bytes());
        self.buffer.extend_from_slice(b"=\"");
    }

    fn escape_into_buffer(&mut self, text: &str) {
        for c in text.chars() {
            match c {
                '&' => self.buffer.extend_from_slice(b"&amp;"),
                '<' => self.buffer.extend_from_slice(b"&lt;"),
                '>' => self.buffer.extend_from_slice(b"&gt;"),
                '"' => self.buffer.extend_from_slice(b"&quot;"),
                '\'' => self.buffer.extend_from_slice(b"&apos;"),
                // Control characters other than tab and newlines are not valid XML 1.0
                c if c.is_control() && !matches!(c, '\t' | '\n' | '\r') => {}
                _ => {
                    let mut utf8 = [0; 4];
                    self.buffer
                        .extend_from_slice(c.encode_utf8(&mut utf8).as_bytes());
                }
            }
        }
    }

    /// Flush buffered bytes to the underlying writer
    pub fn flush(&mut self) -> Result<()> {
        if !self.buffer.is_empty() {
            self.writer.write_all(&self.buffer)?;
            self.buffer.clear();
        }
        self.writer.flush()?;
        Ok(())
    }

    /// Flush and hand back the underlying writer
    pub fn into_inner(mut self) -> Result<W> {
        self.flush()?;
        Ok(self.writer)
    }
}
