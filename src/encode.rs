//! Field encoding for both delimiter conventions

use bstr::ByteSlice;

use crate::error::Result;
use crate::field::{ASCII28, COMMA, FieldInfo, NEWLINE, QUOTE};
use crate::sink::WriteSink;

/// Emit a field in the comma convention
///
/// `info` must describe `value`. A value without commas or quotes is
/// written unchanged; otherwise it is wrapped in quotes with each embedded
/// quote doubled.
pub fn write_field<S: WriteSink + ?Sized>(
    sink: &mut S,
    name: &str,
    value: &[u8],
    info: &FieldInfo,
) -> Result<()> {
    if !info.needs_quotes() {
        return sink.write_n(name, value);
    }

    sink.write_char(name, QUOTE)?;
    let mut rest = value;
    while let Some(i) = rest.find_byte(QUOTE) {
        // Write through the quote, then its double
        sink.write_n(name, &rest[..=i])?;
        sink.write_char(name, QUOTE)?;
        rest = &rest[i + 1..];
    }
    sink.write_n(name, rest)?;
    sink.write_char(name, QUOTE)
}

pub fn write_delimiter<S: WriteSink + ?Sized>(sink: &mut S, name: &str) -> Result<()> {
    sink.write_char(name, COMMA)
}

pub fn write_newline<S: WriteSink + ?Sized>(sink: &mut S, name: &str) -> Result<()> {
    sink.write_char(name, NEWLINE)
}

/// Emit a field in the byte-28 convention
///
/// The convention has no escapes, so a value is only wrapped when it
/// already starts and ends with a quote, which the reader would strip.
pub fn write_ascii28_field<S: WriteSink + ?Sized>(
    sink: &mut S,
    name: &str,
    value: &[u8],
) -> Result<()> {
    let wrap = value.len() >= 2 && value.first() == Some(&QUOTE) && value.last() == Some(&QUOTE);
    if wrap {
        sink.write_char(name, QUOTE)?;
        sink.write_n(name, value)?;
        sink.write_char(name, QUOTE)
    } else {
        sink.write_n(name, value)
    }
}

pub fn write_ascii28_delimiter<S: WriteSink + ?Sized>(sink: &mut S, name: &str) -> Result<()> {
    sink.write_char(name, ASCII28)
}

/// Emit a complete comma-convention record, newline included
pub fn write_record<S, I, F>(sink: &mut S, name: &str, fields: I) -> Result<()>
where
    S: WriteSink + ?Sized,
    I: IntoIterator<Item = F>,
    F: AsRef<[u8]>,
{
    for (i, field) in fields.into_iter().enumerate() {
        if i > 0 {
            write_delimiter(sink, name)?;
        }
        let value = field.as_ref();
        write_field(sink, name, value, &FieldInfo::scan(value))?;
    }
    write_newline(sink, name)
}
