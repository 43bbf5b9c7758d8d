//! Field decoding for the comma convention and the byte-28 convention
//!
//! Both readers work on a [`LineBuffer`] with a byte cursor. The CSV reader
//! un-escapes quoted fields in place: every `""` collapses to `"`, so the
//! write cursor can only fall behind the read cursor and never clobbers
//! bytes that are still to be read.

use std::ops::Range;

use bstr::ByteSlice;

use crate::buffer::LineBuffer;
use crate::error::{FieldmuxError, Result};

pub const QUOTE: u8 = b'"';
pub const COMMA: u8 = b',';
pub const NEWLINE: u8 = b'\n';
/// ASCII file separator, the field terminator of the secondary convention
pub const ASCII28: u8 = 0x1c;

/// Per-field counts of the bytes that force quoting on output
///
/// The counts describe the decoded value, so they can be handed straight
/// to [`crate::encode::write_field`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FieldInfo {
    pub commas: usize,
    pub quotes: usize,
}

impl FieldInfo {
    pub fn new() -> Self {
        Self::default()
    }

    /// Scan a whole value
    pub fn scan(value: &[u8]) -> Self {
        let mut info = Self::new();
        for &c in value {
            process_field_char(c, &mut info);
        }
        info
    }

    pub fn needs_quotes(&self) -> bool {
        self.commas > 0 || self.quotes > 0
    }
}

/// Account for one byte of a field
#[inline]
pub fn process_field_char(c: u8, info: &mut FieldInfo) {
    match c {
        COMMA => info.commas += 1,
        QUOTE => info.quotes += 1,
        _ => {}
    }
}

/// Whether `c` ends a field in the comma convention
///
/// NUL is the end-of-input sentinel.
#[inline]
pub fn end_of_field(c: u8) -> bool {
    matches!(c, COMMA | NEWLINE | b'\r' | 0)
}

/// A decoded field within its line buffer
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Field {
    pub start: usize,
    pub end: usize,
    /// Byte that ended the field, `None` at end of input
    pub terminator: Option<u8>,
    /// A quoted field ran to end of input without its closing quote
    pub unterminated: bool,
}

impl Field {
    pub fn span(&self) -> Range<usize> {
        self.start..self.end
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Whether no further field of the same record follows
    pub fn ends_record(&self) -> bool {
        !matches!(self.terminator, Some(COMMA) | Some(ASCII28))
    }

    /// Reject a field whose quoted section was never closed
    pub fn strict(self) -> Result<Self> {
        if self.unterminated {
            // The opening quote sits just before the decoded span.
            Err(FieldmuxError::MalformedField {
                position: self.start.saturating_sub(1),
            })
        } else {
            Ok(self)
        }
    }
}

/// Content length up to the first NUL sentinel at or after `from`
fn input_end(bytes: &[u8], from: usize) -> usize {
    bytes[from..].find_byte(0).map_or(bytes.len(), |i| from + i)
}

/// Leave the cursor just past the terminator at `at`, if there is one
fn finish(bytes: &[u8], at: usize, len: usize, position: &mut usize) -> Option<u8> {
    if at < len {
        *position = at + 1;
        Some(bytes[at])
    } else {
        *position = len;
        None
    }
}

/// Read one comma-convention field starting at `position`
///
/// Quoted fields are decoded in place and the returned span covers the
/// unescaped interior. Bytes following a closing quote up to the terminator
/// are kept as they are, and a missing closing quote runs the field to the
/// end of input with [`Field::unterminated`] set.
pub fn read_csv_field(line: &mut LineBuffer, position: &mut usize, info: &mut FieldInfo) -> Field {
    let bytes = line.as_mut_bytes();
    let start = (*position).min(bytes.len());
    let len = input_end(bytes, start);

    if start >= len || bytes[start] != QUOTE {
        let mut read = start;
        while read < len && !end_of_field(bytes[read]) {
            process_field_char(bytes[read], info);
            read += 1;
        }
        let terminator = finish(bytes, read, len, position);
        return Field {
            start,
            end: read,
            terminator,
            unterminated: false,
        };
    }

    let start = start + 1;
    let mut read = start;
    let mut write = start;
    let mut closed = false;

    while read < len {
        let c = bytes[read];
        if closed {
            if end_of_field(c) {
                break;
            }
        } else if c == QUOTE {
            if read + 1 < len && bytes[read + 1] == QUOTE {
                bytes[write] = QUOTE;
                write += 1;
                read += 2;
                process_field_char(QUOTE, info);
            } else {
                closed = true;
                read += 1;
            }
            continue;
        }
        bytes[write] = c;
        write += 1;
        read += 1;
        process_field_char(c, info);
    }

    let terminator = finish(bytes, read, len, position);
    Field {
        start,
        end: write,
        terminator,
        unterminated: !closed,
    }
}

/// Read one field of the byte-28 convention starting at `position`
///
/// A field that both starts and ends with `"` is returned without them.
/// Nothing inside the field is rewritten.
pub fn read_ascii28_field(line: &LineBuffer, position: &mut usize, info: &mut FieldInfo) -> Field {
    let bytes = line.as_bytes();
    let start = (*position).min(bytes.len());
    let len = input_end(bytes, start);

    let stop = bytes[start..len]
        .find_byteset([ASCII28, NEWLINE, b'\r'])
        .map_or(len, |i| start + i);
    let terminator = finish(bytes, stop, len, position);

    let (mut start, mut end) = (start, stop);
    if end - start >= 2 && bytes[start] == QUOTE && bytes[end - 1] == QUOTE {
        start += 1;
        end -= 1;
    }
    for &c in &bytes[start..end] {
        process_field_char(c, info);
    }

    Field {
        start,
        end,
        terminator,
        unterminated: false,
    }
}

/// Decode every comma-convention field of one record
pub fn split_csv_record(line: &mut LineBuffer) -> Vec<(Field, FieldInfo)> {
    let mut fields = Vec::new();
    read_csv_record(line, &mut 0, &mut fields);
    fields
}

/// Append the fields of the record starting at `position` to `fields`
///
/// The cursor is left just past the record terminator, or at the first
/// NUL or the end of the content.
pub fn read_csv_record(
    line: &mut LineBuffer,
    position: &mut usize,
    fields: &mut Vec<(Field, FieldInfo)>,
) {
    loop {
        let mut info = FieldInfo::new();
        let field = read_csv_field(line, position, &mut info);
        fields.push((field, info));
        if field.ends_record() {
            return;
        }
    }
}

/// Decode every byte-28 field of one record
pub fn split_ascii28_record(line: &LineBuffer) -> Vec<(Field, FieldInfo)> {
    let mut fields = Vec::new();
    read_ascii28_record(line, &mut 0, &mut fields);
    fields
}

/// Byte-28 counterpart of [`read_csv_record`]
pub fn read_ascii28_record(
    line: &LineBuffer,
    position: &mut usize,
    fields: &mut Vec<(Field, FieldInfo)>,
) {
    loop {
        let mut info = FieldInfo::new();
        let field = read_ascii28_field(line, position, &mut info);
        fields.push((field, info));
        if field.ends_record() {
            return;
        }
    }
}
