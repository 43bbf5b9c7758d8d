//! Row router: decode each input line and re-emit it as CSV under the
//! logical filename named by its first field

use std::io::BufRead;

use bstr::ByteSlice;
use log::{debug, warn};

use crate::buffer::LineBuffer;
use crate::encode::{write_delimiter, write_field, write_newline};
use crate::error::{FieldmuxError, Result};
use crate::context::validate_name;
use crate::field::{Field, FieldInfo, read_ascii28_record, read_csv_record};
use crate::input::LineReader;
use crate::sink::WriteSink;

/// Input field convention
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Convention {
    #[default]
    Csv,
    Ascii28,
}

impl Convention {
    fn read_record(
        self,
        line: &mut LineBuffer,
        position: &mut usize,
        fields: &mut Vec<(Field, FieldInfo)>,
    ) {
        match self {
            Convention::Csv => read_csv_record(line, position, fields),
            Convention::Ascii28 => read_ascii28_record(line, position, fields),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SplitStats {
    pub rows: usize,
    pub fields: usize,
    /// Rows holding a quoted field that never closed, a record terminator
    /// before the end of the line, or an unusable output name
    pub malformed: usize,
}

impl SplitStats {
    pub fn merge(&mut self, other: SplitStats) {
        self.rows += other.rows;
        self.fields += other.fields;
        self.malformed += other.malformed;
    }
}

#[derive(Clone, Debug)]
pub struct Splitter {
    pub convention: Convention,
    pub strict: bool,
    /// Destination for rows whose first field is not a usable output name
    pub default_name: String,
}

impl Splitter {
    pub fn new(convention: Convention) -> Self {
        Self {
            convention,
            strict: false,
            default_name: "unknown".to_string(),
        }
    }

    /// Route every line of `reader` into `sink`. Blank lines are skipped.
    pub fn split<R: BufRead, S: WriteSink + ?Sized>(
        &self,
        reader: R,
        sink: &mut S,
    ) -> Result<SplitStats> {
        let mut lines = LineReader::new(reader);
        let mut line = LineBuffer::new();
        let mut stats = SplitStats::default();

        while lines.read_line(&mut line)? {
            if line.is_empty() {
                continue;
            }

            let line_number = lines.line_number();
            let mut malformed = false;
            let mut fields = Vec::new();
            let mut position = 0;
            self.convention.read_record(&mut line, &mut position, &mut fields);

            // The line ending is already stripped, so a `\r` or NUL with bytes
            // after it is data, not the end of the record.
            while position < line.len() {
                // A NUL leaves the cursor on itself; other terminators are behind it
                if fields.last().is_some_and(|(f, _)| f.terminator.is_none()) {
                    position += 1;
                }
                let stray = position - 1;
                if self.strict {
                    return Err(FieldmuxError::StrayTerminator {
                        line: line_number,
                        position: stray,
                    });
                }
                warn!("line {}: record terminator at byte {}", line_number, stray);
                malformed = true;
                self.convention.read_record(&mut line, &mut position, &mut fields);
            }

            if let Some((field, _)) = fields.iter().find(|(f, _)| f.unterminated) {
                if self.strict {
                    return Err(FieldmuxError::MalformedRow {
                        line: line_number,
                        position: field.start.saturating_sub(1),
                    });
                }
                warn!("line {}: unterminated quoted field", line_number);
                malformed = true;
            }

            let bytes = line.as_bytes();
            let name = match self.route(bytes, &fields) {
                Ok(name) => name,
                Err(e) if self.strict => return Err(e),
                Err(e) => {
                    warn!("line {}: {}, using {:?}", line_number, e, self.default_name);
                    malformed = true;
                    self.default_name.as_str()
                }
            };

            self.emit_row(sink, name, bytes, &fields)?;
            stats.rows += 1;
            stats.fields += fields.len();
            if malformed {
                stats.malformed += 1;
            }
        }

        debug!(
            "split {} rows ({} fields, {} malformed)",
            stats.rows, stats.fields, stats.malformed
        );
        Ok(stats)
    }

    /// Output name for a row: its first field, or the default when empty
    fn route<'a>(&'a self, bytes: &'a [u8], fields: &[(Field, FieldInfo)]) -> Result<&'a str> {
        let first = match fields.first() {
            Some((field, _)) if !field.is_empty() => &bytes[field.span()],
            _ => return Ok(self.default_name.as_str()),
        };
        let name = first
            .to_str()
            .map_err(|_| FieldmuxError::InvalidName(first.to_str_lossy().into_owned()))?;
        validate_name(name)?;
        Ok(name)
    }

    fn emit_row<S: WriteSink + ?Sized>(
        &self,
        sink: &mut S,
        name: &str,
        bytes: &[u8],
        fields: &[(Field, FieldInfo)],
    ) -> Result<()> {
        for (i, (field, info)) in fields.iter().enumerate() {
            if i > 0 {
                write_delimiter(sink, name)?;
            }
            write_field(sink, name, &bytes[field.span()], info)?;
        }
        write_newline(sink, name)
    }
}
