use std::io::{self, BufRead};

use crate::buffer::LineBuffer;

/// Reads newline-terminated lines into a reusable [`LineBuffer`]
pub struct LineReader<R> {
    reader: R,
    scratch: Vec<u8>,
    line_number: usize,
}

impl<R: BufRead> LineReader<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            scratch: Vec::new(),
            line_number: 0,
        }
    }

    /// Read the next line into `line`, returning false at EOF
    ///
    /// The trailing `\n` and a `\r` before it are stripped.
    pub fn read_line(&mut self, line: &mut LineBuffer) -> io::Result<bool> {
        self.scratch.clear();
        let bytes_read = self.reader.read_until(b'\n', &mut self.scratch)?;

        if bytes_read == 0 {
            line.clear();
            return Ok(false);
        }

        if self.scratch.last() == Some(&b'\n') {
            self.scratch.pop();
            if self.scratch.last() == Some(&b'\r') {
                self.scratch.pop();
            }
        }

        self.line_number += 1;
        line.set_contents(&self.scratch);
        Ok(true)
    }

    /// 1-based number of the line last read
    pub fn line_number(&self) -> usize {
        self.line_number
    }
}
