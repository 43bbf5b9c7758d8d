use crate::buffer::LineBuffer;
use crate::error::Result;

/// Destination for encoded bytes, addressed by logical filename
///
/// Implementors decide what a name means: [`crate::context::WriteContext`]
/// maps it to a file, [`LocalWriter`] ignores it.
pub trait WriteSink {
    /// Write raw bytes to the destination named `name`
    fn write_n(&mut self, name: &str, bytes: &[u8]) -> Result<()>;

    /// Write a whole string
    fn write(&mut self, name: &str, s: &str) -> Result<()> {
        self.write_n(name, s.as_bytes())
    }

    /// Write a single byte
    fn write_char(&mut self, name: &str, c: u8) -> Result<()> {
        self.write_n(name, &[c])
    }
}

impl<S: WriteSink + ?Sized> WriteSink for &mut S {
    fn write_n(&mut self, name: &str, bytes: &[u8]) -> Result<()> {
        (**self).write_n(name, bytes)
    }

    fn write(&mut self, name: &str, s: &str) -> Result<()> {
        (**self).write(name, s)
    }

    fn write_char(&mut self, name: &str, c: u8) -> Result<()> {
        (**self).write_char(name, c)
    }
}

/// Sink that collects every write into a caller-owned [`LineBuffer`]
///
/// The buffer is emptied on construction and stays NUL-terminated after
/// every write.
pub struct LocalWriter<'a> {
    buffer: &'a mut LineBuffer,
    position: usize,
}

impl<'a> LocalWriter<'a> {
    pub fn new(buffer: &'a mut LineBuffer) -> Self {
        buffer.clear();
        Self {
            buffer,
            position: 0,
        }
    }

    /// Number of bytes written so far
    pub fn position(&self) -> usize {
        self.position
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.buffer.as_bytes()
    }
}

impl WriteSink for LocalWriter<'_> {
    fn write_n(&mut self, _name: &str, bytes: &[u8]) -> Result<()> {
        self.buffer.put_at(self.position, bytes);
        self.position += bytes.len();
        Ok(())
    }
}
