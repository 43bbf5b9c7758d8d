//! Growable line buffer shared by the decoder and the local writer
//!
//! The allocated size is tracked separately from the content length, and
//! the byte just past the content is always a NUL terminator.

use std::fmt;

use bstr::ByteSlice;

const DEFAULT_ALLOCATION: usize = 64;

/// One input or output line, owned by the row-processing loop
#[derive(Clone)]
pub struct LineBuffer {
    /// Allocated storage; `data.len()` is the tracked capacity
    data: Vec<u8>,
    /// Content length, always `< data.len()`
    len: usize,
}

impl LineBuffer {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_ALLOCATION)
    }

    /// Create an empty buffer with at least `n` allocated bytes
    pub fn with_capacity(n: usize) -> Self {
        Self {
            data: vec![0; n.max(1)],
            len: 0,
        }
    }

    pub fn from_bytes(bytes: &[u8]) -> Self {
        let mut buffer = Self::with_capacity(bytes.len() + 1);
        buffer.set_contents(bytes);
        buffer
    }

    /// Grow the allocation to at least `n` bytes. Never shrinks.
    pub fn grow_to(&mut self, n: usize) {
        if n > self.data.len() {
            let target = n.max(self.data.len() * 2);
            self.data.resize(target, 0);
        }
    }

    /// Empty the buffer, leaving only the terminator
    pub fn clear(&mut self) {
        self.len = 0;
        self.data[0] = 0;
    }

    /// Replace the content with `bytes`
    pub fn set_contents(&mut self, bytes: &[u8]) {
        self.grow_to(bytes.len() + 1);
        self.data[..bytes.len()].copy_from_slice(bytes);
        self.set_len(bytes.len());
    }

    /// Copy `bytes` in at `at`, truncating the content to end just after them
    ///
    /// Used by the local writer, whose cursor always sits at the content end.
    pub(crate) fn put_at(&mut self, at: usize, bytes: &[u8]) {
        let end = at + bytes.len();
        self.grow_to(end + 1);
        self.data[at..end].copy_from_slice(bytes);
        self.set_len(end);
    }

    fn set_len(&mut self, len: usize) {
        debug_assert!(len < self.data.len());
        self.len = len;
        self.data[len] = 0;
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data[..self.len]
    }

    /// Content bytes, for in-place decoding
    pub fn as_mut_bytes(&mut self) -> &mut [u8] {
        &mut self.data[..self.len]
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Tracked allocated size
    pub fn allocated(&self) -> usize {
        self.data.len()
    }

    /// Whether the byte just past the content is the NUL terminator
    pub fn is_terminated(&self) -> bool {
        self.data.get(self.len) == Some(&0)
    }
}

impl Default for LineBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for LineBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LineBuffer")
            .field("content", &self.as_bytes().as_bstr())
            .field("allocated", &self.data.len())
            .finish()
    }
}

impl From<&[u8]> for LineBuffer {
    fn from(bytes: &[u8]) -> Self {
        Self::from_bytes(bytes)
    }
}

impl From<&str> for LineBuffer {
    fn from(s: &str) -> Self {
        Self::from_bytes(s.as_bytes())
    }
}
