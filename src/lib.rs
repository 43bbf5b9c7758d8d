//! CSV field codec and multi-destination write multiplexer
//!
//! [`field`] decodes fields of the comma convention (in place) and of the
//! byte-28 convention, [`encode`] writes them back with CSV quoting, and
//! [`context::WriteContext`] routes the bytes to one lazily opened file per
//! logical filename. [`sink::LocalWriter`] collects the same writes in
//! memory instead.

pub mod buffer;
pub mod cli;
pub mod config;
pub mod context;
pub mod encode;
pub mod error;
pub mod field;
pub mod input;
pub mod sink;
pub mod split;

pub use buffer::LineBuffer;
pub use context::{FsStorage, Storage, WriteContext};
pub use error::{FieldmuxError, Result};
pub use field::{Field, FieldInfo};
pub use sink::{LocalWriter, WriteSink};
pub use split::{Convention, SplitStats, Splitter};
