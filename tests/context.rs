//! Tests for destination resolution and local diversion
//!
//! A counting storage double stands in for the filesystem so the tests can
//! observe exactly how often directories are created and files opened.

use std::cell::RefCell;
use std::collections::HashMap;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::rc::Rc;

use fieldmux::encode::{write_delimiter, write_field, write_newline, write_record};
use fieldmux::{FieldInfo, FieldmuxError, LineBuffer, Storage, WriteContext, WriteSink};

/// Handle that appends into a shared byte vector
#[derive(Clone, Default)]
struct SharedHandle(Rc<RefCell<Vec<u8>>>);

impl Write for SharedHandle {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.borrow_mut().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[derive(Default)]
struct CountingStorage {
    dirs_created: Vec<PathBuf>,
    files_opened: Vec<PathBuf>,
    contents: HashMap<PathBuf, SharedHandle>,
    /// Number of upcoming `ensure_dir` calls that fail
    fail_dirs: usize,
    /// Number of upcoming `create` calls that fail
    fail_creates: usize,
}

impl CountingStorage {
    fn contents(&self, path: &Path) -> Vec<u8> {
        self.contents
            .get(path)
            .map(|h| h.0.borrow().clone())
            .unwrap_or_default()
    }
}

impl Storage for CountingStorage {
    type Handle = SharedHandle;

    fn ensure_dir(&mut self, path: &Path) -> io::Result<()> {
        if self.fail_dirs > 0 {
            self.fail_dirs -= 1;
            return Err(io::Error::new(io::ErrorKind::PermissionDenied, "denied"));
        }
        self.dirs_created.push(path.to_path_buf());
        Ok(())
    }

    fn create(&mut self, path: &Path) -> io::Result<SharedHandle> {
        if self.fail_creates > 0 {
            self.fail_creates -= 1;
            return Err(io::Error::new(io::ErrorKind::PermissionDenied, "denied"));
        }
        self.files_opened.push(path.to_path_buf());
        let handle = SharedHandle::default();
        self.contents.insert(path.to_path_buf(), handle.clone());
        Ok(handle)
    }
}

fn counting_context() -> WriteContext<CountingStorage> {
    WriteContext::with_storage("out", "1234", CountingStorage::default())
}

// ============================================================
// Destination resolution
// ============================================================

#[test]
fn test_repeated_writes_open_once() {
    let mut ctx = counting_context();
    for _ in 0..10 {
        ctx.write("ledger", "row").unwrap();
    }
    assert_eq!(ctx.storage().dirs_created.len(), 1);
    assert_eq!(ctx.storage().files_opened.len(), 1);
    assert_eq!(ctx.open_count(), 1);
}

#[test]
fn test_ledger_index_ledger_scenario() {
    let mut ctx = counting_context();
    ctx.write("ledger", "a").unwrap();
    ctx.write("ledger", "b").unwrap();
    ctx.write("index", "c").unwrap();
    ctx.write("ledger", "d").unwrap();

    assert_eq!(ctx.open_count(), 2);
    assert_eq!(ctx.storage().files_opened.len(), 2);
    assert_eq!(ctx.last_used(), Some("ledger"));
    assert_eq!(ctx.filenames().collect::<Vec<_>>(), vec!["ledger", "index"]);

    let ledger = ctx.path_for("ledger");
    let index = ctx.path_for("index");
    assert_eq!(ctx.storage().contents(&ledger), b"abd");
    assert_eq!(ctx.storage().contents(&index), b"c");
}

#[test]
fn test_path_convention() {
    let mut ctx = counting_context();
    ctx.write_char("F3X", b'x').unwrap();
    let expected = Path::new("out").join("F3X").join("1234.csv");
    assert_eq!(ctx.storage().dirs_created, vec![Path::new("out").join("F3X")]);
    assert_eq!(ctx.storage().files_opened, vec![expected.clone()]);
    assert_eq!(ctx.paths().collect::<Vec<_>>(), vec![expected.as_path()]);
}

#[test]
fn test_directory_failure_is_reported_then_retried() {
    let mut ctx = WriteContext::with_storage(
        "out",
        "1234",
        CountingStorage {
            fail_dirs: 1,
            ..Default::default()
        },
    );
    let err = ctx.write("ledger", "lost").unwrap_err();
    assert!(err.is_resource());
    assert!(matches!(err, FieldmuxError::CreateDir { .. }));
    assert_eq!(ctx.open_count(), 0);
    assert_eq!(ctx.last_used(), None);
    assert!(ctx.storage().files_opened.is_empty());

    ctx.write("ledger", "row").unwrap();
    assert_eq!(ctx.storage().dirs_created.len(), 1);
    assert_eq!(ctx.storage().files_opened.len(), 1);
    assert_eq!(ctx.open_count(), 1);
    let ledger = ctx.path_for("ledger");
    assert_eq!(ctx.storage().contents(&ledger), b"row");
}

#[test]
fn test_open_failure_is_reported_then_retried() {
    let mut ctx = WriteContext::with_storage(
        "out",
        "1234",
        CountingStorage {
            fail_creates: 1,
            ..Default::default()
        },
    );
    let err = ctx.write_char("ledger", b'x').unwrap_err();
    assert!(err.is_resource());
    match &err {
        FieldmuxError::OpenFile { path, .. } => assert_eq!(path, &ctx.path_for("ledger")),
        other => panic!("expected OpenFile, got {:?}", other),
    }
    assert_eq!(ctx.open_count(), 0);

    ctx.write("ledger", "row").unwrap();
    ctx.write("ledger", "more").unwrap();
    assert_eq!(ctx.storage().dirs_created.len(), 2);
    assert_eq!(ctx.storage().files_opened.len(), 1);
    assert_eq!(ctx.open_count(), 1);
    assert_eq!(ctx.last_used(), Some("ledger"));
    let ledger = ctx.path_for("ledger");
    assert_eq!(ctx.storage().contents(&ledger), b"rowmore");
}

#[test]
fn test_invalid_name_rejected_before_storage() {
    let mut ctx = counting_context();
    let err = ctx.write("../etc", "row").unwrap_err();
    assert!(matches!(err, FieldmuxError::InvalidName(_)));
    assert!(ctx.storage().dirs_created.is_empty());
}

#[test]
fn test_encoded_rows_per_destination() {
    let mut ctx = counting_context();
    write_record(&mut ctx, "SA", ["SA", "Smith, John", "10"]).unwrap();
    write_record(&mut ctx, "SB", ["SB", "say \"hi\""]).unwrap();

    let value = b"x,y";
    write_field(&mut ctx, "SA", b"SA", &FieldInfo::scan(b"SA")).unwrap();
    write_delimiter(&mut ctx, "SA").unwrap();
    write_field(&mut ctx, "SA", value, &FieldInfo::scan(value)).unwrap();
    write_newline(&mut ctx, "SA").unwrap();

    let sa = ctx.path_for("SA");
    let sb = ctx.path_for("SB");
    assert_eq!(
        ctx.storage().contents(&sa),
        b"SA,\"Smith, John\",10\nSA,\"x,y\"\n"
    );
    assert_eq!(ctx.storage().contents(&sb), b"SB,\"say \"\"hi\"\"\"\n");
}

// ============================================================
// Local diversion
// ============================================================

#[test]
fn test_local_mode_touches_no_file() {
    let mut ctx = counting_context();
    let mut buffer = LineBuffer::from("leftover");
    {
        let mut local = ctx.local(&mut buffer);
        local.write("ledger", "a,").unwrap();
        assert!(local.as_bytes() == b"a,");
        local.write_char("index", b'"').unwrap();
        local.write_n("ledger", b"tail").unwrap();
    }
    assert_eq!(buffer.as_bytes(), b"a,\"tail");
    assert!(buffer.is_terminated());
    assert_eq!(ctx.open_count(), 0);
    assert!(ctx.storage().dirs_created.is_empty());
    assert!(ctx.storage().files_opened.is_empty());
}

#[test]
fn test_local_buffer_terminated_after_every_write() {
    let mut ctx = counting_context();
    let mut buffer = LineBuffer::with_capacity(1);
    let mut local = ctx.local(&mut buffer);
    let mut expected = Vec::new();
    for chunk in ["a", "bc", "", "defghijklmnop", "q"] {
        local.write("any", chunk).unwrap();
        expected.extend_from_slice(chunk.as_bytes());
        assert_eq!(local.as_bytes(), &expected[..]);
    }
    drop(local);
    assert!(buffer.is_terminated());
}

#[test]
fn test_file_writes_resume_after_local_scope() {
    let mut ctx = counting_context();
    ctx.write("ledger", "before;").unwrap();
    let mut buffer = LineBuffer::new();
    {
        let mut local = ctx.local(&mut buffer);
        local.write("ledger", "diverted").unwrap();
    }
    ctx.write("ledger", "after").unwrap();

    let ledger = ctx.path_for("ledger");
    assert_eq!(ctx.storage().contents(&ledger), b"before;after");
    assert_eq!(buffer.as_bytes(), b"diverted");
    assert_eq!(ctx.storage().files_opened.len(), 1);
}
