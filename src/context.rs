//! File-backed write context
//!
//! A [`WriteContext`] multiplexes writes over any number of logical
//! filenames. Each name is opened lazily, once, at
//! `<output_dir>/<name>/<filing_id>.csv` and stays open until the context
//! is finished or dropped.

use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use log::{debug, trace};

use crate::buffer::LineBuffer;
use crate::error::{FieldmuxError, Result};
use crate::sink::{LocalWriter, WriteSink};

/// Extension of every file a context creates
pub const EXTENSION: &str = ".csv";

/// Directory creation and file opening on behalf of a [`WriteContext`]
pub trait Storage {
    type Handle: Write;

    /// Create `path` and any missing parents. A directory that already
    /// exists is not an error.
    fn ensure_dir(&mut self, path: &Path) -> io::Result<()>;

    /// Open `path` for writing, truncating it
    fn create(&mut self, path: &Path) -> io::Result<Self::Handle>;
}

/// The real filesystem
#[derive(Clone, Copy, Debug, Default)]
pub struct FsStorage;

impl Storage for FsStorage {
    type Handle = BufWriter<File>;

    fn ensure_dir(&mut self, path: &Path) -> io::Result<()> {
        match fs::create_dir_all(path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists && path.is_dir() => Ok(()),
            Err(e) => Err(e),
        }
    }

    fn create(&mut self, path: &Path) -> io::Result<Self::Handle> {
        Ok(BufWriter::new(File::create(path)?))
    }
}

struct Destination<H> {
    name: String,
    path: PathBuf,
    handle: H,
}

pub struct WriteContext<S: Storage = FsStorage> {
    output_dir: PathBuf,
    filing_id: String,
    storage: S,
    /// Open destinations in the order they were first used
    destinations: Vec<Destination<S::Handle>>,
    index: HashMap<String, usize>,
    /// Most recently used destination
    last: Option<usize>,
}

impl WriteContext<FsStorage> {
    pub fn new(output_dir: impl Into<PathBuf>, filing_id: impl Into<String>) -> Self {
        Self::with_storage(output_dir, filing_id, FsStorage)
    }
}

impl<S: Storage> WriteContext<S> {
    pub fn with_storage(
        output_dir: impl Into<PathBuf>,
        filing_id: impl Into<String>,
        storage: S,
    ) -> Self {
        Self {
            output_dir: output_dir.into(),
            filing_id: filing_id.into(),
            storage,
            destinations: Vec::new(),
            index: HashMap::new(),
            last: None,
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn filing_id(&self) -> &str {
        &self.filing_id
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Path a logical filename resolves to
    pub fn path_for(&self, name: &str) -> PathBuf {
        self.output_dir
            .join(name)
            .join(format!("{}{}", self.filing_id, EXTENSION))
    }

    /// Resolve `name` to its open handle, opening it on first use
    pub fn get_file(&mut self, name: &str) -> Result<&mut S::Handle> {
        let i = self.resolve(name)?;
        Ok(&mut self.destinations[i].handle)
    }

    fn resolve(&mut self, name: &str) -> Result<usize> {
        if let Some(i) = self.last.filter(|&i| self.destinations[i].name == name) {
            return Ok(i);
        }

        if let Some(&i) = self.index.get(name) {
            trace!("switching to destination {:?}", name);
            self.last = Some(i);
            return Ok(i);
        }

        validate_name(name)?;
        let dir = self.output_dir.join(name);
        self.storage
            .ensure_dir(&dir)
            .map_err(|source| FieldmuxError::CreateDir { path: dir, source })?;

        let path = self.path_for(name);
        let handle = self
            .storage
            .create(&path)
            .map_err(|source| FieldmuxError::OpenFile {
                path: path.clone(),
                source,
            })?;
        debug!("opened {:?} at {}", name, path.display());

        let i = self.destinations.len();
        self.destinations.push(Destination {
            name: name.to_string(),
            path,
            handle,
        });
        self.index.insert(name.to_string(), i);
        self.last = Some(i);
        Ok(i)
    }

    /// Divert writes into `buffer` for as long as the returned writer lives
    ///
    /// The buffer is emptied first. The context stays borrowed, so no file
    /// can be written until the writer is dropped.
    pub fn local<'a>(&'a mut self, buffer: &'a mut LineBuffer) -> LocalWriter<'a> {
        LocalWriter::new(buffer)
    }

    /// Logical filenames opened so far, in first-use order
    pub fn filenames(&self) -> impl Iterator<Item = &str> {
        self.destinations.iter().map(|d| d.name.as_str())
    }

    /// Paths opened so far, in first-use order
    pub fn paths(&self) -> impl Iterator<Item = &Path> {
        self.destinations.iter().map(|d| d.path.as_path())
    }

    pub fn open_count(&self) -> usize {
        self.destinations.len()
    }

    pub fn last_used(&self) -> Option<&str> {
        self.last.map(|i| self.destinations[i].name.as_str())
    }

    pub fn flush(&mut self) -> Result<()> {
        for destination in &mut self.destinations {
            destination.handle.flush()?;
        }
        Ok(())
    }

    /// Flush and close every destination, reporting the first failure
    pub fn finish(self) -> Result<()> {
        let mut first_err = None;
        for mut destination in self.destinations {
            if let Err(e) = destination.handle.flush() {
                debug!("flushing {} failed: {}", destination.path.display(), e);
                first_err.get_or_insert(e);
            }
        }
        match first_err {
            Some(e) => Err(e.into()),
            None => Ok(()),
        }
    }
}

impl<S: Storage> WriteSink for WriteContext<S> {
    fn write_n(&mut self, name: &str, bytes: &[u8]) -> Result<()> {
        self.get_file(name)?.write_all(bytes)?;
        Ok(())
    }
}

/// A logical filename becomes one directory segment
pub(crate) fn validate_name(name: &str) -> Result<()> {
    let invalid = name.is_empty()
        || name == "."
        || name == ".."
        || name.contains(['/', '\\', '\0']);
    if invalid {
        Err(FieldmuxError::InvalidName(name.to_string()))
    } else {
        Ok(())
    }
}
