use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum FieldmuxError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("cannot create directory {}: {source}", .path.display())]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot open {}: {source}", .path.display())]
    OpenFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("unterminated quoted field starting at byte {position}")]
    MalformedField { position: usize },

    #[error("line {line}: unterminated quoted field starting at byte {position}")]
    MalformedRow { line: usize, position: usize },

    #[error("line {line}: record terminator inside the line at byte {position}")]
    StrayTerminator { line: usize, position: usize },

    #[error("invalid output name: {0:?}")]
    InvalidName(String),
}

impl FieldmuxError {
    /// Whether this error came from provisioning an output destination
    pub fn is_resource(&self) -> bool {
        matches!(
            self,
            FieldmuxError::CreateDir { .. } | FieldmuxError::OpenFile { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, FieldmuxError>;
