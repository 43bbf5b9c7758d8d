use std::path::PathBuf;

use crate::cli::Args;
use crate::context::validate_name;
use crate::error::Result;
use crate::split::{Convention, Splitter};

/// Runtime configuration derived from CLI arguments
#[derive(Clone, Debug)]
pub struct Config {
    pub output_dir: PathBuf,
    pub filing_id: String,
    pub convention: Convention,
    pub strict: bool,
    pub default_name: String,
    pub list: bool,
    pub input_files: Vec<String>,
}

impl Config {
    /// Build configuration from parsed CLI arguments
    pub fn from_args(args: &Args) -> Result<Self> {
        // Both end up as single path components
        validate_name(&args.filing_id)?;
        validate_name(&args.default_name)?;

        Ok(Config {
            output_dir: args.output_dir.clone(),
            filing_id: args.filing_id.clone(),
            convention: args.convention(),
            strict: args.strict,
            default_name: args.default_name.clone(),
            list: args.list,
            input_files: args.files.clone(),
        })
    }

    pub fn splitter(&self) -> Splitter {
        Splitter {
            convention: self.convention,
            strict: self.strict,
            default_name: self.default_name.clone(),
        }
    }
}
