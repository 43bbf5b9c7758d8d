use std::path::PathBuf;

use clap::Parser;

#[derive(Parser, Debug, Clone)]
#[command(
    name = "fieldmux",
    about = "Split delimited rows into one CSV file per leading field"
)]
pub struct Args {
    /// Directory that receives one subdirectory per output name
    #[arg(short = 'o', long = "output-dir", value_name = "DIR", default_value = "output")]
    pub output_dir: PathBuf,

    /// Identifier used as the file name inside each output directory
    #[arg(short = 'i', long = "filing-id", value_name = "ID")]
    pub filing_id: String,

    /// Input fields are separated by the ASCII 28 file separator
    #[arg(long)]
    pub ascii28: bool,

    /// Fail on a quoted field that is never closed
    #[arg(short = 's', long)]
    pub strict: bool,

    /// Output name for rows with an empty or non-UTF-8 first field
    #[arg(long = "default-name", value_name = "NAME", default_value = "unknown")]
    pub default_name: String,

    /// Print every file written to stdout
    #[arg(short = 'l', long)]
    pub list: bool,

    /// Input files
    #[arg(value_name = "FILE")]
    pub files: Vec<String>,
}

impl Args {
    pub fn convention(&self) -> crate::split::Convention {
        if self.ascii28 {
            crate::split::Convention::Ascii28
        } else {
            crate::split::Convention::Csv
        }
    }
}
