use std::fs::File;
use std::io::{self, BufRead, BufReader, Write};

use clap::Parser;
use log::info;

use fieldmux::cli::Args;
use fieldmux::config::Config;
use fieldmux::{Result, SplitStats, WriteContext};

/// Set up SIGPIPE handling for Unix systems
/// This prevents "broken pipe" errors when `--list` output is piped to `head`
#[cfg(unix)]
fn setup_sigpipe() {
    unsafe {
        libc::signal(libc::SIGPIPE, libc::SIG_DFL);
    }
}

#[cfg(not(unix))]
fn setup_sigpipe() {
    // Windows doesn't have SIGPIPE
}

fn main() {
    setup_sigpipe();
    env_logger::init();

    if let Err(e) = run() {
        eprintln!("fieldmux: {}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let args = Args::parse();
    let config = Config::from_args(&args)?;
    let splitter = config.splitter();
    let mut ctx = WriteContext::new(&config.output_dir, &config.filing_id);
    let mut stats = SplitStats::default();

    if config.input_files.is_empty() {
        stats.merge(splitter.split(io::stdin().lock(), &mut ctx)?);
    } else {
        for path in &config.input_files {
            let reader: Box<dyn BufRead> = if path == "-" {
                Box::new(io::stdin().lock())
            } else {
                Box::new(BufReader::new(File::open(path)?))
            };
            stats.merge(splitter.split(reader, &mut ctx)?);
        }
    }

    info!(
        "wrote {} rows to {} files ({} malformed)",
        stats.rows,
        ctx.open_count(),
        stats.malformed
    );

    if config.list {
        let stdout = io::stdout();
        let mut out = stdout.lock();
        for path in ctx.paths() {
            writeln!(out, "{}", path.display())?;
        }
        out.flush()?;
    }

    ctx.finish()
}
