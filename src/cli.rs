use std::num::NonZeroUsize;
use std::path::PathBuf;

use clap::{Parser, ValueEnum};

#[derive(Parser, Debug, Clone)]
#[command(
    name = "cis-parser",
    version,
    about = "Convert CIS Benchmark PDFs into per-control JSON records"
)]
pub struct Cli {
    /// CIS Benchmark PDF (or pre-extracted text file).
    pub input: PathBuf,

    /// Output `.json` file, or a directory that receives `<input stem>.json`.
    pub output: PathBuf,

    /// Parser worker threads. Defaults to the available parallelism.
    #[arg(long)]
    pub workers: Option<NonZeroUsize>,

    #[arg(long, value_enum, default_value_t = InputFormat::Auto)]
    pub input_format: InputFormat,

    #[arg(long)]
    pub max_pages: Option<usize>,

    /// Also write a run manifest (counts, warnings, source hash) to this path.
    #[arg(long)]
    pub manifest_path: Option<PathBuf>,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
pub enum InputFormat {
    Auto,
    Pdf,
    Text,
}

impl InputFormat {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Auto => "auto",
            Self::Pdf => "pdf",
            Self::Text => "text",
        }
    }
}
