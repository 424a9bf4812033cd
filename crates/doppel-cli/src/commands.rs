//! CLI argument definitions using clap

use clap::{Parser, ValueEnum};
use std::path::PathBuf;

/// Doppel: generate a test double for a Rust struct
#[derive(Parser, Debug)]
#[command(name = "doppel")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Struct to generate a test double for
    #[arg(value_name = "TYPE")]
    pub type_name: Option<String>,

    /// Source root to scan for the type
    #[arg(short = 'C', long = "dir", value_name = "DIR", default_value = ".")]
    pub dir: PathBuf,

    /// Directory the generated file is written to
    #[arg(
        short,
        long,
        value_name = "DIR",
        default_value = ".",
        env = "DOPPEL_OUT_DIR"
    )]
    pub out_dir: PathBuf,

    /// Read type declarations from a JSON or YAML catalog instead of scanning sources
    #[arg(long, value_name = "FILE")]
    pub catalog: Option<PathBuf>,

    /// Print the generated source instead of writing it
    #[arg(long)]
    pub stdout: bool,

    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Quiet mode (errors only)
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Log output format
    #[arg(long, value_enum, default_value = "text")]
    pub log_format: LogFormatArg,
}

/// Log format argument
#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LogFormatArg {
    /// Human-readable lines
    #[default]
    Text,
    /// One JSON object per event
    Json,
}
