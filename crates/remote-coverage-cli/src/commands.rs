//! CLI command definitions using clap

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// remote-coverage: fetch, merge and inspect coverage collected by a remote application
#[derive(Parser, Debug)]
#[command(name = "remote-coverage")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Verbosity level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Quiet mode (suppress non-error output)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Color output (auto, always, never)
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorArg,

    /// Subcommand to run
    #[command(subcommand)]
    pub command: Commands,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Export a coverage group from the application and store it
    Fetch(FetchArgs),

    /// Merge stored coverage files into one
    Merge(MergeArgs),

    /// Summarize a stored coverage file
    Summary(SummaryArgs),

    /// Load and validate a configuration file
    CheckConfig(CheckConfigArgs),
}

/// Arguments for the fetch command
#[derive(Parser, Debug)]
pub struct FetchArgs {
    /// Base URL of the application
    #[arg(long)]
    pub base_url: String,

    /// Coverage group to export
    #[arg(long)]
    pub group: String,

    /// Directory the coverage file is written to
    #[arg(long, default_value = "build/coverage")]
    pub target_directory: PathBuf,

    /// Base name of the coverage file (defaults to the group)
    #[arg(long)]
    pub name: Option<String>,

    /// Request timeout in seconds
    #[arg(long, default_value = "30")]
    pub timeout: u64,
}

/// Arguments for the merge command
#[derive(Parser, Debug)]
pub struct MergeArgs {
    /// Output file
    #[arg(short, long)]
    pub output: PathBuf,

    /// Coverage files to merge
    #[arg(required = true)]
    pub inputs: Vec<PathBuf>,
}

/// Arguments for the summary command
#[derive(Parser, Debug)]
pub struct SummaryArgs {
    /// Coverage file
    pub file: PathBuf,

    /// Output format
    #[arg(short, long, default_value = "text")]
    pub format: SummaryFormat,
}

/// Summary output format
#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SummaryFormat {
    /// Human readable
    #[default]
    Text,
    /// JSON object
    Json,
}

/// Arguments for the check-config command
#[derive(Parser, Debug)]
pub struct CheckConfigArgs {
    /// YAML configuration file
    pub file: PathBuf,
}

/// Color argument
#[derive(ValueEnum, Clone, Debug, Default)]
pub enum ColorArg {
    /// Automatic color detection
    #[default]
    Auto,
    /// Always use colors
    Always,
    /// Never use colors
    Never,
}

impl From<ColorArg> for crate::config::ColorChoice {
    fn from(arg: ColorArg) -> Self {
        match arg {
            ColorArg::Auto => Self::Auto,
            ColorArg::Always => Self::Always,
            ColorArg::Never => Self::Never,
        }
    }
}
