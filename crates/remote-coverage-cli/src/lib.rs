//! remote-coverage CLI library
//!
//! Command-line companion to the `remote-coverage` library: fetch a single
//! coverage group by hand, merge stored files, summarize them and validate
//! configuration.

#![warn(missing_docs)]
#![allow(clippy::missing_errors_doc)]

mod commands;
mod config;
mod error;
pub mod handlers;
mod output;

pub use commands::{
    CheckConfigArgs, Cli, ColorArg, Commands, FetchArgs, MergeArgs, SummaryArgs, SummaryFormat,
};
pub use config::{CliConfig, ColorChoice, Verbosity};
pub use error::{CliError, CliResult};
pub use output::{render_summary_json, render_summary_text, StatusReporter};
