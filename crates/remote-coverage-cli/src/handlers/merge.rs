//! Merge command handler

use crate::config::CliConfig;
use crate::error::CliResult;
use crate::output::StatusReporter;
use crate::MergeArgs;
use remote_coverage::storage::{merge_files, write_atomic};
use remote_coverage::{CoverageData, LineCoverage};
use std::path::Path;

/// Execute the merge command
pub fn execute_merge(config: &CliConfig, args: &MergeArgs) -> CliResult<()> {
    let mut reporter = StatusReporter::from_config(config);
    reporter.start_files(args.inputs.len());
    let merged = merge_files::<LineCoverage>(&args.inputs, |path| reporter.file_done(path));
    reporter.finish_files();
    let merged = merged?;

    write_merged(&args.output, &merged)?;
    reporter.ok(&format!(
        "merged {} file(s), {} source file(s)",
        args.inputs.len(),
        merged.summary().files
    ));
    println!("{}", args.output.display());
    Ok(())
}

/// Write the merged result, replacing any existing file
pub fn write_merged(output: &Path, merged: &LineCoverage) -> CliResult<()> {
    write_atomic(output, &merged.encode()?)?;
    Ok(())
}
