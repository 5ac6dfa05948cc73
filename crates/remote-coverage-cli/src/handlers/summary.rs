//! Summary command handler

use crate::config::CliConfig;
use crate::error::CliResult;
use crate::output::{render_summary_json, render_summary_text};
use crate::{SummaryArgs, SummaryFormat};
use remote_coverage::storage::load;
use remote_coverage::LineCoverage;

/// Execute the summary command
pub fn execute_summary(_config: &CliConfig, args: &SummaryArgs) -> CliResult<()> {
    println!("{}", render(args)?);
    Ok(())
}

/// Summary of the file in the requested format
pub fn render(args: &SummaryArgs) -> CliResult<String> {
    let coverage: LineCoverage = load(&args.file)?;
    let summary = coverage.summary();
    Ok(match args.format {
        SummaryFormat::Text => render_summary_text(&args.file, &summary),
        SummaryFormat::Json => render_summary_json(&args.file, &summary)?,
    })
}
