//! Fetch command handler

use crate::config::CliConfig;
use crate::error::{CliError, CliResult};
use crate::output::StatusReporter;
use crate::FetchArgs;
use remote_coverage::{
    CoverageGroup, CoverageStore, HttpTransport, LineCoverage, RemoteCoverageConfig,
    RemoteFetcher,
};

/// Execute the fetch command: export one group and store it
pub fn execute_fetch(config: &CliConfig, args: &FetchArgs) -> CliResult<()> {
    let coverage_config = fetch_config(args)?;
    let base_name = base_name(args)?;
    let group = CoverageGroup::from_raw(args.group.as_str());

    let fetcher = RemoteFetcher::new(HttpTransport::new(coverage_config.fetch_timeout())?);
    let snapshot: LineCoverage = fetcher.fetch(&args.base_url, &group)?;
    let stored = CoverageStore::new(&coverage_config.target_directory).store(snapshot, base_name)?;

    let reporter = StatusReporter::from_config(config);
    if stored.merged {
        reporter.ok(&format!("merged group {group} into existing file"));
    } else {
        reporter.ok(&format!("stored group {group}"));
    }
    println!("{}", stored.path.display());
    Ok(())
}

/// Validated configuration equivalent to the fetch arguments
pub fn fetch_config(args: &FetchArgs) -> CliResult<RemoteCoverageConfig> {
    let config = RemoteCoverageConfig::new(&args.target_directory)
        .with_base_url(args.base_url.as_str())
        .with_fetch_timeout_secs(args.timeout);
    config.validate()?;
    Ok(config)
}

/// File base name: `--name`, else the group
pub fn base_name(args: &FetchArgs) -> CliResult<&str> {
    let name = args.name.as_deref().unwrap_or(&args.group);
    if name.is_empty() || name.contains(['/', '\\']) {
        return Err(CliError::invalid_argument(format!(
            "\"{name}\" is not usable as a file name"
        )));
    }
    Ok(name)
}
