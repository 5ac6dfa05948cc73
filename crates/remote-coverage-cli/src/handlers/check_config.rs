//! Check-config command handler

use crate::config::CliConfig;
use crate::error::{CliError, CliResult};
use crate::output::StatusReporter;
use crate::CheckConfigArgs;
use remote_coverage::RemoteCoverageConfig;

/// Execute the check-config command: print the effective configuration
pub fn execute_check_config(config: &CliConfig, args: &CheckConfigArgs) -> CliResult<()> {
    let effective = load(args)?;
    if effective.base_url.is_none() {
        StatusReporter::from_config(config)
            .warn("no base_url configured; each session must provide one");
    }
    print!("{}", render(&effective)?);
    Ok(())
}

/// Load and validate the file
pub fn load(args: &CheckConfigArgs) -> CliResult<RemoteCoverageConfig> {
    Ok(RemoteCoverageConfig::from_path(&args.file)?)
}

/// Effective configuration as YAML, defaults filled in
pub fn render(config: &RemoteCoverageConfig) -> CliResult<String> {
    serde_yaml_ng::to_string(config).map_err(|e| CliError::config(e.to_string()))
}
