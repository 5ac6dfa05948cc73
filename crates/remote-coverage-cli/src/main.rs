//! remote-coverage CLI
//!
//! ## Usage
//!
//! ```bash
//! remote-coverage fetch --base-url http://localhost:8080 --group Checkout.1f2e --name checkout
//! remote-coverage merge -o build/coverage/all.cov build/coverage/*.cov
//! remote-coverage summary build/coverage/all.cov --format json
//! remote-coverage check-config behat.yml
//! ```

use clap::Parser;
use remote_coverage::logging;
use remote_coverage_cli::{
    handlers, Cli, CliConfig, CliResult, ColorChoice, Commands, StatusReporter, Verbosity,
};
use std::process::ExitCode;

fn main() -> ExitCode {
    let cli = Cli::parse();
    let config = build_config(&cli);
    let _ = logging::init(config.verbosity.log_filter(), false);
    tracing::debug!(?config, "starting");

    match run(&config, cli.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            StatusReporter::from_config(&config).error(&e.to_string());
            ExitCode::FAILURE
        }
    }
}

fn run(config: &CliConfig, command: Commands) -> CliResult<()> {
    match command {
        Commands::Fetch(args) => handlers::execute_fetch(config, &args),
        Commands::Merge(args) => handlers::execute_merge(config, &args),
        Commands::Summary(args) => handlers::execute_summary(config, &args),
        Commands::CheckConfig(args) => handlers::execute_check_config(config, &args),
    }
}

fn build_config(cli: &Cli) -> CliConfig {
    let verbosity = Verbosity::from_flags(cli.quiet, cli.verbose);
    let color: ColorChoice = cli.color.clone().into();

    CliConfig::new().with_verbosity(verbosity).with_color(color)
}
