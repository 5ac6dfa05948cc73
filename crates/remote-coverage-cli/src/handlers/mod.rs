//! Command handlers, one module per subcommand

pub mod check_config;
pub mod fetch;
pub mod merge;
pub mod summary;

pub use check_config::execute_check_config;
pub use fetch::execute_fetch;
pub use merge::execute_merge;
pub use summary::execute_summary;
