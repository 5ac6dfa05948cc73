//! Remote code coverage for acceptance test runs.
//!
//! Acceptance tests drive an application through a browser or HTTP client,
//! so the code under test runs in another process. This crate hooks into the
//! test lifecycle, tags every request with a coverage group and point through
//! session cookies, asks the application's export route for what it
//! collected, and merges the result into local coverage files split by
//! suite, feature or scenario.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐  events  ┌─────────────────────────┐  cookies  ┌─────────────┐
//! │ test runner  │─────────►│ RemoteCoverageListener  │──────────►│ session(s)  │
//! │ (dispatcher) │          │  correlator  split      │           └─────────────┘
//! └──────────────┘          │  fetcher     store      │   GET     ┌─────────────┐
//!                           │                         │──────────►│ application │
//!                           └────────────┬────────────┘  export   └─────────────┘
//!                                        │ merge + atomic write
//!                                        ▼
//!                               {target_directory}/*.cov
//! ```
//!
//! # Example
//!
//! ```no_run
//! use remote_coverage::{
//!     Feature, LifecycleDispatcher, MemorySession, RemoteCoverageConfig,
//!     RemoteCoverageListener, SplitPolicy, Suite, SuiteSettings,
//! };
//!
//! # fn main() -> remote_coverage::CoverageResult<()> {
//! let config = RemoteCoverageConfig::new("build/coverage")
//!     .with_split_by(SplitPolicy::Feature)
//!     .with_base_url("http://localhost:8080");
//! let mut listener =
//!     RemoteCoverageListener::http(config)?.with_session("default", MemorySession::new());
//!
//! let suite = Suite::new("Checkout")
//!     .with_settings(SuiteSettings::new().with("remote_coverage_enabled", true));
//! let feature = Feature::new("features/checkout/pay.feature");
//! let scenario = feature.scenario(3);
//!
//! let mut dispatcher = LifecycleDispatcher::new();
//! dispatcher.register(&mut listener);
//! dispatcher.before_suite(&suite)?;
//! dispatcher.before_feature(&feature)?;
//! dispatcher.before_scenario(&scenario)?;
//! dispatcher.after_scenario(&scenario)?;
//! dispatcher.after_feature(&feature)?;
//! dispatcher.after_suite(&suite)?;
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

pub mod config;
pub mod correlator;
pub mod event;
pub mod fetcher;
pub mod lifecycle;
pub mod listener;
pub mod logging;
mod result;
pub mod session;
pub mod snapshot;
pub mod split;
pub mod storage;

pub use config::{is_truthy, RemoteCoverageConfig, SuiteSettings};
pub use correlator::{CoverageGroup, CoveragePointId, SessionCorrelator};
pub use event::{Feature, Scenario, Suite};
#[cfg(feature = "http")]
pub use fetcher::HttpTransport;
pub use fetcher::{export_url, ExportResponse, ExportTransport, RemoteFetcher};
pub use lifecycle::{LifecycleDispatcher, LifecycleListener, Phase};
pub use listener::RemoteCoverageListener;
pub use result::{CoverageError, CoverageResult};
#[cfg(feature = "http")]
pub use session::HttpSession;
pub use session::{Cookie, MemorySession, RemoteSession, SessionRegistry};
pub use snapshot::{CoverageData, CoverageSummary, LineCoverage};
pub use split::SplitPolicy;
pub use storage::{CoverageStore, StoredCoverage};
