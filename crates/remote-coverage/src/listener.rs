//! The coverage listener driving a test run.
//!
//! ```text
//!  before_suite     enabled? ─ no ─► every hook is a no-op until after_suite
//!       │ yes
//!       ▼
//!  new group, resolve session + base URL
//!       │
//!  before_scenario  start session, set collect/group/point cookies
//!  after_scenario   split_by = scenario ─► fetch + store `{dir}-{stem}_{line}`
//!  after_feature    split_by = feature  ─► fetch + store `{dir}-{stem}`
//!  after_suite      split_by = suite    ─► fetch + store `{suite}`
//!       │
//!       ▼
//!  reset (always): coverage cookies removed from every session that got them
//! ```

use crate::config::RemoteCoverageConfig;
use crate::correlator::{CoverageGroup, SessionCorrelator};
use crate::event::{Feature, Scenario, Suite};
use crate::fetcher::{ExportTransport, RemoteFetcher};
use crate::lifecycle::LifecycleListener;
use crate::result::{CoverageError, CoverageResult};
use crate::session::{
    Cookie, RemoteSession, SessionRegistry, COLLECT_COOKIE, GROUP_COOKIE, POINT_COOKIE,
};
use crate::snapshot::{CoverageData, LineCoverage};
use crate::split;
use crate::storage::{CoverageStore, StoredCoverage};
use std::collections::BTreeSet;
use std::marker::PhantomData;

/// State held while a suite with coverage enabled is running
#[derive(Debug, Clone, PartialEq, Eq)]
struct ActiveSuite {
    session: String,
    base_url: String,
}

/// Maps test lifecycle events onto remote coverage collection.
///
/// One instance lives for the whole test run. Between `before_suite` and
/// `after_suite` of an enabled suite it holds the suite's coverage group and
/// the session cookies are sent through; otherwise it is idle.
#[derive(Debug)]
pub struct RemoteCoverageListener<T, C = LineCoverage> {
    config: RemoteCoverageConfig,
    sessions: SessionRegistry,
    fetcher: RemoteFetcher<T>,
    store: CoverageStore,
    correlator: SessionCorrelator,
    active: Option<ActiveSuite>,
    cookie_sessions: BTreeSet<String>,
    _coverage: PhantomData<fn() -> C>,
}

impl<T: ExportTransport> RemoteCoverageListener<T> {
    /// Create a listener storing [`LineCoverage`]
    pub fn new(config: RemoteCoverageConfig, transport: T) -> CoverageResult<Self> {
        Self::for_coverage_data(config, transport)
    }
}

#[cfg(feature = "http")]
impl RemoteCoverageListener<crate::fetcher::HttpTransport> {
    /// Create a listener fetching over HTTP with the configured timeout
    pub fn http(config: RemoteCoverageConfig) -> CoverageResult<Self> {
        let transport = crate::fetcher::HttpTransport::new(config.fetch_timeout())?;
        Self::new(config, transport)
    }
}

impl<T: ExportTransport, C: CoverageData> RemoteCoverageListener<T, C> {
    /// Create a listener storing coverage of type `C`
    pub fn for_coverage_data(config: RemoteCoverageConfig, transport: T) -> CoverageResult<Self> {
        config.validate()?;
        Ok(Self {
            sessions: SessionRegistry::new(&config.default_session),
            store: CoverageStore::new(&config.target_directory),
            fetcher: RemoteFetcher::new(transport),
            correlator: SessionCorrelator::new(),
            active: None,
            cookie_sessions: BTreeSet::new(),
            config,
            _coverage: PhantomData,
        })
    }

    /// Register a session under `name`
    #[must_use]
    pub fn with_session(mut self, name: &str, session: impl RemoteSession + 'static) -> Self {
        self.sessions.register(name, session);
        self
    }

    /// Register a session under `name`
    pub fn register_session(&mut self, name: &str, session: impl RemoteSession + 'static) {
        self.sessions.register(name, session);
    }

    /// Run configuration
    #[must_use]
    pub const fn config(&self) -> &RemoteCoverageConfig {
        &self.config
    }

    /// Registered sessions
    #[must_use]
    pub const fn sessions(&self) -> &SessionRegistry {
        &self.sessions
    }

    /// The fetcher (and through it the transport)
    #[must_use]
    pub const fn fetcher(&self) -> &RemoteFetcher<T> {
        &self.fetcher
    }

    /// Whether coverage is being collected for the current suite
    #[must_use]
    pub const fn is_enabled(&self) -> bool {
        self.active.is_some()
    }

    /// Group of the running suite
    #[must_use]
    pub fn current_group(&self) -> Option<&CoverageGroup> {
        self.correlator.current_group()
    }

    /// Session selected for the running suite
    #[must_use]
    pub fn selected_session(&self) -> Option<&str> {
        self.active.as_ref().map(|active| active.session.as_str())
    }

    /// Base URL coverage is exported from for the running suite
    #[must_use]
    pub fn active_base_url(&self) -> Option<&str> {
        self.active.as_ref().map(|active| active.base_url.as_str())
    }

    /// Back to idle: no group, collection off, no selected session, and no
    /// coverage cookies left on any session
    pub fn reset(&mut self) {
        self.correlator.end_suite();
        self.active = None;
        self.clear_cookies();
    }

    fn clear_cookies(&mut self) {
        for name in std::mem::take(&mut self.cookie_sessions) {
            let Some(session) = self.sessions.get_mut(&name) else {
                continue;
            };
            for cookie in [COLLECT_COOKIE, GROUP_COOKIE, POINT_COOKIE] {
                if let Err(e) = session.remove_cookie(cookie) {
                    tracing::warn!(session = %name, cookie, error = %e, "failed to clear coverage cookie");
                }
            }
        }
    }

    /// Fetch the running suite's coverage and store it under `base_name`
    pub fn flush(&self, base_name: &str) -> CoverageResult<StoredCoverage> {
        let active = self.active.as_ref().ok_or(CoverageError::NoActiveGroup)?;
        let group = self
            .correlator
            .current_group()
            .ok_or(CoverageError::NoActiveGroup)?;

        let snapshot: C = self.fetcher.fetch(&active.base_url, group)?;
        let stored = self.store.store(snapshot, base_name)?;
        tracing::info!(
            group = %group,
            path = %stored.path.display(),
            merged = stored.merged,
            "flushed remote coverage"
        );
        Ok(stored)
    }

    fn start_suite(&mut self, suite: &Suite) -> CoverageResult<()> {
        let session = self.sessions.resolve(suite.settings.session_name())?;
        let session_base_url = self.sessions.get(&session).and_then(|s| s.base_url());
        let base_url = self.config.resolve_base_url(session_base_url)?;

        let group = self.correlator.begin_suite(&suite.name);
        tracing::info!(
            suite = %suite.name,
            group = %group,
            session = %session,
            split_by = %self.config.split_by,
            "remote coverage enabled"
        );
        self.active = Some(ActiveSuite { session, base_url });
        Ok(())
    }
}

impl<T: ExportTransport, C: CoverageData> LifecycleListener for RemoteCoverageListener<T, C> {
    fn before_suite(&mut self, suite: &Suite) -> CoverageResult<()> {
        self.reset();
        if !suite.settings.coverage_enabled() {
            tracing::debug!(suite = %suite.name, "remote coverage disabled for suite");
            return Ok(());
        }
        self.start_suite(suite)
    }

    fn before_scenario(&mut self, scenario: &Scenario) -> CoverageResult<()> {
        let Some(active) = &self.active else {
            return Ok(());
        };
        let group = self
            .correlator
            .current_group()
            .ok_or(CoverageError::NoActiveGroup)?;
        let point = self
            .correlator
            .begin_scenario(&scenario.feature_file, scenario.line);

        let session = self.sessions.get_mut(&active.session).ok_or_else(|| {
            CoverageError::UnknownSession {
                name: active.session.clone(),
                registered: String::new(),
            }
        })?;
        if !session.is_started() {
            session.start()?;
        }
        self.cookie_sessions.insert(active.session.clone());
        session.set_cookie(Cookie::new(COLLECT_COOKIE, "true"))?;
        session.set_cookie(Cookie::new(GROUP_COOKIE, group.as_str()))?;
        session.set_cookie(Cookie::new(POINT_COOKIE, point.as_str()))?;
        tracing::debug!(point = %point, session = %active.session, "coverage cookies set");
        Ok(())
    }

    fn after_scenario(&mut self, scenario: &Scenario) -> CoverageResult<()> {
        if !self.is_enabled() || !self.config.split_by.is_scenario() {
            return Ok(());
        }
        let base_name = split::scenario_base_name(&scenario.feature_file, scenario.line);
        self.flush(&base_name).map(|_| ())
    }

    fn after_feature(&mut self, feature: &Feature) -> CoverageResult<()> {
        if !self.is_enabled() || !self.config.split_by.is_feature() {
            return Ok(());
        }
        let base_name = split::feature_base_name(&feature.file);
        self.flush(&base_name).map(|_| ())
    }

    fn after_suite(&mut self, suite: &Suite) -> CoverageResult<()> {
        let result = if self.is_enabled() && self.config.split_by.is_suite() {
            self.flush(&split::suite_base_name(&suite.name)).map(|_| ())
        } else {
            Ok(())
        };
        if let Err(e) = &result {
            tracing::warn!(suite = %suite.name, error = %e, "suite coverage flush failed");
        }
        self.reset();
        result
    }
}
