//! Lifecycle hooks and ordered dispatch.
//!
//! A test runner reports its progress as a fixed sequence of events:
//!
//! ```text
//! before_suite ─► ( before_feature ─► ( before_scenario ─► after_scenario )* ─► after_feature )* ─► after_suite
//! ```
//!
//! [`LifecycleDispatcher`] forwards each event to its listeners in
//! registration order and refuses events that break the sequence, so a
//! listener can rely on `before_suite` having run before any scenario hook.

use crate::event::{Feature, Scenario, Suite};
use crate::result::{CoverageError, CoverageResult};

/// Receiver of test lifecycle events
pub trait LifecycleListener {
    /// A suite is about to run
    fn before_suite(&mut self, suite: &Suite) -> CoverageResult<()>;

    /// A feature is about to run
    fn before_feature(&mut self, _feature: &Feature) -> CoverageResult<()> {
        Ok(())
    }

    /// A scenario is about to run
    fn before_scenario(&mut self, scenario: &Scenario) -> CoverageResult<()>;

    /// A scenario finished
    fn after_scenario(&mut self, scenario: &Scenario) -> CoverageResult<()>;

    /// A feature finished
    fn after_feature(&mut self, feature: &Feature) -> CoverageResult<()>;

    /// A suite finished
    fn after_suite(&mut self, suite: &Suite) -> CoverageResult<()>;
}

/// Where the dispatcher is in the event sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    /// Between suites
    #[default]
    Idle,
    /// Inside a suite, between features
    InSuite,
    /// Inside a feature, between scenarios
    InFeature,
    /// Inside a scenario
    InScenario,
}

impl Phase {
    const fn describe(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::InSuite => "in a suite",
            Self::InFeature => "in a feature",
            Self::InScenario => "in a scenario",
        }
    }
}

/// Forwards lifecycle events to listeners, enforcing their order
pub struct LifecycleDispatcher<'a> {
    listeners: Vec<&'a mut dyn LifecycleListener>,
    phase: Phase,
}

impl std::fmt::Debug for LifecycleDispatcher<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LifecycleDispatcher")
            .field("listener_count", &self.listeners.len())
            .field("phase", &self.phase)
            .finish()
    }
}

impl Default for LifecycleDispatcher<'_> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a> LifecycleDispatcher<'a> {
    /// Create a dispatcher with no listeners
    #[must_use]
    pub fn new() -> Self {
        Self {
            listeners: Vec::new(),
            phase: Phase::Idle,
        }
    }

    /// Append a listener; listeners see events in registration order
    pub fn register(&mut self, listener: &'a mut dyn LifecycleListener) {
        self.listeners.push(listener);
    }

    /// Current phase
    #[must_use]
    pub const fn phase(&self) -> Phase {
        self.phase
    }

    /// Number of listeners
    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    /// Deliver `before_suite`
    pub fn before_suite(&mut self, suite: &Suite) -> CoverageResult<()> {
        self.transition("before_suite", &[Phase::Idle], Phase::InSuite)?;
        self.each_until_error(|listener| listener.before_suite(suite))
    }

    /// Deliver `before_feature`
    pub fn before_feature(&mut self, feature: &Feature) -> CoverageResult<()> {
        self.transition("before_feature", &[Phase::InSuite], Phase::InFeature)?;
        self.each_until_error(|listener| listener.before_feature(feature))
    }

    /// Deliver `before_scenario`
    pub fn before_scenario(&mut self, scenario: &Scenario) -> CoverageResult<()> {
        self.transition("before_scenario", &[Phase::InFeature], Phase::InScenario)?;
        self.each_until_error(|listener| listener.before_scenario(scenario))
    }

    /// Deliver `after_scenario`
    pub fn after_scenario(&mut self, scenario: &Scenario) -> CoverageResult<()> {
        self.transition("after_scenario", &[Phase::InScenario], Phase::InFeature)?;
        self.each_first_error(|listener| listener.after_scenario(scenario))
    }

    /// Deliver `after_feature`
    pub fn after_feature(&mut self, feature: &Feature) -> CoverageResult<()> {
        self.transition("after_feature", &[Phase::InFeature], Phase::InSuite)?;
        self.each_first_error(|listener| listener.after_feature(feature))
    }

    /// Deliver `after_suite`. Accepted from any phase inside a suite so an
    /// aborted run can still close it.
    pub fn after_suite(&mut self, suite: &Suite) -> CoverageResult<()> {
        self.transition(
            "after_suite",
            &[Phase::InSuite, Phase::InFeature, Phase::InScenario],
            Phase::Idle,
        )?;
        self.each_first_error(|listener| listener.after_suite(suite))
    }

    fn transition(&mut self, event: &'static str, from: &[Phase], to: Phase) -> CoverageResult<()> {
        if !from.contains(&self.phase) {
            return Err(CoverageError::OutOfOrder {
                event,
                phase: self.phase.describe(),
            });
        }
        tracing::trace!(event, from = ?self.phase, to = ?to, "lifecycle transition");
        self.phase = to;
        Ok(())
    }

    // Setup hooks: stop at the first failing listener.
    fn each_until_error<F>(&mut self, mut hook: F) -> CoverageResult<()>
    where
        F: FnMut(&mut dyn LifecycleListener) -> CoverageResult<()>,
    {
        for listener in &mut self.listeners {
            hook(&mut **listener)?;
        }
        Ok(())
    }

    // Teardown hooks: every listener runs, the first error is returned.
    fn each_first_error<F>(&mut self, mut hook: F) -> CoverageResult<()>
    where
        F: FnMut(&mut dyn LifecycleListener) -> CoverageResult<()>,
    {
        let mut first_error = None;
        for listener in &mut self.listeners {
            if let Err(e) = hook(&mut **listener) {
                if first_error.is_none() {
                    first_error = Some(e);
                }
            }
        }
        first_error.map_or(Ok(()), Err)
    }
}
