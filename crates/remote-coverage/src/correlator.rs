//! Correlation identifiers shared with the application under test.
//!
//! A [`CoverageGroup`] scopes everything the remote collector records during
//! one suite run. A [`CoveragePointId`] tags the contributions of a single
//! scenario so the collector can attribute covered lines to it.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use uuid::Uuid;

/// Identifier of one suite run's coverage on the remote system
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CoverageGroup(String);

impl CoverageGroup {
    /// Create a fresh group for a suite. The suite name is kept as a prefix
    /// so groups stay traceable in the collector's storage.
    #[must_use]
    pub fn generate(suite_name: &str) -> Self {
        Self(format!("{suite_name}.{}", Uuid::new_v4().simple()))
    }

    /// Wrap an existing identifier (e.g. given on the command line)
    #[must_use]
    pub fn from_raw(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The identifier as sent to the remote system
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CoverageGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// `{feature_file}:{line}` tag for one scenario
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CoveragePointId(String);

impl CoveragePointId {
    /// Build the tag for the scenario starting at `line` in `feature_file`
    #[must_use]
    pub fn new(feature_file: &Path, line: u32) -> Self {
        Self(format!("{}:{line}", feature_file.display()))
    }

    /// The identifier as sent to the remote system
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CoveragePointId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Hands out correlation identifiers and remembers the active group
#[derive(Debug, Default)]
pub struct SessionCorrelator {
    current: Option<CoverageGroup>,
}

impl SessionCorrelator {
    /// Create a correlator with no active group
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a suite run and make its group current
    pub fn begin_suite(&mut self, suite_name: &str) -> CoverageGroup {
        let group = CoverageGroup::generate(suite_name);
        self.current = Some(group.clone());
        group
    }

    /// Coverage point for a scenario. Does not touch the current group.
    #[must_use]
    pub fn begin_scenario(&self, feature_file: &Path, line: u32) -> CoveragePointId {
        CoveragePointId::new(feature_file, line)
    }

    /// Forget the current group
    pub fn end_suite(&mut self) {
        self.current = None;
    }

    /// Group of the suite in progress, if any
    #[must_use]
    pub fn current_group(&self) -> Option<&CoverageGroup> {
        self.current.as_ref()
    }
}
