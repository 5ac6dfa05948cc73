//! Split policy and output file naming.
//!
//! The split policy decides at which lifecycle boundary coverage is fetched
//! and flushed, and how the output file is named:
//!
//! | policy     | flushed after | base name                          |
//! |------------|---------------|------------------------------------|
//! | `suite`    | suite         | `{suite}`                          |
//! | `feature`  | feature       | `{parent_dir}-{feature_stem}`      |
//! | `scenario` | scenario      | `{parent_dir}-{feature_stem}_{line}` |

use crate::result::CoverageError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// Granularity at which coverage is persisted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SplitPolicy {
    /// One file per suite run
    #[default]
    Suite,
    /// One file per feature file
    Feature,
    /// One file per scenario
    Scenario,
}

impl SplitPolicy {
    /// All policies, in configuration order
    pub const ALL: [Self; 3] = [Self::Suite, Self::Feature, Self::Scenario];

    /// Configuration name of the policy
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Suite => "suite",
            Self::Feature => "feature",
            Self::Scenario => "scenario",
        }
    }

    /// Whether this policy flushes at the end of a suite
    #[must_use]
    pub const fn is_suite(self) -> bool {
        matches!(self, Self::Suite)
    }

    /// Whether this policy flushes at the end of a feature
    #[must_use]
    pub const fn is_feature(self) -> bool {
        matches!(self, Self::Feature)
    }

    /// Whether this policy flushes at the end of a scenario
    #[must_use]
    pub const fn is_scenario(self) -> bool {
        matches!(self, Self::Scenario)
    }
}

impl fmt::Display for SplitPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SplitPolicy {
    type Err = CoverageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|policy| policy.as_str() == s)
            .ok_or_else(|| {
                CoverageError::invalid_config(format!(
                    "split_by must be one of suite, feature, scenario (got \"{s}\")"
                ))
            })
    }
}

/// Base name for a suite-level flush: the suite name with path separators
/// replaced by `_`, so the file always lands directly in the target directory
#[must_use]
pub fn suite_base_name(suite_name: &str) -> String {
    suite_name.replace(['/', '\\'], "_")
}

/// Base name for a feature-level flush: `{parent_dir}-{feature_stem}`
#[must_use]
pub fn feature_base_name(feature_file: &Path) -> String {
    format!("{}-{}", parent_dir_name(feature_file), file_stem(feature_file))
}

/// Base name for a scenario-level flush: `{parent_dir}-{feature_stem}_{line}`
#[must_use]
pub fn scenario_base_name(feature_file: &Path, line: u32) -> String {
    format!("{}_{line}", feature_base_name(feature_file))
}

// A bare file name has no parent directory; "." stands in for it.
fn parent_dir_name(path: &Path) -> String {
    path.parent()
        .and_then(Path::file_name)
        .map_or_else(|| ".".to_string(), |name| name.to_string_lossy().into_owned())
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default()
}
