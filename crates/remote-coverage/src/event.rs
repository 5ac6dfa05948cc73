//! Test run elements delivered with lifecycle events.

use crate::config::SuiteSettings;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// A named collection of feature files run together
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Suite {
    /// Suite name
    pub name: String,
    /// Suite-level settings
    #[serde(default)]
    pub settings: SuiteSettings,
}

impl Suite {
    /// Create a suite with no settings
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            settings: SuiteSettings::default(),
        }
    }

    /// Set settings
    #[must_use]
    pub fn with_settings(mut self, settings: SuiteSettings) -> Self {
        self.settings = settings;
        self
    }
}

/// One feature file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Feature {
    /// Path of the feature file
    pub file: PathBuf,
    /// Feature title
    #[serde(default)]
    pub title: String,
}

impl Feature {
    /// Create a feature for `file`
    #[must_use]
    pub fn new(file: impl Into<PathBuf>) -> Self {
        Self {
            file: file.into(),
            title: String::new(),
        }
    }

    /// Set title
    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Scenario of this feature starting at `line`
    #[must_use]
    pub fn scenario(&self, line: u32) -> Scenario {
        Scenario::new(&self.file, line)
    }
}

/// One scenario (or scenario outline example) within a feature
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scenario {
    /// Path of the feature file the scenario belongs to
    pub feature_file: PathBuf,
    /// Line the scenario starts at
    pub line: u32,
    /// Scenario title
    #[serde(default)]
    pub title: String,
}

impl Scenario {
    /// Create a scenario at `line` of `feature_file`
    #[must_use]
    pub fn new(feature_file: impl AsRef<Path>, line: u32) -> Self {
        Self {
            feature_file: feature_file.as_ref().to_path_buf(),
            line,
            title: String::new(),
        }
    }

    /// Set title
    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }
}
