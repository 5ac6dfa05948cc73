//! Extension configuration and per-suite settings.
//!
//! ```yaml
//! remote_code_coverage:
//!   target_directory: build/coverage
//!   split_by: feature          # suite | feature | scenario
//!   base_url: http://localhost:8000
//!   fetch_timeout_secs: 30
//!   default_session: default
//! ```
//!
//! Suites opt in through their own settings:
//!
//! ```yaml
//! remote_coverage_enabled: true
//! mink_session: selenium
//! ```

use crate::result::{CoverageError, CoverageResult};
use crate::split::SplitPolicy;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Key the configuration may be nested under
pub const CONFIG_KEY: &str = "remote_code_coverage";
/// Suite setting that enables collection
pub const ENABLED_SETTING: &str = "remote_coverage_enabled";
/// Suite setting that selects a session
pub const SESSION_SETTING: &str = "mink_session";

const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 30;

fn default_fetch_timeout_secs() -> u64 {
    DEFAULT_FETCH_TIMEOUT_SECS
}

fn default_session() -> String {
    "default".to_string()
}

/// Run-wide configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RemoteCoverageConfig {
    /// Directory coverage files are written to
    pub target_directory: PathBuf,
    /// Granularity of the written files
    #[serde(default)]
    pub split_by: SplitPolicy,
    /// Base URL of the application; `None` uses the session's base URL
    #[serde(default)]
    pub base_url: Option<String>,
    /// Export request timeout
    #[serde(default = "default_fetch_timeout_secs")]
    pub fetch_timeout_secs: u64,
    /// Session used when a suite does not name one
    #[serde(default = "default_session")]
    pub default_session: String,
}

impl RemoteCoverageConfig {
    /// Create a configuration with defaults for everything but the target
    #[must_use]
    pub fn new(target_directory: impl Into<PathBuf>) -> Self {
        Self {
            target_directory: target_directory.into(),
            split_by: SplitPolicy::default(),
            base_url: None,
            fetch_timeout_secs: DEFAULT_FETCH_TIMEOUT_SECS,
            default_session: default_session(),
        }
    }

    /// Set split policy
    #[must_use]
    pub const fn with_split_by(mut self, split_by: SplitPolicy) -> Self {
        self.split_by = split_by;
        self
    }

    /// Set base URL
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Set export timeout
    #[must_use]
    pub const fn with_fetch_timeout_secs(mut self, secs: u64) -> Self {
        self.fetch_timeout_secs = secs;
        self
    }

    /// Set default session name
    #[must_use]
    pub fn with_default_session(mut self, name: impl Into<String>) -> Self {
        self.default_session = name.into();
        self
    }

    /// Parse YAML, either the bare mapping or nested under `remote_code_coverage`
    pub fn from_yaml_str(yaml: &str) -> CoverageResult<Self> {
        let document: serde_yaml_ng::Value = serde_yaml_ng::from_str(yaml)
            .map_err(|e| CoverageError::invalid_config(e.to_string()))?;
        let section = match document.get(CONFIG_KEY) {
            Some(section) => section.clone(),
            None => document,
        };
        let config: Self = serde_yaml_ng::from_value(section)
            .map_err(|e| CoverageError::invalid_config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a YAML file
    pub fn from_path(path: &Path) -> CoverageResult<Self> {
        let yaml = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&yaml)
    }

    /// Reject values that cannot work
    pub fn validate(&self) -> CoverageResult<()> {
        if self.target_directory.as_os_str().is_empty() {
            return Err(CoverageError::invalid_config(
                "target_directory must not be empty",
            ));
        }
        if self.fetch_timeout_secs == 0 {
            return Err(CoverageError::invalid_config(
                "fetch_timeout_secs must be greater than zero",
            ));
        }
        if self.default_session.is_empty() {
            return Err(CoverageError::invalid_config(
                "default_session must not be empty",
            ));
        }
        if let Some(base_url) = &self.base_url {
            let _ = url::Url::parse(base_url).map_err(|e| {
                CoverageError::invalid_config(format!("invalid base_url \"{base_url}\": {e}"))
            })?;
        }
        Ok(())
    }

    /// Export timeout as a duration
    #[must_use]
    pub const fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }

    /// Configured base URL, else the session's
    pub fn resolve_base_url(&self, session_base_url: Option<&str>) -> CoverageResult<String> {
        self.base_url
            .as_deref()
            .or(session_base_url)
            .map(|url| url.trim_end_matches('/').to_string())
            .ok_or_else(|| {
                CoverageError::invalid_config(
                    "no base_url configured and the session does not provide one",
                )
            })
    }
}

/// Settings attached to one suite
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SuiteSettings(BTreeMap<String, serde_json::Value>);

impl SuiteSettings {
    /// Create empty settings
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a setting
    #[must_use]
    pub fn with(mut self, key: &str, value: impl Into<serde_json::Value>) -> Self {
        let _ = self.0.insert(key.to_string(), value.into());
        self
    }

    /// Whether a setting is present
    #[must_use]
    pub fn has_setting(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    /// Raw setting value
    #[must_use]
    pub fn setting(&self, key: &str) -> Option<&serde_json::Value> {
        self.0.get(key)
    }

    /// Whether coverage collection is switched on for the suite
    #[must_use]
    pub fn coverage_enabled(&self) -> bool {
        self.setting(ENABLED_SETTING).is_some_and(is_truthy)
    }

    /// Session the suite asked for, if any
    #[must_use]
    pub fn session_name(&self) -> Option<&str> {
        self.setting(SESSION_SETTING)
            .and_then(serde_json::Value::as_str)
            .filter(|name| !name.is_empty())
    }
}

/// Truthiness used for suite switches.
///
/// Stricter than PHP truthiness: besides `false`, `null`, zero, `""`, `"0"`
/// and empty collections, the string `"false"` and whitespace-only strings
/// are off as well, so `remote_coverage_enabled: "false"` in YAML disables
/// collection.
#[must_use]
pub fn is_truthy(value: &serde_json::Value) -> bool {
    use serde_json::Value;
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !matches!(s.trim(), "" | "0" | "false"),
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
    }
}
