//! Coverage data returned by the remote collector.
//!
//! The wire format belongs to whatever collector library the application
//! uses, so the rest of the crate only talks to [`CoverageData`]. The bundled
//! [`LineCoverage`] maps each source file to its executable lines and the
//! coverage points (scenarios) that executed them:
//!
//! ```json
//! {"files": {"src/Cart.php": {"12": ["features/cart/add.feature:4"], "13": []}}}
//! ```
//!
//! A line with an empty set is executable but was never hit.

use crate::correlator::CoveragePointId;
use crate::result::CoverageResult;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Why a payload could not be decoded
pub type DecodeError = Box<dyn std::error::Error + Send + Sync>;

/// A coverage snapshot that can be decoded, merged and written back
pub trait CoverageData: Sized {
    /// Extension of the files this data is stored in (without the dot)
    const EXTENSION: &'static str;

    /// Decode a payload. Anything that is not well-formed coverage data of
    /// this type must be rejected.
    fn decode(bytes: &[u8]) -> Result<Self, DecodeError>;

    /// Serialize for storage
    fn encode(&self) -> CoverageResult<Vec<u8>>;

    /// Fold `other` into `self`
    fn merge(&mut self, other: Self);
}

/// Line coverage keyed by file and line number
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LineCoverage {
    files: BTreeMap<String, BTreeMap<u32, BTreeSet<String>>>,
}

impl LineCoverage {
    /// Create empty coverage
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark a line as executable without recording a hit
    pub fn add_line(&mut self, file: &str, line: u32) {
        let _ = self
            .files
            .entry(file.to_string())
            .or_default()
            .entry(line)
            .or_default();
    }

    /// Record that `point` executed `line` of `file`
    pub fn record_hit(&mut self, file: &str, line: u32, point: &CoveragePointId) {
        let _ = self
            .files
            .entry(file.to_string())
            .or_default()
            .entry(line)
            .or_default()
            .insert(point.as_str().to_string());
    }

    /// Coverage points that executed a line, if the line is known
    #[must_use]
    pub fn hits(&self, file: &str, line: u32) -> Option<&BTreeSet<String>> {
        self.files.get(file).and_then(|lines| lines.get(&line))
    }

    /// Whether a line was executed at least once
    #[must_use]
    pub fn is_covered(&self, file: &str, line: u32) -> bool {
        self.hits(file, line).is_some_and(|points| !points.is_empty())
    }

    /// Source files present in the data
    pub fn files(&self) -> impl Iterator<Item = &str> {
        self.files.keys().map(String::as_str)
    }

    /// True when no file was reported
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Totals for reporting
    #[must_use]
    pub fn summary(&self) -> CoverageSummary {
        let mut summary = CoverageSummary {
            files: self.files.len(),
            ..CoverageSummary::default()
        };
        let mut points = BTreeSet::new();
        for lines in self.files.values() {
            summary.lines += lines.len();
            for hits in lines.values() {
                if !hits.is_empty() {
                    summary.covered_lines += 1;
                }
                points.extend(hits.iter());
            }
        }
        summary.points = points.len();
        summary
    }
}

impl CoverageData for LineCoverage {
    const EXTENSION: &'static str = "cov";

    fn decode(bytes: &[u8]) -> Result<Self, DecodeError> {
        Ok(serde_json::from_slice(bytes)?)
    }

    fn encode(&self) -> CoverageResult<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }

    fn merge(&mut self, other: Self) {
        for (file, lines) in other.files {
            let ours = self.files.entry(file).or_default();
            for (line, hits) in lines {
                ours.entry(line).or_default().extend(hits);
            }
        }
    }
}

/// Counts over a [`LineCoverage`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoverageSummary {
    /// Source files
    pub files: usize,
    /// Executable lines
    pub lines: usize,
    /// Lines hit at least once
    pub covered_lines: usize,
    /// Distinct coverage points that hit anything
    pub points: usize,
}

impl CoverageSummary {
    /// Covered share of executable lines, 100% when there are none
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn coverage_percent(&self) -> f64 {
        if self.lines == 0 {
            return 100.0;
        }
        (self.covered_lines as f64 / self.lines as f64) * 100.0
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use std::path::Path;

    fn point(line: u32) -> CoveragePointId {
        CoveragePointId::new(Path::new("features/cart/add.feature"), line)
    }

    mod decode_tests {
        use super::*;

        #[test]
        fn test_decode_valid() {
            let body = br#"{"files":{"src/Cart.php":{"12":["features/cart/add.feature:4"],"13":[]}}}"#;
            let coverage = LineCoverage::decode(body).unwrap();
            assert!(coverage.is_covered("src/Cart.php", 12));
            assert!(!coverage.is_covered("src/Cart.php", 13));
            assert!(coverage.hits("src/Cart.php", 13).is_some());
            assert!(coverage.hits("src/Cart.php", 14).is_none());
        }

        #[test]
        fn test_decode_rejects_html() {
            assert!(LineCoverage::decode(b"<html><body>Fatal error</body></html>").is_err());
        }

        #[test]
        fn test_decode_rejects_wrong_shape() {
            assert!(LineCoverage::decode(b"{}").is_err());
            assert!(LineCoverage::decode(b"null").is_err());
            assert!(LineCoverage::decode(br#"{"files":[]}"#).is_err());
            assert!(LineCoverage::decode(br#"{"files":{},"extra":1}"#).is_err());
        }

        #[test]
        fn test_decode_rejects_empty_body() {
            assert!(LineCoverage::decode(b"").is_err());
        }

        #[test]
        fn test_encode_decodes_back() {
            let mut coverage = LineCoverage::new();
            coverage.record_hit("src/Cart.php", 12, &point(4));
            coverage.add_line("src/Cart.php", 13);
            let bytes = coverage.encode().unwrap();
            assert_eq!(LineCoverage::decode(&bytes).unwrap(), coverage);
        }
    }

    mod merge_tests {
        use super::*;

        #[test]
        fn test_merge_unions_hits() {
            let mut a = LineCoverage::new();
            a.record_hit("src/Cart.php", 12, &point(4));
            a.add_line("src/Cart.php", 20);

            let mut b = LineCoverage::new();
            b.record_hit("src/Cart.php", 12, &point(9));
            b.record_hit("src/Cart.php", 20, &point(9));
            b.record_hit("src/Order.php", 3, &point(9));

            a.merge(b);

            assert_eq!(a.hits("src/Cart.php", 12).unwrap().len(), 2);
            assert!(a.is_covered("src/Cart.php", 20));
            assert!(a.is_covered("src/Order.php", 3));
            assert_eq!(a.files().count(), 2);
        }

        #[test]
        fn test_merge_keeps_uncovered_lines() {
            let mut a = LineCoverage::new();
            let mut b = LineCoverage::new();
            b.add_line("src/Unused.php", 1);
            a.merge(b);
            assert!(!a.is_covered("src/Unused.php", 1));
            assert_eq!(a.summary().lines, 1);
        }

        #[test]
        fn test_merge_is_idempotent() {
            let mut a = LineCoverage::new();
            a.record_hit("src/Cart.php", 12, &point(4));
            let copy = a.clone();
            a.merge(copy.clone());
            assert_eq!(a, copy);
        }
    }

    mod summary_tests {
        use super::*;

        #[test]
        fn test_summary_counts() {
            let mut coverage = LineCoverage::new();
            coverage.record_hit("src/Cart.php", 12, &point(4));
            coverage.record_hit("src/Cart.php", 13, &point(9));
            coverage.add_line("src/Cart.php", 14);
            coverage.add_line("src/Order.php", 1);

            let summary = coverage.summary();
            assert_eq!(summary.files, 2);
            assert_eq!(summary.lines, 4);
            assert_eq!(summary.covered_lines, 2);
            assert_eq!(summary.points, 2);
            assert!((summary.coverage_percent() - 50.0).abs() < f64::EPSILON);
        }

        #[test]
        fn test_empty_is_fully_covered() {
            let summary = LineCoverage::new().summary();
            assert!(summary.coverage_percent() >= 100.0);
            assert!(LineCoverage::new().is_empty());
        }
    }
}
