//! Output formatting and status reporting.
//!
//! Results (paths, summaries, YAML) go to stdout so they can be piped.
//! Everything meant for the person at the terminal goes to stderr through
//! [`StatusReporter`]: one-line statuses and the merge progress bar.

use crate::config::CliConfig;
use console::{style, Term};
use indicatif::{ProgressBar, ProgressStyle};
use remote_coverage::CoverageSummary;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Status {
    Ok,
    Warn,
    Error,
}

impl Status {
    fn prefix(self, color: bool) -> String {
        match (self, color) {
            (Self::Ok, true) => style("✓").green().bold().to_string(),
            (Self::Warn, true) => style("⚠").yellow().bold().to_string(),
            (Self::Error, true) => style("✗").red().bold().to_string(),
            (Self::Ok, false) => "OK".to_string(),
            (Self::Warn, false) => "WARN".to_string(),
            (Self::Error, false) => "ERROR".to_string(),
        }
    }
}

/// Status lines and file progress on stderr
#[derive(Debug)]
pub struct StatusReporter {
    term: Term,
    color: bool,
    quiet: bool,
    bar: Option<ProgressBar>,
}

impl StatusReporter {
    /// Reporter writing to stderr
    #[must_use]
    pub fn new(color: bool, quiet: bool) -> Self {
        Self {
            term: Term::stderr(),
            color,
            quiet,
            bar: None,
        }
    }

    /// Reporter honoring the global `--color` and `-q` flags
    #[must_use]
    pub fn from_config(config: &CliConfig) -> Self {
        Self::new(config.color.should_color(), config.verbosity.is_quiet())
    }

    /// Show a bar counting `total` input files. Quiet mode shows nothing.
    pub fn start_files(&mut self, total: usize) {
        if self.quiet {
            return;
        }
        let bar = ProgressBar::new(total as u64);
        bar.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{bar:30.cyan/blue}] {pos}/{len} {wide_msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("=>-"),
        );
        self.bar = Some(bar);
    }

    /// One input file is done
    pub fn file_done(&self, path: &Path) {
        if let Some(bar) = &self.bar {
            bar.set_message(path.display().to_string());
            bar.inc(1);
        }
    }

    /// Remove the bar
    pub fn finish_files(&mut self) {
        if let Some(bar) = self.bar.take() {
            bar.finish_and_clear();
        }
    }

    /// Report success. Hidden in quiet mode.
    pub fn ok(&self, message: &str) {
        self.emit(Status::Ok, message);
    }

    /// Report something suspicious. Hidden in quiet mode.
    pub fn warn(&self, message: &str) {
        self.emit(Status::Warn, message);
    }

    /// Report a failure. Always shown.
    pub fn error(&self, message: &str) {
        self.emit(Status::Error, message);
    }

    fn emit(&self, status: Status, message: &str) {
        if let Some(line) = self.line(status, message) {
            let _ = self.term.write_line(&line);
        }
    }

    fn line(&self, status: Status, message: &str) -> Option<String> {
        if self.quiet && status != Status::Error {
            return None;
        }
        Some(format!("{} {message}", status.prefix(self.color)))
    }
}

/// Human readable summary of one coverage file
#[must_use]
pub fn render_summary_text(path: &Path, summary: &CoverageSummary) -> String {
    format!(
        "{}\n  files:        {}\n  lines:        {}\n  covered:      {} ({:.1}%)\n  points:       {}",
        path.display(),
        summary.files,
        summary.lines,
        summary.covered_lines,
        summary.coverage_percent(),
        summary.points,
    )
}

/// JSON summary of one coverage file
pub fn render_summary_json(path: &Path, summary: &CoverageSummary) -> serde_json::Result<String> {
    serde_json::to_string_pretty(&serde_json::json!({
        "file": path.display().to_string(),
        "files": summary.files,
        "lines": summary.lines,
        "covered_lines": summary.covered_lines,
        "coverage_percent": summary.coverage_percent(),
        "points": summary.points,
    }))
}
