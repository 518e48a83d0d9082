//! Run statistics and the end-of-run summary

use chrono::{DateTime, Utc};
use std::path::Path;

/// An item that could not be processed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Failure {
    /// URL or path of the item
    pub identifier: String,

    /// Human-readable cause
    pub reason: String,
}

/// Final statistics of one run
///
/// Built by a [`RunRecorder`] and immutable once the run has finished.
#[derive(Debug, Clone)]
pub struct RunReport {
    /// Items the run set out to process
    pub total: usize,

    /// Items written successfully
    pub succeeded: usize,

    /// Items left alone because their output already existed
    pub skipped: usize,

    /// Bytes written to disk
    pub bytes_written: u64,

    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,

    /// Failed items, in the order they failed
    pub failures: Vec<Failure>,
}

impl RunReport {
    pub fn failed(&self) -> usize {
        self.failures.len()
    }

    pub fn elapsed(&self) -> chrono::Duration {
        self.finished_at - self.started_at
    }

    /// Share of items that succeeded, in percent
    pub fn success_rate(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            (self.succeeded as f64 / self.total as f64) * 100.0
        }
    }

    /// Prints the end-of-run summary to stdout
    pub fn print_summary(&self, output_root: &Path) {
        println!();
        println!("=== Run Summary ===\n");

        println!("Overview:");
        println!("  Total items: {}", self.total);
        println!("  Succeeded: {}", self.succeeded);
        println!("  Failed: {}", self.failed());
        if self.skipped > 0 {
            println!("  Skipped (already present): {}", self.skipped);
        }
        println!("  Bytes written: {}", format_bytes(self.bytes_written));
        println!(
            "  Elapsed: {:.1}s",
            self.elapsed().num_milliseconds() as f64 / 1000.0
        );
        println!("  Output: {}", output_root.display());
        println!();

        if !self.failures.is_empty() {
            println!("Failed Items ({}):", self.failures.len());
            for failure in &self.failures {
                println!("  - {} ({})", failure.identifier, failure.reason);
            }
            println!();
        }

        println!(
            "Success Rate: {:.1}% ({} / {} items)",
            self.success_rate(),
            self.succeeded,
            self.total
        );
    }
}

/// Accumulates statistics while a run is in progress
///
/// Owned by a single aggregating task; workers report back to it rather
/// than sharing it.
#[derive(Debug)]
pub struct RunRecorder {
    total: usize,
    succeeded: usize,
    skipped: usize,
    bytes_written: u64,
    started_at: DateTime<Utc>,
    failures: Vec<Failure>,
}

impl Default for RunRecorder {
    fn default() -> Self {
        Self::new()
    }
}

impl RunRecorder {
    pub fn new() -> Self {
        Self {
            total: 0,
            succeeded: 0,
            skipped: 0,
            bytes_written: 0,
            started_at: Utc::now(),
            failures: Vec::new(),
        }
    }

    /// Adds `count` items to the planned total
    pub fn add_total(&mut self, count: usize) {
        self.total += count;
    }

    pub fn record_success(&mut self, bytes: u64) {
        self.succeeded += 1;
        self.bytes_written += bytes;
    }

    pub fn record_skipped(&mut self) {
        self.skipped += 1;
    }

    pub fn record_failure(&mut self, identifier: impl Into<String>, reason: impl Into<String>) {
        self.failures.push(Failure {
            identifier: identifier.into(),
            reason: reason.into(),
        });
    }

    /// Closes the run and returns the immutable report
    pub fn finish(self) -> RunReport {
        RunReport {
            total: self.total,
            succeeded: self.succeeded,
            skipped: self.skipped,
            bytes_written: self.bytes_written,
            started_at: self.started_at,
            finished_at: Utc::now(),
            failures: self.failures,
        }
    }
}

fn format_bytes(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["B", "KiB", "MiB", "GiB"];
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{} B", bytes)
    } else {
        format!("{:.1} {}", value, UNITS[unit])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recorder_counts() {
        let mut recorder = RunRecorder::new();
        recorder.add_total(3);
        recorder.record_success(100);
        recorder.record_failure("https://x.com/a", "HTTP 404");
        recorder.record_skipped();

        let report = recorder.finish();
        assert_eq!(report.total, 3);
        assert_eq!(report.succeeded, 1);
        assert_eq!(report.failed(), 1);
        assert_eq!(report.skipped, 1);
        assert_eq!(report.bytes_written, 100);
        assert_eq!(report.failures[0].identifier, "https://x.com/a");
        assert!(report.finished_at >= report.started_at);
    }

    #[test]
    fn test_failures_keep_order() {
        let mut recorder = RunRecorder::new();
        recorder.record_failure("b", "x");
        recorder.record_failure("a", "y");
        let ids: Vec<_> = recorder
            .finish()
            .failures
            .into_iter()
            .map(|f| f.identifier)
            .collect();
        assert_eq!(ids, vec!["b", "a"]);
    }

    #[test]
    fn test_success_rate() {
        let mut recorder = RunRecorder::new();
        assert_eq!(RunRecorder::new().finish().success_rate(), 0.0);
        recorder.add_total(4);
        recorder.record_success(0);
        assert_eq!(recorder.finish().success_rate(), 25.0);
    }

    #[test]
    fn test_format_bytes() {
        assert_eq!(format_bytes(512), "512 B");
        assert_eq!(format_bytes(2048), "2.0 KiB");
        assert_eq!(format_bytes(5 * 1024 * 1024), "5.0 MiB");
    }
}
