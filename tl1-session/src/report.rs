//! Test outcome recording
//!
//! Every command exchange ends in exactly one [`ReportSink`] record. The sink
//! itself is owned by the test harness; [`TracingReport`] and [`MemoryReport`]
//! cover logging-only runs and inspection in tests.

use std::time::{Duration, SystemTime};

use parking_lot::Mutex;

/// Receiver of test step outcomes
pub trait ReportSink: Send + Sync {
    /// When the report was opened
    fn start_time(&self) -> SystemTime;

    fn add_success(&self, reference: &str, title: &str, elapsed: Option<Duration>, output: &str);

    fn add_failure(
        &self,
        reference: &str,
        title: &str,
        elapsed: Option<Duration>,
        output: &str,
        error: &str,
    );

    fn add_skipped(&self, reference: &str, title: &str, elapsed: Option<Duration>, output: &str);
}

/// Reports outcomes through `tracing`
#[derive(Debug)]
pub struct TracingReport {
    started: SystemTime,
}

impl TracingReport {
    pub fn new() -> Self {
        Self {
            started: SystemTime::now(),
        }
    }
}

impl Default for TracingReport {
    fn default() -> Self {
        Self::new()
    }
}

impl ReportSink for TracingReport {
    fn start_time(&self) -> SystemTime {
        self.started
    }

    fn add_success(&self, reference: &str, title: &str, elapsed: Option<Duration>, output: &str) {
        tracing::info!(reference, elapsed = ?elapsed, "PASS {}", title);
        tracing::debug!("{}", output);
    }

    fn add_failure(
        &self,
        reference: &str,
        title: &str,
        elapsed: Option<Duration>,
        output: &str,
        error: &str,
    ) {
        tracing::warn!(reference, elapsed = ?elapsed, "FAIL {}: {}", title, error);
        tracing::debug!("{}", output);
    }

    fn add_skipped(&self, reference: &str, title: &str, elapsed: Option<Duration>, output: &str) {
        tracing::info!(reference, elapsed = ?elapsed, "SKIP {}: {}", title, output);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Success,
    Failure,
    Skipped,
}

/// One recorded outcome
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportEntry {
    pub verdict: Verdict,
    pub reference: String,
    pub title: String,
    pub elapsed: Option<Duration>,
    pub output: String,
    pub error: Option<String>,
}

/// Keeps every outcome in memory
#[derive(Debug)]
pub struct MemoryReport {
    started: SystemTime,
    entries: Mutex<Vec<ReportEntry>>,
}

impl MemoryReport {
    pub fn new() -> Self {
        Self {
            started: SystemTime::now(),
            entries: Mutex::new(Vec::new()),
        }
    }

    pub fn entries(&self) -> Vec<ReportEntry> {
        self.entries.lock().clone()
    }

    pub fn count(&self, verdict: Verdict) -> usize {
        self.entries
            .lock()
            .iter()
            .filter(|entry| entry.verdict == verdict)
            .count()
    }

    fn push(
        &self,
        verdict: Verdict,
        reference: &str,
        title: &str,
        elapsed: Option<Duration>,
        output: &str,
        error: Option<&str>,
    ) {
        self.entries.lock().push(ReportEntry {
            verdict,
            reference: reference.to_string(),
            title: title.to_string(),
            elapsed,
            output: output.to_string(),
            error: error.map(str::to_string),
        });
    }
}

impl Default for MemoryReport {
    fn default() -> Self {
        Self::new()
    }
}

impl ReportSink for MemoryReport {
    fn start_time(&self) -> SystemTime {
        self.started
    }

    fn add_success(&self, reference: &str, title: &str, elapsed: Option<Duration>, output: &str) {
        self.push(Verdict::Success, reference, title, elapsed, output, None);
    }

    fn add_failure(
        &self,
        reference: &str,
        title: &str,
        elapsed: Option<Duration>,
        output: &str,
        error: &str,
    ) {
        self.push(Verdict::Failure, reference, title, elapsed, output, Some(error));
    }

    fn add_skipped(&self, reference: &str, title: &str, elapsed: Option<Duration>, output: &str) {
        self.push(Verdict::Skipped, reference, title, elapsed, output, None);
    }
}
