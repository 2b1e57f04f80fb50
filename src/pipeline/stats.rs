//! Outcome counters for cascade runs.
//!
//! `CascadeStats` tallies how images left the cascade and how long they took;
//! `StatsManager` updates it behind a mutex so one orchestrator can serve many threads.

use std::fmt;
use std::sync::{Mutex, MutexGuard};

use crate::domain::ClassificationResult;

/// Counts of cascade outcomes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CascadeStats {
    pub total_processed: usize,
    pub rejected: usize,
    pub normal_by_screen: usize,
    pub multi_label: usize,
    /// Multi-label results produced by a classifier with missing parameters.
    pub degraded: usize,
    pub failed: usize,
    /// Mean wall time per image in milliseconds.
    pub average_time_ms: f64,
}

impl CascadeStats {
    /// Returns the failure rate as a percentage (0.0 to 100.0).
    pub fn failure_rate(&self) -> f64 {
        if self.total_processed == 0 {
            0.0
        } else {
            (self.failed as f64 / self.total_processed as f64) * 100.0
        }
    }

    /// Share of images that reached the multi-label stage, as a percentage.
    pub fn escalation_rate(&self) -> f64 {
        if self.total_processed == 0 {
            0.0
        } else {
            (self.multi_label as f64 / self.total_processed as f64) * 100.0
        }
    }
}

impl fmt::Display for CascadeStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Cascade Statistics:")?;
        writeln!(f, "  Total processed: {}", self.total_processed)?;
        writeln!(f, "  Rejected: {}", self.rejected)?;
        writeln!(f, "  Normal by screen: {}", self.normal_by_screen)?;
        writeln!(
            f,
            "  Multi-label: {} ({:.1}%, {} degraded)",
            self.multi_label,
            self.escalation_rate(),
            self.degraded
        )?;
        writeln!(f, "  Failed: {} ({:.1}%)", self.failed, self.failure_rate())?;
        writeln!(f, "  Average time: {:.2} ms", self.average_time_ms)?;
        Ok(())
    }
}

/// Thread-safe accumulator for [`CascadeStats`].
#[derive(Debug, Default)]
pub struct StatsManager {
    stats: Mutex<CascadeStats>,
}

impl StatsManager {
    pub fn new() -> Self {
        Self::default()
    }

    // Counters stay usable after a panic elsewhere poisoned the lock.
    fn lock(&self) -> MutexGuard<'_, CascadeStats> {
        self.stats.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Returns a copy of the current statistics snapshot.
    pub fn snapshot(&self) -> CascadeStats {
        self.lock().clone()
    }

    /// Records one finished image.
    pub fn record(&self, result: &ClassificationResult, elapsed_ms: f64) {
        let mut stats = self.lock();
        let previous_total = stats.total_processed;
        stats.total_processed += 1;
        match result {
            ClassificationResult::Rejected { .. } => stats.rejected += 1,
            ClassificationResult::NormalByScreen { .. } => stats.normal_by_screen += 1,
            ClassificationResult::MultiLabel { degraded, .. } => {
                stats.multi_label += 1;
                if *degraded {
                    stats.degraded += 1;
                }
            }
            ClassificationResult::Failed { .. } => stats.failed += 1,
        }
        let accumulated = stats.average_time_ms * previous_total as f64;
        stats.average_time_ms = (accumulated + elapsed_ms) / stats.total_processed as f64;
    }

    pub fn reset(&self) {
        *self.lock() = CascadeStats::default();
    }
}
