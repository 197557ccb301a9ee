//! Progress tracking for a queue run.

use std::fmt;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

use crate::core::QueueItem;
use crate::processing::{ItemOutcome, Stage};

/// Number of completed items between two estimates.
pub const REPORT_INTERVAL: usize = 20;

/// Elapsed time and extrapolated duration at one point of a run.
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressEstimate {
    pub completed: usize,
    pub total: usize,
    /// Whole minutes since start, rounded up
    pub elapsed_minutes: u64,
    /// Extrapolated hours, two decimals
    pub remaining_hours: f64,
}

impl ProgressEstimate {
    pub fn compute(total: usize, completed: usize, elapsed: Duration) -> Self {
        let elapsed_minutes = elapsed.as_secs().div_ceil(60);
        let remaining_hours = if completed == 0 {
            0.0
        } else {
            let hours = (total as f64 / completed as f64) * elapsed_minutes as f64 / 60.0;
            (hours * 100.0).round() / 100.0
        };

        Self {
            completed,
            total,
            elapsed_minutes,
            remaining_hours,
        }
    }
}

impl fmt::Display for ProgressEstimate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{} | Elapsed time: {} minutes | Estimated time left: {} hours",
            self.completed, self.total, self.elapsed_minutes, self.remaining_hours
        )
    }
}

/// Counts completed items and yields an estimate every `interval` items.
#[derive(Debug)]
pub struct ProgressTracker {
    total: usize,
    completed: usize,
    interval: usize,
    started: Instant,
}

impl ProgressTracker {
    pub fn new(total: usize) -> Self {
        Self::starting_at(total, Instant::now())
    }

    pub fn starting_at(total: usize, started: Instant) -> Self {
        Self {
            total,
            completed: 0,
            interval: REPORT_INTERVAL,
            started,
        }
    }

    pub fn completed(&self) -> usize {
        self.completed
    }

    pub fn record(&mut self) -> Option<ProgressEstimate> {
        self.record_at(Instant::now())
    }

    pub fn record_at(&mut self, now: Instant) -> Option<ProgressEstimate> {
        self.completed += 1;
        if self.completed % self.interval != 0 {
            return None;
        }
        let elapsed = now.saturating_duration_since(self.started);
        Some(ProgressEstimate::compute(self.total, self.completed, elapsed))
    }
}

/// Receives per-item outcomes and periodic estimates from the engine.
pub trait ProgressSink: Send {
    fn item_finished(&self, _item: &QueueItem, _outcome: &ItemOutcome) {}

    fn estimate(&self, _estimate: &ProgressEstimate) {}
}

/// Discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl ProgressSink for NullSink {}

/// Writes outcomes and estimates through `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

impl ProgressSink for LogSink {
    fn item_finished(&self, item: &QueueItem, outcome: &ItemOutcome) {
        match outcome {
            ItemOutcome::Optimized => debug!("- Optimized {}", item),
            ItemOutcome::Skipped => debug!("- Skipped {}", item),
            ItemOutcome::Failed { stage: Stage::Backup, cause } => {
                warn!("There was an error copying {}: {}", item, cause)
            }
            ItemOutcome::Failed { stage, cause } => {
                warn!("{} failed during {}: {}", item, stage, cause)
            }
            ItemOutcome::RollbackFailed { cause, rollback } => error!(
                "{} failed ({}) and the rollback failed too: {}",
                item, cause, rollback
            ),
        }
    }

    fn estimate(&self, estimate: &ProgressEstimate) {
        info!("{}", estimate);
    }
}
