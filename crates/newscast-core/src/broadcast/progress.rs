use std::num::NonZeroUsize;

use async_trait::async_trait;

use crate::{broadcast::outcome::BroadcastResult, Result};

/// Number of completed deliveries between progress emissions.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Cadence(NonZeroUsize);

impl Cadence {
    pub const DEFAULT: usize = 10;

    pub fn new(every: usize) -> Option<Self> {
        NonZeroUsize::new(every).map(Self)
    }

    pub fn get(self) -> usize {
        self.0.get()
    }

    /// Whether a snapshot is due after `completed` deliveries.
    pub fn is_due(self, completed: usize) -> bool {
        completed > 0 && completed % self.0.get() == 0
    }
}

impl Default for Cadence {
    fn default() -> Self {
        Self(NonZeroUsize::MIN.saturating_add(Self::DEFAULT - 1))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProgressPhase {
    Started,
    Running,
    Finished,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ProgressSnapshot {
    pub succeeded: usize,
    pub failed: usize,
    pub total: usize,
    pub phase: ProgressPhase,
}

impl ProgressSnapshot {
    pub fn completed(&self) -> usize {
        self.succeeded + self.failed
    }
}

/// Sink for progress updates of one broadcast.
///
/// Errors are logged by the coordinator and otherwise ignored; reporting is best-effort.
#[async_trait]
pub trait ProgressReporter: Send + Sync {
    async fn on_progress(&self, snapshot: &ProgressSnapshot) -> Result<()>;

    async fn on_complete(&self, result: &BroadcastResult) -> Result<()>;
}

/// Reporter that discards everything.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopReporter;

#[async_trait]
impl ProgressReporter for NoopReporter {
    async fn on_progress(&self, _snapshot: &ProgressSnapshot) -> Result<()> {
        Ok(())
    }

    async fn on_complete(&self, _result: &BroadcastResult) -> Result<()> {
        Ok(())
    }
}

/// Running counters for one broadcast plus the cadence decision.
#[derive(Debug)]
pub(crate) struct ProgressTracker {
    cadence: Cadence,
    total: usize,
    succeeded: usize,
    failed: usize,
}

impl ProgressTracker {
    pub(crate) fn new(cadence: Cadence, total: usize) -> Self {
        Self {
            cadence,
            total,
            succeeded: 0,
            failed: 0,
        }
    }

    pub(crate) fn started(&self) -> ProgressSnapshot {
        self.snapshot(ProgressPhase::Started)
    }

    /// Count one finished delivery; returns the snapshot to emit when the cadence is hit.
    pub(crate) fn record(&mut self, success: bool) -> Option<ProgressSnapshot> {
        if success {
            self.succeeded += 1;
        } else {
            self.failed += 1;
        }
        self.cadence
            .is_due(self.succeeded + self.failed)
            .then(|| self.snapshot(ProgressPhase::Running))
    }

    pub(crate) fn finished(&self) -> ProgressSnapshot {
        self.snapshot(ProgressPhase::Finished)
    }

    fn snapshot(&self, phase: ProgressPhase) -> ProgressSnapshot {
        ProgressSnapshot {
            succeeded: self.succeeded,
            failed: self.failed,
            total: self.total,
            phase,
        }
    }
}
