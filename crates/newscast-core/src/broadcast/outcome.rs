use crate::domain::Recipient;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DeliveryStatus {
    Success,
    Failure,
}

/// Result of delivering the payload to one recipient.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DeliveryOutcome {
    pub recipient: Recipient,
    pub status: DeliveryStatus,
    pub failure_reason: Option<String>,
}

impl DeliveryOutcome {
    pub fn success(recipient: Recipient) -> Self {
        Self {
            recipient,
            status: DeliveryStatus::Success,
            failure_reason: None,
        }
    }

    pub fn failure(recipient: Recipient, reason: impl Into<String>) -> Self {
        Self {
            recipient,
            status: DeliveryStatus::Failure,
            failure_reason: Some(reason.into()),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == DeliveryStatus::Success
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RunStatus {
    /// Every recipient in the filtered snapshot was attempted.
    Completed,
    /// The run was cancelled (deadline or caller abort) before all recipients were attempted.
    Cancelled,
}

/// Terminal result of one broadcast run.
///
/// `attempted == succeeded + failed == outcomes.len()`; `total` is the size of the
/// filtered snapshot and equals `attempted` unless the run was cancelled.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BroadcastResult {
    pub total: usize,
    pub excluded: usize,
    pub attempted: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub outcomes: Vec<DeliveryOutcome>,
    pub status: RunStatus,
}

/// Caller-facing classification of a finished run.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BroadcastSummary {
    NoRecipients,
    AllFailed { total: usize },
    Delivered { succeeded: usize, failed: usize },
    Cancelled { attempted: usize, total: usize },
}

impl BroadcastResult {
    pub(crate) fn from_outcomes(
        total: usize,
        excluded: usize,
        outcomes: Vec<DeliveryOutcome>,
        status: RunStatus,
    ) -> Self {
        let succeeded = outcomes.iter().filter(|o| o.is_success()).count();
        let attempted = outcomes.len();
        Self {
            total,
            excluded,
            attempted,
            succeeded,
            failed: attempted - succeeded,
            outcomes,
            status,
        }
    }

    pub fn is_partial(&self) -> bool {
        self.status == RunStatus::Cancelled && self.attempted < self.total
    }

    pub fn failures(&self) -> impl Iterator<Item = &DeliveryOutcome> {
        self.outcomes.iter().filter(|o| !o.is_success())
    }

    pub fn summary(&self) -> BroadcastSummary {
        if self.status == RunStatus::Cancelled && self.attempted < self.total {
            return BroadcastSummary::Cancelled {
                attempted: self.attempted,
                total: self.total,
            };
        }
        if self.total == 0 {
            return BroadcastSummary::NoRecipients;
        }
        if self.succeeded == 0 {
            return BroadcastSummary::AllFailed { total: self.total };
        }
        BroadcastSummary::Delivered {
            succeeded: self.succeeded,
            failed: self.failed,
        }
    }
}
