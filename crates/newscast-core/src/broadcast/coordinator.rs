use std::{collections::HashSet, num::NonZeroUsize, pin::pin, sync::Arc, time::Duration};

use futures::{future, stream, StreamExt};
use tokio_util::sync::CancellationToken;

use crate::{
    broadcast::{
        delivery::deliver,
        outcome::{BroadcastResult, RunStatus},
        payload::Payload,
        progress::{Cadence, ProgressReporter, ProgressSnapshot, ProgressTracker},
    },
    domain::{ChatId, Recipient},
    errors::Error,
    ports::RecipientRegistry,
    transport::Transport,
    Result,
};

/// Per-run knobs of a broadcast.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BroadcastOptions {
    pub cadence: Cadence,
    /// Maximum deliveries in flight. `1` dispatches strictly one after another.
    pub concurrency: NonZeroUsize,
    /// Chats that never receive this broadcast (typically the admins who triggered it).
    pub exclude: HashSet<ChatId>,
    /// Cancel the run after this long; the result is then partial.
    pub deadline: Option<Duration>,
}

impl Default for BroadcastOptions {
    fn default() -> Self {
        Self {
            cadence: Cadence::default(),
            concurrency: NonZeroUsize::MIN,
            exclude: HashSet::new(),
            deadline: None,
        }
    }
}

impl BroadcastOptions {
    pub fn excluding(mut self, ids: impl IntoIterator<Item = ChatId>) -> Self {
        self.exclude.extend(ids);
        self
    }
}

/// Drives delivery units over a fixed recipient list and aggregates the outcomes.
///
/// Outcomes are yielded in snapshot order whatever the concurrency, and counters
/// and the outcome list are only touched from the single loop in [`Coordinator::run`].
pub struct Coordinator<'a> {
    transport: &'a dyn Transport,
    options: &'a BroadcastOptions,
}

impl<'a> Coordinator<'a> {
    pub fn new(transport: &'a dyn Transport, options: &'a BroadcastOptions) -> Self {
        Self { transport, options }
    }

    pub async fn run(
        &self,
        payload: &Payload,
        recipients: Vec<Recipient>,
        reporter: &dyn ProgressReporter,
        cancel: &CancellationToken,
    ) -> BroadcastResult {
        let before = recipients.len();
        let targets: Vec<Recipient> = recipients
            .into_iter()
            .filter(|r| !self.options.exclude.contains(&r.id))
            .collect();
        let total = targets.len();
        let excluded = before - total;

        tracing::info!(
            kind = payload.kind_label(),
            total,
            excluded,
            concurrency = self.options.concurrency.get(),
            "broadcast started"
        );

        let mut tracker = ProgressTracker::new(self.options.cadence, total);
        emit(reporter, tracker.started()).await;

        let transport = self.transport;
        // `take_while` runs right before a recipient is dispatched, so no new
        // delivery starts once the token fires; in-flight ones are still recorded.
        let mut deliveries = pin!(stream::iter(targets)
            .take_while(|_| future::ready(!cancel.is_cancelled()))
            .map(|recipient| deliver(transport, payload, recipient))
            .buffered(self.options.concurrency.get()));

        let mut outcomes = Vec::with_capacity(total);
        while let Some(outcome) = deliveries.next().await {
            let due = tracker.record(outcome.is_success());
            outcomes.push(outcome);
            if let Some(snapshot) = due {
                emit(reporter, snapshot).await;
            }
        }

        let status = if outcomes.len() < total {
            tracing::warn!(
                attempted = outcomes.len(),
                total,
                "broadcast cancelled before all recipients were attempted"
            );
            RunStatus::Cancelled
        } else {
            RunStatus::Completed
        };

        emit(reporter, tracker.finished()).await;

        let result = BroadcastResult::from_outcomes(total, excluded, outcomes, status);
        tracing::info!(
            succeeded = result.succeeded,
            failed = result.failed,
            total,
            "broadcast finished"
        );

        if let Err(e) = reporter.on_complete(&result).await {
            tracing::warn!(error = %e, "progress reporter rejected final summary");
        }
        result
    }
}

async fn emit(reporter: &dyn ProgressReporter, snapshot: ProgressSnapshot) {
    if let Err(e) = reporter.on_progress(&snapshot).await {
        tracing::warn!(
            error = %e,
            completed = snapshot.completed(),
            "progress reporter rejected update"
        );
    }
}

/// Entry point for callers: snapshot the registry, then run one broadcast over it.
#[derive(Clone)]
pub struct Broadcaster {
    registry: Arc<dyn RecipientRegistry>,
    transport: Arc<dyn Transport>,
}

impl Broadcaster {
    pub fn new(registry: Arc<dyn RecipientRegistry>, transport: Arc<dyn Transport>) -> Self {
        Self {
            registry,
            transport,
        }
    }

    /// Run one broadcast to completion (or cancellation).
    ///
    /// Returns `Error::RegistryUnavailable` when no snapshot could be taken; the
    /// reporter is not called in that case.
    pub async fn run_broadcast(
        &self,
        payload: &Payload,
        options: &BroadcastOptions,
        reporter: &dyn ProgressReporter,
        cancel: &CancellationToken,
    ) -> Result<BroadcastResult> {
        let recipients = self.registry.snapshot().await.map_err(|e| {
            tracing::error!(error = %e, "failed to snapshot recipient registry");
            Error::RegistryUnavailable(e.to_string())
        })?;

        let run_token = cancel.child_token();
        // Dropping the guard cancels the child token, which also ends the deadline timer.
        let _guard = run_token.clone().drop_guard();
        if let Some(deadline) = options.deadline {
            let timer_token = run_token.clone();
            tokio::spawn(async move {
                tokio::select! {
                    _ = tokio::time::sleep(deadline) => {
                        tracing::warn!(?deadline, "broadcast deadline reached, cancelling");
                        timer_token.cancel();
                    }
                    _ = timer_token.cancelled() => {}
                }
            });
        }

        let coordinator = Coordinator::new(self.transport.as_ref(), options);
        Ok(coordinator
            .run(payload, recipients, reporter, &run_token)
            .await)
    }
}
