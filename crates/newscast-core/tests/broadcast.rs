use std::{
    collections::{HashMap, HashSet},
    num::NonZeroUsize,
    sync::{Arc, Mutex},
    time::Duration,
};

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use newscast_core::{
    broadcast::{
        BroadcastOptions, BroadcastResult, BroadcastSummary, Broadcaster, Cadence, ContentPayload,
        Coordinator, DeliveryStatus, Payload, PollPayload, ProgressPhase, ProgressReporter,
        ProgressSnapshot, RunStatus,
    },
    domain::{ChatId, Recipient, RecipientKind},
    ports::RecipientRegistry,
    transport::{Transport, TransportError, TransportResult},
    Error, Result,
};

#[derive(Default)]
struct FakeTransport {
    failing: HashSet<i64>,
    delays: HashMap<i64, Duration>,
    sent: Mutex<Vec<i64>>,
    /// Cancel this token once this many sends have been made.
    cancel_after: Option<(usize, CancellationToken)>,
}

impl FakeTransport {
    fn failing(ids: &[i64]) -> Self {
        Self {
            failing: ids.iter().copied().collect(),
            ..Default::default()
        }
    }

    async fn send(&self, chat_id: ChatId) -> TransportResult {
        if let Some(d) = self.delays.get(&chat_id.0) {
            tokio::time::sleep(*d).await;
        }
        let count = {
            let mut sent = self.sent.lock().unwrap();
            sent.push(chat_id.0);
            sent.len()
        };
        if let Some((n, token)) = &self.cancel_after {
            if count >= *n {
                token.cancel();
            }
        }
        if self.failing.contains(&chat_id.0) {
            return Err(TransportError::Blocked);
        }
        Ok(())
    }
}

#[async_trait]
impl Transport for FakeTransport {
    async fn send_message(&self, chat_id: ChatId, _text: &str) -> TransportResult {
        self.send(chat_id).await
    }
    async fn send_photo(&self, chat_id: ChatId, _f: &str, _c: &str) -> TransportResult {
        self.send(chat_id).await
    }
    async fn send_video(&self, chat_id: ChatId, _f: &str, _c: &str) -> TransportResult {
        self.send(chat_id).await
    }
    async fn send_poll(&self, chat_id: ChatId, _poll: &PollPayload) -> TransportResult {
        self.send(chat_id).await
    }
}

#[derive(Default)]
struct RecordingReporter {
    snapshots: Mutex<Vec<ProgressSnapshot>>,
    completions: Mutex<Vec<BroadcastResult>>,
    fail: bool,
}

impl RecordingReporter {
    fn counts(&self) -> Vec<usize> {
        self.snapshots
            .lock()
            .unwrap()
            .iter()
            .map(|s| s.completed())
            .collect()
    }
}

#[async_trait]
impl ProgressReporter for RecordingReporter {
    async fn on_progress(&self, snapshot: &ProgressSnapshot) -> Result<()> {
        self.snapshots.lock().unwrap().push(*snapshot);
        if self.fail {
            return Err(Error::Reporter("log channel gone".into()));
        }
        Ok(())
    }

    async fn on_complete(&self, result: &BroadcastResult) -> Result<()> {
        self.completions.lock().unwrap().push(result.clone());
        if self.fail {
            return Err(Error::Reporter("log channel gone".into()));
        }
        Ok(())
    }
}

struct FakeRegistry(Option<Vec<Recipient>>);

#[async_trait]
impl RecipientRegistry for FakeRegistry {
    async fn snapshot(&self) -> Result<Vec<Recipient>> {
        self.0
            .clone()
            .ok_or_else(|| Error::Registry("database is locked".into()))
    }
}

fn recipients(n: i64) -> Vec<Recipient> {
    (1..=n)
        .map(|i| Recipient::new(ChatId(i), RecipientKind::Direct, format!("chat {i}")))
        .collect()
}

fn news() -> Payload {
    ContentPayload::text("breaking").into()
}

fn ids(result: &BroadcastResult) -> Vec<i64> {
    result.outcomes.iter().map(|o| o.recipient.id.0).collect()
}

async fn run(
    transport: &FakeTransport,
    options: &BroadcastOptions,
    list: Vec<Recipient>,
    reporter: &RecordingReporter,
) -> BroadcastResult {
    Coordinator::new(transport, options)
        .run(&news(), list, reporter, &CancellationToken::new())
        .await
}

#[tokio::test]
async fn twenty_five_recipients_emit_at_0_10_20_25_then_complete() {
    let t = FakeTransport::default();
    let reporter = RecordingReporter::default();
    let res = run(&t, &BroadcastOptions::default(), recipients(25), &reporter).await;

    assert_eq!(reporter.counts(), vec![0, 10, 20, 25]);
    assert_eq!(reporter.completions.lock().unwrap().len(), 1);
    let phases: Vec<_> = reporter
        .snapshots
        .lock()
        .unwrap()
        .iter()
        .map(|s| s.phase)
        .collect();
    assert_eq!(
        phases,
        vec![
            ProgressPhase::Started,
            ProgressPhase::Running,
            ProgressPhase::Running,
            ProgressPhase::Finished
        ]
    );
    assert!(reporter
        .snapshots
        .lock()
        .unwrap()
        .iter()
        .all(|s| s.total == 25));
    assert_eq!(res.attempted, 25);
    assert_eq!(res.succeeded + res.failed, res.attempted);
    assert_eq!(res.status, RunStatus::Completed);
}

#[tokio::test]
async fn twelve_recipients_with_two_failures() {
    let t = FakeTransport::failing(&[3, 9]);
    let reporter = RecordingReporter::default();
    let res = run(&t, &BroadcastOptions::default(), recipients(12), &reporter).await;

    assert_eq!(res.attempted, 12);
    assert_eq!(res.succeeded, 10);
    assert_eq!(res.failed, 2);
    for o in &res.outcomes {
        let expected = if [3, 9].contains(&o.recipient.id.0) {
            DeliveryStatus::Failure
        } else {
            DeliveryStatus::Success
        };
        assert_eq!(o.status, expected, "chat {}", o.recipient.id);
    }
    assert_eq!(reporter.counts(), vec![0, 10, 12]);
    // Recipients after a failing one are still attempted.
    assert_eq!(*t.sent.lock().unwrap(), (1..=12).collect::<Vec<_>>());
}

#[tokio::test]
async fn excluded_ids_never_appear_in_outcomes() {
    let t = FakeTransport::default();
    let reporter = RecordingReporter::default();
    let options = BroadcastOptions::default().excluding([ChatId(2), ChatId(5), ChatId(99)]);
    let res = run(&t, &options, recipients(6), &reporter).await;

    assert_eq!(ids(&res), vec![1, 3, 4, 6]);
    assert_eq!(res.total, 4);
    assert_eq!(res.excluded, 2);
    assert!(!t.sent.lock().unwrap().contains(&2));
    assert_eq!(reporter.snapshots.lock().unwrap()[0].total, 4);
}

#[tokio::test]
async fn empty_snapshot_reports_zero_twice() {
    let t = FakeTransport::default();
    let reporter = RecordingReporter::default();
    let res = run(&t, &BroadcastOptions::default(), vec![], &reporter).await;

    assert_eq!(res.attempted, 0);
    assert_eq!(res.succeeded, 0);
    assert_eq!(res.failed, 0);
    assert!(res.outcomes.is_empty());
    assert_eq!(res.summary(), BroadcastSummary::NoRecipients);

    let snaps = reporter.snapshots.lock().unwrap();
    assert_eq!(snaps.len(), 2);
    assert!(snaps
        .iter()
        .all(|s| s.succeeded == 0 && s.failed == 0 && s.total == 0));
}

#[tokio::test]
async fn small_broadcast_only_gets_initial_and_final() {
    let t = FakeTransport::default();
    let reporter = RecordingReporter::default();
    run(&t, &BroadcastOptions::default(), recipients(7), &reporter).await;
    assert_eq!(reporter.counts(), vec![0, 7]);
}

#[tokio::test]
async fn all_failed_is_distinct_from_empty() {
    let t = FakeTransport::failing(&[1, 2, 3]);
    let reporter = RecordingReporter::default();
    let res = run(&t, &BroadcastOptions::default(), recipients(3), &reporter).await;
    assert_eq!(res.summary(), BroadcastSummary::AllFailed { total: 3 });
}

#[tokio::test(start_paused = true)]
async fn concurrent_dispatch_keeps_snapshot_order() {
    let mut t = FakeTransport::default();
    t.delays.insert(1, Duration::from_millis(300));
    t.delays.insert(2, Duration::from_millis(200));
    t.delays.insert(3, Duration::from_millis(10));

    let options = BroadcastOptions {
        concurrency: NonZeroUsize::new(3).unwrap(),
        cadence: Cadence::new(1).unwrap(),
        ..Default::default()
    };
    let reporter = RecordingReporter::default();
    let res = run(&t, &options, recipients(3), &reporter).await;

    // Chat 3 finished first on the wire...
    assert_eq!(t.sent.lock().unwrap()[0], 3);
    // ...but outcomes and progress follow the snapshot.
    assert_eq!(ids(&res), vec![1, 2, 3]);
    assert_eq!(reporter.counts(), vec![0, 1, 2, 3, 3]);
}

#[tokio::test]
async fn cancellation_returns_partial_result() {
    let token = CancellationToken::new();
    let t = FakeTransport {
        cancel_after: Some((4, token.clone())),
        ..Default::default()
    };
    let reporter = RecordingReporter::default();
    let res = Coordinator::new(&t, &BroadcastOptions::default())
        .run(&news(), recipients(20), &reporter, &token)
        .await;

    assert_eq!(res.status, RunStatus::Cancelled);
    assert_eq!(res.attempted, 4);
    assert_eq!(res.total, 20);
    assert!(res.is_partial());
    assert_eq!(
        res.summary(),
        BroadcastSummary::Cancelled {
            attempted: 4,
            total: 20
        }
    );
    let last = *reporter.snapshots.lock().unwrap().last().unwrap();
    assert_eq!(last.phase, ProgressPhase::Finished);
    assert_eq!(last.completed(), 4);
}

#[tokio::test]
async fn reporter_failures_do_not_abort_the_run() {
    let t = FakeTransport::default();
    let reporter = RecordingReporter {
        fail: true,
        ..Default::default()
    };
    let res = run(&t, &BroadcastOptions::default(), recipients(15), &reporter).await;
    assert_eq!(res.attempted, 15);
    assert_eq!(res.succeeded, 15);
    assert_eq!(reporter.counts(), vec![0, 10, 15]);
}

#[tokio::test]
async fn unavailable_registry_is_surfaced_to_caller() {
    let b = Broadcaster::new(
        Arc::new(FakeRegistry(None)),
        Arc::new(FakeTransport::default()),
    );
    let reporter = RecordingReporter::default();
    let err = b
        .run_broadcast(
            &news(),
            &BroadcastOptions::default(),
            &reporter,
            &CancellationToken::new(),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, Error::RegistryUnavailable(_)));
    assert!(reporter.snapshots.lock().unwrap().is_empty());
}

#[tokio::test]
async fn broadcaster_uses_registry_snapshot_in_order() {
    let transport = Arc::new(FakeTransport::failing(&[2]));
    let b = Broadcaster::new(Arc::new(FakeRegistry(Some(recipients(3)))), transport.clone());
    let res = b
        .run_broadcast(
            &news(),
            &BroadcastOptions::default().excluding([ChatId(1)]),
            &RecordingReporter::default(),
            &CancellationToken::new(),
        )
        .await
        .unwrap();
    assert_eq!(ids(&res), vec![2, 3]);
    assert_eq!(res.failed, 1);
    assert_eq!(*transport.sent.lock().unwrap(), vec![2, 3]);
}

#[tokio::test(start_paused = true)]
async fn deadline_cancels_the_run() {
    let mut t = FakeTransport::default();
    for i in 1..=10 {
        t.delays.insert(i, Duration::from_secs(1));
    }
    let b = Broadcaster::new(Arc::new(FakeRegistry(Some(recipients(10)))), Arc::new(t));
    let options = BroadcastOptions {
        deadline: Some(Duration::from_millis(2500)),
        ..Default::default()
    };
    let res = b
        .run_broadcast(
            &news(),
            &options,
            &RecordingReporter::default(),
            &CancellationToken::new(),
        )
        .await
        .unwrap();
    assert_eq!(res.status, RunStatus::Cancelled);
    assert_eq!(res.attempted, 3);
}
