//! Log-channel reporting: timestamped status logs and the live progress message.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Local;
use tokio::sync::Mutex;

use crate::{
    broadcast::{
        BroadcastResult, BroadcastSummary, Payload, ProgressPhase, ProgressReporter,
        ProgressSnapshot,
    },
    domain::{ChatId, MessageRef},
    errors::Error,
    formatting::{escape_html, preview_html},
    messaging::port::MessagingPort,
    ports::Notifier,
    Result,
};

/// Posts timestamped status text to the operators' log channel.
pub struct LogChannelNotifier {
    messenger: Arc<dyn MessagingPort>,
    chat_id: ChatId,
}

impl LogChannelNotifier {
    pub fn new(messenger: Arc<dyn MessagingPort>, chat_id: ChatId) -> Self {
        Self { messenger, chat_id }
    }
}

#[async_trait]
impl Notifier for LogChannelNotifier {
    async fn send_log(&self, text: &str) -> Result<()> {
        let ts = Local::now().format("%Y-%m-%d %H:%M:%S");
        self.messenger
            .send_html(self.chat_id, &format!("📝 {ts}\n\n{text}"))
            .await
            .map(|_| ())
    }
}

/// What is being broadcast, as shown in the log channel.
#[derive(Clone, Debug)]
pub enum BroadcastSubject {
    News {
        post_id: i64,
        content: String,
        media_kind: Option<String>,
    },
    Poll {
        question: String,
        options: Vec<String>,
    },
}

impl BroadcastSubject {
    pub fn news(post_id: i64, payload: &Payload) -> Self {
        match payload {
            Payload::Content(c) => BroadcastSubject::News {
                post_id,
                content: c.text.clone(),
                media_kind: c.media.as_ref().map(|m| m.kind.as_str().to_string()),
            },
            Payload::Poll(p) => BroadcastSubject::poll(p),
        }
    }

    pub fn poll(poll: &crate::broadcast::PollPayload) -> Self {
        BroadcastSubject::Poll {
            question: poll.question().to_string(),
            options: poll.options().to_vec(),
        }
    }

    fn noun(&self) -> &'static str {
        match self {
            BroadcastSubject::News { .. } => "news",
            BroadcastSubject::Poll { .. } => "poll",
        }
    }

    fn label_line(&self) -> String {
        match self {
            BroadcastSubject::News { post_id, .. } => format!("📌 Post ID: {post_id}"),
            BroadcastSubject::Poll { question, .. } => {
                format!("📌 Question: {}", preview_html(question, 20))
            }
        }
    }
}

/// Progress text for the message edited in place during a run.
pub fn format_progress(subject: &BroadcastSubject, snapshot: &ProgressSnapshot) -> String {
    let noun = subject.noun();
    let head = match snapshot.phase {
        ProgressPhase::Started => format!("⏳ Starting {noun} broadcast..."),
        ProgressPhase::Running => format!("⏳ {} broadcast progress...", capitalize(noun)),
        ProgressPhase::Finished if snapshot.completed() < snapshot.total => format!(
            "⛔ {} broadcast stopped after {} of {} chats",
            capitalize(noun),
            snapshot.completed(),
            snapshot.total
        ),
        ProgressPhase::Finished => format!("🏁 {} broadcast finished", capitalize(noun)),
    };
    format!(
        "{head}\n\n{}\n🗂️ Total chats: {}\n✅ Success: {}\n❌ Failed: {}",
        subject.label_line(),
        snapshot.total,
        snapshot.succeeded,
        snapshot.failed
    )
}

/// Final log entry posted once a run is over.
pub fn format_completion_log(
    subject: &BroadcastSubject,
    result: &BroadcastResult,
    posted_by: &str,
) -> String {
    let mut out = match subject {
        BroadcastSubject::News {
            post_id, content, ..
        } => format!(
            "📢 News broadcast complete\n\n🆔 Post ID: {post_id}\n📝 Content: {}\n\n",
            preview_html(content, 50)
        ),
        BroadcastSubject::Poll { question, options } => {
            let opts = options
                .iter()
                .map(|o| escape_html(&o.chars().take(10).collect::<String>()))
                .collect::<Vec<_>>()
                .join(", ");
            format!(
                "📊 Poll broadcast complete\n\n❓ Question: {}\n📊 Options: {opts}...\n\n",
                preview_html(question, 50)
            )
        }
    };

    out.push_str(&format!(
        "📊 Stats:\n• Total chats: {}\n• Success: {}\n• Failed: {}",
        result.total, result.succeeded, result.failed
    ));
    if result.excluded > 0 {
        out.push_str(&format!("\n• Excluded: {}", result.excluded));
    }
    if let BroadcastSummary::Cancelled { attempted, total } = result.summary() {
        out.push_str(&format!("\n⛔ Cancelled after {attempted} of {total} chats"));
    }
    out.push_str(&format!("\n\n👤 Posted by: {}", escape_html(posted_by)));

    if let BroadcastSubject::News {
        media_kind: Some(kind),
        ..
    } = subject
    {
        out.push_str(&format!("\n🖼️ Media type: {}", escape_html(kind)));
    }
    out
}

/// Reply sent to the admin who triggered the broadcast.
pub fn format_admin_reply(subject: &BroadcastSubject, result: &BroadcastResult) -> String {
    let what = match subject {
        BroadcastSubject::News { post_id, .. } => format!("📌 Post ID: {post_id}"),
        BroadcastSubject::Poll { question, .. } => {
            format!("❓ Question: {}", preview_html(question, 30))
        }
    };
    let noun = capitalize(subject.noun());

    match result.summary() {
        BroadcastSummary::NoRecipients => {
            format!("⚠️ {noun} not sent: no registered chats to deliver to\n{what}")
        }
        BroadcastSummary::AllFailed { total } => {
            format!("❌ {noun} failed in all {total} chats\n{what}")
        }
        BroadcastSummary::Cancelled { attempted, total } => format!(
            "⛔ {noun} broadcast stopped after {attempted} of {total} chats\n{what}\n✅ Success in {} chats\n❌ Failed in {} chats",
            result.succeeded, result.failed
        ),
        BroadcastSummary::Delivered { succeeded, failed } => format!(
            "✅ {noun} successfully sent\n{what}\n✅ Success in {succeeded} chats\n❌ Failed in {failed} chats"
        ),
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Progress reporter backed by one log-channel message that is edited in place.
///
/// The completion summary goes out as a separate, timestamped log entry.
pub struct LogChannelReporter {
    messenger: Arc<dyn MessagingPort>,
    notifier: Arc<dyn Notifier>,
    chat_id: ChatId,
    subject: BroadcastSubject,
    posted_by: String,
    progress_msg: Mutex<Option<MessageRef>>,
}

impl LogChannelReporter {
    pub fn new(
        messenger: Arc<dyn MessagingPort>,
        notifier: Arc<dyn Notifier>,
        chat_id: ChatId,
        subject: BroadcastSubject,
        posted_by: impl Into<String>,
    ) -> Self {
        Self {
            messenger,
            notifier,
            chat_id,
            subject,
            posted_by: posted_by.into(),
            progress_msg: Mutex::new(None),
        }
    }
}

#[async_trait]
impl ProgressReporter for LogChannelReporter {
    async fn on_progress(&self, snapshot: &ProgressSnapshot) -> Result<()> {
        let text = format_progress(&self.subject, snapshot);
        let mut slot = self.progress_msg.lock().await;

        match *slot {
            Some(msg) => self
                .messenger
                .edit_html(msg, &text)
                .await
                .map_err(|e| Error::Reporter(e.to_string())),
            // First snapshot, or the initial post failed: post a fresh message.
            None => {
                let msg = self
                    .messenger
                    .send_html(self.chat_id, &text)
                    .await
                    .map_err(|e| Error::Reporter(e.to_string()))?;
                *slot = Some(msg);
                Ok(())
            }
        }
    }

    async fn on_complete(&self, result: &BroadcastResult) -> Result<()> {
        let text = format_completion_log(&self.subject, result, &self.posted_by);
        self.notifier
            .send_log(&text)
            .await
            .map_err(|e| Error::Reporter(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        broadcast::{ContentPayload, MediaKind, PollPayload},
        domain::MessageId,
    };
    use std::sync::Mutex as StdMutex;

    #[derive(Default)]
    struct FakeMessenger {
        next_id: StdMutex<i32>,
        sends: StdMutex<Vec<(ChatId, String)>>,
        edits: StdMutex<Vec<(MessageRef, String)>>,
        fail_sends: bool,
    }

    #[async_trait]
    impl MessagingPort for FakeMessenger {
        async fn send_html(&self, chat_id: ChatId, html: &str) -> Result<MessageRef> {
            if self.fail_sends {
                return Err(Error::External("telegram error: chat not found".into()));
            }
            self.sends.lock().unwrap().push((chat_id, html.to_string()));
            let mut guard = self.next_id.lock().unwrap();
            *guard += 1;
            Ok(MessageRef {
                chat_id,
                message_id: MessageId(*guard),
            })
        }

        async fn edit_html(&self, msg: MessageRef, html: &str) -> Result<()> {
            self.edits.lock().unwrap().push((msg, html.to_string()));
            Ok(())
        }
    }

    fn snapshot(succeeded: usize, failed: usize, total: usize, phase: ProgressPhase) -> ProgressSnapshot {
        ProgressSnapshot {
            succeeded,
            failed,
            total,
            phase,
        }
    }

    fn result(total: usize, succeeded: usize, failed: usize) -> BroadcastResult {
        use crate::broadcast::{DeliveryOutcome, RunStatus};
        use crate::domain::{Recipient, RecipientKind};
        let mut outcomes = Vec::new();
        for i in 0..succeeded {
            outcomes.push(DeliveryOutcome::success(Recipient::new(
                ChatId(i as i64),
                RecipientKind::Direct,
                "x",
            )));
        }
        for i in 0..failed {
            outcomes.push(DeliveryOutcome::failure(
                Recipient::new(ChatId(1000 + i as i64), RecipientKind::Group, "y"),
                "blocked",
            ));
        }
        let status = if succeeded + failed < total {
            RunStatus::Cancelled
        } else {
            RunStatus::Completed
        };
        BroadcastResult {
            total,
            excluded: 0,
            attempted: succeeded + failed,
            succeeded,
            failed,
            outcomes,
            status,
        }
    }

    fn news_subject() -> BroadcastSubject {
        BroadcastSubject::news(
            7,
            &ContentPayload::with_media("Big <news> today", MediaKind::Photo, "f").into(),
        )
    }

    #[tokio::test]
    async fn posts_once_then_edits_in_place() {
        let messenger = Arc::new(FakeMessenger::default());
        let notifier = Arc::new(LogChannelNotifier::new(messenger.clone(), ChatId(-5)));
        let reporter = LogChannelReporter::new(
            messenger.clone(),
            notifier,
            ChatId(-5),
            news_subject(),
            "Alice",
        );

        reporter
            .on_progress(&snapshot(0, 0, 12, ProgressPhase::Started))
            .await
            .unwrap();
        reporter
            .on_progress(&snapshot(9, 1, 12, ProgressPhase::Running))
            .await
            .unwrap();
        reporter
            .on_progress(&snapshot(10, 2, 12, ProgressPhase::Finished))
            .await
            .unwrap();
        reporter.on_complete(&result(12, 10, 2)).await.unwrap();

        let sends = messenger.sends.lock().unwrap();
        let edits = messenger.edits.lock().unwrap();
        assert_eq!(sends.len(), 2, "progress message + completion log");
        assert!(sends[0].1.starts_with("⏳ Starting news broadcast..."));
        assert!(sends[0].1.contains("📌 Post ID: 7"));
        assert_eq!(edits.len(), 2);
        assert!(edits[0].1.contains("✅ Success: 9"));
        assert!(edits[1].1.starts_with("🏁 News broadcast finished"));
        assert!(sends[1].1.starts_with("📝 "));
        assert!(sends[1].1.contains("📢 News broadcast complete"));
        assert!(sends[1].1.contains("Big &lt;news&gt; today"));
        assert!(sends[1].1.contains("🖼️ Media type: photo"));
        assert!(sends[1].1.contains("👤 Posted by: Alice"));
    }

    #[tokio::test]
    async fn send_failure_is_a_reporter_error() {
        let messenger = Arc::new(FakeMessenger {
            fail_sends: true,
            ..Default::default()
        });
        let notifier = Arc::new(LogChannelNotifier::new(messenger.clone(), ChatId(-5)));
        let reporter =
            LogChannelReporter::new(messenger, notifier, ChatId(-5), news_subject(), "Alice");
        let err = reporter
            .on_progress(&snapshot(0, 0, 1, ProgressPhase::Started))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Reporter(_)));
    }

    #[test]
    fn stopped_run_is_visible_in_progress_text() {
        let text = format_progress(&news_subject(), &snapshot(3, 1, 10, ProgressPhase::Finished));
        assert!(text.starts_with("⛔ News broadcast stopped after 4 of 10 chats"));
    }

    #[test]
    fn poll_completion_log_lists_truncated_options() {
        let poll = PollPayload::new(
            "Which feature should we build next?",
            vec!["Dark mode everywhere".into(), "Exports".into()],
        )
        .unwrap();
        let log = format_completion_log(&BroadcastSubject::poll(&poll), &result(2, 2, 0), "Bob");
        assert!(log.contains("📊 Poll broadcast complete"));
        assert!(log.contains("📊 Options: Dark mode , Exports..."));
        assert!(!log.contains("Media type"));
    }

    #[test]
    fn admin_reply_distinguishes_outcomes() {
        let subject = news_subject();
        assert!(format_admin_reply(&subject, &result(0, 0, 0)).contains("no registered chats"));
        assert!(format_admin_reply(&subject, &result(3, 0, 3)).contains("failed in all 3 chats"));
        assert!(format_admin_reply(&subject, &result(10, 2, 1)).contains("stopped after 3 of 10"));
        let ok = format_admin_reply(&subject, &result(3, 2, 1));
        assert!(ok.starts_with("✅ News successfully sent"));
        assert!(ok.contains("✅ Success in 2 chats"));
    }
}
