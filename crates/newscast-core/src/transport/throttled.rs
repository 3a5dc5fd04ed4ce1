use std::{collections::HashMap, sync::Arc, time::Duration};

use tokio::sync::Mutex;
use tokio::time::{sleep, Instant};

use crate::{
    broadcast::payload::PollPayload,
    domain::ChatId,
    transport::port::{Transport, TransportResult},
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ThrottleConfig {
    /// Minimum spacing between *any* two sends (global flood control).
    pub global_min_interval: Duration,
    /// Minimum spacing between sends to the same chat.
    pub per_chat_min_interval: Duration,
}

impl Default for ThrottleConfig {
    fn default() -> Self {
        Self {
            global_min_interval: Duration::from_millis(40), // ~25/sec
            per_chat_min_interval: Duration::from_millis(1050), // ~0.95/sec
        }
    }
}

#[derive(Debug)]
struct IntervalLimiter {
    interval: Duration,
    next: Instant,
}

impl IntervalLimiter {
    fn new(interval: Duration) -> Self {
        Self {
            interval,
            next: Instant::now(),
        }
    }

    /// Reserve the next slot and return the wait duration required before executing.
    fn reserve(&mut self) -> Duration {
        let now = Instant::now();
        let start = if now >= self.next { now } else { self.next };
        self.next = start + self.interval;
        start.saturating_duration_since(now)
    }
}

/// Entry count at which idle per-chat limiters are first swept.
const MIN_PRUNE_AT: usize = 64;

/// Per-chat limiters, dropped once their next slot is in the past.
///
/// A limiter whose slot has passed behaves exactly like a fresh one, so removing
/// it changes no wait. Sweeps run when the map doubles since the last sweep.
#[derive(Debug)]
struct ChatLimiters {
    interval: Duration,
    limiters: HashMap<i64, IntervalLimiter>,
    prune_at: usize,
}

impl ChatLimiters {
    fn new(interval: Duration) -> Self {
        Self {
            interval,
            limiters: HashMap::new(),
            prune_at: MIN_PRUNE_AT,
        }
    }

    fn reserve(&mut self, chat_id: i64) -> Duration {
        if self.limiters.len() >= self.prune_at {
            let now = Instant::now();
            self.limiters.retain(|_, lim| lim.next > now);
            self.prune_at = (self.limiters.len() * 2).max(MIN_PRUNE_AT);
        }
        let interval = self.interval;
        self.limiters
            .entry(chat_id)
            .or_insert_with(|| IntervalLimiter::new(interval))
            .reserve()
    }
}

/// Transport decorator that spaces outbound sends.
///
/// Broadcasts fan out to many chats back to back, which is exactly what trips
/// Telegram's 429 flood control. This only delays calls; it never retries or drops one.
pub struct ThrottledTransport {
    inner: Arc<dyn Transport>,
    global: Mutex<IntervalLimiter>,
    per_chat: Mutex<ChatLimiters>,
}

impl ThrottledTransport {
    pub fn new(inner: Arc<dyn Transport>, cfg: ThrottleConfig) -> Self {
        Self {
            inner,
            global: Mutex::new(IntervalLimiter::new(cfg.global_min_interval)),
            per_chat: Mutex::new(ChatLimiters::new(cfg.per_chat_min_interval)),
        }
    }

    async fn throttle_chat(&self, chat_id: ChatId) {
        let global_wait = { self.global.lock().await.reserve() };
        let chat_wait = { self.per_chat.lock().await.reserve(chat_id.0) };

        let wait = global_wait.max(chat_wait);
        if !wait.is_zero() {
            sleep(wait).await;
        }
    }
}

#[async_trait::async_trait]
impl Transport for ThrottledTransport {
    async fn send_message(&self, chat_id: ChatId, text: &str) -> TransportResult {
        self.throttle_chat(chat_id).await;
        self.inner.send_message(chat_id, text).await
    }

    async fn send_photo(&self, chat_id: ChatId, file_ref: &str, caption: &str) -> TransportResult {
        self.throttle_chat(chat_id).await;
        self.inner.send_photo(chat_id, file_ref, caption).await
    }

    async fn send_video(&self, chat_id: ChatId, file_ref: &str, caption: &str) -> TransportResult {
        self.throttle_chat(chat_id).await;
        self.inner.send_video(chat_id, file_ref, caption).await
    }

    async fn send_poll(&self, chat_id: ChatId, poll: &PollPayload) -> TransportResult {
        self.throttle_chat(chat_id).await;
        self.inner.send_poll(chat_id, poll).await
    }
}
