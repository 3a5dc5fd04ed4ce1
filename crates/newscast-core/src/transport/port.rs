use async_trait::async_trait;

use crate::{broadcast::payload::PollPayload, domain::ChatId};

/// Typed failure of one send attempt to one chat.
///
/// Recorded as a failure outcome by the delivery unit; never aborts a broadcast.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    #[error("recipient blocked the bot")]
    Blocked,

    #[error("recipient no longer reachable: {0}")]
    Unreachable(String),

    #[error("rate limited: {0}")]
    RateLimited(String),

    #[error("network error: {0}")]
    Network(String),

    #[error("unsupported media kind: {0}")]
    UnsupportedMedia(String),

    #[error("rejected: {0}")]
    Rejected(String),
}

pub type TransportResult = std::result::Result<(), TransportError>;

/// Channel-specific send primitives. One call is one delivery attempt; implementations
/// must not retry.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send_message(&self, chat_id: ChatId, text: &str) -> TransportResult;

    async fn send_photo(&self, chat_id: ChatId, file_ref: &str, caption: &str) -> TransportResult;

    async fn send_video(&self, chat_id: ChatId, file_ref: &str, caption: &str) -> TransportResult;

    async fn send_poll(&self, chat_id: ChatId, poll: &PollPayload) -> TransportResult;
}
