use async_trait::async_trait;

use crate::{domain::Recipient, Result};

/// Source of the chats a broadcast is sent to.
///
/// `snapshot()` returns an owned, point-in-time copy; later registrations are not
/// observed by a broadcast that is already running.
#[async_trait]
pub trait RecipientRegistry: Send + Sync {
    async fn snapshot(&self) -> Result<Vec<Recipient>>;
}

/// Side channel for human-readable status text (the bot's log channel).
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send_log(&self, text: &str) -> Result<()>;
}
