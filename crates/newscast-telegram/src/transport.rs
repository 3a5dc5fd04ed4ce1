use async_trait::async_trait;
use teloxide::{
    prelude::*,
    types::{InputFile, Message},
    ApiError, RequestError,
};

use newscast_core::{
    broadcast::PollPayload,
    domain::ChatId,
    transport::{Transport, TransportError, TransportResult},
};

/// Broadcast transport over the Bot API.
///
/// Each call is exactly one request: no retry, 429s included.
#[derive(Clone)]
pub struct TelegramTransport {
    bot: Bot,
}

impl TelegramTransport {
    pub fn new(bot: Bot) -> Self {
        Self { bot }
    }

    fn tg_chat(chat_id: ChatId) -> teloxide::types::ChatId {
        teloxide::types::ChatId(chat_id.0)
    }
}

fn is_unreachable(api: &ApiError) -> bool {
    matches!(
        api,
        ApiError::ChatNotFound
            | ApiError::UserDeactivated
            | ApiError::BotKicked
            | ApiError::BotKickedFromSupergroup
            | ApiError::CantInitiateConversation
    )
}

pub(crate) fn map_send_err(err: RequestError) -> TransportError {
    let text = err.to_string();
    match &err {
        RequestError::Api(ApiError::BotBlocked) => TransportError::Blocked,
        RequestError::Api(api) if is_unreachable(api) => TransportError::Unreachable(text),
        RequestError::MigrateToChatId(_) => TransportError::Unreachable(text),
        RequestError::RetryAfter(_) => TransportError::RateLimited(text),
        RequestError::Network(_) | RequestError::Io(_) => TransportError::Network(text),
        _ => TransportError::Rejected(text),
    }
}

fn done(res: Result<Message, RequestError>) -> TransportResult {
    res.map(|_| ()).map_err(map_send_err)
}

#[async_trait]
impl Transport for TelegramTransport {
    async fn send_message(&self, chat_id: ChatId, text: &str) -> TransportResult {
        done(
            self.bot
                .send_message(Self::tg_chat(chat_id), text.to_string())
                .await,
        )
    }

    async fn send_photo(&self, chat_id: ChatId, file_ref: &str, caption: &str) -> TransportResult {
        let mut req = self
            .bot
            .send_photo(Self::tg_chat(chat_id), InputFile::file_id(file_ref));
        if !caption.is_empty() {
            req = req.caption(caption.to_string());
        }
        done(req.await)
    }

    async fn send_video(&self, chat_id: ChatId, file_ref: &str, caption: &str) -> TransportResult {
        let mut req = self
            .bot
            .send_video(Self::tg_chat(chat_id), InputFile::file_id(file_ref));
        if !caption.is_empty() {
            req = req.caption(caption.to_string());
        }
        done(req.await)
    }

    async fn send_poll(&self, chat_id: ChatId, poll: &PollPayload) -> TransportResult {
        let mut req = self
            .bot
            .send_poll(
                Self::tg_chat(chat_id),
                poll.question().to_string(),
                poll.options().to_vec(),
            )
            .is_anonymous(poll.is_anonymous())
            .allows_multiple_answers(poll.allows_multiple_answers());
        if let Some(explanation) = poll.explanation_text() {
            req = req.explanation(explanation.to_string());
        }
        if let Some(secs) = poll.open_period() {
            let secs = u16::try_from(secs).map_err(|_| {
                TransportError::Rejected(format!("poll open period too long: {secs}s"))
            })?;
            req = req.open_period(secs);
        }
        done(req.await)
    }
}
