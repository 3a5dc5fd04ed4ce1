use std::sync::Arc;

use teloxide::{prelude::*, types::Poll};

use newscast_core::{
    broadcast::{Payload, PollPayload},
    report::BroadcastSubject,
};

use crate::{router::AppState, texts};

use super::broadcast::spawn_broadcast;

/// `/broadcastpoll`, sent as a reply to the poll to re-post everywhere.
pub async fn handle_broadcast_poll(
    bot: Bot,
    msg: Message,
    state: Arc<AppState>,
) -> ResponseResult<()> {
    let Some(source) = msg.reply_to_message().and_then(|m| m.poll()) else {
        bot.send_message(msg.chat.id, texts::POLL_USAGE_HINT).await?;
        return Ok(());
    };

    let poll = match poll_payload(source) {
        Ok(p) => p,
        Err(e) => {
            bot.send_message(msg.chat.id, format!("⚠️ Cannot broadcast this poll: {e}"))
                .await?;
            return Ok(());
        }
    };

    let subject = BroadcastSubject::poll(&poll);
    spawn_broadcast(bot, &msg, state, Payload::from(poll), subject).await
}

fn poll_payload(poll: &Poll) -> newscast_core::Result<PollPayload> {
    let options = poll.options.iter().map(|o| o.text.clone()).collect();
    Ok(PollPayload::new(poll.question.clone(), options)?
        .anonymous(poll.is_anonymous)
        .multiple_answers(poll.allows_multiple_answers)
        .explanation(poll.explanation.clone())
        .open_period_seconds(poll.open_period.map(u32::from)))
}
