use std::sync::Arc;

use teloxide::{
    prelude::*,
    types::{InputFile, ParseMode},
};

use newscast_core::domain::{ChatId, RecipientKind};

use crate::{router::AppState, texts};

use super::sender_name;

/// `/start`: register the chat, log it, then greet.
pub async fn handle_start(bot: Bot, msg: Message, state: Arc<AppState>) -> ResponseResult<()> {
    let chat_id = ChatId(msg.chat.id.0);
    let is_group = !msg.chat.is_private();
    let kind = if is_group {
        RecipientKind::Group
    } else {
        RecipientKind::Direct
    };

    match state.store.add_chat(chat_id, kind, msg.chat.title()).await {
        Ok(true) => tracing::info!(chat_id = chat_id.0, kind = kind.as_str(), "chat registered"),
        Ok(false) => {}
        Err(e) => tracing::error!(chat_id = chat_id.0, error = %e, "failed to register chat"),
    }

    let user = msg.from();
    let log = texts::chat_registered_log(
        is_group,
        chat_id,
        msg.chat.title(),
        &sender_name(user),
        user.and_then(|u| u.username.as_deref()),
    );
    state.log(&log).await;

    send_welcome(&bot, msg.chat.id, &state).await
}

/// Welcome text plus keyboard, as a photo caption when a welcome image is configured.
pub async fn send_welcome(
    bot: &Bot,
    chat_id: teloxide::types::ChatId,
    state: &AppState,
) -> ResponseResult<()> {
    let text = texts::welcome_text();
    let keyboard = match texts::welcome_keyboard(&state.bot_username, state.cfg.channel_handle()) {
        Ok(kb) => Some(kb),
        Err(e) => {
            tracing::warn!(error = %e, "invalid welcome keyboard url, sending without buttons");
            None
        }
    };

    if let Some(file_id) = state.cfg.welcome_image_file_id.as_deref() {
        let mut req = bot
            .send_photo(chat_id, InputFile::file_id(file_id))
            .caption(text.clone())
            .parse_mode(ParseMode::Html);
        if let Some(kb) = keyboard.clone() {
            req = req.reply_markup(kb);
        }
        match req.await {
            Ok(_) => return Ok(()),
            Err(e) => tracing::error!(error = %e, "failed to send welcome photo, falling back to text"),
        }
    }

    let mut req = bot.send_message(chat_id, text).parse_mode(ParseMode::Html);
    if let Some(kb) = keyboard {
        req = req.reply_markup(kb);
    }
    req.await?;
    Ok(())
}
