use std::sync::Arc;

use teloxide::{prelude::*, types::ParseMode};

use newscast_core::domain::{ChatId, RecipientKind};

use crate::{router::AppState, texts};

use super::sender_name;

/// Registers a group when the bot itself is among the new members.
pub async fn handle_new_members(
    bot: Bot,
    msg: Message,
    state: Arc<AppState>,
) -> ResponseResult<()> {
    let Some(members) = msg.new_chat_members() else {
        return Ok(());
    };
    if !members.iter().any(|m| m.id == state.bot_id) {
        return Ok(());
    }

    let chat_id = ChatId(msg.chat.id.0);
    let title = msg.chat.title();
    match state
        .store
        .add_chat(chat_id, RecipientKind::Group, title)
        .await
    {
        Ok(_) => tracing::info!(chat_id = chat_id.0, "bot added to group"),
        Err(e) => tracing::error!(chat_id = chat_id.0, error = %e, "failed to register group"),
    }

    state
        .log(&texts::added_to_group_log(title, chat_id, &sender_name(msg.from())))
        .await;

    bot.send_message(msg.chat.id, texts::activation_notice())
        .parse_mode(ParseMode::Html)
        .await?;
    Ok(())
}
