use std::sync::Arc;

use teloxide::prelude::*;

use crate::{router::AppState, texts};

use super::welcome::send_welcome;

pub async fn handle_callback(
    bot: Bot,
    q: CallbackQuery,
    state: Arc<AppState>,
) -> ResponseResult<()> {
    // Always answer so the client stops its spinner.
    let _ = bot.answer_callback_query(q.id.clone()).await;

    if q.data.as_deref() != Some(texts::BACK_TO_START) {
        return Ok(());
    }
    let Some(stats_msg) = q.message else {
        return Ok(());
    };

    send_welcome(&bot, stats_msg.chat.id, &state).await?;

    if let Err(e) = bot.delete_message(stats_msg.chat.id, stats_msg.id).await {
        tracing::warn!(chat_id = stats_msg.chat.id.0, error = %e, "failed to delete stats message");
    }
    Ok(())
}
