use std::sync::Arc;

use teloxide::{prelude::*, types::ParseMode};

use crate::{router::AppState, texts};

use super::{is_admin, poll, sender_name, welcome};

fn parse_command(text: &str) -> (String, String) {
    // Telegram may send `/cmd@botname arg1 ...`
    let mut parts = text.trim().splitn(2, char::is_whitespace);
    let first = parts.next().unwrap_or("").trim();
    let rest = parts.next().unwrap_or("").trim().to_string();

    let cmd = first
        .trim_start_matches('/')
        .split('@')
        .next()
        .unwrap_or("")
        .to_lowercase();

    (cmd, rest)
}

pub async fn handle_command(bot: Bot, msg: Message, state: Arc<AppState>) -> ResponseResult<()> {
    let Some(text) = msg.text() else {
        return Ok(());
    };
    let (cmd, _arg) = parse_command(text);

    match cmd.as_str() {
        "start" => welcome::handle_start(bot, msg, state).await,
        "stats" => handle_stats(bot, msg, state).await,
        "broadcastpoll" if is_admin(&msg, &state) => {
            poll::handle_broadcast_poll(bot, msg, state).await
        }
        "cancel" if is_admin(&msg, &state) => handle_cancel(bot, msg, state).await,
        // Unknown commands and admin commands from non-admins are ignored.
        _ => Ok(()),
    }
}

async fn handle_stats(bot: Bot, msg: Message, state: Arc<AppState>) -> ResponseResult<()> {
    let stats = match state.store.stats().await {
        Ok(s) => s,
        Err(e) => {
            tracing::error!(error = %e, "failed to load chat statistics");
            bot.send_message(msg.chat.id, "⚠️ Statistics are unavailable right now.")
                .await?;
            return Ok(());
        }
    };

    bot.send_message(msg.chat.id, texts::stats_text(&stats, state.cfg.log_channel_id))
        .parse_mode(ParseMode::Html)
        .reply_markup(texts::back_keyboard())
        .await?;

    let user_name = sender_name(msg.from());
    tracing::info!(
        user = %user_name,
        user_id = msg.from().map(|u| u.id.0),
        "statistics checked"
    );
    state.log(&texts::stats_checked_log(&user_name)).await;
    Ok(())
}

async fn handle_cancel(bot: Bot, msg: Message, state: Arc<AppState>) -> ResponseResult<()> {
    let cancelled = state.broadcasts.cancel_all().await;
    tracing::info!(cancelled, chat_id = msg.chat.id.0, "cancel requested");

    let reply = if cancelled == 0 {
        "ℹ️ No broadcast is running.".to_string()
    } else {
        format!("⛔ Stopping {cancelled} running broadcast(s). A summary follows when each one ends.")
    };
    bot.send_message(msg.chat.id, reply).await?;
    Ok(())
}
