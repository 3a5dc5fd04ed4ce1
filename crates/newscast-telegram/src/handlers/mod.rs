//! Telegram update handlers.
//!
//! Each handler is a small adapter that:
//! - checks admin rights where the action fans out to every chat
//! - registers chats in the store
//! - hands broadcasts to `newscast-core` and reports back to the admin

use std::sync::Arc;

use teloxide::{
    prelude::*,
    types::{CallbackQuery, Message, User},
};

use newscast_core::{domain::UserId, security::is_authorized};

use crate::router::AppState;

mod broadcast;
mod callback;
mod commands;
mod members;
mod news;
mod poll;
mod welcome;

pub async fn handle_callback(
    bot: Bot,
    q: CallbackQuery,
    state: Arc<AppState>,
) -> ResponseResult<()> {
    callback::handle_callback(bot, q, state).await
}

pub async fn handle_message(bot: Bot, msg: Message, state: Arc<AppState>) -> ResponseResult<()> {
    if msg.new_chat_members().is_some() {
        return members::handle_new_members(bot, msg, state).await;
    }

    if let Some(text) = msg.text() {
        if text.starts_with('/') {
            return commands::handle_command(bot, msg, state).await;
        }
    }

    // Plain text, photos and videos from an admin are news posts. Everyone else
    // gets no response.
    let postable = msg.text().is_some() || msg.photo().is_some() || msg.video().is_some();
    if postable && is_admin(&msg, &state) {
        return news::handle_news(bot, msg, state).await;
    }

    Ok(())
}

fn is_admin(msg: &Message, state: &AppState) -> bool {
    is_authorized(
        msg.from().map(|u| UserId(u.id.0 as i64)),
        &state.cfg.admin_ids,
    )
}

fn sender_name(user: Option<&User>) -> String {
    user.map(|u| u.full_name())
        .unwrap_or_else(|| "unknown".to_string())
}
