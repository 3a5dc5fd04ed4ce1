//! User-facing message templates (Telegram HTML).

use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup};

use newscast_core::{domain::ChatId, formatting::escape_html};
use newscast_store::ChatStats;

pub const BACK_TO_START: &str = "back_to_start";

pub fn welcome_text() -> String {
    [
        "🌟 <b>WELCOME TO NEWS BOT</b> 🌟",
        "",
        "📰 <b>Stay updated with the latest news!</b>",
        "🔔 Get instant news updates directly in this chat",
        "📢 Broadcast news to all subscribed chats (admin only)",
        "",
        "⚡ <b>Available Commands:</b>",
        "• /start - Show welcome message",
        "• /stats - Show bot statistics",
        "• /broadcastpoll - Broadcast a poll (reply to a poll, admin only)",
        "",
        "👇 <b>Use the buttons below to get started:</b>",
    ]
    .join("\n")
}

/// "Add me to your group" + "Join our channel" buttons.
pub fn welcome_keyboard(bot_username: &str, channel_handle: &str) -> anyhow::Result<InlineKeyboardMarkup> {
    let add = InlineKeyboardButton::url(
        "➕ ADD ME TO YOUR GROUP ➕",
        format!("https://t.me/{bot_username}?startgroup=true").parse()?,
    );
    let join = InlineKeyboardButton::url(
        "📢 JOIN OUR NEWS CHANNEL 📢",
        format!("https://t.me/{channel_handle}").parse()?,
    );
    Ok(InlineKeyboardMarkup::new(vec![vec![add], vec![join]]))
}

pub fn back_keyboard() -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![vec![InlineKeyboardButton::callback(
        "🔙 Back",
        BACK_TO_START,
    )]])
}

pub fn stats_text(stats: &ChatStats, log_channel: ChatId) -> String {
    format!(
        "📊 <b>Bot Statistics</b>\n\n• Total chats: <b>{}</b>\n  ├─ Groups: <b>{}</b>\n  └─ Private: <b>{}</b>\n\n🆔 Log channel: <code>{}</code>",
        stats.total, stats.groups, stats.direct, log_channel.0
    )
}

pub fn activation_notice() -> &'static str {
    "📢 <b>News Bot Activated!</b> This group will now receive news updates.\n\n\
⚠️ Please make the bot admin and grant 'Send Messages' permission.\n\n\
Type /start to see bot features or /stats to view statistics!"
}

pub const POLL_USAGE_HINT: &str =
    "⚠️ Please reply to a poll message with /broadcastpoll to broadcast it.";

pub fn chat_registered_log(
    is_group: bool,
    chat_id: ChatId,
    title: Option<&str>,
    user_name: &str,
    username: Option<&str>,
) -> String {
    format!(
        "🆕 New chat registered\n\n📌 Type: {}\n🆔 ID: {}\n🏷️ Name: {}\n👤 User: {} (@{})",
        if is_group { "Group" } else { "Private" },
        chat_id.0,
        escape_html(title.unwrap_or("N/A")),
        escape_html(user_name),
        escape_html(username.unwrap_or("N/A")),
    )
}

pub fn added_to_group_log(title: Option<&str>, chat_id: ChatId, added_by: &str) -> String {
    format!(
        "➕ Bot added to new group\n\n🏷️ Group name: {}\n🆔 ID: {}\n👤 Added by: {}",
        escape_html(title.unwrap_or("N/A")),
        chat_id.0,
        escape_html(added_by)
    )
}

pub fn stats_checked_log(user_name: &str) -> String {
    format!("📊 Statistics checked\n👤 User: {}", escape_html(user_name))
}
