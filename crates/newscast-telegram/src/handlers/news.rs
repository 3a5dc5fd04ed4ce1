use std::sync::Arc;

use teloxide::prelude::*;

use newscast_core::{
    broadcast::{ContentPayload, MediaKind, Payload},
    report::BroadcastSubject,
};

use crate::router::AppState;

use super::broadcast::spawn_broadcast;

/// Admin post: store it, then fan it out to every registered chat.
pub async fn handle_news(bot: Bot, msg: Message, state: Arc<AppState>) -> ResponseResult<()> {
    let content = content_payload(&msg);
    let media = content
        .media
        .as_ref()
        .map(|m| (&m.kind, m.reference.as_str()));

    let post_id = match state.store.save_news(&content.text, media).await {
        Ok(id) => id,
        Err(e) => {
            tracing::error!(error = %e, "failed to save news post");
            bot.send_message(msg.chat.id, "⚠️ Could not save the post. Nothing was sent.")
                .await?;
            return Ok(());
        }
    };

    let payload = Payload::from(content);
    let subject = BroadcastSubject::news(post_id, &payload);
    spawn_broadcast(bot, &msg, state, payload, subject).await
}

/// Caption wins over text; for photos the largest size (last) is sent.
fn content_payload(msg: &Message) -> ContentPayload {
    let text = msg.caption().or_else(|| msg.text()).unwrap_or("");

    if let Some(best) = msg.photo().and_then(|sizes| sizes.last()) {
        return ContentPayload::with_media(text, MediaKind::Photo, best.file.id.clone());
    }
    if let Some(video) = msg.video() {
        return ContentPayload::with_media(text, MediaKind::Video, video.file.id.clone());
    }
    ContentPayload::text(text)
}
