use std::sync::Arc;

use teloxide::{prelude::*, types::ParseMode};
use tokio_util::sync::CancellationToken;

use newscast_core::{
    broadcast::Payload,
    formatting::escape_html,
    report::{format_admin_reply, BroadcastSubject, LogChannelReporter},
};

use crate::router::AppState;

use super::sender_name;

/// Start one broadcast in the background and return immediately.
///
/// Progress goes to the log channel and the summary is sent back to `msg.chat`
/// once the run ends. The run is registered with `ActiveBroadcasts` before this
/// returns, so `/cancel` and shutdown can stop it, even when `/cancel` comes from
/// the same chat as the post.
pub async fn spawn_broadcast(
    bot: Bot,
    msg: &Message,
    state: Arc<AppState>,
    payload: Payload,
    subject: BroadcastSubject,
) -> ResponseResult<()> {
    let posted_by = sender_name(msg.from());
    let reply_to = msg.chat.id;

    tracing::info!(kind = payload.kind_label(), posted_by = %posted_by, "broadcast requested");

    let active = state.broadcasts.clone();
    active
        .spawn(move |cancel| async move {
            let reply = run_and_summarize(&state, &payload, subject, posted_by, &cancel).await;
            if let Err(e) = bot
                .send_message(reply_to, reply)
                .parse_mode(ParseMode::Html)
                .await
            {
                tracing::warn!(chat_id = reply_to.0, error = %e, "failed to send broadcast summary");
            }
        })
        .await;
    Ok(())
}

/// Run the broadcast to its end and build the admin reply.
async fn run_and_summarize(
    state: &AppState,
    payload: &Payload,
    subject: BroadcastSubject,
    posted_by: String,
    cancel: &CancellationToken,
) -> String {
    let reporter = LogChannelReporter::new(
        state.messenger.clone(),
        state.notifier.clone(),
        state.cfg.log_channel_id,
        subject.clone(),
        posted_by,
    );
    let options = state.cfg.broadcast_options();

    match state
        .broadcaster
        .run_broadcast(payload, &options, &reporter, cancel)
        .await
    {
        Ok(result) => {
            tracing::info!(
                kind = payload.kind_label(),
                total = result.total,
                excluded = result.excluded,
                succeeded = result.succeeded,
                failed = result.failed,
                status = ?result.status,
                "broadcast finished"
            );
            format_admin_reply(&subject, &result)
        }
        Err(e) => {
            tracing::error!(kind = payload.kind_label(), error = %e, "broadcast aborted");
            state
                .log(&format!(
                    "❌ {} broadcast aborted\n\n{}",
                    payload.kind_label(),
                    escape_html(&e.to_string())
                ))
                .await;
            "⚠️ Broadcast aborted: the chat list could not be loaded. Nothing was sent.".to_string()
        }
    }
}
