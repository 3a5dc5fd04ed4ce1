use crate::{
    broadcast::{
        outcome::DeliveryOutcome,
        payload::{ContentPayload, MediaKind, Payload},
    },
    domain::Recipient,
    transport::{Transport, TransportError, TransportResult},
};

/// Deliver `payload` to one recipient.
///
/// Makes at most one transport call and never fails: every transport error becomes
/// a failure outcome so one bad chat cannot affect the others.
pub async fn deliver(transport: &dyn Transport, payload: &Payload, recipient: Recipient) -> DeliveryOutcome {
    let res = match payload {
        Payload::Content(content) => send_content(transport, &recipient, content).await,
        Payload::Poll(poll) => transport.send_poll(recipient.id, poll).await,
    };

    match res {
        Ok(()) => DeliveryOutcome::success(recipient),
        Err(e) => {
            tracing::warn!(chat_id = recipient.id.0, error = %e, "delivery failed");
            DeliveryOutcome::failure(recipient, e.to_string())
        }
    }
}

async fn send_content(
    transport: &dyn Transport,
    recipient: &Recipient,
    content: &ContentPayload,
) -> TransportResult {
    let Some(media) = &content.media else {
        return transport.send_message(recipient.id, &content.text).await;
    };

    match &media.kind {
        MediaKind::Photo => {
            transport
                .send_photo(recipient.id, &media.reference, &content.text)
                .await
        }
        MediaKind::Video => {
            transport
                .send_video(recipient.id, &media.reference, &content.text)
                .await
        }
        MediaKind::Other(kind) => Err(TransportError::UnsupportedMedia(kind.clone())),
    }
}
