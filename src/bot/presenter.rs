//! Presentation adapter: turns a render request into transport calls,
//! choosing between editing the previous message and replacing it.
//!
//! Transports cannot turn a text message into a photo (or back) by editing,
//! and cannot edit a reply keyboard away, so:
//! 1. a message with an image is always sent fresh;
//! 2. a prior photo or a reply-keyboard change also forces a fresh text;
//! 3. otherwise the prior message is edited in place, falling back to 2.
//!
//! Whenever a fresh message replaces a prior one, the prior one is deleted
//! best-effort. Failures never propagate to the caller.

use teloxide::types::{ChatId, MessageId};
use tracing::{debug, error, warn};

use super::channel::{MessagingChannel, OutboundMessage};
use super::event::PriorMessage;

/// Renders `message` into `chat`, replacing or editing `prior`. Returns the
/// id of the message now showing the content, if any was delivered.
pub async fn present(
    channel: &dyn MessagingChannel,
    chat: ChatId,
    prior: Option<PriorMessage>,
    message: &OutboundMessage,
) -> Option<MessageId> {
    if let Some(image) = &message.image {
        match channel
            .send_photo(chat, image, &message.text, &message.keyboard)
            .await
        {
            Ok(id) => {
                discard_prior(channel, chat, prior).await;
                return Some(id);
            }
            Err(e) => {
                warn!(chat_id = %chat, error = %e, "Failed to send photo, falling back to text");
            }
        }
        return replace_with_text(channel, chat, prior, message).await;
    }

    match prior {
        Some(p) if !p.has_image && !message.keyboard.is_reply_affordance() => {
            match channel
                .edit_text(chat, p.id, &message.text, &message.keyboard)
                .await
            {
                Ok(()) => Some(p.id),
                Err(e) => {
                    warn!(chat_id = %chat, error = %e, "Failed to edit message, sending a new one");
                    replace_with_text(channel, chat, prior, message).await
                }
            }
        }
        _ => replace_with_text(channel, chat, prior, message).await,
    }
}

async fn replace_with_text(
    channel: &dyn MessagingChannel,
    chat: ChatId,
    prior: Option<PriorMessage>,
    message: &OutboundMessage,
) -> Option<MessageId> {
    match channel
        .send_text(chat, &message.text, &message.keyboard)
        .await
    {
        Ok(id) => {
            discard_prior(channel, chat, prior).await;
            Some(id)
        }
        Err(e) => {
            error!(chat_id = %chat, error = %e, "Failed to send message");
            None
        }
    }
}

async fn discard_prior(channel: &dyn MessagingChannel, chat: ChatId, prior: Option<PriorMessage>) {
    if let Some(p) = prior {
        if let Err(e) = channel.delete(chat, p.id).await {
            debug!(chat_id = %chat, message_id = p.id.0, error = %e, "Could not delete previous message");
        }
    }
}
