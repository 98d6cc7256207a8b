//! Callback Handler module for processing inline keyboard callback queries

use anyhow::Result;
use std::sync::Arc;
use teloxide::prelude::*;
use teloxide::types::MaybeInaccessibleMessage;
use tracing::debug;

use crate::dialogue::CheckoutDialogue;

use super::event::{Event, Inbound, PriorMessage};
use super::message_handler::sender_from_user;
use super::storefront::Storefront;

/// The message the pressed button is attached to, if still accessible
fn prior_message(message: &MaybeInaccessibleMessage) -> PriorMessage {
    let has_image = match message {
        MaybeInaccessibleMessage::Regular(msg) => msg.photo().is_some(),
        MaybeInaccessibleMessage::Inaccessible(_) => false,
    };
    PriorMessage {
        id: message.id(),
        has_image,
    }
}

/// Handle callback queries from inline keyboards
pub async fn callback_handler(
    q: CallbackQuery,
    dialogue: CheckoutDialogue,
    storefront: Arc<Storefront>,
) -> Result<()> {
    let chat_id = match &q.message {
        Some(message) => message.chat().id,
        None => ChatId(q.from.id.0 as i64),
    };
    let token = q.data.clone().unwrap_or_default();
    debug!(user_id = %q.from.id, token = %token, "Received callback query");

    let event = Event {
        sender: sender_from_user(&q.from, chat_id),
        inbound: Inbound::Action {
            callback_id: q.id.0.clone(),
            token,
            origin: q.message.as_ref().map(prior_message),
        },
    };

    let mut checkout = dialogue.get_or_default().await?;
    storefront.handle(event, &mut checkout).await?;
    dialogue.update(checkout).await?;

    Ok(())
}
