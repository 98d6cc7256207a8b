//! Message Handler module for processing incoming Telegram messages

use anyhow::Result;
use std::sync::Arc;
use teloxide::prelude::*;
use teloxide::types::User;
use tracing::debug;

use crate::dialogue::CheckoutDialogue;

use super::event::{Event, Inbound, Sender, SharedContact};
use super::storefront::Storefront;

/// Builds the sender from a Telegram user and the chat replies go to
pub fn sender_from_user(user: &User, chat_id: ChatId) -> Sender {
    Sender {
        user_id: user.id.0 as i64,
        chat_id,
        username: user.username.clone(),
        full_name: user.full_name(),
    }
}

/// `/start`, optionally addressed to the bot (`/start@shop_bot`) or with a payload
pub fn is_start_command(text: &str) -> bool {
    let command = text.split_whitespace().next().unwrap_or("");
    command == "/start" || command.starts_with("/start@")
}

/// Classifies a Telegram message into an inbound event
pub fn inbound_from_message(msg: &Message) -> Inbound {
    if let Some(contact) = msg.contact() {
        return Inbound::Contact {
            contact: SharedContact {
                phone_number: contact.phone_number.clone(),
                first_name: contact.first_name.clone(),
                last_name: contact.last_name.clone(),
            },
            message_id: msg.id,
        };
    }

    match msg.text() {
        Some(text) if is_start_command(text) => Inbound::Start,
        Some(text) => Inbound::Text(text.to_string()),
        None => Inbound::Unsupported,
    }
}

pub async fn message_handler(
    msg: Message,
    dialogue: CheckoutDialogue,
    storefront: Arc<Storefront>,
) -> Result<()> {
    let Some(user) = msg.from.as_ref() else {
        debug!(chat_id = %msg.chat.id, "Ignoring message without a sender");
        return Ok(());
    };

    let event = Event {
        sender: sender_from_user(user, msg.chat.id),
        inbound: inbound_from_message(&msg),
    };
    debug!(user_id = %user.id, inbound = ?event.inbound, "Received message");

    let mut checkout = dialogue.get_or_default().await?;
    storefront.handle(event, &mut checkout).await?;
    dialogue.update(checkout).await?;

    Ok(())
}
