//! Transport-neutral inbound events, built by the message and callback
//! handlers from Telegram updates.

use teloxide::types::{ChatId, MessageId};

/// Who sent the update and where replies go
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sender {
    pub user_id: i64,
    pub chat_id: ChatId,
    pub username: Option<String>,
    pub full_name: String,
}

impl Sender {
    /// `@username` when the user has one, the full name otherwise
    pub fn display_name(&self) -> String {
        match &self.username {
            Some(username) => format!("@{username}"),
            None => self.full_name.clone(),
        }
    }
}

/// A contact card shared through the reply keyboard
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SharedContact {
    pub phone_number: String,
    pub first_name: String,
    pub last_name: Option<String>,
}

impl SharedContact {
    pub fn full_name(&self) -> String {
        match &self.last_name {
            Some(last) if !last.is_empty() => format!("{} {}", self.first_name, last),
            _ => self.first_name.clone(),
        }
    }
}

/// The bot message a button was pressed on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PriorMessage {
    pub id: MessageId,
    pub has_image: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inbound {
    /// The `/start` command
    Start,
    /// An inline button press carrying an action token
    Action {
        callback_id: String,
        token: String,
        origin: Option<PriorMessage>,
    },
    /// Free text typed by the user
    Text(String),
    /// A contact shared by the user, with the id of the message carrying it
    Contact {
        contact: SharedContact,
        message_id: MessageId,
    },
    /// Any other message kind (photo, sticker, ...)
    Unsupported,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    pub sender: Sender,
    pub inbound: Inbound,
}
