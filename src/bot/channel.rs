//! Messaging seams: what the storefront needs from the chat transport and
//! from the operator chat, with their Telegram implementations.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use teloxide::prelude::*;
use teloxide::types::{
    ButtonRequest, CallbackQueryId, InlineKeyboardButton, InlineKeyboardMarkup, InputFile,
    KeyboardButton, KeyboardMarkup, KeyboardRemove, MessageId, ParseMode, ReplyMarkup,
};
use tracing::debug;

use crate::action::Action;
use crate::errors::ShopError;

/// An inline button routed through an action token
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Button {
    pub label: String,
    pub action: Action,
}

impl Button {
    pub fn new(label: impl Into<String>, action: Action) -> Self {
        Self {
            label: label.into(),
            action,
        }
    }
}

/// A reply-keyboard button; it sends its label as text or shares the contact
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplyButton {
    pub label: String,
    pub request_contact: bool,
}

/// Controls attached to an outbound message
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Keyboard {
    #[default]
    None,
    /// Buttons attached to the message itself
    Inline(Vec<Vec<Button>>),
    /// Persistent keyboard replacing the user's input area
    Reply(Vec<Vec<ReplyButton>>),
    /// Removes a previously shown reply keyboard
    RemoveReply,
}

impl Keyboard {
    /// Reply keyboards can neither be edited in nor edited away
    pub fn is_reply_affordance(&self) -> bool {
        matches!(self, Keyboard::Reply(_) | Keyboard::RemoveReply)
    }
}

/// A logical render request
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OutboundMessage {
    /// HTML text, used as the caption when an image is attached
    pub text: String,
    pub image: Option<PathBuf>,
    pub keyboard: Keyboard,
}

impl OutboundMessage {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Default::default()
        }
    }

    pub fn with_keyboard(mut self, keyboard: Keyboard) -> Self {
        self.keyboard = keyboard;
        self
    }

    pub fn with_image(mut self, image: Option<PathBuf>) -> Self {
        self.image = image;
        self
    }
}

/// Outbound side of the chat transport
#[async_trait]
pub trait MessagingChannel: Send + Sync {
    async fn send_text(
        &self,
        chat: ChatId,
        text: &str,
        keyboard: &Keyboard,
    ) -> Result<MessageId, ShopError>;

    async fn send_photo(
        &self,
        chat: ChatId,
        image: &Path,
        caption: &str,
        keyboard: &Keyboard,
    ) -> Result<MessageId, ShopError>;

    /// Replaces the text and inline keyboard of an existing text message
    async fn edit_text(
        &self,
        chat: ChatId,
        message: MessageId,
        text: &str,
        keyboard: &Keyboard,
    ) -> Result<(), ShopError>;

    async fn delete(&self, chat: ChatId, message: MessageId) -> Result<(), ShopError>;

    /// Acknowledges a button press, optionally with a notice or alert
    async fn answer_callback(
        &self,
        callback_id: &str,
        notice: Option<&str>,
        alert: bool,
    ) -> Result<(), ShopError>;
}

/// Notification destination for orders and help requests
#[async_trait]
pub trait OperatorChannel: Send + Sync {
    async fn notify(&self, text: &str) -> Result<(), ShopError>;
}

fn inline_markup(rows: &[Vec<Button>]) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(rows.iter().map(|row| {
        row.iter()
            .map(|b| InlineKeyboardButton::callback(b.label.clone(), b.action.to_string()))
            .collect::<Vec<_>>()
    }))
}

fn reply_markup(keyboard: &Keyboard) -> Option<ReplyMarkup> {
    match keyboard {
        Keyboard::None => None,
        Keyboard::Inline(rows) => Some(ReplyMarkup::InlineKeyboard(inline_markup(rows))),
        Keyboard::Reply(rows) => {
            let buttons = rows.iter().map(|row| {
                row.iter()
                    .map(|b| {
                        let button = KeyboardButton::new(b.label.clone());
                        if b.request_contact {
                            button.request(ButtonRequest::Contact)
                        } else {
                            button
                        }
                    })
                    .collect::<Vec<_>>()
            });
            Some(ReplyMarkup::Keyboard(
                KeyboardMarkup::new(buttons).resize_keyboard().one_time_keyboard(),
            ))
        }
        Keyboard::RemoveReply => Some(ReplyMarkup::KeyboardRemove(KeyboardRemove::new())),
    }
}

fn render_failure(e: teloxide::RequestError) -> ShopError {
    ShopError::RenderDeliveryFailure(e.to_string())
}

/// Telegram implementation of the messaging channel; all texts use HTML
#[derive(Debug, Clone)]
pub struct TelegramChannel {
    bot: Bot,
}

impl TelegramChannel {
    pub fn new(bot: Bot) -> Self {
        Self { bot }
    }
}

#[async_trait]
impl MessagingChannel for TelegramChannel {
    async fn send_text(
        &self,
        chat: ChatId,
        text: &str,
        keyboard: &Keyboard,
    ) -> Result<MessageId, ShopError> {
        let mut request = self
            .bot
            .send_message(chat, text)
            .parse_mode(ParseMode::Html);
        if let Some(markup) = reply_markup(keyboard) {
            request = request.reply_markup(markup);
        }
        let sent = request.await.map_err(render_failure)?;
        Ok(sent.id)
    }

    async fn send_photo(
        &self,
        chat: ChatId,
        image: &Path,
        caption: &str,
        keyboard: &Keyboard,
    ) -> Result<MessageId, ShopError> {
        let mut request = self
            .bot
            .send_photo(chat, InputFile::file(image.to_path_buf()))
            .caption(caption)
            .parse_mode(ParseMode::Html);
        if let Some(markup) = reply_markup(keyboard) {
            request = request.reply_markup(markup);
        }
        let sent = request.await.map_err(render_failure)?;
        Ok(sent.id)
    }

    async fn edit_text(
        &self,
        chat: ChatId,
        message: MessageId,
        text: &str,
        keyboard: &Keyboard,
    ) -> Result<(), ShopError> {
        let mut request = self
            .bot
            .edit_message_text(chat, message, text)
            .parse_mode(ParseMode::Html);
        match keyboard {
            Keyboard::Inline(rows) => request = request.reply_markup(inline_markup(rows)),
            Keyboard::None => {}
            Keyboard::Reply(_) | Keyboard::RemoveReply => {
                return Err(ShopError::RenderDeliveryFailure(
                    "reply keyboards cannot be attached by editing".to_string(),
                ));
            }
        }
        request.await.map_err(render_failure)?;
        Ok(())
    }

    async fn delete(&self, chat: ChatId, message: MessageId) -> Result<(), ShopError> {
        self.bot
            .delete_message(chat, message)
            .await
            .map_err(render_failure)?;
        Ok(())
    }

    async fn answer_callback(
        &self,
        callback_id: &str,
        notice: Option<&str>,
        alert: bool,
    ) -> Result<(), ShopError> {
        let mut request = self
            .bot
            .answer_callback_query(CallbackQueryId(callback_id.to_string()));
        if let Some(text) = notice {
            request = request.text(text).show_alert(alert);
        }
        request.await.map_err(render_failure)?;
        Ok(())
    }
}

/// Sends plain-text notifications to the configured operator chat
#[derive(Debug, Clone)]
pub struct TelegramOperator {
    bot: Bot,
    operator: Option<ChatId>,
}

impl TelegramOperator {
    pub fn new(bot: Bot, operator: Option<ChatId>) -> Self {
        Self { bot, operator }
    }
}

#[async_trait]
impl OperatorChannel for TelegramOperator {
    async fn notify(&self, text: &str) -> Result<(), ShopError> {
        let Some(chat) = self.operator else {
            debug!("Operator notification skipped: no operator chat configured");
            return Err(ShopError::MissingOperatorConfig);
        };

        self.bot
            .send_message(chat, text)
            .await
            .map_err(|e| ShopError::NotificationDeliveryFailure(e.to_string()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::MenuTarget;

    #[test]
    fn test_reply_affordance_kinds() {
        assert!(Keyboard::RemoveReply.is_reply_affordance());
        assert!(Keyboard::Reply(vec![]).is_reply_affordance());
        assert!(!Keyboard::None.is_reply_affordance());
        assert!(!Keyboard::Inline(vec![]).is_reply_affordance());
    }

    #[test]
    fn test_inline_markup_carries_action_tokens() {
        let markup = inline_markup(&[vec![Button::new("Cart", Action::Menu(MenuTarget::Cart))]]);
        assert_eq!(
            markup.inline_keyboard,
            vec![vec![InlineKeyboardButton::callback("Cart", "menu:cart")]]
        );
    }
}
