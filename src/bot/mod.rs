//! Bot module for handling Telegram interactions
//!
//! This module is split into several submodules:
//! - `event`: Transport-neutral inbound events
//! - `message_handler` / `callback_handler`: Turn Telegram updates into events
//! - `storefront`: Application context and dialog state machine
//! - `channel`: Messaging and operator seams with their Telegram implementations
//! - `presenter`: Edit-or-resend rendering policy
//! - `ui_builder`: Creates keyboards and formats views
//! - `order`: Operator notification texts

pub mod callback_handler;
pub mod channel;
pub mod event;
pub mod message_handler;
pub mod order;
pub mod presenter;
pub mod storefront;
pub mod ui_builder;

// Re-export main handler functions for use in main.rs
pub use callback_handler::callback_handler;
pub use message_handler::message_handler;

pub use channel::{
    Button, Keyboard, MessagingChannel, OperatorChannel, OutboundMessage, ReplyButton,
    TelegramChannel, TelegramOperator,
};
pub use event::{Event, Inbound, PriorMessage, Sender, SharedContact};
pub use storefront::Storefront;
