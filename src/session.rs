//! Per-user durable session: the cart and the dialog state.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::str::FromStr;
use tokio::sync::Mutex;

use crate::cart::Cart;
use crate::errors::ShopError;

/// Server-held mode deciding which inputs are meaningful for a user
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DialogState {
    #[default]
    MainMenu,
    ChoosingCategory,
    ViewingProduct,
    InCart,
    EnteringAddress,
    EnteringContact,
    ConfirmingOrder,
    AwaitingHelpMessage,
    AwaitingHelpContact,
}

impl DialogState {
    pub fn as_str(&self) -> &'static str {
        match self {
            DialogState::MainMenu => "MAIN_MENU",
            DialogState::ChoosingCategory => "CHOOSING_CATEGORY",
            DialogState::ViewingProduct => "VIEWING_PRODUCT",
            DialogState::InCart => "IN_CART",
            DialogState::EnteringAddress => "ENTERING_ADDRESS",
            DialogState::EnteringContact => "ENTERING_CONTACT",
            DialogState::ConfirmingOrder => "CONFIRMING_ORDER",
            DialogState::AwaitingHelpMessage => "AWAITING_HELP_MESSAGE",
            DialogState::AwaitingHelpContact => "AWAITING_HELP_CONTACT",
        }
    }

    /// States whose prompt left a reply keyboard on the user's screen
    pub fn shows_reply_keyboard(&self) -> bool {
        matches!(
            self,
            DialogState::EnteringContact | DialogState::AwaitingHelpMessage | DialogState::AwaitingHelpContact
        )
    }

    /// States that own an in-progress checkout
    pub fn is_checkout(&self) -> bool {
        matches!(
            self,
            DialogState::EnteringAddress | DialogState::EnteringContact | DialogState::ConfirmingOrder
        )
    }
}

impl std::fmt::Display for DialogState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DialogState {
    type Err = String;

    /// Accepts both `MAIN_MENU` and the older `UserState:MAIN_MENU` form.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.rsplit(':').next().unwrap_or(s);
        match name {
            "MAIN_MENU" => Ok(DialogState::MainMenu),
            "CHOOSING_CATEGORY" => Ok(DialogState::ChoosingCategory),
            "VIEWING_PRODUCT" => Ok(DialogState::ViewingProduct),
            "IN_CART" => Ok(DialogState::InCart),
            "ENTERING_ADDRESS" => Ok(DialogState::EnteringAddress),
            "ENTERING_CONTACT" => Ok(DialogState::EnteringContact),
            "CONFIRMING_ORDER" => Ok(DialogState::ConfirmingOrder),
            "AWAITING_HELP_MESSAGE" | "WAITING_FOR_HELP_MESSAGE" => Ok(DialogState::AwaitingHelpMessage),
            "AWAITING_HELP_CONTACT" | "WAITING_FOR_HELP_CONTACT" => Ok(DialogState::AwaitingHelpContact),
            other => Err(format!("unknown dialog state: {other}")),
        }
    }
}

/// Durable record keyed by the chat user id
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSession {
    pub user_id: i64,
    pub cart: Cart,
    pub dialog_state: DialogState,
}

impl UserSession {
    pub fn new(user_id: i64) -> Self {
        Self {
            user_id,
            cart: Cart::new(),
            dialog_state: DialogState::MainMenu,
        }
    }
}

/// Durable session storage. `save` overwrites: last write wins.
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn load(&self, user_id: i64) -> Result<Option<UserSession>, ShopError>;
    async fn save(&self, session: &UserSession) -> Result<(), ShopError>;
}

/// Process-local session storage
#[derive(Debug, Default)]
pub struct InMemorySessionStore {
    sessions: Mutex<HashMap<i64, UserSession>>,
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn load(&self, user_id: i64) -> Result<Option<UserSession>, ShopError> {
        Ok(self.sessions.lock().await.get(&user_id).cloned())
    }

    async fn save(&self, session: &UserSession) -> Result<(), ShopError> {
        self.sessions
            .lock()
            .await
            .insert(session.user_id, session.clone());
        Ok(())
    }
}
