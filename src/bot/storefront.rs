//! Storefront: the application context shared by every handler and the
//! dialog state machine routing events by `(DialogState, Action)`.
//!
//! One event is one read-modify-write cycle: the session is loaded, the
//! transition renders its views, and the session is saved afterwards.

use anyhow::{Context, Result};
use chrono::Utc;
use std::path::PathBuf;
use std::sync::Arc;
use teloxide::types::MessageId;
use tracing::{debug, error, info, warn};

use crate::action::{Action, BackTarget, LineOp, MenuTarget};
use crate::cart::{add_by_id, CartSummary};
use crate::catalog::{CatalogStore, Category, Product, ProductId};
use crate::dialogue::{validate_address, AddressError, CheckoutState, PendingOrder};
use crate::errors::ShopError;
use crate::localization::Messages;
use crate::session::{DialogState, SessionStore, UserSession};

use super::channel::{MessagingChannel, OperatorChannel, OutboundMessage};
use super::event::{Event, Inbound, PriorMessage, Sender, SharedContact};
use super::order::{format_help_contact, format_help_message, format_order_notification};
use super::presenter::present;
use super::ui_builder;

/// How a button press is acknowledged
#[derive(Debug, Default)]
struct Ack {
    text: Option<String>,
    alert: bool,
}

impl Ack {
    fn silent() -> Self {
        Self::default()
    }

    fn notice(text: String) -> Self {
        Self {
            text: Some(text),
            alert: false,
        }
    }

    fn alert(text: String) -> Self {
        Self {
            text: Some(text),
            alert: true,
        }
    }
}

/// Per-event working set
struct Turn<'a> {
    sender: &'a Sender,
    session: UserSession,
    checkout: &'a mut CheckoutState,
    /// Message to edit or replace on the next render; taken by the first one
    prior: Option<PriorMessage>,
}

impl Turn<'_> {
    fn state(&self) -> DialogState {
        self.session.dialog_state
    }

    fn set_state(&mut self, state: DialogState) {
        if state != self.session.dialog_state {
            debug!(
                user_id = %self.sender.user_id,
                from = %self.session.dialog_state,
                to = %state,
                "Dialog state transition"
            );
        }
        self.session.dialog_state = state;
    }
}

pub struct Storefront {
    catalog: Arc<dyn CatalogStore>,
    sessions: Arc<dyn SessionStore>,
    channel: Arc<dyn MessagingChannel>,
    operator: Arc<dyn OperatorChannel>,
    messages: Messages,
    images_dir: PathBuf,
}

impl Storefront {
    pub fn new(
        catalog: Arc<dyn CatalogStore>,
        sessions: Arc<dyn SessionStore>,
        channel: Arc<dyn MessagingChannel>,
        operator: Arc<dyn OperatorChannel>,
        messages: Messages,
        images_dir: PathBuf,
    ) -> Self {
        Self {
            catalog,
            sessions,
            channel,
            operator,
            messages,
            images_dir,
        }
    }

    /// Handles one inbound event. `checkout` is the conversation's checkout
    /// dialogue, updated in place.
    pub async fn handle(&self, event: Event, checkout: &mut CheckoutState) -> Result<()> {
        let Event { sender, inbound } = event;
        let user_id = sender.user_id;

        let loaded = self.sessions.load(user_id).await;
        let (session, created) = match loaded {
            Ok(Some(session)) => (session, false),
            Ok(None) => (UserSession::new(user_id), true),
            Err(e) => {
                error!(user_id = %user_id, error = %e, "Failed to load session");
                if let Inbound::Action { callback_id, .. } = &inbound {
                    self.answer(callback_id, Ack::silent()).await;
                }
                return Err(e).context("Failed to load session");
            }
        };
        let before = session.clone();

        let mut turn = Turn {
            sender: &sender,
            session,
            checkout,
            prior: None,
        };

        match inbound {
            Inbound::Start => self.on_start(&mut turn, created).await,
            Inbound::Action {
                callback_id,
                token,
                origin,
            } => {
                turn.prior = origin;
                let outcome = match token.parse::<Action>() {
                    Ok(action) => self.on_action(&mut turn, action).await,
                    Err(e) => {
                        debug!(user_id = %user_id, error = %e, "Ignoring unrecognized action token");
                        Ok(Ack::silent())
                    }
                };
                match outcome {
                    Ok(ack) => self.answer(&callback_id, ack).await,
                    Err(e) => {
                        self.answer(&callback_id, Ack::silent()).await;
                        return Err(e).context("Failed to handle button press");
                    }
                }
            }
            Inbound::Text(text) => self.on_text(&mut turn, &text).await,
            Inbound::Contact {
                contact,
                message_id,
            } => self
                .on_contact(&mut turn, &contact, message_id)
                .await
                .context("Failed to handle shared contact")?,
            Inbound::Unsupported => self.acknowledge_message(&mut turn).await,
        }

        if !turn.session.dialog_state.is_checkout() && *turn.checkout != CheckoutState::Idle {
            debug!(user_id = %user_id, "Discarding pending order");
            *turn.checkout = CheckoutState::Idle;
        }

        if created || turn.session != before {
            self.sessions
                .save(&turn.session)
                .await
                .inspect_err(|e| error!(user_id = %user_id, error = %e, "Failed to save session"))
                .context("Failed to save session")?;
        }

        Ok(())
    }

    async fn on_start(&self, turn: &mut Turn<'_>, created: bool) {
        info!(user_id = %turn.sender.user_id, new_user = created, "User started the bot");
        let heading = if created {
            self.messages.get("welcome-new")
        } else {
            self.messages.get("welcome-back")
        };
        self.go_main_menu(turn, heading).await;
    }

    async fn on_action(&self, turn: &mut Turn<'_>, action: Action) -> Result<Ack, ShopError> {
        use DialogState as S;

        debug!(user_id = %turn.sender.user_id, state = %turn.state(), action = %action, "Routing action");

        match (turn.state(), action) {
            (_, Action::Menu(MenuTarget::Main) | Action::Back(BackTarget::MainMenu)) => {
                let heading = self.messages.get("main-menu");
                self.go_main_menu(turn, heading).await;
                Ok(Ack::silent())
            }
            (_, Action::ViewProduct(id)) => self.show_product(turn, id).await,
            (_, Action::Menu(MenuTarget::Cart)) => {
                self.leave_reply_keyboard(turn, "back-to-shopping").await;
                self.show_cart(turn).await?;
                turn.set_state(S::InCart);
                Ok(Ack::silent())
            }
            (S::MainMenu | S::ChoosingCategory, Action::Menu(MenuTarget::Catalog))
            | (S::ChoosingCategory | S::ViewingProduct, Action::Back(BackTarget::CategoryPicker)) => {
                self.render(turn, ui_builder::category_picker(&self.messages)).await;
                turn.set_state(S::ChoosingCategory);
                Ok(Ack::silent())
            }
            (S::MainMenu, Action::Menu(MenuTarget::Promo)) => {
                self.render(turn, ui_builder::promo(&self.messages)).await;
                Ok(Ack::silent())
            }
            (S::MainMenu, Action::Menu(MenuTarget::Help)) => {
                self.render(turn, ui_builder::help_prompt(&self.messages)).await;
                turn.set_state(S::AwaitingHelpMessage);
                Ok(Ack::silent())
            }
            (S::ChoosingCategory, Action::PickCategory(category))
            | (S::ViewingProduct, Action::Back(BackTarget::Category(category))) => {
                self.show_category(turn, category).await?;
                turn.set_state(S::ChoosingCategory);
                Ok(Ack::silent())
            }
            (S::ViewingProduct, Action::AddToCart(id)) => self.add_to_cart(turn, id).await,
            (S::InCart, Action::EditLine { op, index }) => self.edit_line(turn, op, index).await,
            (S::InCart, Action::ClearCart) => {
                turn.session.cart = turn.session.cart.clone().clear();
                self.show_cart(turn).await?;
                Ok(Ack::alert(self.messages.get("cart-cleared")))
            }
            (S::InCart, Action::Checkout) => self.begin_checkout(turn).await,
            (state, action) => {
                debug!(
                    user_id = %turn.sender.user_id,
                    state = %state,
                    action = %action,
                    "Action not valid in current state"
                );
                Ok(Ack::silent())
            }
        }
    }

    async fn on_text(&self, turn: &mut Turn<'_>, text: &str) {
        match turn.state() {
            DialogState::EnteringAddress => self.accept_address(turn, text).await,
            DialogState::EnteringContact => {
                let reminder = self.messages.get("checkout-contact-reminder");
                self.render(turn, ui_builder::contact_request(reminder, &self.messages))
                    .await;
            }
            DialogState::AwaitingHelpMessage if text.trim() == self.messages.get("button-cancel") => {
                let cancelled = self.messages.get("help-cancelled");
                self.render(turn, ui_builder::prompt_without_keyboard(cancelled))
                    .await;
                let heading = self.messages.get("main-menu");
                self.render(turn, ui_builder::main_menu(&self.messages, &heading))
                    .await;
                turn.set_state(DialogState::MainMenu);
            }
            DialogState::AwaitingHelpMessage => {
                let notification = format_help_message(&self.messages, turn.sender, text);
                self.forward_help(turn, &notification, "help-message-sent").await;
            }
            _ => self.acknowledge_message(turn).await,
        }
    }

    async fn on_contact(
        &self,
        turn: &mut Turn<'_>,
        contact: &SharedContact,
        message_id: MessageId,
    ) -> Result<(), ShopError> {
        match turn.state() {
            DialogState::EnteringContact => self.submit_order(turn, contact, message_id).await?,
            DialogState::AwaitingHelpMessage => {
                let notification = format_help_contact(&self.messages, turn.sender, contact);
                self.forward_help(turn, &notification, "help-contact-sent").await;
            }
            _ => self.acknowledge_message(turn).await,
        }
        Ok(())
    }

    async fn acknowledge_message(&self, turn: &mut Turn<'_>) {
        debug!(user_id = %turn.sender.user_id, state = %turn.state(), "Message not expected in current state");
        self.render(turn, OutboundMessage::text(self.messages.get("message-received")))
            .await;
    }

    /// Clears the reply keyboard shown by the current state, if any, before
    /// an inline view replaces it.
    async fn leave_reply_keyboard(&self, turn: &mut Turn<'_>, notice_key: &str) {
        if turn.state().shows_reply_keyboard() {
            let notice = self.messages.get(notice_key);
            self.render(turn, ui_builder::prompt_without_keyboard(notice))
                .await;
        }
    }

    async fn go_main_menu(&self, turn: &mut Turn<'_>, heading: String) {
        self.leave_reply_keyboard(turn, "returning-to-menu").await;
        self.render(turn, ui_builder::main_menu(&self.messages, &heading))
            .await;
        turn.set_state(DialogState::MainMenu);
    }

    async fn show_category(&self, turn: &mut Turn<'_>, category: Category) -> Result<(), ShopError> {
        let products = self.catalog.find_by_category(category).await?;
        self.render(turn, ui_builder::product_list(&self.messages, category, &products))
            .await;
        Ok(())
    }

    async fn show_product(&self, turn: &mut Turn<'_>, id: ProductId) -> Result<Ack, ShopError> {
        match self.catalog.find_by_id(id).await? {
            Some(product) => {
                self.leave_reply_keyboard(turn, "back-to-shopping").await;
                self.render_product(turn, &product).await;
                turn.set_state(DialogState::ViewingProduct);
            }
            None => {
                warn!(user_id = %turn.sender.user_id, product_id = id, "Requested product not found");
                let heading = self.messages.get("product-not-found-menu");
                self.go_main_menu(turn, heading).await;
            }
        }
        Ok(Ack::silent())
    }

    async fn render_product(&self, turn: &mut Turn<'_>, product: &Product) {
        let image = self.product_image(product).await;
        self.render(turn, ui_builder::product_detail(&self.messages, product, image))
            .await;
    }

    /// Path of the product's image when the file exists
    async fn product_image(&self, product: &Product) -> Option<PathBuf> {
        if product.image_ref.is_empty() {
            return None;
        }
        let path = self.images_dir.join(&product.image_ref);
        match tokio::fs::try_exists(&path).await {
            Ok(true) => Some(path),
            Ok(false) => {
                warn!(product_id = product.id, path = %path.display(), "Product image not found");
                None
            }
            Err(e) => {
                warn!(product_id = product.id, path = %path.display(), error = %e, "Could not check product image");
                None
            }
        }
    }

    async fn add_to_cart(&self, turn: &mut Turn<'_>, id: ProductId) -> Result<Ack, ShopError> {
        match add_by_id(self.catalog.as_ref(), turn.session.cart.clone(), id).await {
            Ok((cart, product)) => {
                turn.session.cart = cart;
                debug!(user_id = %turn.sender.user_id, product_id = id, "Product added to cart");
                self.render_product(turn, &product).await;
                Ok(Ack::alert(
                    self.messages.get_with_args("cart-added", &[("name", &product.name)]),
                ))
            }
            Err(ShopError::ProductNotFound(_)) => {
                warn!(user_id = %turn.sender.user_id, product_id = id, "Cannot add unknown product");
                let heading = self.messages.get("product-not-found-menu");
                self.go_main_menu(turn, heading).await;
                Ok(Ack::alert(self.messages.get("product-not-found")))
            }
            Err(e) => Err(e),
        }
    }

    async fn show_cart(&self, turn: &mut Turn<'_>) -> Result<(), ShopError> {
        let summary = CartSummary::resolve(self.catalog.as_ref(), &turn.session.cart).await?;
        self.render(turn, ui_builder::cart_view(&self.messages, &summary))
            .await;
        Ok(())
    }

    async fn edit_line(&self, turn: &mut Turn<'_>, op: LineOp, index: usize) -> Result<Ack, ShopError> {
        let cart = turn.session.cart.clone();
        let edited = match op {
            LineOp::Increment => cart.increment(index),
            LineOp::Decrement => cart.decrement(index),
            LineOp::Remove => cart.remove_line(index),
        };

        match edited {
            Ok(cart) => {
                turn.session.cart = cart;
                self.show_cart(turn).await?;
                Ok(match op {
                    LineOp::Remove => Ack::notice(self.messages.get("cart-item-removed")),
                    LineOp::Increment | LineOp::Decrement => Ack::silent(),
                })
            }
            Err(e @ ShopError::CartIndexOutOfRange { .. }) => {
                debug!(user_id = %turn.sender.user_id, error = %e, "Stale cart line");
                Ok(Ack::alert(self.messages.get("cart-item-missing")))
            }
            Err(e) => Err(e),
        }
    }

    async fn begin_checkout(&self, turn: &mut Turn<'_>) -> Result<Ack, ShopError> {
        if turn.session.cart.is_empty() {
            self.show_cart(turn).await?;
            return Ok(Ack::alert(self.messages.get("checkout-empty-cart")));
        }

        info!(user_id = %turn.sender.user_id, lines = turn.session.cart.len(), "Checkout started");
        let prompt = self.messages.get("checkout-address-prompt");
        self.render(turn, ui_builder::prompt_without_keyboard(prompt))
            .await;
        *turn.checkout = CheckoutState::EnteringAddress;
        turn.set_state(DialogState::EnteringAddress);
        Ok(Ack::silent())
    }

    async fn accept_address(&self, turn: &mut Turn<'_>, text: &str) {
        match validate_address(text) {
            Ok(address) => {
                let prompt = self.messages.get("checkout-contact-prompt");
                self.render(turn, ui_builder::contact_request(prompt, &self.messages))
                    .await;
                *turn.checkout = CheckoutState::EnteringContact { address };
                turn.set_state(DialogState::EnteringContact);
            }
            Err(e) => {
                let key = match e {
                    AddressError::Empty => "checkout-address-empty",
                    AddressError::TooLong => "checkout-address-too-long",
                };
                debug!(user_id = %turn.sender.user_id, error = ?e, "Rejected delivery address");
                self.render(turn, OutboundMessage::text(self.messages.get(key)))
                    .await;
            }
        }
    }

    async fn submit_order(
        &self,
        turn: &mut Turn<'_>,
        contact: &SharedContact,
        contact_message: MessageId,
    ) -> Result<(), ShopError> {
        let pending_address = match &*turn.checkout {
            CheckoutState::EnteringContact { address } => Some(address.clone()),
            CheckoutState::Idle | CheckoutState::EnteringAddress => None,
        };
        let address = match pending_address {
            Some(address) => address,
            None => {
                warn!(user_id = %turn.sender.user_id, "Pending order lost, asking for the address again");
                let prompt = self.messages.get("checkout-restart");
                self.render(turn, ui_builder::prompt_without_keyboard(prompt))
                    .await;
                *turn.checkout = CheckoutState::EnteringAddress;
                turn.set_state(DialogState::EnteringAddress);
                return Ok(());
            }
        };

        if turn.session.cart.is_empty() {
            let notice = self.messages.get("order-cart-empty");
            self.render(turn, ui_builder::prompt_without_keyboard(notice))
                .await;
            let heading = self.messages.get("main-menu");
            self.render(turn, ui_builder::main_menu(&self.messages, &heading))
                .await;
            turn.set_state(DialogState::MainMenu);
            return Ok(());
        }

        let summary = CartSummary::resolve(self.catalog.as_ref(), &turn.session.cart).await?;
        let order = PendingOrder {
            address,
            contact_phone: contact.phone_number.clone(),
            contact_name: contact.full_name(),
        };
        let notification =
            format_order_notification(&self.messages, turn.sender, &order, &summary, Utc::now());

        match self.operator.notify(&notification).await {
            Ok(()) => {
                info!(
                    user_id = %turn.sender.user_id,
                    lines = summary.lines.len(),
                    total = summary.total,
                    "Order placed"
                );
                if let Err(e) = self.channel.delete(turn.sender.chat_id, contact_message).await {
                    debug!(user_id = %turn.sender.user_id, error = %e, "Could not delete contact message");
                }
                let placed = self.messages.get("order-placed");
                self.render(turn, ui_builder::prompt_without_keyboard(placed))
                    .await;
                let heading = self.messages.get("main-menu");
                self.render(turn, ui_builder::main_menu(&self.messages, &heading))
                    .await;
                turn.session.cart = turn.session.cart.clone().clear();
                *turn.checkout = CheckoutState::Idle;
                turn.set_state(DialogState::MainMenu);
            }
            Err(e) => {
                error!(user_id = %turn.sender.user_id, error = %e, "Failed to notify operator about order");
                let failed = self.messages.get("order-failed");
                self.render(turn, ui_builder::contact_request(failed, &self.messages))
                    .await;
            }
        }
        Ok(())
    }

    /// Forwards a help request and returns the user to the main menu
    /// whatever the outcome.
    async fn forward_help(&self, turn: &mut Turn<'_>, notification: &str, sent_key: &str) {
        let reply = match self.operator.notify(notification).await {
            Ok(()) => {
                info!(user_id = %turn.sender.user_id, "Help request forwarded");
                self.messages.get(sent_key)
            }
            Err(ShopError::MissingOperatorConfig) => {
                warn!(user_id = %turn.sender.user_id, "Help request dropped: no operator configured");
                self.messages.get("help-no-operator")
            }
            Err(e) => {
                error!(user_id = %turn.sender.user_id, error = %e, "Failed to forward help request");
                self.messages.get("help-send-failed")
            }
        };

        self.render(turn, ui_builder::prompt_without_keyboard(reply))
            .await;
        let heading = self.messages.get("main-menu");
        self.render(turn, ui_builder::main_menu(&self.messages, &heading))
            .await;
        turn.set_state(DialogState::MainMenu);
    }

    async fn render(&self, turn: &mut Turn<'_>, message: OutboundMessage) {
        let prior = turn.prior.take();
        present(self.channel.as_ref(), turn.sender.chat_id, prior, &message).await;
    }

    async fn answer(&self, callback_id: &str, ack: Ack) {
        if let Err(e) = self
            .channel
            .answer_callback(callback_id, ack.text.as_deref(), ack.alert)
            .await
        {
            debug!(callback_id = %callback_id, error = %e, "Could not answer callback query");
        }
    }
}

impl std::fmt::Debug for Storefront {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Storefront")
            .field("images_dir", &self.images_dir)
            .finish_non_exhaustive()
    }
}
