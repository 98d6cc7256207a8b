//! Recording fakes for the messaging and operator channels.
#![allow(dead_code)]

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicI32, Ordering};
use std::sync::{Arc, Mutex};
use teloxide::types::{ChatId, MessageId};

use petshop_bot::bot::{
    Event, Inbound, Keyboard, MessagingChannel, OperatorChannel, PriorMessage, Sender,
    SharedContact, Storefront,
};
use petshop_bot::catalog::{Category, InMemoryCatalog, Product};
use petshop_bot::errors::ShopError;
use petshop_bot::localization::Messages;
use petshop_bot::session::InMemorySessionStore;

pub const USER_ID: i64 = 1001;

/// One transport call, in order
#[derive(Debug, Clone, PartialEq)]
pub enum Sent {
    Text {
        id: MessageId,
        text: String,
        keyboard: Keyboard,
    },
    Photo {
        id: MessageId,
        image: PathBuf,
        caption: String,
        keyboard: Keyboard,
    },
    Edit {
        id: MessageId,
        text: String,
        keyboard: Keyboard,
    },
    Delete(MessageId),
    Answer {
        callback_id: String,
        notice: Option<String>,
        alert: bool,
    },
}

#[derive(Debug, Default)]
pub struct RecordingChannel {
    log: Mutex<Vec<Sent>>,
    next_id: AtomicI32,
    pub fail_edits: AtomicBool,
    pub fail_photos: AtomicBool,
    pub fail_deletes: AtomicBool,
}

impl RecordingChannel {
    pub fn new() -> Self {
        Self {
            next_id: AtomicI32::new(100),
            ..Default::default()
        }
    }

    fn record(&self, sent: Sent) {
        self.log.lock().unwrap().push(sent);
    }

    fn allocate(&self) -> MessageId {
        MessageId(self.next_id.fetch_add(1, Ordering::SeqCst))
    }

    pub fn sent(&self) -> Vec<Sent> {
        self.log.lock().unwrap().clone()
    }

    pub fn clear(&self) {
        self.log.lock().unwrap().clear();
    }

    /// Texts of sent messages, edits and photo captions
    pub fn texts(&self) -> Vec<String> {
        self.sent()
            .into_iter()
            .filter_map(|s| match s {
                Sent::Text { text, .. } | Sent::Edit { text, .. } => Some(text),
                Sent::Photo { caption, .. } => Some(caption),
                _ => None,
            })
            .collect()
    }

    pub fn answers(&self) -> Vec<(Option<String>, bool)> {
        self.sent()
            .into_iter()
            .filter_map(|s| match s {
                Sent::Answer { notice, alert, .. } => Some((notice, alert)),
                _ => None,
            })
            .collect()
    }

    /// The message a follow-up button press would originate from
    pub fn last_rendered(&self) -> Option<PriorMessage> {
        self.sent().into_iter().rev().find_map(|s| match s {
            Sent::Text { id, .. } | Sent::Edit { id, .. } => Some(PriorMessage { id, has_image: false }),
            Sent::Photo { id, .. } => Some(PriorMessage { id, has_image: true }),
            _ => None,
        })
    }
}

#[async_trait]
impl MessagingChannel for RecordingChannel {
    async fn send_text(&self, _chat: ChatId, text: &str, keyboard: &Keyboard) -> Result<MessageId, ShopError> {
        let id = self.allocate();
        self.record(Sent::Text {
            id,
            text: text.to_string(),
            keyboard: keyboard.clone(),
        });
        Ok(id)
    }

    async fn send_photo(
        &self,
        _chat: ChatId,
        image: &Path,
        caption: &str,
        keyboard: &Keyboard,
    ) -> Result<MessageId, ShopError> {
        if self.fail_photos.load(Ordering::SeqCst) {
            return Err(ShopError::RenderDeliveryFailure("photo rejected".to_string()));
        }
        let id = self.allocate();
        self.record(Sent::Photo {
            id,
            image: image.to_path_buf(),
            caption: caption.to_string(),
            keyboard: keyboard.clone(),
        });
        Ok(id)
    }

    async fn edit_text(
        &self,
        _chat: ChatId,
        message: MessageId,
        text: &str,
        keyboard: &Keyboard,
    ) -> Result<(), ShopError> {
        if self.fail_edits.load(Ordering::SeqCst) {
            return Err(ShopError::RenderDeliveryFailure("message is not modified".to_string()));
        }
        self.record(Sent::Edit {
            id: message,
            text: text.to_string(),
            keyboard: keyboard.clone(),
        });
        Ok(())
    }

    async fn delete(&self, _chat: ChatId, message: MessageId) -> Result<(), ShopError> {
        if self.fail_deletes.load(Ordering::SeqCst) {
            return Err(ShopError::RenderDeliveryFailure("message can't be deleted".to_string()));
        }
        self.record(Sent::Delete(message));
        Ok(())
    }

    async fn answer_callback(&self, callback_id: &str, notice: Option<&str>, alert: bool) -> Result<(), ShopError> {
        self.record(Sent::Answer {
            callback_id: callback_id.to_string(),
            notice: notice.map(str::to_string),
            alert,
        });
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct RecordingOperator {
    notifications: Mutex<Vec<String>>,
    pub fail: AtomicBool,
    pub missing: AtomicBool,
}

impl RecordingOperator {
    pub fn notifications(&self) -> Vec<String> {
        self.notifications.lock().unwrap().clone()
    }
}

#[async_trait]
impl OperatorChannel for RecordingOperator {
    async fn notify(&self, text: &str) -> Result<(), ShopError> {
        if self.missing.load(Ordering::SeqCst) {
            return Err(ShopError::MissingOperatorConfig);
        }
        if self.fail.load(Ordering::SeqCst) {
            return Err(ShopError::NotificationDeliveryFailure("chat not found".to_string()));
        }
        self.notifications.lock().unwrap().push(text.to_string());
        Ok(())
    }
}

pub fn product(id: i64, name: &str, category: Category, price: i64, image_ref: &str) -> Product {
    Product {
        id,
        name: name.to_string(),
        category,
        subcategory: "test".to_string(),
        price,
        description: format!("{name} description"),
        image_ref: image_ref.to_string(),
    }
}

/// A storefront wired to in-memory stores and recording channels
pub struct Harness {
    pub storefront: Storefront,
    pub channel: Arc<RecordingChannel>,
    pub operator: Arc<RecordingOperator>,
    pub sessions: Arc<InMemorySessionStore>,
    pub messages: Messages,
    pub checkout: petshop_bot::dialogue::CheckoutState,
    callbacks: u32,
}

impl Harness {
    pub fn new(products: Vec<Product>) -> Self {
        Self::with_images_dir(products, PathBuf::from("/nonexistent/images"))
    }

    pub fn with_images_dir(products: Vec<Product>, images_dir: PathBuf) -> Self {
        let channel = Arc::new(RecordingChannel::new());
        let operator = Arc::new(RecordingOperator::default());
        let sessions = Arc::new(InMemorySessionStore::default());
        let storefront = Storefront::new(
            Arc::new(InMemoryCatalog::new(products)),
            sessions.clone(),
            channel.clone(),
            operator.clone(),
            Messages::new().unwrap(),
            images_dir,
        );

        Self {
            storefront,
            channel,
            operator,
            sessions,
            messages: Messages::new().unwrap(),
            checkout: Default::default(),
            callbacks: 0,
        }
    }

    pub fn sender() -> Sender {
        Sender {
            user_id: USER_ID,
            chat_id: ChatId(USER_ID),
            username: Some("buyer".to_string()),
            full_name: "Test Buyer".to_string(),
        }
    }

    async fn dispatch(&mut self, inbound: Inbound) -> anyhow::Result<()> {
        let event = Event {
            sender: Self::sender(),
            inbound,
        };
        self.storefront.handle(event, &mut self.checkout).await
    }

    pub async fn start(&mut self) -> anyhow::Result<()> {
        self.dispatch(Inbound::Start).await
    }

    /// Presses a button on the last rendered message
    pub async fn press(&mut self, token: &str) -> anyhow::Result<()> {
        self.callbacks += 1;
        let origin = self.channel.last_rendered();
        self.dispatch(Inbound::Action {
            callback_id: format!("cb-{}", self.callbacks),
            token: token.to_string(),
            origin,
        })
        .await
    }

    pub async fn type_text(&mut self, text: &str) -> anyhow::Result<()> {
        self.dispatch(Inbound::Text(text.to_string())).await
    }

    pub async fn share_contact(&mut self) -> anyhow::Result<()> {
        self.dispatch(Inbound::Contact {
            contact: SharedContact {
                phone_number: "+15550100".to_string(),
                first_name: "Test".to_string(),
                last_name: Some("Buyer".to_string()),
            },
            message_id: MessageId(7),
        })
        .await
    }
}
