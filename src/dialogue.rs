//! Checkout dialogue module: the per-conversation state of an order that is
//! being filled in. It lives in the dialogue storage only, never in the
//! durable session.

use serde::{Deserialize, Serialize};
use teloxide::dispatching::dialogue::{Dialogue, InMemStorage};

pub const MAX_ADDRESS_LEN: usize = 512;

/// Progress of the order being assembled in this conversation
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum CheckoutState {
    #[default]
    Idle,
    EnteringAddress,
    EnteringContact {
        address: String,
    },
}

/// A checkout with every field filled in, ready to be submitted
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingOrder {
    pub address: String,
    pub contact_phone: String,
    pub contact_name: String,
}

/// Type alias for our checkout dialogue
pub type CheckoutDialogue = Dialogue<CheckoutState, InMemStorage<CheckoutState>>;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AddressError {
    Empty,
    TooLong,
}

/// Validates a delivery address input
pub fn validate_address(address: &str) -> Result<String, AddressError> {
    let trimmed = address.trim();

    if trimmed.is_empty() {
        return Err(AddressError::Empty);
    }

    if trimmed.chars().count() > MAX_ADDRESS_LEN {
        return Err(AddressError::TooLong);
    }

    Ok(trimmed.to_string())
}
