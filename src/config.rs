//! # Bot Configuration Module
//!
//! Startup configuration read from the environment (optionally through a
//! `.env` file). Only a missing bot token is fatal.

use std::env;
use std::path::PathBuf;
use teloxide::types::ChatId;

use crate::errors::ShopError;

pub const TOKEN_VAR: &str = "TELEGRAM_BOT_TOKEN";
pub const LEGACY_TOKEN_VAR: &str = "BOT_TOKEN";
pub const OPERATOR_VAR: &str = "ADMIN_ID";
pub const DATABASE_VAR: &str = "DATABASE_URL";
pub const IMAGES_DIR_VAR: &str = "IMAGES_DIR";
pub const DEFAULT_IMAGES_DIR: &str = "/app/images";

/// Configuration structure for the bot process
#[derive(Debug, Clone)]
pub struct BotConfig {
    /// Telegram bot token
    pub bot_token: String,
    /// Postgres connection string; in-memory stores are used when absent
    pub database_url: Option<String>,
    /// Chat receiving orders and help requests
    pub operator_chat_id: Option<ChatId>,
    /// Directory holding product images
    pub images_dir: PathBuf,
}

impl BotConfig {
    pub fn from_env() -> Result<Self, ShopError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ShopError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let bot_token = get(TOKEN_VAR).or_else(|| get(LEGACY_TOKEN_VAR)).ok_or_else(|| {
            ShopError::Configuration(format!("{TOKEN_VAR} (or {LEGACY_TOKEN_VAR}) must be set"))
        })?;

        let operator_chat_id = match get(OPERATOR_VAR) {
            Some(raw) => Some(ChatId(raw.parse::<i64>().map_err(|e| {
                ShopError::Configuration(format!("{OPERATOR_VAR} must be a numeric chat id: {e}"))
            })?)),
            None => None,
        };

        Ok(Self {
            bot_token,
            database_url: get(DATABASE_VAR),
            operator_chat_id,
            images_dir: get(IMAGES_DIR_VAR)
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_IMAGES_DIR)),
        })
    }
}
