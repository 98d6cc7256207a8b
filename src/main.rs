use anyhow::{Context, Result};
use sqlx::postgres::PgPool;
use std::sync::Arc;
use teloxide::dispatching::dialogue::InMemStorage;
use teloxide::prelude::*;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use petshop_bot::bot::{
    callback_handler, message_handler, Storefront, TelegramChannel, TelegramOperator,
};
use petshop_bot::catalog::{default_products, CatalogStore, InMemoryCatalog};
use petshop_bot::config::BotConfig;
use petshop_bot::db::{self, PgStore};
use petshop_bot::dialogue::CheckoutState;
use petshop_bot::localization::Messages;
use petshop_bot::session::{InMemorySessionStore, SessionStore};

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let json = std::env::var("LOG_FORMAT").is_ok_and(|v| v.eq_ignore_ascii_case("json"));

    if json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenv::dotenv().ok();

    init_tracing();

    info!("Starting Pet Shop Telegram Bot");

    let config = BotConfig::from_env().context("Invalid configuration")?;
    if config.operator_chat_id.is_none() {
        warn!("ADMIN_ID is not set, orders and help requests cannot be delivered");
    }

    let (catalog, sessions): (Arc<dyn CatalogStore>, Arc<dyn SessionStore>) =
        match &config.database_url {
            Some(database_url) => {
                info!("Connecting to database");
                let pool = PgPool::connect(database_url)
                    .await
                    .context("Failed to connect to database")?;
                db::init_database_schema(&pool).await?;

                let store = Arc::new(PgStore::new(pool));
                let catalog: Arc<dyn CatalogStore> = store.clone();
                let sessions: Arc<dyn SessionStore> = store;
                (catalog, sessions)
            }
            None => {
                warn!("DATABASE_URL is not set, using in-memory storage with the default catalog");
                let catalog: Arc<dyn CatalogStore> =
                    Arc::new(InMemoryCatalog::new(default_products()));
                let sessions: Arc<dyn SessionStore> = Arc::new(InMemorySessionStore::default());
                (catalog, sessions)
            }
        };

    let bot = Bot::new(&config.bot_token);
    let storefront = Arc::new(Storefront::new(
        catalog,
        sessions,
        Arc::new(TelegramChannel::new(bot.clone())),
        Arc::new(TelegramOperator::new(bot.clone(), config.operator_chat_id)),
        Messages::new()?,
        config.images_dir.clone(),
    ));

    info!(images_dir = %config.images_dir.display(), "Bot initialized, starting dispatcher");

    let handler = dptree::entry()
        .branch(
            Update::filter_message()
                .enter_dialogue::<Message, InMemStorage<CheckoutState>, CheckoutState>()
                .endpoint(message_handler),
        )
        .branch(
            Update::filter_callback_query()
                .enter_dialogue::<CallbackQuery, InMemStorage<CheckoutState>, CheckoutState>()
                .endpoint(callback_handler),
        );

    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![InMemStorage::<CheckoutState>::new(), storefront])
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;

    Ok(())
}
