//! notibox: Telegram note relay into Notion with scheduled inbox
//! reminders.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use dashmap::DashMap;
use rusqlite::Connection;
use teloxide::Bot;
use tracing::info;
use tracing_subscriber::EnvFilter;

use notibox_core::config::NotiboxConfig;
use notibox_core::version::VERSION;
use notibox_notion::NotionClient;
use notibox_scheduler::NotificationScheduler;
use notibox_store::Store;
use notibox_telegram::{AppContext, InboxDelivery, TelegramAdapter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("notibox=info")),
        )
        .init();

    let config_path = std::env::var("NOTIBOX_CONFIG").ok();
    let config = NotiboxConfig::load(config_path.as_deref()).context("loading config")?;

    info!(version = VERSION, "starting notibox");

    if let Some(parent) = std::path::Path::new(&config.database.path).parent() {
        std::fs::create_dir_all(parent).context("creating database directory")?;
    }
    let store = open_store(&config.database.path).context("opening database")?;
    // Separate connection for the delivery path so a long-running summary
    // fetch never blocks the dispatcher's store.
    let delivery_store = open_store(&config.database.path).context("opening database")?;

    let notion = Arc::new(NotionClient::new(
        &config.notion.base_url,
        Duration::from_secs(config.notion.request_timeout_secs),
    )?);

    let bot = Bot::new(&config.telegram.bot_token);

    let delivery = Arc::new(InboxDelivery::new(
        bot.clone(),
        delivery_store,
        Arc::clone(&notion),
    ));
    let scheduler = Arc::new(NotificationScheduler::new(store.clone(), delivery));
    let armed = scheduler.start().context("arming notification timers")?;
    info!(armed, "notification timers armed");

    let ctx = Arc::new(AppContext {
        store,
        notion,
        scheduler: Arc::clone(&scheduler),
        flows: DashMap::new(),
    });

    TelegramAdapter::new(bot, ctx).run().await;

    scheduler.shutdown();
    info!("notibox stopped");
    Ok(())
}

fn open_store(path: &str) -> anyhow::Result<Store> {
    let conn = Connection::open(path)?;
    conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")?;
    Ok(Store::new(conn)?)
}
