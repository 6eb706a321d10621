//! Scheduled inbox-summary delivery, the outbound side of the scheduler.

use std::sync::Arc;

use async_trait::async_trait;
use teloxide::prelude::*;
use tracing::{info, warn};

use notibox_core::config::LIST_PAGE_SIZE;
use notibox_notion::NotionClient;
use notibox_scheduler::Deliver;
use notibox_store::Store;

use crate::text;

/// Fired by the scheduler for each occurrence: fetch the user's unchecked
/// items and send a summary. Fire-and-forget: every failure path logs and
/// leaves the timer untouched; the next occurrence retries naturally.
pub struct InboxDelivery {
    bot: Bot,
    store: Store,
    notion: Arc<NotionClient>,
}

impl InboxDelivery {
    pub fn new(bot: Bot, store: Store, notion: Arc<NotionClient>) -> Self {
        Self { bot, store, notion }
    }
}

#[async_trait]
impl Deliver for InboxDelivery {
    async fn deliver(
        &self,
        user_id: i64,
    ) -> std::result::Result<(), Box<dyn std::error::Error + Send + Sync>> {
        // A user can enable notifications and later /reset their
        // credentials; that is not an error, just nothing to deliver.
        let Some(creds) = self.store.credentials(user_id)? else {
            warn!(user_id, "no notion configuration, notification skipped");
            return Ok(());
        };

        let items = self
            .notion
            .unchecked_items(&creds.notion_token, &creds.page_id, LIST_PAGE_SIZE)
            .await?;

        let message = text::format_summary(&items);
        self.bot.send_message(ChatId(user_id), message).await?;
        info!(user_id, items = items.len(), "notification delivered");
        Ok(())
    }
}
