//! Long-polling dispatcher wiring.

use std::sync::Arc;

use teloxide::prelude::*;
use tracing::info;

use crate::callback;
use crate::context::AppContext;
use crate::handler;

pub struct TelegramAdapter {
    bot: Bot,
    ctx: Arc<AppContext>,
}

impl TelegramAdapter {
    pub fn new(bot: Bot, ctx: Arc<AppContext>) -> Self {
        Self { bot, ctx }
    }

    /// Runs the long-polling loop until the process is stopped.
    pub async fn run(self) {
        info!("starting telegram dispatcher");

        let tree = dptree::entry()
            .branch(Update::filter_message().endpoint(handler::handle_message))
            .branch(Update::filter_callback_query().endpoint(callback::handle_callback));

        Dispatcher::builder(self.bot, tree)
            .dependencies(dptree::deps![self.ctx])
            .default_handler(|_| async {})
            .enable_ctrlc_handler()
            .build()
            .dispatch()
            .await;
    }
}
