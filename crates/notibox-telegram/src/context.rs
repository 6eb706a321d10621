use std::sync::Arc;

use dashmap::DashMap;

use notibox_notion::NotionClient;
use notibox_scheduler::NotificationScheduler;
use notibox_store::Store;

use crate::flow::Flow;

/// Everything the handlers need, constructed once at process start and
/// passed explicitly, no ambient global lookup.
pub struct AppContext {
    pub store: Store,
    pub notion: Arc<NotionClient>,
    pub scheduler: Arc<NotificationScheduler>,
    /// Per-user interactive flow state. One interaction at a time per chat
    /// (serialized by the transport), distinct from the timer context.
    pub flows: DashMap<i64, Flow>,
}
