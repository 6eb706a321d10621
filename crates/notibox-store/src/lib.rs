//! `notibox-store`: SQLite persistence for per-user state.
//!
//! One `users` row per Telegram user holds the Notion credentials, the
//! target page, and the notification schedule. Every write autocommits,
//! so persisted state is durable before the call returns.

pub mod db;
pub mod error;
pub mod store;
pub mod types;

pub use error::{Result, StoreError};
pub use store::Store;
pub use types::{Credentials, EnabledSchedule, NotificationSettings, UserConfig};
