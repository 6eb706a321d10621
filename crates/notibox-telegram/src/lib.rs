//! `notibox-telegram`: the Telegram transport adapter.
//!
//! Wraps a teloxide `Bot` + `Dispatcher` over long polling. Inbound text
//! drives setup and note capture; inline-keyboard callbacks drive the
//! notification settings flow; [`notify::InboxDelivery`] is the outbound
//! side invoked by the scheduler on each fired occurrence.

pub mod adapter;
pub mod callback;
pub mod context;
pub mod flow;
pub mod handler;
pub mod keyboards;
pub mod notify;
pub mod text;

pub use adapter::TelegramAdapter;
pub use context::AppContext;
pub use notify::InboxDelivery;
