//! `notibox-notion`: REST client for the Notion boundary.
//!
//! Four operations are consumed by the rest of the system: validate a
//! token, resolve a target page (URL or name), append a to-do item, and
//! list items with their checked state. Tokens are passed per call; the
//! client itself is shared across all users.

pub mod client;
pub mod error;
pub mod page;

pub use client::{NotionClient, TodoItem};
pub use error::{NotionError, Result};
