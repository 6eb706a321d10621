//! `notibox-core`: shared configuration, errors and version metadata.

pub mod config;
pub mod error;
pub mod version;

pub use config::NotiboxConfig;
pub use error::{NotiboxError, Result};
