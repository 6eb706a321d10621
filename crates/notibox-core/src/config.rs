use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

/// Page size used when listing items from a Notion page.
pub const LIST_PAGE_SIZE: usize = 20;

/// Top-level config (notibox.toml + `NOTIBOX_` env overrides, sections
/// separated by a double underscore, e.g. `NOTIBOX_TELEGRAM__BOT_TOKEN`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotiboxConfig {
    pub telegram: TelegramConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub notion: NotionConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelegramConfig {
    pub bot_token: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_db_path")]
    pub path: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotionConfig {
    #[serde(default = "default_notion_base_url")]
    pub base_url: String,
    /// Per-request timeout; a stuck Notion call must not starve the
    /// timer context.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl Default for NotionConfig {
    fn default() -> Self {
        Self {
            base_url: default_notion_base_url(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

fn default_db_path() -> String {
    let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
    format!("{}/.notibox/notibox.db", home)
}

fn default_notion_base_url() -> String {
    "https://api.notion.com".to_string()
}

fn default_request_timeout_secs() -> u64 {
    15
}

impl NotiboxConfig {
    /// Load config from a TOML file with `NOTIBOX_` env var overrides.
    /// The env separator is a double underscore so field names that
    /// themselves contain an underscore stay addressable
    /// (`NOTIBOX_TELEGRAM__BOT_TOKEN` → `telegram.bot_token`).
    ///
    /// Checks in order:
    ///   1. Explicit path argument
    ///   2. ~/.notibox/notibox.toml
    pub fn load(config_path: Option<&str>) -> crate::error::Result<Self> {
        let path = config_path
            .map(String::from)
            .unwrap_or_else(default_config_path);

        let config: NotiboxConfig = Figment::new()
            .merge(Toml::file(&path))
            .merge(Env::prefixed("NOTIBOX_").split("__"))
            .extract()
            .map_err(|e| crate::error::NotiboxError::Config(e.to_string()))?;

        Ok(config)
    }
}

fn default_config_path() -> String {
    let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
    format!("{}/.notibox/notibox.toml", home)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_override_reaches_nested_fields() {
        figment::Jail::expect_with(|jail| {
            jail.create_file(
                "notibox.toml",
                r#"
                [telegram]
                bot_token = "from-file"
                "#,
            )?;
            jail.set_env("NOTIBOX_TELEGRAM__BOT_TOKEN", "from-env");

            let config = NotiboxConfig::load(Some("notibox.toml")).unwrap();
            assert_eq!(config.telegram.bot_token, "from-env");
            Ok(())
        });
    }

    #[test]
    fn file_values_and_defaults() {
        figment::Jail::expect_with(|jail| {
            jail.create_file(
                "notibox.toml",
                r#"
                [telegram]
                bot_token = "123:abc"
                "#,
            )?;

            let config = NotiboxConfig::load(Some("notibox.toml")).unwrap();
            assert_eq!(config.telegram.bot_token, "123:abc");
            assert_eq!(config.notion.base_url, "https://api.notion.com");
            assert_eq!(config.notion.request_timeout_secs, 15);
            Ok(())
        });
    }
}
