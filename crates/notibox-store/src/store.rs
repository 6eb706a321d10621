use std::sync::{Arc, Mutex};

use chrono::Utc;
use rusqlite::{Connection, OptionalExtension};
use tracing::info;

use crate::db::init_db;
use crate::error::Result;
use crate::types::{Credentials, EnabledSchedule, NotificationSettings, UserConfig};

/// Shared handle over the users table.
///
/// Wraps its `Connection` in a mutex so the dispatcher path and the timer
/// tasks can both read and write. Cloning shares the same connection.
#[derive(Clone)]
pub struct Store {
    conn: Arc<Mutex<Connection>>,
}

impl Store {
    pub fn new(conn: Connection) -> Result<Self> {
        init_db(&conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    // --- credentials ------------------------------------------------------

    pub fn user_config(&self, user_id: i64) -> Result<Option<UserConfig>> {
        let conn = self.conn.lock().unwrap();
        let row = conn
            .query_row(
                "SELECT notion_token, page_id, page_name FROM users WHERE user_id = ?1",
                [user_id],
                |row| {
                    Ok(UserConfig {
                        notion_token: row.get(0)?,
                        page_id: row.get(1)?,
                        page_name: row.get(2)?,
                    })
                },
            )
            .optional()?;
        Ok(row)
    }

    /// Token + page, or `None` unless both setup steps have completed.
    pub fn credentials(&self, user_id: i64) -> Result<Option<Credentials>> {
        let config = self.user_config(user_id)?;
        Ok(config.and_then(|c| {
            match (c.notion_token, c.page_id) {
                (Some(notion_token), Some(page_id)) => Some(Credentials {
                    notion_token,
                    page_id,
                    page_name: c.page_name.unwrap_or_else(|| "Untitled".to_string()),
                }),
                _ => None,
            }
        }))
    }

    pub fn save_token(&self, user_id: i64, token: &str) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        let now = Utc::now().to_rfc3339();
        conn.execute(
            "INSERT INTO users (user_id, notion_token, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?3)
             ON CONFLICT(user_id) DO UPDATE SET
                 notion_token = excluded.notion_token,
                 updated_at   = excluded.updated_at",
            rusqlite::params![user_id, token, now],
        )?;
        info!(user_id, "notion token saved");
        Ok(())
    }

    pub fn save_page(&self, user_id: i64, page_id: &str, page_name: &str) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        let now = Utc::now().to_rfc3339();
        conn.execute(
            "INSERT INTO users (user_id, page_id, page_name, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?4)
             ON CONFLICT(user_id) DO UPDATE SET
                 page_id    = excluded.page_id,
                 page_name  = excluded.page_name,
                 updated_at = excluded.updated_at",
            rusqlite::params![user_id, page_id, page_name, now],
        )?;
        info!(user_id, page_id, "target page saved");
        Ok(())
    }

    /// Drop the user's row entirely: credentials, page and schedule.
    pub fn reset_user(&self, user_id: i64) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute("DELETE FROM users WHERE user_id = ?1", [user_id])?;
        info!(user_id, "user configuration reset");
        Ok(())
    }

    // --- notification schedule --------------------------------------------

    pub fn notification_settings(&self, user_id: i64) -> Result<Option<NotificationSettings>> {
        let conn = self.conn.lock().unwrap();
        let row = conn
            .query_row(
                "SELECT notification_enabled, notification_time, notification_days,
                        timezone_offset
                 FROM users WHERE user_id = ?1",
                [user_id],
                |row| {
                    Ok(NotificationSettings {
                        enabled: row.get::<_, i64>(0)? != 0,
                        time: row.get(1)?,
                        days: row.get(2)?,
                        timezone_offset: row.get(3)?,
                    })
                },
            )
            .optional()?;
        Ok(row)
    }

    /// Full replace of the enabled/time/days triple.
    ///
    /// The timezone offset is preserved when `timezone_offset` is `None`,
    /// so a disable (or a settings pass that skipped the timezone step)
    /// never loses it. Creates the row when absent; disabling a user who
    /// never enabled anything still succeeds.
    pub fn upsert_schedule(
        &self,
        user_id: i64,
        enabled: bool,
        time: Option<&str>,
        days: Option<&str>,
        timezone_offset: Option<i32>,
    ) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        let now = Utc::now().to_rfc3339();
        conn.execute(
            "INSERT INTO users (user_id, notification_enabled, notification_time,
                                notification_days, timezone_offset, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)
             ON CONFLICT(user_id) DO UPDATE SET
                 notification_enabled = excluded.notification_enabled,
                 notification_time    = excluded.notification_time,
                 notification_days    = excluded.notification_days,
                 timezone_offset      = COALESCE(excluded.timezone_offset, users.timezone_offset),
                 updated_at           = excluded.updated_at",
            rusqlite::params![user_id, enabled as i64, time, days, timezone_offset, now],
        )?;
        info!(user_id, enabled, "notification schedule saved");
        Ok(())
    }

    /// All users with notifications enabled and a time set. Order is
    /// irrelevant; the scheduler arms one timer per row.
    pub fn list_enabled(&self) -> Result<Vec<EnabledSchedule>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT user_id, notification_time, notification_days
             FROM users
             WHERE notification_enabled = 1 AND notification_time IS NOT NULL",
        )?;
        let rows = stmt
            .query_map([], |row| {
                Ok(EnabledSchedule {
                    user_id: row.get(0)?,
                    time: row.get(1)?,
                    days: row.get::<_, Option<String>>(2)?.unwrap_or_default(),
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    // --- version tracking -------------------------------------------------

    pub fn user_version(&self, user_id: i64) -> Result<String> {
        let conn = self.conn.lock().unwrap();
        let version = conn
            .query_row(
                "SELECT last_seen_version FROM users WHERE user_id = ?1",
                [user_id],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(version.unwrap_or_else(|| "0.0.0".to_string()))
    }

    pub fn set_user_version(&self, user_id: i64, version: &str) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        let now = Utc::now().to_rfc3339();
        conn.execute(
            "INSERT INTO users (user_id, last_seen_version, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?3)
             ON CONFLICT(user_id) DO UPDATE SET
                 last_seen_version = excluded.last_seen_version,
                 updated_at        = excluded.updated_at",
            rusqlite::params![user_id, version, now],
        )?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mem_store() -> Store {
        Store::new(Connection::open_in_memory().unwrap()).unwrap()
    }

    #[test]
    fn credentials_absent_until_both_steps() {
        let store = mem_store();
        assert!(store.credentials(1).unwrap().is_none());

        store.save_token(1, "secret_abc").unwrap();
        assert!(store.credentials(1).unwrap().is_none());

        store.save_page(1, "page-1", "Inbox").unwrap();
        let creds = store.credentials(1).unwrap().unwrap();
        assert_eq!(creds.notion_token, "secret_abc");
        assert_eq!(creds.page_id, "page-1");
        assert_eq!(creds.page_name, "Inbox");
    }

    #[test]
    fn upsert_schedule_full_replace() {
        let store = mem_store();
        store
            .upsert_schedule(7, true, Some("09:00"), Some("1,2,3,4,5"), Some(10800))
            .unwrap();
        let s = store.notification_settings(7).unwrap().unwrap();
        assert!(s.enabled);
        assert_eq!(s.time.as_deref(), Some("09:00"));
        assert_eq!(s.days.as_deref(), Some("1,2,3,4,5"));
        assert_eq!(s.timezone_offset, Some(10800));

        store
            .upsert_schedule(7, true, Some("18:30"), Some("6,7"), None)
            .unwrap();
        let s = store.notification_settings(7).unwrap().unwrap();
        assert_eq!(s.time.as_deref(), Some("18:30"));
        assert_eq!(s.days.as_deref(), Some("6,7"));
        // offset preserved across a write that omitted it
        assert_eq!(s.timezone_offset, Some(10800));
    }

    #[test]
    fn disable_without_prior_row_succeeds() {
        let store = mem_store();
        store.upsert_schedule(42, false, None, None, None).unwrap();
        let s = store.notification_settings(42).unwrap().unwrap();
        assert!(!s.enabled);
        assert!(s.time.is_none());
        assert!(s.days.is_none());
    }

    #[test]
    fn disable_clears_time_and_days_keeps_offset() {
        let store = mem_store();
        store
            .upsert_schedule(3, true, Some("08:00"), Some("1"), Some(-18000))
            .unwrap();
        store.upsert_schedule(3, false, None, None, None).unwrap();
        let s = store.notification_settings(3).unwrap().unwrap();
        assert!(!s.enabled);
        assert!(s.time.is_none());
        assert_eq!(s.timezone_offset, Some(-18000));
    }

    #[test]
    fn list_enabled_skips_disabled_and_timeless() {
        let store = mem_store();
        store
            .upsert_schedule(1, true, Some("09:00"), Some("1,2"), None)
            .unwrap();
        store.upsert_schedule(2, false, None, None, None).unwrap();
        store
            .upsert_schedule(3, true, Some("21:00"), Some("7"), None)
            .unwrap();

        let mut ids: Vec<i64> = store
            .list_enabled()
            .unwrap()
            .iter()
            .map(|e| e.user_id)
            .collect();
        ids.sort_unstable();
        assert_eq!(ids, vec![1, 3]);
    }

    #[test]
    fn version_defaults_and_roundtrips() {
        let store = mem_store();
        assert_eq!(store.user_version(9).unwrap(), "0.0.0");
        store.set_user_version(9, "1.1.0").unwrap();
        assert_eq!(store.user_version(9).unwrap(), "1.1.0");
    }

    #[test]
    fn reset_removes_everything() {
        let store = mem_store();
        store.save_token(5, "secret_x").unwrap();
        store
            .upsert_schedule(5, true, Some("10:00"), Some("3"), Some(0))
            .unwrap();
        store.reset_user(5).unwrap();
        assert!(store.user_config(5).unwrap().is_none());
        assert!(store.notification_settings(5).unwrap().is_none());
    }
}
