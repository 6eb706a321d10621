use rusqlite::Connection;

use crate::error::Result;

/// Initialise the users schema in `conn`. Safe to call on every startup
/// (idempotent).
///
/// Notification time and days are stored as text exactly as committed by
/// the settings flow (`HH:MM` and comma-joined day tags); the scheduler
/// parses them at arm time so one malformed row degrades to a logged skip.
pub fn init_db(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS users (
            user_id              INTEGER NOT NULL PRIMARY KEY,
            notion_token         TEXT,
            page_id              TEXT,
            page_name            TEXT,
            notification_enabled INTEGER NOT NULL DEFAULT 0,
            notification_time    TEXT,               -- reference-time 'HH:MM' or NULL
            notification_days    TEXT,               -- comma-joined tags '1,2,3' or NULL
            timezone_offset      INTEGER,            -- signed seconds; NULL = not chosen
            last_seen_version    TEXT    NOT NULL DEFAULT '0.0.0',
            created_at           TEXT    NOT NULL,
            updated_at           TEXT    NOT NULL
        ) STRICT;

        CREATE INDEX IF NOT EXISTS idx_users_notify
            ON users (notification_enabled);
        ",
    )?;
    Ok(())
}
