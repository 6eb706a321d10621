//! Bot version and per-version changelog messages.
//!
//! Users store the last version they have seen; on `/start` the bot shows
//! the changelog for anything newer, once.

pub const VERSION: &str = "1.1.0";

/// Parse "major.minor.patch" into a comparable tuple.
/// Missing or non-numeric components count as 0.
fn parse_version(version: &str) -> (u32, u32, u32) {
    let mut parts = version.split('.').map(|p| p.parse::<u32>().unwrap_or(0));
    (
        parts.next().unwrap_or(0),
        parts.next().unwrap_or(0),
        parts.next().unwrap_or(0),
    )
}

/// True when `current` is strictly newer than `seen`.
pub fn is_newer_version(current: &str, seen: &str) -> bool {
    parse_version(current) > parse_version(seen)
}

/// Scheduled notifications shipped in 1.1.0; users coming from anything
/// older get the interactive intro instead of the plain changelog text.
pub fn should_show_notifications_intro(seen: &str) -> bool {
    parse_version(seen) < parse_version("1.1.0")
}

/// Changelog message for a released version, if any.
pub fn changelog_message(version: &str) -> Option<&'static str> {
    match version {
        "1.1.0" => Some(
            "🎉 New in 1.1.0:\n\n\
             📬 Inbox reminders!\n\n\
             I can now send you a summary of unchecked tasks at a time of \
             your choosing. Use /notifications to set it up.",
        ),
        "1.0.0" => Some("👋 Welcome to the Notion inbox bot!"),
        _ => None,
    }
}
