//! User-facing message text and formatting helpers.

use notibox_notion::TodoItem;
use notibox_scheduler::Weekday;

pub const EMPTY_INBOX: &str = "🎉 Your inbox is empty. Nice work!";

pub const NOT_CONFIGURED: &str = "⚠️ The bot is not set up yet. Use /start to begin.";

pub const SETUP_INTRO: &str = "👋 Hi! I save your notes to a Notion inbox page.\n\n\
    To get started you need to:\n\
    1. Connect your Notion account\n\
    2. Pick the page notes go to\n\n\
    📝 Send me your Notion Integration Token.\n\n\
    How to get one:\n\
    1. Open https://www.notion.so/my-integrations\n\
    2. Create a new integration\n\
    3. Copy the Internal Integration Token\n\
    4. Send it here\n\n\
    Or send /cancel to stop.";

pub const TOKEN_SAVED: &str = "✅ Token saved!\n\n\
    Now tell me which page notes should go to.\n\n\
    You can send:\n\
    • A link to the page (URL)\n\
    • Or the page name (if it's in your workspace)\n\n\
    Or send /cancel to stop.";

pub const HELP: &str = "📖 How to use this bot:\n\n\
    Commands:\n\
    • /start - Set up the bot\n\
    • /list - Show the latest 20 notes\n\
    • /notifications - Configure inbox reminders\n\
    • /reset - Clear the current configuration\n\
    • /help - Show this help\n\n\
    Usage:\n\
    Once set up, just send me messages and they are appended to your \
    Notion inbox page.";

/// Summary sent on each fired occurrence. Items keep their page order,
/// each prefixed with the unchecked glyph.
pub fn format_summary(items: &[String]) -> String {
    if items.is_empty() {
        return EMPTY_INBOX.to_string();
    }
    let mut lines = vec![format!("📬 Unsorted inbox ({} tasks):\n", items.len())];
    for item in items {
        lines.push(format!("☐ {item}"));
    }
    lines.push("\n💡 Use /list to see all notes".to_string());
    lines.join("\n")
}

/// The /list rendering: ☑ done, ☐ open, • plain paragraph.
pub fn format_list(items: &[TodoItem]) -> String {
    if items.is_empty() {
        return "📭 No notes yet".to_string();
    }
    let mut lines = vec![format!("📋 Your latest notes ({}):\n", items.len())];
    for item in items {
        let glyph = match item.checked {
            Some(true) => "☑",
            Some(false) => "☐",
            None => "•",
        };
        lines.push(format!("{glyph} {}", item.text));
    }
    lines.join("\n")
}

/// Day set for display, always in tag-numeric order regardless of
/// selection order.
pub fn format_days(days: &[Weekday]) -> String {
    if days.is_empty() {
        return "None".to_string();
    }
    let mut sorted = days.to_vec();
    sorted.sort_by_key(|d| d.tag());
    sorted
        .iter()
        .map(|d| d.label())
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_inbox_message() {
        assert_eq!(format_summary(&[]), EMPTY_INBOX);
    }

    #[test]
    fn summary_keeps_order_and_glyphs() {
        let items = vec!["buy milk".to_string(), "call bob".to_string()];
        let msg = format_summary(&items);
        let checklist: Vec<&str> = msg
            .lines()
            .filter(|l| l.starts_with('☐'))
            .collect();
        assert_eq!(checklist, vec!["☐ buy milk", "☐ call bob"]);
        assert!(msg.contains("(2 tasks)"));
        assert!(msg.contains("/list"));
    }

    #[test]
    fn weekday_formatting_is_tag_ordered() {
        use Weekday::*;
        // Selection order Fri-first still renders Mon..Fri.
        assert_eq!(
            format_days(&[Fri, Mon, Wed, Tue, Thu]),
            "Mon, Tue, Wed, Thu, Fri"
        );
        assert_eq!(format_days(&[]), "None");
    }

    #[test]
    fn list_rendering_glyphs() {
        let items = vec![
            TodoItem {
                text: "done thing".into(),
                checked: Some(true),
            },
            TodoItem {
                text: "open thing".into(),
                checked: Some(false),
            },
            TodoItem {
                text: "a paragraph".into(),
                checked: None,
            },
        ];
        let msg = format_list(&items);
        assert!(msg.contains("☑ done thing"));
        assert!(msg.contains("☐ open thing"));
        assert!(msg.contains("• a paragraph"));
    }
}
