//! Inline keyboard builders for the settings flow.
//!
//! Every button carries an opaque action tag in its callback data; the
//! tags are matched in `callback.rs`.

use std::collections::BTreeSet;

use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup};

use notibox_scheduler::{format_offset, Weekday};

pub fn yes_no_keyboard() -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![vec![
        InlineKeyboardButton::callback("Yes", "notif_yes"),
        InlineKeyboardButton::callback("No, thanks", "notif_no"),
    ]])
}

pub fn actions_keyboard() -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![vec![
        InlineKeyboardButton::callback("📝 Change", "notif_change"),
        InlineKeyboardButton::callback("🔕 Disable", "notif_disable"),
    ]])
}

/// Whole-hour offsets, GMT-12 through GMT+14, four per row.
pub fn timezone_keyboard() -> InlineKeyboardMarkup {
    let mut rows = Vec::new();
    let mut row = Vec::new();
    for hours in -12i32..=14 {
        row.push(InlineKeyboardButton::callback(
            format_offset(hours * 3600),
            format!("tz_{hours}"),
        ));
        if row.len() == 4 {
            rows.push(std::mem::take(&mut row));
        }
    }
    if !row.is_empty() {
        rows.push(row);
    }
    InlineKeyboardMarkup::new(rows)
}

/// Delivery times 07:00–22:00 on the hour, four per row.
pub fn time_keyboard() -> InlineKeyboardMarkup {
    let mut rows = Vec::new();
    let mut row = Vec::new();
    for hour in 7u8..=22 {
        let label = format!("{hour:02}:00");
        row.push(InlineKeyboardButton::callback(
            label.clone(),
            format!("time_{label}"),
        ));
        if row.len() == 4 {
            rows.push(std::mem::take(&mut row));
        }
    }
    if !row.is_empty() {
        rows.push(row);
    }
    InlineKeyboardMarkup::new(rows)
}

/// Toggle multi-select over the week, one day per row, plus a Done row.
pub fn days_keyboard(selected: &BTreeSet<Weekday>) -> InlineKeyboardMarkup {
    let mut rows: Vec<Vec<InlineKeyboardButton>> = Weekday::ALL
        .iter()
        .map(|day| {
            let prefix = if selected.contains(day) { "✅" } else { "☐" };
            vec![InlineKeyboardButton::callback(
                format!("{prefix} {}", day.label()),
                format!("day_{}", day.tag()),
            )]
        })
        .collect();
    rows.push(vec![InlineKeyboardButton::callback("✅ Done", "days_done")]);
    InlineKeyboardMarkup::new(rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels(kb: &InlineKeyboardMarkup) -> Vec<String> {
        kb.inline_keyboard
            .iter()
            .flatten()
            .map(|b| b.text.clone())
            .collect()
    }

    #[test]
    fn timezone_keyboard_covers_full_range() {
        let kb = timezone_keyboard();
        let labels = labels(&kb);
        assert_eq!(labels.len(), 27);
        assert_eq!(labels.first().map(String::as_str), Some("GMT-12"));
        assert!(labels.contains(&"UTC".to_string()));
        assert_eq!(labels.last().map(String::as_str), Some("GMT+14"));
    }

    #[test]
    fn time_keyboard_is_hourly_07_to_22() {
        let labels = labels(&time_keyboard());
        assert_eq!(labels.len(), 16);
        assert_eq!(labels.first().map(String::as_str), Some("07:00"));
        assert_eq!(labels.last().map(String::as_str), Some("22:00"));
    }

    #[test]
    fn days_keyboard_marks_selection() {
        let selected: BTreeSet<Weekday> = [Weekday::Mon, Weekday::Sun].into_iter().collect();
        let labels = labels(&days_keyboard(&selected));
        assert!(labels.contains(&"✅ Mon".to_string()));
        assert!(labels.contains(&"☐ Tue".to_string()));
        assert!(labels.contains(&"✅ Sun".to_string()));
        assert_eq!(labels.last().map(String::as_str), Some("✅ Done"));
    }
}
