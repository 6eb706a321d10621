//! Interactive flow state for the multi-step conversations.
//!
//! Setup: token entry → page entry. Notification settings:
//! timezone? → time → days → commit. The timezone step runs only when no
//! offset is stored yet; the commit converts the chosen local time to
//! reference time and persists + reschedules in one pass.

use std::collections::BTreeSet;

use notibox_scheduler::{TimeOfDay, Weekday};

/// Day set preselected when the day-picker opens: Mon–Fri.
pub fn default_days() -> BTreeSet<Weekday> {
    [
        Weekday::Mon,
        Weekday::Tue,
        Weekday::Wed,
        Weekday::Thu,
        Weekday::Fri,
    ]
    .into_iter()
    .collect()
}

/// Where a user currently is in a multi-step conversation.
///
/// `chosen_offset` is the timezone picked during *this* pass, `None` when
/// the step was skipped because an offset is already stored; the commit
/// then falls back to the stored one.
#[derive(Debug, Clone)]
pub enum Flow {
    /// Setup: waiting for the Notion integration token.
    AwaitingToken,
    /// Setup: waiting for the target page (URL or name).
    AwaitingPage,
    /// Settings: timezone keyboard is showing.
    ChoosingTimezone,
    /// Settings: time keyboard is showing.
    ChoosingTime { chosen_offset: Option<i32> },
    /// Settings: day multi-select is showing.
    ChoosingDays {
        chosen_offset: Option<i32>,
        local_time: TimeOfDay,
        selected: BTreeSet<Weekday>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_days_are_weekdays() {
        let days = default_days();
        assert_eq!(days.len(), 5);
        assert!(days.contains(&Weekday::Mon));
        assert!(days.contains(&Weekday::Fri));
        assert!(!days.contains(&Weekday::Sat));
        assert!(!days.contains(&Weekday::Sun));
    }
}
