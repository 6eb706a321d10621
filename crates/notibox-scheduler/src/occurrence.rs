//! Next-occurrence computation for weekly recurring triggers.

use chrono::{DateTime, Datelike, Duration, TimeZone, Utc};

use crate::clock::{TimeOfDay, Weekday};

/// Compute the next UTC instant strictly after `from` that falls on one of
/// `days` at `time` (reference time).
///
/// Returns `None` only for an empty day set. Feeding each fire instant back
/// in as the next `from` gives a drift-free weekly recurrence with no
/// duplicate fires.
pub fn next_occurrence(
    from: DateTime<Utc>,
    time: TimeOfDay,
    days: &[Weekday],
) -> Option<DateTime<Utc>> {
    days.iter()
        .filter_map(|&day| candidate_for(from, time, day))
        .min()
}

/// Next strictly-after instant on a single weekday.
fn candidate_for(from: DateTime<Utc>, time: TimeOfDay, day: Weekday) -> Option<DateTime<Utc>> {
    let today = from.weekday().num_days_from_monday() as i64;
    let target = day.num_from_monday() as i64;
    let days_ahead = (target - today).rem_euclid(7);

    let date = from + Duration::days(days_ahead);
    let candidate = Utc
        .with_ymd_and_hms(
            date.year(),
            date.month(),
            date.day(),
            time.hour as u32,
            time.minute as u32,
            0,
        )
        .single()?;

    if candidate > from {
        Some(candidate)
    } else {
        // The time on the target weekday has already passed; push 7 days.
        Some(candidate + Duration::days(7))
    }
}
