//! Pure time helpers: time-of-day, weekday tags and timezone conversion.
//!
//! Offsets are signed seconds, whole hours only (no fractional-hour zones),
//! magnitude within [-12h, +14h]. The persisted time-of-day is always
//! reference time (UTC); offsets exist for display and input conversion.

use std::fmt;
use std::str::FromStr;

/// Hour:minute wall-clock time without a date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct TimeOfDay {
    pub hour: u8,
    pub minute: u8,
}

impl TimeOfDay {
    pub fn new(hour: u8, minute: u8) -> Option<Self> {
        (hour <= 23 && minute <= 59).then_some(Self { hour, minute })
    }
}

impl fmt::Display for TimeOfDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour, self.minute)
    }
}

impl FromStr for TimeOfDay {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let (h, m) = s
            .split_once(':')
            .ok_or_else(|| format!("expected HH:MM, got '{s}'"))?;
        let hour: u8 = h.parse().map_err(|_| format!("bad hour in '{s}'"))?;
        let minute: u8 = m.parse().map_err(|_| format!("bad minute in '{s}'"))?;
        TimeOfDay::new(hour, minute).ok_or_else(|| format!("time out of range: '{s}'"))
    }
}

/// Weekday with the 1=Mon … 7=Sun tag numbering used in persisted day sets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Weekday {
    Mon,
    Tue,
    Wed,
    Thu,
    Fri,
    Sat,
    Sun,
}

impl Weekday {
    pub const ALL: [Weekday; 7] = [
        Weekday::Mon,
        Weekday::Tue,
        Weekday::Wed,
        Weekday::Thu,
        Weekday::Fri,
        Weekday::Sat,
        Weekday::Sun,
    ];

    /// Persisted tag, 1–7.
    pub fn tag(self) -> u8 {
        self as u8 + 1
    }

    /// Total mapping from a persisted tag. Tags outside 1–7 have no weekday.
    pub fn from_tag(tag: u8) -> Option<Self> {
        match tag {
            1 => Some(Weekday::Mon),
            2 => Some(Weekday::Tue),
            3 => Some(Weekday::Wed),
            4 => Some(Weekday::Thu),
            5 => Some(Weekday::Fri),
            6 => Some(Weekday::Sat),
            7 => Some(Weekday::Sun),
            _ => None,
        }
    }

    /// Days since Monday, 0–6, matches chrono's `num_days_from_monday`.
    pub fn num_from_monday(self) -> u32 {
        self as u32
    }

    pub fn label(self) -> &'static str {
        match self {
            Weekday::Mon => "Mon",
            Weekday::Tue => "Tue",
            Weekday::Wed => "Wed",
            Weekday::Thu => "Thu",
            Weekday::Fri => "Fri",
            Weekday::Sat => "Sat",
            Weekday::Sun => "Sun",
        }
    }
}

impl fmt::Display for Weekday {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Parse a comma-joined tag list ("1,2,5") into weekdays, tag order.
/// Unrecognized tags are skipped, not errors.
pub fn parse_days(days: &str) -> Vec<Weekday> {
    days.split(',')
        .filter_map(|part| part.trim().parse::<u8>().ok())
        .filter_map(Weekday::from_tag)
        .collect()
}

/// Join weekdays back into the persisted comma-joined tag form.
pub fn join_days(days: &[Weekday]) -> String {
    days.iter()
        .map(|d| d.tag().to_string())
        .collect::<Vec<_>>()
        .join(",")
}

/// Convert a local wall-clock time to reference (UTC) time by subtracting
/// the whole-hour offset, wrapping modulo 24. The date component is
/// deliberately untracked; only hour:minute matters for a weekly trigger.
pub fn local_to_reference(local: TimeOfDay, offset_secs: i32) -> TimeOfDay {
    shift_hours(local, -(offset_secs / 3600))
}

/// Inverse of [`local_to_reference`].
pub fn reference_to_local(reference: TimeOfDay, offset_secs: i32) -> TimeOfDay {
    shift_hours(reference, offset_secs / 3600)
}

fn shift_hours(t: TimeOfDay, delta_hours: i32) -> TimeOfDay {
    let hour = (t.hour as i32 + delta_hours).rem_euclid(24) as u8;
    TimeOfDay {
        hour,
        minute: t.minute,
    }
}

/// Render an offset for display: "UTC", "GMT+3", "GMT-5".
pub fn format_offset(offset_secs: i32) -> String {
    match offset_secs / 3600 {
        0 => "UTC".to_string(),
        hours => format!("GMT{hours:+}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(hour: u8, minute: u8) -> TimeOfDay {
        TimeOfDay::new(hour, minute).unwrap()
    }

    #[test]
    fn parse_and_display_time() {
        assert_eq!("09:05".parse::<TimeOfDay>().unwrap(), t(9, 5));
        assert_eq!(t(9, 5).to_string(), "09:05");
        assert!("24:00".parse::<TimeOfDay>().is_err());
        assert!("12:60".parse::<TimeOfDay>().is_err());
        assert!("noon".parse::<TimeOfDay>().is_err());
        assert!("12".parse::<TimeOfDay>().is_err());
    }

    #[test]
    fn local_to_reference_wraps_backwards() {
        // local 02:00 at GMT+3 → reference 23:00 (previous day, untracked)
        assert_eq!(local_to_reference(t(2, 0), 10800), t(23, 0));
    }

    #[test]
    fn local_to_reference_wraps_forwards() {
        // local 22:00 at GMT-5 → reference 03:00
        assert_eq!(local_to_reference(t(22, 0), -18000), t(3, 0));
    }

    #[test]
    fn zero_offset_is_identity() {
        for hour in 0..24 {
            let time = t(hour, 30);
            assert_eq!(local_to_reference(time, 0), time);
            assert_eq!(reference_to_local(time, 0), time);
        }
    }

    #[test]
    fn round_trip_all_whole_hour_offsets() {
        for offset_hours in -12..=14 {
            let offset = offset_hours * 3600;
            for hour in 0..24 {
                let time = t(hour, 15);
                assert_eq!(
                    reference_to_local(local_to_reference(time, offset), offset),
                    time,
                    "offset {offset_hours}h, hour {hour}"
                );
            }
        }
    }

    #[test]
    fn offset_formatting() {
        assert_eq!(format_offset(0), "UTC");
        assert_eq!(format_offset(10800), "GMT+3");
        assert_eq!(format_offset(-18000), "GMT-5");
        assert_eq!(format_offset(14 * 3600), "GMT+14");
    }

    #[test]
    fn day_tags_round_trip() {
        for day in Weekday::ALL {
            assert_eq!(Weekday::from_tag(day.tag()), Some(day));
        }
        assert_eq!(Weekday::from_tag(0), None);
        assert_eq!(Weekday::from_tag(8), None);
    }

    #[test]
    fn parse_days_skips_unknown_tags() {
        assert_eq!(
            parse_days("1,2,9,5,x"),
            vec![Weekday::Mon, Weekday::Tue, Weekday::Fri]
        );
        assert_eq!(parse_days(""), Vec::<Weekday>::new());
    }

    #[test]
    fn join_days_is_tag_order_of_input() {
        assert_eq!(
            join_days(&[Weekday::Mon, Weekday::Wed, Weekday::Sun]),
            "1,3,7"
        );
    }
}
