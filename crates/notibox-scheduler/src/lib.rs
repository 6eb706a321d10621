//! `notibox-scheduler`: per-user weekly notification timers.
//!
//! # Overview
//!
//! The [`scheduler::NotificationScheduler`] owns one tokio task per user
//! with notifications enabled. On [`start`](scheduler::NotificationScheduler::start)
//! it bulk-loads enabled schedules from the store and arms a recurring
//! weekly timer for each; the settings flow replaces a user's timer through
//! [`update_schedule`](scheduler::NotificationScheduler::update_schedule)
//! (cancel-then-rearm, never mutate in place). Each fire invokes the
//! [`Deliver`](scheduler::Deliver) callback; delivery failures are logged
//! and the timer keeps running.
//!
//! [`clock`] holds the pure time helpers: `HH:MM` parsing, weekday tags
//! (1=Mon … 7=Sun) and local ↔ reference (UTC) conversion for whole-hour
//! offsets.

pub mod clock;
pub mod error;
pub mod occurrence;
pub mod scheduler;

pub use clock::{
    format_offset, join_days, local_to_reference, parse_days, reference_to_local, TimeOfDay,
    Weekday,
};
pub use error::{Result, SchedulerError};
pub use scheduler::{Deliver, NotificationScheduler, ScheduleChange};
