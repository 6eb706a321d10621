use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::Utc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use notibox_store::Store;

use crate::clock::{parse_days, TimeOfDay, Weekday};
use crate::error::{Result, SchedulerError};
use crate::occurrence::next_occurrence;

/// Delivery seam invoked on every fired occurrence.
///
/// Implementations must never block the timer context indefinitely;
/// outbound calls carry their own timeouts. A returned error is logged by
/// the scheduler and the timer stays armed.
#[async_trait]
pub trait Deliver: Send + Sync {
    async fn deliver(
        &self,
        user_id: i64,
    ) -> std::result::Result<(), Box<dyn std::error::Error + Send + Sync>>;
}

/// Requested timer state for one user. Enabling carries the time and day
/// set by construction, so "enabled without a time" cannot be expressed.
#[derive(Debug, Clone)]
pub enum ScheduleChange {
    Enabled {
        /// Reference-time (UTC) hour:minute.
        time: TimeOfDay,
        /// Non-empty weekday set; an empty set is rejected.
        days: Vec<Weekday>,
    },
    Disabled,
}

struct TimerTable {
    running: bool,
    /// user_id → timer task. At most one entry per user; the handle is
    /// owned here exclusively and never leaves the scheduler.
    armed: HashMap<i64, JoinHandle<()>>,
}

/// Owns one recurring weekly timer per enabled user.
///
/// Timers are plain tokio tasks cancelled via `JoinHandle::abort`, so a
/// slow delivery for one user never delays another user's fire. All table
/// mutations happen under one mutex; the cancel-then-rearm sequence in
/// [`update_schedule`](Self::update_schedule) is atomic to observers.
pub struct NotificationScheduler {
    store: Store,
    delivery: Arc<dyn Deliver>,
    timers: Mutex<TimerTable>,
}

impl NotificationScheduler {
    pub fn new(store: Store, delivery: Arc<dyn Deliver>) -> Self {
        Self {
            store,
            delivery,
            timers: Mutex::new(TimerTable {
                running: false,
                armed: HashMap::new(),
            }),
        }
    }

    /// Load every enabled schedule from the store and arm a timer for each.
    ///
    /// A row with a malformed time or an empty day set is logged and
    /// skipped; the remaining users still load. Returns the armed count.
    pub fn start(&self) -> Result<usize> {
        let rows = self.store.list_enabled()?;

        let mut table = self.timers.lock().unwrap();
        if table.running {
            warn!("scheduler start() called while already running");
            return Ok(table.armed.len());
        }
        table.running = true;

        for row in rows {
            let time: TimeOfDay = match row.time.parse() {
                Ok(t) => t,
                Err(e) => {
                    error!(user_id = row.user_id, "skipping user, bad schedule: {e}");
                    continue;
                }
            };
            let days = parse_days(&row.days);
            if days.is_empty() {
                error!(user_id = row.user_id, "skipping user, empty day set");
                continue;
            }
            let handle = self.spawn_timer(row.user_id, time, days);
            table.armed.insert(row.user_id, handle);
        }

        info!(count = table.armed.len(), "notification timers armed");
        Ok(table.armed.len())
    }

    /// Replace a user's timer with the requested state.
    ///
    /// The existing timer (if any) is cancelled unconditionally before the
    /// new state is applied; no duplicate timer can ever exist for a user,
    /// and no stale timer survives an update. Does not touch the store;
    /// the caller persists within the same logical commit.
    pub fn update_schedule(&self, user_id: i64, change: ScheduleChange) -> Result<()> {
        // Reject bad input before mutating any timer state.
        if let ScheduleChange::Enabled { days, .. } = &change {
            if days.is_empty() {
                return Err(SchedulerError::InvalidSchedule {
                    user_id,
                    reason: "enabled schedule with empty day set".to_string(),
                });
            }
        }

        let mut table = self.timers.lock().unwrap();
        if let Some(handle) = table.armed.remove(&user_id) {
            handle.abort();
            debug!(user_id, "existing timer cancelled");
        }

        if let ScheduleChange::Enabled { time, days } = change {
            if !table.running {
                // Armed timers only exist while running; the next start()
                // rebuilds from the store.
                debug!(user_id, "scheduler stopped, timer not armed");
                return Ok(());
            }
            let handle = self.spawn_timer(user_id, time, days);
            table.armed.insert(user_id, handle);
            info!(user_id, time = %time, "timer armed");
        } else {
            info!(user_id, "timer disarmed");
        }
        Ok(())
    }

    /// Cancel all armed timers and stop. Idempotent.
    pub fn shutdown(&self) {
        let mut table = self.timers.lock().unwrap();
        if !table.running && table.armed.is_empty() {
            return;
        }
        for (_, handle) in table.armed.drain() {
            handle.abort();
        }
        table.running = false;
        info!("notification scheduler stopped");
    }

    pub fn is_armed(&self, user_id: i64) -> bool {
        self.timers.lock().unwrap().armed.contains_key(&user_id)
    }

    pub fn armed_count(&self) -> usize {
        self.timers.lock().unwrap().armed.len()
    }

    // --- private helpers ---------------------------------------------------

    /// Spawn the per-user timer task: sleep until the next occurrence, fire,
    /// repeat. The next occurrence is computed from the previous fire
    /// instant, which keeps the weekly cadence drift-free and duplicate-free.
    fn spawn_timer(&self, user_id: i64, time: TimeOfDay, days: Vec<Weekday>) -> JoinHandle<()> {
        let delivery = Arc::clone(&self.delivery);
        tokio::spawn(async move {
            let mut after = Utc::now();
            loop {
                let Some(next) = next_occurrence(after, time, &days) else {
                    return;
                };
                let wait = (next - Utc::now()).to_std().unwrap_or_default();
                tokio::time::sleep(wait).await;

                debug!(user_id, "notification occurrence fired");
                if let Err(e) = delivery.deliver(user_id).await {
                    // Failed deliveries still fire again next time.
                    warn!(user_id, error = %e, "notification delivery failed");
                }
                after = next;
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    struct NoopDeliver;

    #[async_trait]
    impl Deliver for NoopDeliver {
        async fn deliver(
            &self,
            _user_id: i64,
        ) -> std::result::Result<(), Box<dyn std::error::Error + Send + Sync>> {
            Ok(())
        }
    }

    struct CountingDeliver {
        fires: AtomicUsize,
        fail: bool,
    }

    #[async_trait]
    impl Deliver for CountingDeliver {
        async fn deliver(
            &self,
            _user_id: i64,
        ) -> std::result::Result<(), Box<dyn std::error::Error + Send + Sync>> {
            self.fires.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                Err("simulated api error".into())
            } else {
                Ok(())
            }
        }
    }

    fn mem_store() -> Store {
        Store::new(rusqlite::Connection::open_in_memory().unwrap()).unwrap()
    }

    fn running_scheduler(delivery: Arc<dyn Deliver>) -> NotificationScheduler {
        let scheduler = NotificationScheduler::new(mem_store(), delivery);
        scheduler.start().unwrap();
        scheduler
    }

    fn enabled(time: &str, days: &[Weekday]) -> ScheduleChange {
        ScheduleChange::Enabled {
            time: time.parse().unwrap(),
            days: days.to_vec(),
        }
    }

    #[tokio::test]
    async fn double_enable_leaves_one_timer() {
        let scheduler = running_scheduler(Arc::new(NoopDeliver));
        scheduler
            .update_schedule(1, enabled("09:00", &[Weekday::Mon]))
            .unwrap();
        scheduler
            .update_schedule(1, enabled("18:00", &[Weekday::Fri]))
            .unwrap();
        assert_eq!(scheduler.armed_count(), 1);
        assert!(scheduler.is_armed(1));
    }

    #[tokio::test]
    async fn disable_after_enable_disarms() {
        let scheduler = running_scheduler(Arc::new(NoopDeliver));
        scheduler
            .update_schedule(1, enabled("09:00", &[Weekday::Mon]))
            .unwrap();
        scheduler.update_schedule(1, ScheduleChange::Disabled).unwrap();
        assert_eq!(scheduler.armed_count(), 0);
    }

    #[tokio::test]
    async fn disable_when_never_armed_is_a_noop() {
        let scheduler = running_scheduler(Arc::new(NoopDeliver));
        scheduler
            .update_schedule(99, ScheduleChange::Disabled)
            .unwrap();
        assert_eq!(scheduler.armed_count(), 0);
    }

    #[tokio::test]
    async fn empty_day_set_rejected_before_mutation() {
        let scheduler = running_scheduler(Arc::new(NoopDeliver));
        scheduler
            .update_schedule(1, enabled("09:00", &[Weekday::Mon]))
            .unwrap();

        let err = scheduler.update_schedule(
            1,
            ScheduleChange::Enabled {
                time: "10:00".parse().unwrap(),
                days: Vec::new(),
            },
        );
        assert!(matches!(
            err,
            Err(SchedulerError::InvalidSchedule { user_id: 1, .. })
        ));
        // The previously armed timer survived the rejected update.
        assert!(scheduler.is_armed(1));
    }

    #[tokio::test]
    async fn start_skips_malformed_rows() {
        let store = mem_store();
        store
            .upsert_schedule(1, true, Some("09:00"), Some("1,2,3"), None)
            .unwrap();
        store
            .upsert_schedule(2, true, Some("9h30"), Some("1"), None)
            .unwrap(); // malformed time
        store
            .upsert_schedule(3, true, Some("21:15"), Some("6,7"), None)
            .unwrap();
        store.upsert_schedule(4, false, None, None, None).unwrap();

        let scheduler = NotificationScheduler::new(store, Arc::new(NoopDeliver));
        let armed = scheduler.start().unwrap();
        assert_eq!(armed, 2);
        assert!(scheduler.is_armed(1));
        assert!(!scheduler.is_armed(2));
        assert!(scheduler.is_armed(3));
        assert!(!scheduler.is_armed(4));
    }

    #[tokio::test]
    async fn update_while_stopped_arms_nothing() {
        let scheduler = NotificationScheduler::new(mem_store(), Arc::new(NoopDeliver));
        scheduler
            .update_schedule(1, enabled("09:00", &[Weekday::Mon]))
            .unwrap();
        assert_eq!(scheduler.armed_count(), 0);
    }

    #[tokio::test]
    async fn shutdown_is_idempotent() {
        let scheduler = running_scheduler(Arc::new(NoopDeliver));
        scheduler
            .update_schedule(1, enabled("09:00", &[Weekday::Mon]))
            .unwrap();
        scheduler.shutdown();
        assert_eq!(scheduler.armed_count(), 0);
        scheduler.shutdown();
        scheduler.shutdown();
    }

    #[tokio::test(start_paused = true)]
    async fn occurrences_fire_on_the_paused_clock() {
        let delivery = Arc::new(CountingDeliver {
            fires: AtomicUsize::new(0),
            fail: false,
        });
        let scheduler = running_scheduler(delivery.clone());
        scheduler
            .update_schedule(1, enabled("12:00", &Weekday::ALL))
            .unwrap();

        // Auto-advance walks through several daily occurrences.
        tokio::time::sleep(Duration::from_secs(5 * 24 * 3600)).await;
        assert!(delivery.fires.load(Ordering::SeqCst) >= 2);
        assert!(scheduler.is_armed(1));
    }

    #[tokio::test(start_paused = true)]
    async fn reset_sequence_disarms_and_stops_fires() {
        let delivery = Arc::new(CountingDeliver {
            fires: AtomicUsize::new(0),
            fail: false,
        });
        let store = mem_store();
        let scheduler = NotificationScheduler::new(store.clone(), delivery.clone());
        scheduler.start().unwrap();
        scheduler
            .update_schedule(1, enabled("12:00", &Weekday::ALL))
            .unwrap();

        // The account-reset sequence: disarm first, then drop the row.
        scheduler.update_schedule(1, ScheduleChange::Disabled).unwrap();
        store.reset_user(1).unwrap();

        tokio::time::sleep(Duration::from_secs(3 * 24 * 3600)).await;
        assert!(!scheduler.is_armed(1));
        assert_eq!(delivery.fires.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn failed_delivery_keeps_firing() {
        let delivery = Arc::new(CountingDeliver {
            fires: AtomicUsize::new(0),
            fail: true,
        });
        let scheduler = running_scheduler(delivery.clone());
        scheduler
            .update_schedule(1, enabled("12:00", &Weekday::ALL))
            .unwrap();

        tokio::time::sleep(Duration::from_secs(5 * 24 * 3600)).await;
        // Every failure was swallowed; the trigger fired again regardless.
        assert!(delivery.fires.load(Ordering::SeqCst) >= 2);
        assert!(scheduler.is_armed(1));
    }
}
