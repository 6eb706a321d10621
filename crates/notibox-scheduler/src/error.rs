use thiserror::Error;

/// Errors from the scheduling subsystem.
#[derive(Debug, Error)]
pub enum SchedulerError {
    /// Bulk load from the schedule store failed.
    #[error("Store error: {0}")]
    Store(#[from] notibox_store::StoreError),

    /// An enabled schedule arrived without a usable time or day set.
    /// Programming error on the caller's side; rejected before any timer
    /// state is touched.
    #[error("Invalid schedule for user {user_id}: {reason}")]
    InvalidSchedule { user_id: i64, reason: String },
}

pub type Result<T> = std::result::Result<T, SchedulerError>;
