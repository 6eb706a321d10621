/// Everything stored for a user, credentials and page included.
/// Fields are optional because rows are created as soon as the first
/// setup step completes.
#[derive(Debug, Clone)]
pub struct UserConfig {
    pub notion_token: Option<String>,
    pub page_id: Option<String>,
    pub page_name: Option<String>,
}

/// Token + target page, present only when setup finished both steps.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub notion_token: String,
    pub page_id: String,
    pub page_name: String,
}

/// A user's notification schedule as persisted.
#[derive(Debug, Clone)]
pub struct NotificationSettings {
    pub enabled: bool,
    /// Reference-time (UTC) "HH:MM"; set when enabled.
    pub time: Option<String>,
    /// Comma-joined weekday tags, 1=Mon … 7=Sun; set when enabled.
    pub days: Option<String>,
    /// Signed seconds east of UTC; None until the user picks one.
    pub timezone_offset: Option<i32>,
}

/// One enabled row as returned by the bulk load at scheduler start.
#[derive(Debug, Clone)]
pub struct EnabledSchedule {
    pub user_id: i64,
    pub time: String,
    pub days: String,
}
