use std::time::Duration;

/// Longest message accepted for submission, in characters.
pub const MAX_MESSAGE_LENGTH: usize = 1600;

/// Most recipients a single campaign may target.
pub const MAX_RECIPIENTS: usize = 300;

/// Campaign history is capped at this many entries, newest first.
pub const MAX_CAMPAIGNS: usize = 100;

pub const DEFAULT_RETENTION_DAYS: i64 = 90;

pub const DEFAULT_DAILY_STATS_DAYS: usize = 30;

pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

pub const DEFAULT_ENDPOINT_URL: &str = "http://localhost:5000/send_sms";

pub const DEFAULT_CURRENCY: &str = "KES";

pub const DEFAULT_COUNTRY_CODE: &str = "233";

pub const DEFAULT_LEADING_DIGITS: &str = "2-5";

pub const DEFAULT_SUBSCRIBER_DIGITS: usize = 8;

pub fn default_progress_interval() -> Duration {
    Duration::from_millis(800)
}
