//! Wall clock helpers. All persisted times are epoch milliseconds.

use std::time::Duration;

use chrono::Utc;

/// Current time in milliseconds since the Unix epoch
pub fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

/// `now_ms + duration`, saturating at `i64::MAX`
pub fn millis_after(now_ms: i64, duration: Duration) -> i64 {
    let delta = i64::try_from(duration.as_millis()).unwrap_or(i64::MAX);
    now_ms.saturating_add(delta)
}
