//! Wall-clock helpers

use chrono::Utc;

/// Current wall-clock time as milliseconds since the Unix epoch
#[must_use]
pub fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}
