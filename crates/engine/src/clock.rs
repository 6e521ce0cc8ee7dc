use std::sync::OnceLock;

use time::macros::format_description;
use time::{OffsetDateTime, UtcOffset};

static LOCAL_OFFSET: OnceLock<UtcOffset> = OnceLock::new();

/// Read the local UTC offset and pin it for all later timestamps. Call while
/// the process is still single-threaded: on Unix the offset cannot be read
/// once other threads exist. Falls back to UTC when it cannot be read.
pub fn capture_local_offset() -> UtcOffset {
    *LOCAL_OFFSET.get_or_init(|| UtcOffset::current_local_offset().unwrap_or(UtcOffset::UTC))
}

/// Local wall-clock time: the pinned offset when captured, otherwise a
/// best-effort lookup falling back to UTC.
fn now() -> OffsetDateTime {
    match LOCAL_OFFSET.get() {
        Some(offset) => OffsetDateTime::now_utc().to_offset(*offset),
        None => OffsetDateTime::now_local().unwrap_or_else(|_| OffsetDateTime::now_utc()),
    }
}

/// `HH:MM:SS`, the French locale time display.
pub fn time_of_day() -> String {
    let fmt = format_description!("[hour]:[minute]:[second]");
    now().format(&fmt).unwrap_or_default()
}

/// `HH:MM`, used in the startup log line.
pub fn hour_minute() -> String {
    let fmt = format_description!("[hour]:[minute]");
    now().format(&fmt).unwrap_or_default()
}
