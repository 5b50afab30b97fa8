use chrono::{DateTime, Utc};

/// Current time as unix milliseconds. All persisted timestamps use this unit.
pub fn unix_ms_now() -> i64 {
    Utc::now().timestamp_millis()
}

/// Human-readable UTC timestamp for admin-facing output.
pub fn format_unix_ms(ms: i64) -> String {
    match DateTime::<Utc>::from_timestamp_millis(ms) {
        Some(dt) => dt.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
        None => "unknown".to_string(),
    }
}

/// Relative age text ("3 days ago") for the console listing.
pub fn time_ago_text(ms: i64, now_ms: i64) -> String {
    let diff = now_ms.saturating_sub(ms);
    let minutes = diff / 60_000;
    let hours = diff / 3_600_000;
    let days = diff / 86_400_000;

    if days > 0 {
        return format!("{days} days ago");
    }
    if hours > 0 {
        return format!("{hours} hours ago");
    }
    if minutes > 0 {
        return format!("{minutes} minutes ago");
    }
    "just now".to_string()
}
