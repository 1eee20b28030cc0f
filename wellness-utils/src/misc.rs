use chrono::{DateTime, TimeDelta, Utc};

/// Human readable distance from `then` to `now`, e.g. "3 hours ago".
///
/// Anything 30 days or older is shown as a date.
pub fn relative_time(then: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let elapsed = now - then;

    let minutes = elapsed.num_minutes();
    let hours = elapsed.num_hours();
    let days = elapsed.num_days();

    if minutes < 1 {
        "just now".to_string()
    } else if hours < 1 {
        plural(minutes, "minute")
    } else if days < 1 {
        plural(hours, "hour")
    } else if days < 30 {
        plural(days, "day")
    } else {
        then.format("%Y-%m-%d").to_string()
    }
}

fn plural(n: i64, unit: &str) -> String {
    if n == 1 {
        format!("1 {unit} ago")
    } else {
        format!("{n} {unit}s ago")
    }
}

/// Clamps an optional page size into `1..=max`
pub fn clamp_limit(limit: Option<i64>, default: i64, max: i64) -> i64 {
    limit.unwrap_or(default).clamp(1, max)
}

/// `now` minus `days`, or `None` when that falls outside the representable range
pub fn days_before(now: DateTime<Utc>, days: i64) -> Option<DateTime<Utc>> {
    TimeDelta::try_days(days).and_then(|window| now.checked_sub_signed(window))
}
