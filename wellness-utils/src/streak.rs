use std::collections::BTreeSet;

use chrono::{DateTime, Datelike, Days, NaiveDate, TimeZone, Utc};
use serde::Serialize;

/// Engagement streak for one user.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StreakStats {
    /// Consecutive active days ending today or yesterday
    pub current: u32,
    /// Longest run of consecutive active days in the whole history
    pub longest: u32,
    /// Distinct days with at least one event
    pub active_days: u32,
    /// Latest active day not after today
    pub last_active_day: Option<NaiveDate>,
    /// Active days in the seven days ending today
    pub this_week: u32,
    /// Active days in the current calendar month
    pub this_month: u32,
}

/// Calendar days (in `tz`) that contain at least one of `timestamps`.
pub fn active_days<Tz, I>(timestamps: I, tz: &Tz) -> BTreeSet<NaiveDate>
where
    Tz: TimeZone,
    I: IntoIterator<Item = DateTime<Utc>>,
{
    timestamps
        .into_iter()
        .map(|t| t.with_timezone(tz).date_naive())
        .collect()
}

/// Counts consecutive days backwards from the most recent active day.
///
/// Returns 0 unless the most recent active day (ignoring days after `today`)
/// is `today` or the day before.
pub fn current_streak(days: &BTreeSet<NaiveDate>, today: NaiveDate) -> u32 {
    let mut recent_first = days.range(..=today).rev();

    let Some(&latest) = recent_first.next() else {
        return 0;
    };
    let yesterday = today.checked_sub_days(Days::new(1));
    if latest != today && Some(latest) != yesterday {
        return 0;
    }

    let mut streak = 1;
    let mut previous = latest;
    for &day in recent_first {
        if previous.checked_sub_days(Days::new(1)) != Some(day) {
            break;
        }
        streak += 1;
        previous = day;
    }
    streak
}

pub fn longest_streak(days: &BTreeSet<NaiveDate>) -> u32 {
    let mut longest = 0;
    let mut run = 0;
    let mut previous: Option<NaiveDate> = None;

    for &day in days {
        run = match previous.and_then(|p| p.checked_add_days(Days::new(1))) {
            Some(next) if next == day => run + 1,
            _ => 1,
        };
        longest = longest.max(run);
        previous = Some(day);
    }
    longest
}

pub fn streak_stats<Tz, I>(timestamps: I, tz: &Tz, today: NaiveDate) -> StreakStats
where
    Tz: TimeZone,
    I: IntoIterator<Item = DateTime<Utc>>,
{
    let days = active_days(timestamps, tz);
    let week_start = today.checked_sub_days(Days::new(6)).unwrap_or(NaiveDate::MIN);
    let month_start = today.with_day(1).unwrap_or(today);

    StreakStats {
        current: current_streak(&days, today),
        longest: longest_streak(&days),
        active_days: days.len() as u32,
        last_active_day: days.range(..=today).next_back().copied(),
        this_week: days.range(week_start..=today).count() as u32,
        this_month: days.range(month_start..=today).count() as u32,
    }
}
