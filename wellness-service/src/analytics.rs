//! User-scoped analytics over stored history.
//!
//! These return storage failures as errors; deciding whether to degrade to a
//! default is left to the caller.
use chrono::{Local, Utc};
use mongodb::bson::DateTime;
use wellness_utils::{
    analytics::{MoodAnalytics, TimeRange, mood_analytics},
    insights::{
        ActivityImpact, Insight, TimeOfDaySlot, activity_correlation, insights,
        mood_by_time_of_day,
    },
    misc::days_before,
    streak::{StreakStats, streak_stats},
    trend::{MoodTrend, mood_trend},
    video::{VideoAnalytics, video_analytics},
};

use crate::{auth::AuthContext, config::AppState, db, error::Error};

fn range_start(range: TimeRange) -> Option<DateTime> {
    range.since(Utc::now()).map(DateTime::from_chrono)
}

/// Streak of `auth`, with days taken in server-local time
#[tracing::instrument(skip_all, fields(username = %auth.username), err(Debug))]
pub async fn compute_streak(state: &AppState, auth: &AuthContext) -> Result<StreakStats, Error> {
    let timestamps = db::activity_timestamps(&state.db, auth).await?;
    let today = Local::now().date_naive();

    let stats = streak_stats(
        timestamps.into_iter().map(|t| t.to_chrono()),
        &Local,
        today,
    );
    tracing::debug!(current = stats.current, longest = stats.longest, "computed streak");
    Ok(stats)
}

/// Trend over the last `window_days`; a window too large to represent is unbounded
#[tracing::instrument(skip_all, fields(username = %auth.username), err(Debug))]
pub async fn compute_mood_trend(
    state: &AppState,
    auth: &AuthContext,
    window_days: i64,
) -> Result<MoodTrend, Error> {
    let since = days_before(Utc::now(), window_days).map(DateTime::from_chrono);
    let entries = db::mood_entries(&state.db, auth, since).await?;

    Ok(mood_trend(&entries, &state.scale, &state.thresholds))
}

#[tracing::instrument(skip_all, fields(username = %auth.username, ?range), err(Debug))]
pub async fn compute_mood_analytics(
    state: &AppState,
    auth: &AuthContext,
    range: TimeRange,
) -> Result<MoodAnalytics, Error> {
    let entries = db::mood_entries(&state.db, auth, range_start(range)).await?;

    Ok(mood_analytics(&entries, &Local, &state.thresholds))
}

#[tracing::instrument(skip_all, fields(username = %auth.username, ?range), err(Debug))]
pub async fn compute_mood_by_time(
    state: &AppState,
    auth: &AuthContext,
    range: TimeRange,
) -> Result<Vec<TimeOfDaySlot>, Error> {
    let entries = db::mood_entries(&state.db, auth, range_start(range)).await?;

    Ok(mood_by_time_of_day(&entries, &Local))
}

#[tracing::instrument(skip_all, fields(username = %auth.username, ?range), err(Debug))]
pub async fn compute_activity_correlation(
    state: &AppState,
    auth: &AuthContext,
    range: TimeRange,
) -> Result<Vec<ActivityImpact>, Error> {
    let since = range_start(range);
    let (entries, events) = tokio::try_join!(
        db::mood_entries(&state.db, auth, since),
        db::activity_events(&state.db, auth, since),
    )?;

    Ok(activity_correlation(&entries, &events, &Local))
}

#[tracing::instrument(skip_all, fields(username = %auth.username, ?range), err(Debug))]
pub async fn compute_insights(
    state: &AppState,
    auth: &AuthContext,
    range: TimeRange,
) -> Result<Vec<Insight>, Error> {
    let since = range_start(range);
    let (entries, events) = tokio::try_join!(
        db::mood_entries(&state.db, auth, since),
        db::activity_events(&state.db, auth, since),
    )?;

    let analytics = mood_analytics(&entries, &Local, &state.thresholds);
    let slots = mood_by_time_of_day(&entries, &Local);
    let impacts = activity_correlation(&entries, &events, &Local);
    Ok(insights(&analytics, &slots, &impacts, &state.scale))
}

#[tracing::instrument(skip_all, fields(username = %auth.username), err(Debug))]
pub async fn compute_video_analytics(
    state: &AppState,
    auth: &AuthContext,
) -> Result<VideoAnalytics, Error> {
    let history = db::video_interactions(&state.db, auth).await?;

    let mut ids: Vec<_> = history.iter().map(|i| i.video_id).collect();
    ids.sort();
    ids.dedup();
    let videos = db::videos_by_ids(&state.db, &ids).await?;

    let today = Local::now().date_naive();
    Ok(video_analytics(&history, &videos, &Local, today))
}
