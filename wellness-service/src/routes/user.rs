use axum::{
    Json,
    extract::{Query, State},
};
use chrono::{Local, Utc};
use schema::{ActivityEvent, ActivityKind, Video};
use serde::{Deserialize, Serialize};
use tracing::warn;
use wellness_utils::{
    misc::{clamp_limit, relative_time},
    streak::StreakStats,
    trend::MoodTrend,
    video::{VideoAnalytics, video_analytics},
};

use super::{to_utc, videos::VideoView};
use crate::{
    analytics::{compute_mood_trend, compute_streak, compute_video_analytics},
    auth::AuthContext,
    config::AppState,
    db,
    error::Error,
};

const NO_ACTIVITY: &str = "No activity yet";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StreakResponse {
    pub streak: u32,
    pub longest: u32,
    pub active_days: u32,
    pub this_week: u32,
    pub this_month: u32,
    pub unit: &'static str,
}

impl From<StreakStats> for StreakResponse {
    fn from(stats: StreakStats) -> Self {
        StreakResponse {
            streak: stats.current,
            longest: stats.longest,
            active_days: stats.active_days,
            this_week: stats.this_week,
            this_month: stats.this_month,
            unit: "days",
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LastActivityResponse {
    pub last_activity: Option<chrono::DateTime<Utc>>,
    pub relative_time: String,
    pub activity_type: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityView {
    pub activity_type: String,
    pub timestamp: chrono::DateTime<Utc>,
    pub relative_time: String,
}

impl ActivityView {
    fn new(event: ActivityEvent, now: chrono::DateTime<Utc>) -> Self {
        let timestamp = to_utc(event.timestamp);
        ActivityView {
            activity_type: event.activity_type.to_string(),
            timestamp,
            relative_time: relative_time(timestamp, now),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    pub limit: Option<i64>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WatchedVideoView {
    #[serde(flatten)]
    pub video: VideoView,
    pub watched_at: chrono::DateTime<Utc>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub journal_count: u64,
    pub streak: u32,
    pub last_activity: String,
    pub mood_trend: MoodTrend,
}

async fn streak_or_default(state: &AppState, auth: &AuthContext) -> StreakStats {
    compute_streak(state, auth).await.unwrap_or_else(|e| {
        warn!(error = ?e, username = %auth.username, "streak unavailable");
        StreakStats::default()
    })
}

async fn mood_trend_or_default(state: &AppState, auth: &AuthContext) -> MoodTrend {
    compute_mood_trend(state, auth, state.mood_trend_window_days)
        .await
        .unwrap_or_else(|e| {
            warn!(error = ?e, username = %auth.username, "mood trend unavailable");
            MoodTrend::no_data()
        })
}

/// Never fails once the caller is known: storage errors report a zero streak
pub async fn get_streak(State(state): State<AppState>, auth: AuthContext) -> Json<StreakResponse> {
    Json(streak_or_default(&state, &auth).await.into())
}

pub async fn get_last_activity(
    State(state): State<AppState>,
    auth: AuthContext,
) -> Result<Json<LastActivityResponse>, Error> {
    let response = match db::last_activity(&state.db, &auth).await? {
        Some(event) => {
            let timestamp = to_utc(event.timestamp);
            LastActivityResponse {
                last_activity: Some(timestamp),
                relative_time: relative_time(timestamp, Utc::now()),
                activity_type: Some(event.activity_type.to_string()),
            }
        }
        None => LastActivityResponse {
            last_activity: None,
            relative_time: NO_ACTIVITY.to_string(),
            activity_type: None,
        },
    };
    Ok(Json(response))
}

pub async fn get_activity_history(
    State(state): State<AppState>,
    auth: AuthContext,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<Vec<ActivityView>>, Error> {
    let limit = clamp_limit(query.limit, 20, 100);
    let events = db::recent_activity(&state.db, &auth, limit).await?;

    let now = Utc::now();
    Ok(Json(
        events
            .into_iter()
            .map(|event| ActivityView::new(event, now))
            .collect(),
    ))
}

/// Storage errors report an empty watch history
pub async fn get_video_analytics(
    State(state): State<AppState>,
    auth: AuthContext,
) -> Json<VideoAnalytics> {
    let analytics = match compute_video_analytics(&state, &auth).await {
        Ok(analytics) => analytics,
        Err(e) => {
            warn!(error = ?e, username = %auth.username, "video analytics unavailable");
            video_analytics(&[], &[], &Local, Local::now().date_naive())
        }
    };
    Json(analytics)
}

/// Distinct videos the caller viewed, most recent first
pub async fn get_watched_videos(
    State(state): State<AppState>,
    auth: AuthContext,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<Vec<WatchedVideoView>>, Error> {
    let limit = clamp_limit(query.limit, 10, 50);
    let watched = db::recently_watched(&state.db, &auth, limit).await?;

    let ids: Vec<_> = watched.iter().map(|w| w.video_id).collect();
    let videos = db::videos_by_ids(&state.db, &ids).await?;

    Ok(Json(join_watched(watched, videos)))
}

// Keeps the order of `watched`; views of deleted videos are dropped
fn join_watched(watched: Vec<db::WatchedVideo>, videos: Vec<Video>) -> Vec<WatchedVideoView> {
    let mut videos: std::collections::HashMap<_, _> =
        videos.into_iter().map(|v| (v.id, v)).collect();
    watched
        .into_iter()
        .filter_map(|w| {
            videos.remove(&w.video_id).map(|video| WatchedVideoView {
                video: video.into(),
                watched_at: to_utc(w.watched_at),
            })
        })
        .collect()
}

/// Records a dashboard visit after the stats are gathered, so the visit
/// itself does not count towards them.
pub async fn get_dashboard_stats(
    State(state): State<AppState>,
    auth: AuthContext,
) -> Result<Json<DashboardStats>, Error> {
    let (journal_count, last_activity, streak, mood_trend) = tokio::join!(
        db::count_journals(&state.db, &auth),
        db::last_activity(&state.db, &auth),
        streak_or_default(&state, &auth),
        mood_trend_or_default(&state, &auth),
    );

    let last_activity = match last_activity? {
        Some(event) => relative_time(to_utc(event.timestamp), Utc::now()),
        None => NO_ACTIVITY.to_string(),
    };

    let stats = DashboardStats {
        journal_count: journal_count?,
        streak: streak.current,
        last_activity,
        mood_trend,
    };

    state.activity.record(&auth, ActivityKind::DashboardVisit);
    Ok(Json(stats))
}
