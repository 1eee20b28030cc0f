use axum::{
    Json,
    extract::{Query, State},
    http::StatusCode,
};
use chrono::{Local, Utc};
use mongodb::bson::{DateTime, oid::ObjectId};
use schema::{ActivityKind, MoodEntry};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use wellness_utils::{
    analytics::{MoodAnalytics, TimeRange, mood_analytics},
    misc::days_before,
    scale::normalize,
    trend::MoodTrend,
};

use super::to_utc;
use crate::{
    analytics::{compute_mood_analytics, compute_mood_trend},
    auth::AuthContext,
    config::{AppState, MAX_WINDOW_DAYS},
    db,
    error::Error,
};

const MAX_NOTE_LEN: usize = 2000;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MoodView {
    #[serde(rename = "_id")]
    pub id: String,
    pub mood: String,
    pub intensity: i64,
    pub note: Option<String>,
    pub timestamp: chrono::DateTime<Utc>,
}

impl From<MoodEntry> for MoodView {
    fn from(entry: MoodEntry) -> Self {
        MoodView {
            id: entry.id.to_hex(),
            mood: entry.mood,
            intensity: entry.intensity,
            note: entry.note,
            timestamp: to_utc(entry.timestamp),
        }
    }
}

/// Timestamps are always taken from the server clock
#[derive(Debug, Deserialize)]
pub struct LogMoodRequest {
    pub mood: String,
    pub intensity: Option<i64>,
    pub note: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsQuery {
    pub time_range: Option<String>,
}

impl AnalyticsQuery {
    /// Requested range, or the default when absent
    pub fn range(&self) -> Result<TimeRange, Error> {
        match self.time_range.as_deref() {
            Some(s) => Ok(s.parse::<TimeRange>()?),
            None => Ok(TimeRange::default()),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct MoodHistoryQuery {
    /// Only entries from the last `days` days
    pub days: Option<i64>,
}

pub async fn post_mood(
    State(state): State<AppState>,
    auth: AuthContext,
    Json(req): Json<LogMoodRequest>,
) -> Result<(StatusCode, Json<MoodView>), Error> {
    let mood = normalize(&req.mood);
    if mood.is_empty() {
        return Err(Error::BadRequest("mood is required".into()));
    }
    let note = req
        .note
        .map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty());
    if note
        .as_ref()
        .is_some_and(|n| n.chars().count() > MAX_NOTE_LEN)
    {
        return Err(Error::BadRequest(format!(
            "note must be at most {MAX_NOTE_LEN} characters"
        )));
    }

    if !state.scale.contains(&mood) {
        debug!(mood = %mood, "mood is not on the scale");
    }
    let bounds = state.scale.bounds();
    let intensity = match req.intensity {
        Some(intensity) if !bounds.contains(&intensity) => {
            return Err(Error::BadRequest(format!(
                "intensity must be between {} and {}",
                bounds.start(),
                bounds.end()
            )));
        }
        Some(intensity) => intensity,
        None => state.scale.intensity(&mood),
    };

    let entry = MoodEntry {
        id: ObjectId::new(),
        username: auth.username.clone(),
        mood,
        intensity,
        note,
        timestamp: DateTime::now(),
    };
    db::insert_mood(&state.db, &entry).await?;

    state.activity.record(&auth, ActivityKind::MoodLog);
    Ok((StatusCode::CREATED, Json(entry.into())))
}

pub async fn get_moods(
    State(state): State<AppState>,
    auth: AuthContext,
    Query(query): Query<MoodHistoryQuery>,
) -> Result<Json<Vec<MoodView>>, Error> {
    let since = query
        .days
        .map(|days| days.clamp(1, MAX_WINDOW_DAYS))
        .and_then(|days| days_before(Utc::now(), days))
        .map(DateTime::from_chrono);
    let entries = db::mood_entries(&state.db, &auth, since).await?;
    Ok(Json(entries.into_iter().map(MoodView::from).collect()))
}

/// Never fails once the caller is known: storage errors report "no data"
pub async fn get_mood_trend(State(state): State<AppState>, auth: AuthContext) -> Json<MoodTrend> {
    let trend = match compute_mood_trend(&state, &auth, state.mood_trend_window_days).await {
        Ok(trend) => trend,
        Err(e) => {
            warn!(error = ?e, username = %auth.username, "mood trend unavailable");
            MoodTrend::no_data()
        }
    };
    Json(trend)
}

pub async fn get_mood_analytics(
    State(state): State<AppState>,
    auth: AuthContext,
    Query(query): Query<AnalyticsQuery>,
) -> Result<Json<MoodAnalytics>, Error> {
    let range = query.range()?;

    let analytics = match compute_mood_analytics(&state, &auth, range).await {
        Ok(analytics) => analytics,
        Err(e) => {
            warn!(error = ?e, username = %auth.username, "mood analytics unavailable");
            mood_analytics(&[], &Local, &state.thresholds)
        }
    };
    Ok(Json(analytics))
}
