use axum::{
    Json,
    extract::{Query, State},
    http::header::{CONTENT_DISPOSITION, CONTENT_TYPE},
    response::IntoResponse,
};
use chrono::Local;
use serde::Serialize;
use tracing::warn;
use wellness_utils::{
    analytics::{DistributionEntry, TimeRange},
    export::moods_csv,
    insights::{ActivityImpact, Insight, TimeOfDaySlot},
    streak::StreakStats,
};

use super::moods::AnalyticsQuery;
use crate::{
    analytics::{
        compute_activity_correlation, compute_insights, compute_mood_analytics,
        compute_mood_by_time, compute_streak,
    },
    auth::AuthContext,
    config::AppState,
    error::Error,
};

/// Body shared by the per-range breakdowns
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RangeData<T> {
    pub time_range: TimeRange,
    pub data: Vec<T>,
}

// Analytics read paths report an empty breakdown instead of failing
fn or_empty<T>(
    res: Result<Vec<T>, Error>,
    auth: &AuthContext,
    what: &'static str,
) -> Vec<T> {
    res.unwrap_or_else(|e| {
        warn!(error = ?e, username = %auth.username, "{what} unavailable");
        Vec::new()
    })
}

pub async fn get_mood_distribution(
    State(state): State<AppState>,
    auth: AuthContext,
    Query(query): Query<AnalyticsQuery>,
) -> Result<Json<RangeData<DistributionEntry>>, Error> {
    let time_range = query.range()?;
    let res = compute_mood_analytics(&state, &auth, time_range)
        .await
        .map(|analytics| analytics.distribution);

    Ok(Json(RangeData {
        time_range,
        data: or_empty(res, &auth, "mood distribution"),
    }))
}

pub async fn get_mood_by_time(
    State(state): State<AppState>,
    auth: AuthContext,
    Query(query): Query<AnalyticsQuery>,
) -> Result<Json<RangeData<TimeOfDaySlot>>, Error> {
    let time_range = query.range()?;
    let res = compute_mood_by_time(&state, &auth, time_range).await;

    Ok(Json(RangeData {
        time_range,
        data: or_empty(res, &auth, "mood by time of day"),
    }))
}

pub async fn get_activity_correlation(
    State(state): State<AppState>,
    auth: AuthContext,
    Query(query): Query<AnalyticsQuery>,
) -> Result<Json<RangeData<ActivityImpact>>, Error> {
    let time_range = query.range()?;
    let res = compute_activity_correlation(&state, &auth, time_range).await;

    Ok(Json(RangeData {
        time_range,
        data: or_empty(res, &auth, "activity correlation"),
    }))
}

pub async fn get_insights(
    State(state): State<AppState>,
    auth: AuthContext,
    Query(query): Query<AnalyticsQuery>,
) -> Result<Json<RangeData<Insight>>, Error> {
    let time_range = query.range()?;
    let res = compute_insights(&state, &auth, time_range).await;

    Ok(Json(RangeData {
        time_range,
        data: or_empty(res, &auth, "insights"),
    }))
}

/// Full streak statistics; storage errors report zeroes
pub async fn get_streak_data(State(state): State<AppState>, auth: AuthContext) -> Json<StreakStats> {
    let stats = compute_streak(&state, &auth).await.unwrap_or_else(|e| {
        warn!(error = ?e, username = %auth.username, "streak unavailable");
        StreakStats::default()
    });
    Json(stats)
}

/// Mood history of the range as a CSV attachment.
///
/// Unlike the breakdowns this fails loudly: an empty file would read as
/// an empty history.
pub async fn get_export(
    State(state): State<AppState>,
    auth: AuthContext,
    Query(query): Query<AnalyticsQuery>,
) -> Result<impl IntoResponse, Error> {
    let time_range = query.range()?;
    let analytics = compute_mood_analytics(&state, &auth, time_range).await?;
    let body = moods_csv(&analytics.moods)?;

    let disposition = format!(
        "attachment; filename=\"mood-history-{}-{}.csv\"",
        time_range.as_str(),
        Local::now().format("%Y-%m-%d")
    );
    Ok((
        [
            (CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (CONTENT_DISPOSITION, disposition),
        ],
        body,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn range_data_names_its_range() {
        let body = RangeData::<DistributionEntry> {
            time_range: TimeRange::Quarter,
            data: Vec::new(),
        };
        assert_eq!(
            serde_json::to_value(body).unwrap(),
            serde_json::json!({ "timeRange": "quarter", "data": [] })
        );
    }
}
