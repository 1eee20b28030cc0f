use axum::{
    Router,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use chrono::Utc;
use mongodb::bson::{DateTime, oid::ObjectId};
use tracing::info;

use crate::{config::AppState, error::Error};

pub mod analytics;
pub mod journal;
pub mod moods;
pub mod user;
pub mod videos;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/status/ping", get(get_status_ping))
        .route(
            "/journal",
            get(journal::get_journals)
                .post(journal::post_journal)
                .put(journal::put_journal)
                .delete(journal::delete_journal),
        )
        .route("/journal/count", get(journal::get_journal_count))
        .route("/moods", get(moods::get_moods).post(moods::post_mood))
        .route("/moods/trend", get(moods::get_mood_trend))
        .route("/moods/analytics", get(moods::get_mood_analytics))
        .route(
            "/analytics/mood-distribution",
            get(analytics::get_mood_distribution),
        )
        .route("/analytics/mood-by-time", get(analytics::get_mood_by_time))
        .route(
            "/analytics/activity-correlation",
            get(analytics::get_activity_correlation),
        )
        .route("/analytics/streak-data", get(analytics::get_streak_data))
        .route("/analytics/insights", get(analytics::get_insights))
        .route("/analytics/export", get(analytics::get_export))
        .route("/user/streak", get(user::get_streak))
        .route("/user/last-activity", get(user::get_last_activity))
        .route("/user/activity-history", get(user::get_activity_history))
        .route("/user/dashboard-stats", get(user::get_dashboard_stats))
        .route("/user/video-analytics", get(user::get_video_analytics))
        .route("/user/watched-videos", get(user::get_watched_videos))
        .route("/videos/recommendations", get(videos::get_recommendations))
        .route("/videos/by-mood/{mood}", get(videos::get_videos_by_mood))
        .route("/videos/popular", get(videos::get_popular_videos))
        .route("/videos/interaction", post(videos::post_interaction))
        .with_state(state)
}

pub async fn get_status_ping() -> impl IntoResponse {
    info!("Status");
    StatusCode::OK
}

fn parse_object_id(id: &str) -> Result<ObjectId, Error> {
    ObjectId::parse_str(id.trim()).map_err(|_| Error::BadRequest(format!("invalid id '{id}'")))
}

fn to_utc(datetime: DateTime) -> chrono::DateTime<Utc> {
    datetime.to_chrono()
}

#[cfg(test)]
mod tests {
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use serde_json::Value;
    use tower::ServiceExt;
    use wellness_utils::scale::MoodScale;

    use crate::{
        auth::USERNAME_HEADER,
        config::{AppState, EnvVars},
    };

    // Nothing listens here: every query fails fast with a server selection error
    const UNREACHABLE_URI: &str =
        "mongodb://127.0.0.1:9/wellness_test?serverSelectionTimeoutMS=200&connectTimeoutMS=200";

    async fn build_app() -> axum::Router {
        let env_vars = EnvVars {
            mongodb_uri: UNREACHABLE_URI.to_string(),
            ..Default::default()
        };
        let db = schema::db::lazy_database(&env_vars.mongodb_uri, "wellness-service-test")
            .await
            .unwrap();
        let state = AppState::new(db, &env_vars, MoodScale::default());
        crate::app(state, &env_vars)
    }

    async fn send(request: Request<Body>) -> (StatusCode, Value) {
        let response = build_app().await.oneshot(request).await.unwrap();
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json = serde_json::from_slice(&body).unwrap_or(Value::Null);
        (status, json)
    }

    fn get_as(uri: &str, username: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder().uri(uri);
        if let Some(username) = username {
            builder = builder.header(USERNAME_HEADER, username);
        }
        builder.body(Body::empty()).unwrap()
    }

    fn json_as(method: &str, uri: &str, username: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .header(USERNAME_HEADER, username)
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn ping_needs_no_identity() {
        let (status, _) = send(get_as("/status/ping", None)).await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn user_routes_require_identity() {
        for uri in [
            "/moods/trend",
            "/user/streak",
            "/journal",
            "/moods",
            "/analytics/insights",
            "/analytics/export",
            "/user/watched-videos",
        ] {
            let (status, body) = send(get_as(uri, None)).await;
            assert_eq!(status, StatusCode::UNAUTHORIZED, "{uri}");
            assert_eq!(body["error"], "not logged in");
        }
    }

    #[tokio::test]
    async fn blank_identity_is_rejected() {
        let (status, _) = send(get_as("/user/streak", Some("   "))).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn unknown_time_range_is_a_bad_request() {
        let (status, body) = send(get_as(
            "/moods/analytics?timeRange=fortnight",
            Some("river"),
        ))
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().contains("fortnight"));
    }

    #[tokio::test]
    async fn blank_mood_is_a_bad_request() {
        let request = json_as("POST", "/moods", "river", serde_json::json!({ "mood": "  " }));
        let (status, body) = send(request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "mood is required");
    }

    #[tokio::test]
    async fn out_of_scale_intensity_is_a_bad_request() {
        for intensity in [1000, -3, i64::MAX, i64::MIN] {
            let request = json_as(
                "POST",
                "/moods",
                "river",
                serde_json::json!({ "mood": "happy", "intensity": intensity }),
            );
            let (status, body) = send(request).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "{intensity}");
            assert_eq!(body["error"], "intensity must be between -2 and 5");
        }
    }

    #[tokio::test]
    async fn malformed_journal_id_is_a_bad_request() {
        let request = json_as(
            "PUT",
            "/journal",
            "river",
            serde_json::json!({ "_id": "not-an-id", "content": "hello" }),
        );
        let (status, _) = send(request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn empty_journal_content_is_a_bad_request() {
        let request = json_as(
            "POST",
            "/journal",
            "river",
            serde_json::json!({ "title": "Monday", "content": "" }),
        );
        let (status, _) = send(request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn streak_degrades_to_zero_when_storage_fails() {
        let (status, body) = send(get_as("/user/streak", Some("river"))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["streak"], 0);
        assert_eq!(body["unit"], "days");
    }

    #[tokio::test]
    async fn trend_degrades_to_neutral_when_storage_fails() {
        let (status, body) = send(get_as("/moods/trend", Some("river"))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["trend"], "neutral");
        assert!(body["recentMoods"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn mood_analytics_degrade_to_an_empty_window() {
        let (status, body) = send(get_as("/moods/analytics?timeRange=week", Some("river"))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["summary"]["totalEntries"], 0);
        assert_eq!(body["summary"]["mostCommonMood"], "neutral");
        assert!(body["moods"].as_array().unwrap().is_empty());
        assert!(body["calendar"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn breakdowns_degrade_to_empty_data() {
        for uri in [
            "/analytics/mood-distribution?timeRange=year",
            "/analytics/mood-by-time?timeRange=year",
            "/analytics/activity-correlation?timeRange=year",
            "/analytics/insights?timeRange=year",
        ] {
            let (status, body) = send(get_as(uri, Some("river"))).await;
            assert_eq!(status, StatusCode::OK, "{uri}");
            assert_eq!(body["timeRange"], "year", "{uri}");
            assert!(body["data"].as_array().unwrap().is_empty(), "{uri}");
        }
    }

    #[tokio::test]
    async fn breakdowns_reject_unknown_time_range() {
        for uri in [
            "/analytics/mood-by-time?timeRange=decade",
            "/analytics/export?timeRange=decade",
        ] {
            let (status, _) = send(get_as(uri, Some("river"))).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
        }
    }

    #[tokio::test]
    async fn streak_data_and_video_analytics_degrade_to_zero() {
        let (status, body) = send(get_as("/analytics/streak-data", Some("river"))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["current"], 0);
        assert_eq!(body["thisWeek"], 0);

        let (status, body) = send(get_as("/user/video-analytics", Some("river"))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["totalWatched"], 0);
        assert_eq!(body["watchTimeByDay"].as_array().unwrap().len(), 7);
    }

    #[tokio::test]
    async fn crud_storage_failures_are_server_errors() {
        for uri in [
            "/journal/count",
            "/moods?days=7",
            "/analytics/export?timeRange=week",
            "/user/watched-videos",
        ] {
            let (status, body) = send(get_as(uri, Some("river"))).await;
            assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR, "{uri}");
            assert_eq!(body["error"], "internal server error", "{uri}");
        }
    }

    #[tokio::test]
    async fn huge_day_windows_do_not_panic() {
        let (status, _) = send(get_as("/moods?days=9223372036854775807", Some("river"))).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    }
}
