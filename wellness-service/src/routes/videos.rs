use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use chrono::Utc;
use mongodb::bson::{DateTime, oid::ObjectId};
use schema::{ActivityKind, InteractionKind, Video, VideoInteraction};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::debug;
use wellness_utils::{
    misc::clamp_limit,
    recommend::categories_for_mood,
    scale::normalize,
};

use super::{parse_object_id, to_utc};
use crate::{auth::AuthContext, config::AppState, db, error::Error};

const RECOMMENDATION_LIMIT: i64 = 6;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoView {
    #[serde(rename = "_id")]
    pub id: String,
    pub title: String,
    pub description: String,
    pub youtube_id: String,
    pub thumbnail: String,
    pub duration: String,
    pub categories: Vec<String>,
    pub tags: Vec<String>,
    pub mood_tags: Vec<String>,
    pub view_count: i64,
    pub like_count: i64,
    pub completion_count: i64,
    pub rating: f64,
    pub published_date: chrono::DateTime<Utc>,
    pub creator: CreatorView,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatorView {
    pub name: String,
    pub channel_id: String,
}

impl From<Video> for VideoView {
    fn from(video: Video) -> Self {
        VideoView {
            id: video.id.to_hex(),
            title: video.title,
            description: video.description,
            youtube_id: video.youtube_id,
            thumbnail: video.thumbnail,
            duration: video.duration,
            categories: video.categories,
            tags: video.tags,
            mood_tags: video.mood_tags,
            view_count: video.view_count,
            like_count: video.like_count,
            completion_count: video.completion_count,
            rating: video.rating,
            published_date: to_utc(video.published_date),
            creator: CreatorView {
                name: video.creator.name,
                channel_id: video.creator.channel_id,
            },
        }
    }
}

fn views(videos: Vec<Video>) -> Vec<VideoView> {
    videos.into_iter().map(VideoView::from).collect()
}

#[derive(Debug, Deserialize)]
pub struct RecommendationQuery {
    pub mood: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct Recommendations {
    pub mood: String,
    pub categories: Vec<&'static str>,
    pub videos: Vec<VideoView>,
}

#[derive(Debug, Deserialize)]
pub struct LimitQuery {
    pub limit: Option<i64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InteractionRequest {
    pub video_id: String,
    pub interaction_type: InteractionKind,
    pub watch_seconds: Option<u32>,
}

fn require_mood(mood: Option<&str>) -> Result<String, Error> {
    let mood = mood.map(normalize).unwrap_or_default();
    if mood.is_empty() {
        return Err(Error::BadRequest("mood is required".into()));
    }
    Ok(mood)
}

/// Videos for a mood; an empty match falls back to the most watched videos
pub async fn get_recommendations(
    State(state): State<AppState>,
    Query(query): Query<RecommendationQuery>,
) -> Result<Json<Recommendations>, Error> {
    let mood = require_mood(query.mood.as_deref())?;
    let categories = categories_for_mood(&mood);

    let mut videos =
        db::videos_for_mood(&state.db, &mood, categories, RECOMMENDATION_LIMIT).await?;
    if videos.is_empty() {
        debug!(mood = %mood, "no videos for mood, falling back to popular");
        videos = db::popular_videos(&state.db, RECOMMENDATION_LIMIT).await?;
    }

    Ok(Json(Recommendations {
        mood,
        categories: categories.to_vec(),
        videos: views(videos),
    }))
}

pub async fn get_videos_by_mood(
    State(state): State<AppState>,
    Path(mood): Path<String>,
) -> Result<Json<Value>, Error> {
    let mood = require_mood(Some(&mood))?;
    let videos = db::videos_tagged(&state.db, &mood).await?;
    Ok(Json(json!({ "mood": mood, "videos": views(videos) })))
}

pub async fn get_popular_videos(
    State(state): State<AppState>,
    Query(query): Query<LimitQuery>,
) -> Result<Json<Value>, Error> {
    let limit = clamp_limit(query.limit, 6, 50);
    let videos = db::popular_videos(&state.db, limit).await?;
    Ok(Json(json!({ "videos": views(videos) })))
}

pub async fn post_interaction(
    State(state): State<AppState>,
    auth: AuthContext,
    Json(req): Json<InteractionRequest>,
) -> Result<(StatusCode, Json<Value>), Error> {
    let video_id: ObjectId = parse_object_id(&req.video_id)?;

    let interaction = VideoInteraction {
        id: ObjectId::new(),
        username: auth.username.clone(),
        video_id,
        interaction_type: req.interaction_type,
        watch_seconds: req.watch_seconds,
        timestamp: DateTime::now(),
    };
    if !db::record_interaction(&state.db, &interaction).await? {
        return Err(Error::NotFound("video".into()));
    }

    let kind = match interaction.interaction_type {
        InteractionKind::View => ActivityKind::VideoView,
        _ => ActivityKind::VideoInteraction,
    };
    state.activity.record(&auth, kind);

    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": "Interaction recorded" })),
    ))
}
