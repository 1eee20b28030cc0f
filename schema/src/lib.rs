//! Documents persisted by the wellness backend.
//!
//! Field names are stored in camelCase, matching the collections written by
//! the front-end era Python services.
use mongodb::bson::{DateTime, oid::ObjectId};
use serde::{Deserialize, Serialize};

pub mod db;

pub const ACTIVITY_COLLECTION: &str = "activities";
pub const JOURNAL_COLLECTION: &str = "journals";
pub const MOOD_COLLECTION: &str = "moods";
pub const VIDEO_COLLECTION: &str = "videos";
pub const VIDEO_INTERACTION_COLLECTION: &str = "videoInteractions";

/// Kinds of user-facing actions recorded in the activity log.
///
/// Values not known to this build are kept verbatim so that reading an
/// older or newer log never fails.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ActivityKind {
    Login,
    Journal,
    MoodLog,
    VideoView,
    VideoInteraction,
    DashboardVisit,
    Other(String),
}

impl ActivityKind {
    pub fn as_str(&self) -> &str {
        match self {
            ActivityKind::Login => "login",
            ActivityKind::Journal => "journal",
            ActivityKind::MoodLog => "mood_log",
            ActivityKind::VideoView => "video_view",
            ActivityKind::VideoInteraction => "video_interaction",
            ActivityKind::DashboardVisit => "dashboard_visit",
            ActivityKind::Other(s) => s,
        }
    }
}

impl From<String> for ActivityKind {
    fn from(s: String) -> Self {
        match s.as_str() {
            "login" => ActivityKind::Login,
            "journal" => ActivityKind::Journal,
            "mood_log" => ActivityKind::MoodLog,
            "video_view" => ActivityKind::VideoView,
            "video_interaction" => ActivityKind::VideoInteraction,
            "dashboard_visit" => ActivityKind::DashboardVisit,
            _ => ActivityKind::Other(s),
        }
    }
}

impl From<ActivityKind> for String {
    fn from(kind: ActivityKind) -> Self {
        kind.as_str().to_string()
    }
}

impl std::fmt::Display for ActivityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityEvent {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub username: String,
    pub activity_type: ActivityKind,
    pub timestamp: DateTime,
}

impl ActivityEvent {
    pub fn new(username: impl Into<String>, activity_type: ActivityKind) -> Self {
        Self {
            id: ObjectId::new(),
            username: username.into(),
            activity_type,
            timestamp: DateTime::now(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MoodEntry {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub username: String,
    pub mood: String,
    pub intensity: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    pub timestamp: DateTime,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JournalEntry {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub username: String,
    #[serde(default)]
    pub title: String,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mood: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    pub created_at: DateTime,
    pub updated_at: DateTime,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoCreator {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub channel_id: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Video {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub youtube_id: String,
    #[serde(default)]
    pub thumbnail: String,
    #[serde(default)]
    pub duration: String,
    #[serde(default)]
    pub categories: Vec<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub mood_tags: Vec<String>,
    #[serde(default)]
    pub view_count: i64,
    #[serde(default)]
    pub like_count: i64,
    #[serde(default)]
    pub completion_count: i64,
    #[serde(default)]
    pub rating: f64,
    pub published_date: DateTime,
    #[serde(default = "default_true")]
    pub active: bool,
    #[serde(default)]
    pub creator: VideoCreator,
}

fn default_true() -> bool {
    true
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InteractionKind {
    View,
    Like,
    Complete,
    Skip,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoInteraction {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub username: String,
    pub video_id: ObjectId,
    pub interaction_type: InteractionKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub watch_seconds: Option<u32>,
    pub timestamp: DateTime,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_activity_kind_is_preserved() {
        let kind: ActivityKind = serde_json::from_str("\"profile_update\"").unwrap();
        assert_eq!(kind, ActivityKind::Other("profile_update".to_string()));
        assert_eq!(
            serde_json::to_string(&kind).unwrap(),
            "\"profile_update\""
        );
    }

    #[test]
    fn known_activity_kinds_use_snake_case() {
        let kind: ActivityKind = serde_json::from_str("\"mood_log\"").unwrap();
        assert_eq!(kind, ActivityKind::MoodLog);
        assert_eq!(ActivityKind::VideoInteraction.to_string(), "video_interaction");
    }

    #[test]
    fn video_defaults_missing_counters() {
        let document = mongodb::bson::doc! {
            "_id": ObjectId::new(),
            "title": "Sunset Beach Meditation",
            "youtubeId": "sYECVezDnso",
            "publishedDate": DateTime::now(),
        };
        let video: Video = mongodb::bson::from_document(document).unwrap();
        assert!(video.active);
        assert_eq!(video.view_count, 0);
        assert!(video.mood_tags.is_empty());
        assert_eq!(video.creator, VideoCreator::default());
    }
}
