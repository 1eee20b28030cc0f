use std::collections::HashSet;

use anyhow::{Context, bail};
use indicatif::ProgressBar;
use mongodb::{
    Database,
    bson::{DateTime, doc, oid::ObjectId},
};
use schema::{VIDEO_COLLECTION, Video, VideoCreator, db::get_collection};
use serde::Deserialize;
use tracing::{debug, info, warn};

pub const BUNDLED_CATALOG: &str = include_str!("../videos.json");

/// A catalog video as written in the import file
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogEntry {
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
    #[serde(default)]
    pub creator: VideoCreator,
}

impl CatalogEntry {
    pub fn into_video(self, published_date: DateTime) -> Video {
        Video {
            id: ObjectId::new(),
            title: self.title.trim().to_string(),
            description: self.description,
            youtube_id: self.youtube_id.trim().to_string(),
            thumbnail: self.thumbnail,
            duration: self.duration.trim().to_string(),
            categories: lowercase(self.categories),
            tags: self.tags,
            mood_tags: lowercase(self.mood_tags),
            view_count: self.view_count,
            like_count: self.like_count,
            completion_count: self.completion_count,
            rating: self.rating,
            published_date,
            active: true,
            creator: self.creator,
        }
    }
}

fn lowercase(labels: Vec<String>) -> Vec<String> {
    labels
        .into_iter()
        .map(|l| l.trim().to_lowercase())
        .filter(|l| !l.is_empty())
        .collect()
}

#[derive(Debug, Default, PartialEq, Eq)]
pub struct ImportSummary {
    pub imported: u64,
    pub skipped: u64,
    pub failed: u64,
}

/// Parses a catalog, rejecting entries without a title or YouTube id and
/// YouTube ids that appear twice.
pub fn parse_catalog(json: &str) -> anyhow::Result<Vec<CatalogEntry>> {
    let catalog: Vec<CatalogEntry> = serde_json::from_str(json).context("invalid catalog")?;

    let mut seen = HashSet::new();
    for (i, entry) in catalog.iter().enumerate() {
        if entry.title.trim().is_empty() {
            bail!("catalog entry {i} has no title");
        }
        let youtube_id = entry.youtube_id.trim();
        if youtube_id.is_empty() {
            bail!("catalog entry {i} ({}) has no youtubeId", entry.title);
        }
        if !seen.insert(youtube_id) {
            bail!("youtubeId {youtube_id} appears more than once");
        }
    }
    Ok(catalog)
}

/// Inserts every catalog video whose YouTube id is not stored yet, then
/// ensures the recommendation indexes exist.
pub async fn import_videos(
    db: &Database,
    catalog: Vec<CatalogEntry>,
) -> anyhow::Result<ImportSummary> {
    let videos = get_collection::<Video>(db, VIDEO_COLLECTION);

    let existing: HashSet<String> = videos
        .distinct("youtubeId", doc! {})
        .await
        .context("unable to query existing videos")?
        .into_iter()
        .filter_map(|id| id.as_str().map(str::to_string))
        .collect();
    info!(existing = existing.len(), "found videos already in database");

    let pb = ProgressBar::new(catalog.len() as u64);
    let mut summary = ImportSummary::default();
    let published_date = DateTime::now();

    for entry in catalog {
        pb.inc(1);
        if existing.contains(entry.youtube_id.trim()) {
            debug!(title = %entry.title, "video already exists");
            summary.skipped += 1;
            continue;
        }

        let video = entry.into_video(published_date);
        match videos.insert_one(&video).await {
            Ok(_) => {
                debug!(title = %video.title, "imported");
                summary.imported += 1;
            }
            Err(e) => {
                warn!(error = ?e, title = %video.title, "unable to import video");
                summary.failed += 1;
            }
        }
    }
    pb.finish_with_message("Videos imported");

    schema::db::ensure_video_indexes(db)
        .await
        .context("unable to create video indexes")?;
    info!("created video indexes");

    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bundled_catalog_is_valid() {
        let catalog = parse_catalog(BUNDLED_CATALOG).unwrap();
        assert_eq!(catalog.len(), 16);
        assert!(catalog.iter().all(|v| !v.mood_tags.is_empty()));
    }

    #[test]
    fn duplicate_youtube_ids_are_rejected() {
        let json = r#"[
            { "title": "Breathe", "youtubeId": "abc" },
            { "title": "Breathe again", "youtubeId": " abc " }
        ]"#;
        let err = parse_catalog(json).unwrap_err();
        assert!(err.to_string().contains("abc"));
    }

    #[test]
    fn missing_youtube_id_is_rejected() {
        let json = r#"[{ "title": "Breathe", "youtubeId": "" }]"#;
        assert!(parse_catalog(json).is_err());
    }

    #[test]
    fn imported_videos_are_active_and_normalised() {
        let json = r#"[{
            "title": " Sleep Meditation ",
            "youtubeId": "N4qabPO9X5o",
            "duration": "25:00 ",
            "moodTags": ["Tired", " anxious", ""],
            "viewCount": 4532
        }]"#;
        let entry = parse_catalog(json).unwrap().pop().unwrap();
        let video = entry.into_video(DateTime::from_millis(0));

        assert!(video.active);
        assert_eq!(video.title, "Sleep Meditation");
        assert_eq!(video.duration, "25:00");
        assert_eq!(video.mood_tags, vec!["tired", "anxious"]);
        assert_eq!(video.view_count, 4532);
        assert_eq!(video.creator, VideoCreator::default());
    }
}
