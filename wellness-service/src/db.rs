use futures_util::TryStreamExt;
use mongodb::{
    Collection, Database,
    bson::{DateTime, Document, doc, oid::ObjectId},
    options::ReturnDocument,
};
use schema::{
    ACTIVITY_COLLECTION, ActivityEvent, InteractionKind, JOURNAL_COLLECTION, JournalEntry,
    MOOD_COLLECTION, MoodEntry, VIDEO_COLLECTION, VIDEO_INTERACTION_COLLECTION, Video,
    VideoInteraction, db::get_collection,
};
use serde::Deserialize;

use crate::{auth::AuthContext, error::Error};

fn activities(db: &Database) -> Collection<ActivityEvent> {
    get_collection(db, ACTIVITY_COLLECTION)
}

fn moods(db: &Database) -> Collection<MoodEntry> {
    get_collection(db, MOOD_COLLECTION)
}

fn journals(db: &Database) -> Collection<JournalEntry> {
    get_collection(db, JOURNAL_COLLECTION)
}

fn videos(db: &Database) -> Collection<Video> {
    get_collection(db, VIDEO_COLLECTION)
}

fn user_filter(auth: &AuthContext, since: Option<DateTime>) -> Document {
    let mut filter = doc! { "username": &auth.username };
    if let Some(since) = since {
        filter.insert("timestamp", doc! { "$gte": since });
    }
    filter
}

/// Timestamps of every activity event for `auth`, oldest first
#[tracing::instrument(skip_all, err(Debug))]
pub async fn activity_timestamps(
    db: &Database,
    auth: &AuthContext,
) -> Result<Vec<DateTime>, Error> {
    #[derive(Deserialize)]
    struct TimestampProjection {
        timestamp: DateTime,
    }

    let timestamps: Vec<TimestampProjection> = activities(db)
        .clone_with_type::<TimestampProjection>()
        .find(user_filter(auth, None))
        .projection(doc! { "_id": false, "timestamp": true })
        .sort(doc! { "timestamp": 1 })
        .await?
        .try_collect()
        .await?;

    Ok(timestamps.into_iter().map(|t| t.timestamp).collect())
}

#[tracing::instrument(skip_all, err(Debug))]
pub async fn recent_activity(
    db: &Database,
    auth: &AuthContext,
    limit: i64,
) -> Result<Vec<ActivityEvent>, Error> {
    let events = activities(db)
        .find(user_filter(auth, None))
        .sort(doc! { "timestamp": -1 })
        .limit(limit)
        .await?
        .try_collect()
        .await?;
    Ok(events)
}

#[tracing::instrument(skip_all, err(Debug))]
pub async fn last_activity(
    db: &Database,
    auth: &AuthContext,
) -> Result<Option<ActivityEvent>, Error> {
    let event = activities(db)
        .find_one(user_filter(auth, None))
        .sort(doc! { "timestamp": -1 })
        .await?;
    Ok(event)
}

/// Mood entries for `auth` logged at or after `since`, newest first
#[tracing::instrument(skip_all, err(Debug))]
pub async fn mood_entries(
    db: &Database,
    auth: &AuthContext,
    since: Option<DateTime>,
) -> Result<Vec<MoodEntry>, Error> {
    let entries = moods(db)
        .find(user_filter(auth, since))
        .sort(doc! { "timestamp": -1 })
        .await?
        .try_collect()
        .await?;
    Ok(entries)
}

#[tracing::instrument(skip_all, err(Debug))]
pub async fn insert_mood(db: &Database, entry: &MoodEntry) -> Result<(), Error> {
    moods(db).insert_one(entry).await?;
    Ok(())
}

#[tracing::instrument(skip_all, err(Debug))]
pub async fn list_journals(db: &Database, auth: &AuthContext) -> Result<Vec<JournalEntry>, Error> {
    let entries = journals(db)
        .find(doc! { "username": &auth.username })
        .sort(doc! { "createdAt": -1 })
        .await?
        .try_collect()
        .await?;
    Ok(entries)
}

#[tracing::instrument(skip_all, err(Debug))]
pub async fn count_journals(db: &Database, auth: &AuthContext) -> Result<u64, Error> {
    let count = journals(db)
        .count_documents(doc! { "username": &auth.username })
        .await?;
    Ok(count)
}

#[tracing::instrument(skip_all, err(Debug))]
pub async fn insert_journal(db: &Database, entry: &JournalEntry) -> Result<(), Error> {
    journals(db).insert_one(entry).await?;
    Ok(())
}

/// Applies `changes` to a journal entry owned by `auth`.
///
/// Returns the updated entry, or `None` if no such entry exists for this user.
#[tracing::instrument(skip_all, fields(journal = %id), err(Debug))]
pub async fn update_journal(
    db: &Database,
    auth: &AuthContext,
    id: ObjectId,
    mut changes: Document,
) -> Result<Option<JournalEntry>, Error> {
    changes.insert("updatedAt", DateTime::now());

    let entry = journals(db)
        .find_one_and_update(
            doc! { "_id": id, "username": &auth.username },
            doc! { "$set": changes },
        )
        .return_document(ReturnDocument::After)
        .await?;
    Ok(entry)
}

/// Returns whether an entry owned by `auth` was deleted
#[tracing::instrument(skip_all, fields(journal = %id), err(Debug))]
pub async fn delete_journal(
    db: &Database,
    auth: &AuthContext,
    id: ObjectId,
) -> Result<bool, Error> {
    let res = journals(db)
        .delete_one(doc! { "_id": id, "username": &auth.username })
        .await?;
    Ok(res.deleted_count > 0)
}

/// Active videos tagged with `mood` or in one of `categories`, best rated first
#[tracing::instrument(skip_all, fields(mood = %mood), err(Debug))]
pub async fn videos_for_mood(
    db: &Database,
    mood: &str,
    categories: &[&str],
    limit: i64,
) -> Result<Vec<Video>, Error> {
    let videos = videos(db)
        .find(doc! {
            "active": true,
            "$or": [
                { "moodTags": mood },
                { "categories": { "$in": categories.to_vec() } }
            ]
        })
        .sort(doc! { "rating": -1, "viewCount": -1 })
        .limit(limit)
        .await?
        .try_collect()
        .await?;
    Ok(videos)
}

#[tracing::instrument(skip_all, fields(mood = %mood), err(Debug))]
pub async fn videos_tagged(db: &Database, mood: &str) -> Result<Vec<Video>, Error> {
    let videos = videos(db)
        .find(doc! { "active": true, "moodTags": mood })
        .sort(doc! { "rating": -1 })
        .await?
        .try_collect()
        .await?;
    Ok(videos)
}

#[tracing::instrument(skip_all, err(Debug))]
pub async fn popular_videos(db: &Database, limit: i64) -> Result<Vec<Video>, Error> {
    let videos = videos(db)
        .find(doc! { "active": true })
        .sort(doc! { "viewCount": -1 })
        .limit(limit)
        .await?
        .try_collect()
        .await?;
    Ok(videos)
}

fn interactions(db: &Database) -> Collection<VideoInteraction> {
    get_collection(db, VIDEO_INTERACTION_COLLECTION)
}

/// Counter on the video document bumped by `kind`, if any
fn counter_increment(kind: InteractionKind) -> Option<Document> {
    match kind {
        InteractionKind::View => Some(doc! { "viewCount": 1 }),
        InteractionKind::Complete => Some(doc! { "completionCount": 1 }),
        InteractionKind::Like => Some(doc! { "likeCount": 1 }),
        InteractionKind::Skip => None,
    }
}

/// Stores an interaction, then bumps the video's counter.
///
/// The interaction is written first so that a failed increment can only
/// leave a counter behind the interaction log, never ahead of it.
/// Returns `false` if the video does not exist.
#[tracing::instrument(skip_all, fields(video = %interaction.video_id), err(Debug))]
pub async fn record_interaction(
    db: &Database,
    interaction: &VideoInteraction,
) -> Result<bool, Error> {
    let filter = doc! { "_id": interaction.video_id };
    if videos(db).count_documents(filter.clone()).await? == 0 {
        return Ok(false);
    }

    interactions(db).insert_one(interaction).await?;

    if let Some(increment) = counter_increment(interaction.interaction_type) {
        videos(db)
            .update_one(filter, doc! { "$inc": increment })
            .await?;
    }
    Ok(true)
}

/// Activity events for `auth` at or after `since`, oldest first
#[tracing::instrument(skip_all, err(Debug))]
pub async fn activity_events(
    db: &Database,
    auth: &AuthContext,
    since: Option<DateTime>,
) -> Result<Vec<ActivityEvent>, Error> {
    let events = activities(db)
        .find(user_filter(auth, since))
        .sort(doc! { "timestamp": 1 })
        .await?
        .try_collect()
        .await?;
    Ok(events)
}

#[tracing::instrument(skip_all, err(Debug))]
pub async fn video_interactions(
    db: &Database,
    auth: &AuthContext,
) -> Result<Vec<VideoInteraction>, Error> {
    let history = interactions(db)
        .find(user_filter(auth, None))
        .sort(doc! { "timestamp": 1 })
        .await?
        .try_collect()
        .await?;
    Ok(history)
}

/// Videos with the given ids, in no particular order; unknown ids are skipped
#[tracing::instrument(skip_all, fields(count = ids.len()), err(Debug))]
pub async fn videos_by_ids(db: &Database, ids: &[ObjectId]) -> Result<Vec<Video>, Error> {
    if ids.is_empty() {
        return Ok(Vec::new());
    }
    let videos = videos(db)
        .find(doc! { "_id": { "$in": ids.to_vec() } })
        .await?
        .try_collect()
        .await?;
    Ok(videos)
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WatchedVideo {
    #[serde(rename = "_id")]
    pub video_id: ObjectId,
    pub watched_at: DateTime,
}

/// Distinct videos `auth` viewed, most recently viewed first
#[tracing::instrument(skip_all, err(Debug))]
pub async fn recently_watched(
    db: &Database,
    auth: &AuthContext,
    limit: i64,
) -> Result<Vec<WatchedVideo>, Error> {
    let watched = interactions(db)
        .aggregate([
            doc! { "$match": { "username": &auth.username, "interactionType": "view" } },
            doc! { "$sort": { "timestamp": -1 } },
            doc! { "$group": { "_id": "$videoId", "watchedAt": { "$first": "$timestamp" } } },
            doc! { "$sort": { "watchedAt": -1 } },
            doc! { "$limit": limit },
        ])
        .with_type::<WatchedVideo>()
        .await?
        .try_collect()
        .await?;
    Ok(watched)
}
