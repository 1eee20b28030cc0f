use axum::{Json, extract::State, http::StatusCode};
use chrono::Utc;
use mongodb::bson::{DateTime, Document, oid::ObjectId};
use schema::{ActivityKind, JournalEntry};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::info;
use wellness_utils::scale::normalize;

use super::{parse_object_id, to_utc};
use crate::{auth::AuthContext, config::AppState, db, error::Error};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JournalView {
    #[serde(rename = "_id")]
    pub id: String,
    pub title: String,
    pub content: String,
    pub mood: Option<String>,
    pub tags: Vec<String>,
    pub created_at: chrono::DateTime<Utc>,
    pub updated_at: chrono::DateTime<Utc>,
}

impl From<JournalEntry> for JournalView {
    fn from(entry: JournalEntry) -> Self {
        JournalView {
            id: entry.id.to_hex(),
            title: entry.title,
            content: entry.content,
            mood: entry.mood,
            tags: entry.tags,
            created_at: to_utc(entry.created_at),
            updated_at: to_utc(entry.updated_at),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateJournalRequest {
    #[serde(default)]
    pub title: String,
    pub content: String,
    pub mood: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateJournalRequest {
    #[serde(rename = "_id")]
    pub id: String,
    pub title: Option<String>,
    pub content: Option<String>,
    pub mood: Option<String>,
    pub tags: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
pub struct DeleteJournalRequest {
    #[serde(rename = "_id")]
    pub id: String,
}

fn clean_content(content: &str) -> Result<String, Error> {
    let content = content.trim();
    if content.is_empty() {
        return Err(Error::BadRequest("content is required".into()));
    }
    Ok(content.to_string())
}

fn clean_mood(mood: Option<&str>) -> Option<String> {
    mood.map(normalize).filter(|m| !m.is_empty())
}

fn clean_tags(tags: Vec<String>) -> Vec<String> {
    let mut cleaned: Vec<String> = Vec::with_capacity(tags.len());
    for tag in tags {
        let tag = tag.trim();
        if !tag.is_empty() && !cleaned.iter().any(|t| t == tag) {
            cleaned.push(tag.to_string());
        }
    }
    cleaned
}

pub async fn get_journals(
    State(state): State<AppState>,
    auth: AuthContext,
) -> Result<Json<Vec<JournalView>>, Error> {
    let entries = db::list_journals(&state.db, &auth).await?;
    Ok(Json(entries.into_iter().map(JournalView::from).collect()))
}

pub async fn get_journal_count(
    State(state): State<AppState>,
    auth: AuthContext,
) -> Result<Json<Value>, Error> {
    let count = db::count_journals(&state.db, &auth).await?;
    Ok(Json(json!({ "count": count })))
}

pub async fn post_journal(
    State(state): State<AppState>,
    auth: AuthContext,
    Json(req): Json<CreateJournalRequest>,
) -> Result<(StatusCode, Json<JournalView>), Error> {
    let content = clean_content(&req.content)?;
    let now = DateTime::now();

    let entry = JournalEntry {
        id: ObjectId::new(),
        username: auth.username.clone(),
        title: req.title.trim().to_string(),
        content,
        mood: clean_mood(req.mood.as_deref()),
        tags: clean_tags(req.tags),
        created_at: now,
        updated_at: now,
    };
    db::insert_journal(&state.db, &entry).await?;
    info!(journal = %entry.id, "journal entry created");

    state.activity.record(&auth, ActivityKind::Journal);
    Ok((StatusCode::CREATED, Json(entry.into())))
}

pub async fn put_journal(
    State(state): State<AppState>,
    auth: AuthContext,
    Json(req): Json<UpdateJournalRequest>,
) -> Result<Json<JournalView>, Error> {
    let id = parse_object_id(&req.id)?;

    let mut changes = Document::new();
    if let Some(title) = req.title {
        changes.insert("title", title.trim());
    }
    if let Some(content) = req.content {
        changes.insert("content", clean_content(&content)?);
    }
    if let Some(mood) = req.mood {
        changes.insert("mood", clean_mood(Some(&mood)));
    }
    if let Some(tags) = req.tags {
        changes.insert("tags", clean_tags(tags));
    }
    if changes.is_empty() {
        return Err(Error::BadRequest("nothing to update".into()));
    }

    let Some(entry) = db::update_journal(&state.db, &auth, id, changes).await? else {
        return Err(Error::NotFound("journal entry".into()));
    };

    state.activity.record(&auth, ActivityKind::Journal);
    Ok(Json(entry.into()))
}

pub async fn delete_journal(
    State(state): State<AppState>,
    auth: AuthContext,
    Json(req): Json<DeleteJournalRequest>,
) -> Result<Json<Value>, Error> {
    let id = parse_object_id(&req.id)?;

    if !db::delete_journal(&state.db, &auth, id).await? {
        return Err(Error::NotFound("journal entry".into()));
    }
    info!(journal = %id, "journal entry deleted");
    Ok(Json(json!({ "message": "Journal entry deleted" })))
}
