use mongodb::{
    Client, Collection, Database, IndexModel,
    bson::{Document, doc},
    options::{ClientOptions, IndexOptions},
};
use serde::{Deserialize, Serialize};

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("database needs to be defined in the URI")]
    MissingDatabase,
    // Froms
    #[error("{0}")]
    MongoDB(#[from] mongodb::error::Error),
}

pub fn get_collection<'d, T>(db: &Database, collection_name: &str) -> Collection<T>
where
    T: Send + Sync + Deserialize<'d> + Serialize,
{
    db.collection::<T>(collection_name)
}

/// Connects to the cluster and returns a handle to the database named in `uri`.
///
/// The connection is verified with a `ping` so misconfiguration surfaces at start-up.
pub async fn database(uri: &str, app_name: &str) -> Result<Database, Error> {
    let mut client_options = ClientOptions::parse(uri).await?;

    client_options.app_name = Some(app_name.to_string());

    let client = Client::with_options(client_options)?;
    let db = client.default_database().ok_or(Error::MissingDatabase)?;

    db.run_command(doc! {"ping": 1}).await?;

    tracing::debug!(database = db.name(), "connected to database");
    Ok(db)
}

/// Same as [`database`], without the `ping`.
///
/// Nothing is sent to the server until the first operation.
pub async fn lazy_database(uri: &str, app_name: &str) -> Result<Database, Error> {
    let mut client_options = ClientOptions::parse(uri).await?;
    client_options.app_name = Some(app_name.to_string());

    let client = Client::with_options(client_options)?;
    client.default_database().ok_or(Error::MissingDatabase)
}

/// Indexes used by the video recommendation queries.
pub async fn ensure_video_indexes(db: &Database) -> Result<(), Error> {
    let videos = db.collection::<Document>(crate::VIDEO_COLLECTION);

    let mut indexes: Vec<IndexModel> = [
        ("categories", 1),
        ("moodTags", 1),
        ("viewCount", -1),
        ("rating", -1),
    ]
    .into_iter()
    .map(|(field, order)| {
        let mut keys = Document::new();
        keys.insert(field, order);
        IndexModel::builder().keys(keys).build()
    })
    .collect();
    indexes.push(
        IndexModel::builder()
            .keys(doc! { "youtubeId": 1 })
            .options(IndexOptions::builder().unique(true).build())
            .build(),
    );

    videos.create_indexes(indexes).await?;
    Ok(())
}
