use anyhow::Context;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

mod import_videos;
use import_videos::{BUNDLED_CATALOG, import_videos, parse_catalog};

/// Imports the video catalog.
///
/// `script [path/to/videos.json]`; without a path the bundled catalog is used.
#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("{e:?}");
        std::process::exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    let file = std::fs::File::create("logs.jsonl").context("unable to create logs.jsonl")?;
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("{}=info", env!("CARGO_CRATE_NAME")).into()),
        )
        .with(tracing_subscriber::fmt::layer().pretty())
        .with(tracing_subscriber::fmt::layer().json().with_writer(file))
        .init();
    dotenvy::dotenv().ok();

    let json = match std::env::args().nth(1) {
        Some(path) => {
            info!(path = %path, "reading catalog");
            std::fs::read_to_string(&path).with_context(|| format!("unable to read {path}"))?
        }
        None => BUNDLED_CATALOG.to_string(),
    };
    let catalog = parse_catalog(&json)?;

    let mongo_uri = std::env::var("MONGODB_URI").context("MONGODB_URI required")?;
    let db = schema::db::database(&mongo_uri, env!("CARGO_CRATE_NAME")).await?;

    let summary = import_videos(&db, catalog).await?;
    info!(
        imported = summary.imported,
        skipped = summary.skipped,
        failed = summary.failed,
        "import finished"
    );
    Ok(())
}
