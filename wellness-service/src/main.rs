use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use wellness_service::config::{AppState, EnvVars};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!("{}=debug,tower_http=info", env!("CARGO_CRATE_NAME")).into()
            }),
        )
        // Log to stdout
        .with(tracing_subscriber::fmt::layer().pretty())
        .with(sentry::integrations::tracing::layer())
        .init();

    info!("Starting wellness service...");
    let env_vars = EnvVars::new();
    info!(environment = %env_vars.environment, "loaded configuration");

    let _guard = env_vars.sentry_dsn.clone().map(|sentry_dsn| {
        info!("initializing Sentry");
        // NOTE: Events are only emitted, once the guard goes out of scope.
        sentry::init((
            sentry_dsn,
            sentry::ClientOptions {
                release: sentry::release_name!(),
                environment: Some(env_vars.environment.to_string().into()),
                traces_sample_rate: 1.0,
                ..Default::default()
            },
        ))
    });

    if let Err(e) = run(env_vars).await {
        error!("Server error: {:?}", e);
    }
}

async fn run(env_vars: EnvVars) -> anyhow::Result<()> {
    let db = schema::db::database(&env_vars.mongodb_uri, env!("CARGO_CRATE_NAME")).await?;
    let scale = env_vars.load_mood_scale()?;
    info!(moods = scale.labels().count(), "loaded mood scale");

    let state = AppState::new(db, &env_vars, scale);
    let app = wellness_service::app(state, &env_vars);

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", env_vars.port)).await?;
    info!("listening on {}", listener.local_addr()?);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("shutting down");
}
