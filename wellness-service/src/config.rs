use std::{env::var, sync::Arc};

use axum::http::HeaderValue;
use mongodb::Database;
use sentry::types::Dsn;
use tracing::{error, warn};
use wellness_utils::{scale::MoodScale, trend::TrendThresholds};

use crate::activity::ActivityRecorder;

#[derive(Clone, Debug)]
pub struct AppState {
    pub db: Database,
    pub scale: Arc<MoodScale>,
    pub thresholds: Arc<TrendThresholds>,
    pub mood_trend_window_days: i64,
    pub activity: ActivityRecorder,
}

impl AppState {
    /// Builds the shared state and starts the activity recorder.
    ///
    /// Must be called from within a tokio runtime.
    pub fn new(db: Database, env_vars: &EnvVars, scale: MoodScale) -> Self {
        let activity = ActivityRecorder::spawn(
            schema::db::get_collection(&db, schema::ACTIVITY_COLLECTION),
            env_vars.activity_queue_capacity,
        );

        AppState {
            db,
            scale: Arc::new(scale),
            thresholds: Arc::new(TrendThresholds::default()),
            mood_trend_window_days: env_vars.mood_trend_window_days,
            activity,
        }
    }
}

/// Upper bound for any configured or requested look-back window
pub const MAX_WINDOW_DAYS: i64 = 3650;

#[derive(Clone, Debug)]
pub struct EnvVars {
    pub activity_queue_capacity: usize,
    pub allowed_origin: HeaderValue,
    pub environment: Environment,
    pub mongodb_uri: String,
    pub mood_scale_path: Option<String>,
    pub mood_trend_window_days: i64,
    pub port: u16,
    pub request_body_size_limit: usize,
    pub request_timeout_in_ms: u64,
    pub sentry_dsn: Option<String>,
}

#[derive(Clone, Debug)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

impl From<String> for Environment {
    fn from(s: String) -> Self {
        match s.to_lowercase().as_str() {
            "development" => Environment::Development,
            "staging" => Environment::Staging,
            "production" => Environment::Production,
            other => {
                warn!(
                    "ENVIRONMENT value '{}' is not valid. Defaulting to 'production'.",
                    other
                );
                Environment::Production
            }
        }
    }
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => f.write_str("development"),
            Environment::Staging => f.write_str("staging"),
            Environment::Production => f.write_str("production"),
        }
    }
}

impl Default for EnvVars {
    fn default() -> Self {
        EnvVars {
            activity_queue_capacity: 1024,
            allowed_origin: HeaderValue::from_static("http://localhost:3000"),
            environment: Environment::Production,
            mongodb_uri: "mongodb://localhost:27017/happify".to_string(),
            mood_scale_path: None,
            mood_trend_window_days: 7,
            port: 3002,
            request_body_size_limit: 1024 * 1024,
            request_timeout_in_ms: 30_000,
            sentry_dsn: None,
        }
    }
}

impl EnvVars {
    pub fn new() -> Self {
        let defaults = EnvVars::default();

        let Ok(mongodb_uri) = var("MONGODB_URI") else {
            error!("MONGODB_URI not set");
            panic!("MONGODB_URI required");
        };
        assert!(!mongodb_uri.is_empty(), "MONGODB_URI must not be empty");

        let sentry_dsn = match var("SENTRY_DSN") {
            Ok(dsn_string) => {
                assert!(
                    valid_sentry_dsn(&dsn_string),
                    "SENTRY_DSN is not valid DSN."
                );
                Some(dsn_string)
            }
            Err(_e) => {
                warn!("SENTRY_DSN not set.");
                None
            }
        };

        let environment = match var("ENVIRONMENT") {
            Ok(v) => v.into(),
            Err(_e) => {
                warn!("ENVIRONMENT not set. Defaulting to 'production'.");
                defaults.environment
            }
        };

        let port = match var("PORT") {
            Ok(port_string) => port_string.parse().expect("PORT to be parseable as u16"),
            Err(_e) => {
                warn!("PORT not set. Defaulting to {}", defaults.port);
                defaults.port
            }
        };

        let request_timeout_in_ms = match var("REQUEST_TIMEOUT_IN_MS") {
            Ok(s) => s
                .parse()
                .expect("REQUEST_TIMEOUT_IN_MS to be valid unsigned integer"),
            Err(_e) => {
                warn!(
                    "REQUEST_TIMEOUT_IN_MS not set. Defaulting to {}",
                    defaults.request_timeout_in_ms
                );
                defaults.request_timeout_in_ms
            }
        };

        let request_body_size_limit = match var("REQUEST_BODY_SIZE_LIMIT") {
            Ok(s) => s
                .parse()
                .expect("REQUEST_BODY_SIZE_LIMIT to be valid unsigned integer"),
            Err(_e) => defaults.request_body_size_limit,
        };

        let allowed_origin = match var("ALLOWED_ORIGIN") {
            Ok(s) => s
                .parse()
                .expect("ALLOWED_ORIGIN to be a valid header value"),
            Err(_e) => {
                warn!(
                    "ALLOWED_ORIGIN not set. Defaulting to {:?}",
                    defaults.allowed_origin
                );
                defaults.allowed_origin
            }
        };

        let mood_trend_window_days = match var("MOOD_TREND_WINDOW_DAYS") {
            Ok(v) => parse_window_days(&v).unwrap_or_else(|| {
                panic!(
                    "MOOD_TREND_WINDOW_DAYS should be a whole number of days from 1 to {MAX_WINDOW_DAYS}: {v}"
                )
            }),
            Err(_e) => defaults.mood_trend_window_days,
        };

        let mood_scale_path = var("MOOD_SCALE_PATH").ok().filter(|p| !p.is_empty());

        let activity_queue_capacity = match var("ACTIVITY_QUEUE_CAPACITY") {
            Ok(v) => match v.parse::<usize>() {
                Ok(capacity) if capacity > 0 => capacity,
                Ok(_) | Err(_) => {
                    panic!("ACTIVITY_QUEUE_CAPACITY should be a whole number above 0: {v}")
                }
            },
            Err(_e) => defaults.activity_queue_capacity,
        };

        Self {
            activity_queue_capacity,
            allowed_origin,
            environment,
            mongodb_uri,
            mood_scale_path,
            mood_trend_window_days,
            port,
            request_body_size_limit,
            request_timeout_in_ms,
            sentry_dsn,
        }
    }

    /// Mood scale from `MOOD_SCALE_PATH`, or the built-in scale
    pub fn load_mood_scale(&self) -> anyhow::Result<MoodScale> {
        use anyhow::Context;

        let Some(path) = &self.mood_scale_path else {
            return Ok(MoodScale::default());
        };
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("unable to read mood scale from {path}"))?;
        let scale = MoodScale::from_json(&json)
            .with_context(|| format!("invalid mood scale in {path}"))?;
        Ok(scale)
    }
}

fn parse_window_days(v: &str) -> Option<i64> {
    v.trim()
        .parse::<i64>()
        .ok()
        .filter(|days| (1..=MAX_WINDOW_DAYS).contains(days))
}

fn valid_sentry_dsn(url: &str) -> bool {
    url.parse::<Dsn>().is_ok()
}
