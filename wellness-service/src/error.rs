use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    Unauthorized(String),
    #[error("{0} not found")]
    NotFound(String),
    // Froms
    #[error("{0}")]
    MongoDB(#[from] mongodb::error::Error),
    #[error("{0}")]
    Analytics(#[from] wellness_utils::error::Error),
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = StatusCode::from(&self);

        let msg = if status.is_server_error() {
            tracing::error!(error = ?self, "request failed");
            "internal server error".to_string()
        } else {
            self.to_string()
        };

        (status, Json(json!({ "error": msg }))).into_response()
    }
}

impl From<&Error> for StatusCode {
    fn from(error: &Error) -> Self {
        match error {
            Error::BadRequest(_) => StatusCode::BAD_REQUEST,
            Error::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Error::NotFound(_) => StatusCode::NOT_FOUND,
            Error::Analytics(wellness_utils::error::Error::InvalidTimeRange(_)) => {
                StatusCode::BAD_REQUEST
            }
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_time_range_is_a_bad_request() {
        let error: Error = "fortnight"
            .parse::<wellness_utils::analytics::TimeRange>()
            .unwrap_err()
            .into();
        assert_eq!(StatusCode::from(&error), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn storage_errors_hide_their_cause() {
        let decode = mongodb::bson::from_document::<schema::MoodEntry>(mongodb::bson::doc! {})
            .unwrap_err();
        let error = Error::MongoDB(decode.into());

        let response = error.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(body, json!({ "error": "internal server error" }));
    }

    #[test]
    fn client_errors_keep_their_message() {
        let error = Error::NotFound("video".to_string());
        assert_eq!(StatusCode::from(&error), StatusCode::NOT_FOUND);
        assert_eq!(error.to_string(), "video not found");
    }
}
