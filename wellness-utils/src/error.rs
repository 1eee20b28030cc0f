#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("invalid time range '{0}': expected one of week, month, quarter, year, all")]
    InvalidTimeRange(String),
    #[error("{0}")]
    InvalidScale(String),
    // Froms
    #[error("{0}")]
    Json(#[from] serde_json::Error),
    #[error("{0}")]
    Csv(#[from] csv::Error),
    #[error("{0}")]
    Utf8(#[from] std::string::FromUtf8Error),
}
