use thiserror::Error;

/// Main error type for the analytics backend
#[derive(Error, Debug)]
pub enum CourtlineError {
    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    // Database errors
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    // Network errors
    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Upstream returned {status} for {endpoint}")]
    UpstreamStatus {
        endpoint: String,
        status: reqwest::StatusCode,
    },

    // Serialization errors
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    // Ingestion errors
    #[error("Missing reference: {entity} api_id {api_id} not ingested yet")]
    MissingReference { entity: &'static str, api_id: i64 },

    #[error("Invalid date: {0}")]
    InvalidDate(String),

    // Metrics errors
    #[error("Unknown market: {0}")]
    InvalidMarket(String),

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // Generic errors
    #[error("Internal error: {0}")]
    Internal(String),

    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

/// Result type alias for CourtlineError
pub type Result<T> = std::result::Result<T, CourtlineError>;
