use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExporterError {
    #[error("VSA API error: {0}")]
    VsaApi(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Authentication failed: {0}")]
    Auth(String),

    #[error("Metrics registry error: {0}")]
    Metrics(#[from] prometheus::Error),

    #[error("Unknown state '{state}' for enum metric {metric}")]
    UnknownState { metric: String, state: String },

    #[error("Label mismatch for metric {metric}: expected {expected} values, got {got}")]
    LabelMismatch {
        metric: String,
        expected: usize,
        got: usize,
    },

    #[error("Collector {0} used before its metrics were defined")]
    NotDefined(&'static str),

    #[error("Collector {0} metrics already defined")]
    AlreadyDefined(&'static str),
}

pub type Result<T> = std::result::Result<T, ExporterError>;
