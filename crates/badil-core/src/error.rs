use thiserror::Error;

#[derive(Debug, Error)]
pub enum BadilError {
    #[error("Config error: {0}")]
    Config(String),

    /// The backing credential or catalog store cannot be reached. Treated
    /// as fatal by callers; never absorbed into the retry loop.
    #[error("Storage unavailable: {0}")]
    StorageUnavailable(String),

    #[error("Provider error: {0}")]
    Provider(String),

    #[error("Analysis error: {0}")]
    Analysis(String),

    #[error("Media error: {0}")]
    Media(String),

    #[error("Gateway error: {0}")]
    Gateway(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, BadilError>;
