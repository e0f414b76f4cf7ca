use thiserror::Error;

#[derive(Debug, Error)]
pub enum IndexerError {
    #[error("{name} is not set. Please set the {name} environment variable in your .env file.")]
    ConfigurationMissing { name: &'static str },

    #[error("error fetching repositories: HTTP {status}: {body}")]
    ListingRequestFailed { status: u16, body: String },

    #[error("language model call failed: {0}")]
    CategorizationCallFailed(String),

    #[error(transparent)]
    Http(#[from] reqwest::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Config(#[from] config::ConfigError),
}

pub type Result<T> = std::result::Result<T, IndexerError>;
