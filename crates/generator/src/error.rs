use thiserror::Error;

/// Errors raised while producing files from a model
#[derive(Debug, Error)]
pub enum GeneratorError {
    #[error("Chat API error: {message}")]
    Api {
        message: String,
        status_code: Option<u16>,
    },

    #[error("Chat API rate limited")]
    RateLimited,

    #[error("Chat API returned no completion")]
    EmptyResponse,

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Result type alias for generator operations
pub type GeneratorResult<T> = Result<T, GeneratorError>;
