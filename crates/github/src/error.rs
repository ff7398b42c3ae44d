use thiserror::Error;

#[derive(Debug, Error)]
pub enum GitHubError {
    #[error("API error: {message}")]
    Api {
        message: String,
        status: Option<u16>,
    },

    #[error("Authentication failed: {0}")]
    Authentication(String),

    #[error("Rate limit exceeded, resets at {reset_at}")]
    RateLimitExceeded { reset_at: String },

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Network error: {0}")]
    Network(String),
}

impl GitHubError {
    pub fn api(message: impl Into<String>) -> Self {
        Self::Api {
            message: message.into(),
            status: None,
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            GitHubError::Api { status, .. } => *status,
            GitHubError::Authentication(_) => Some(401),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }
}

impl From<octocrab::Error> for GitHubError {
    fn from(err: octocrab::Error) -> Self {
        match &err {
            octocrab::Error::GitHub { source, .. } => {
                let status = source.status_code.as_u16();
                if source.message.contains("rate limit") {
                    GitHubError::RateLimitExceeded {
                        reset_at: "unknown".to_string(),
                    }
                } else if status == 401 {
                    GitHubError::Authentication(source.message.clone())
                } else {
                    GitHubError::Api {
                        message: source.message.clone(),
                        status: Some(status),
                    }
                }
            }
            octocrab::Error::Hyper { .. }
            | octocrab::Error::Service { .. }
            | octocrab::Error::Http { .. } => GitHubError::Network(err.to_string()),
            _ => GitHubError::api(err.to_string()),
        }
    }
}

pub type Result<T> = std::result::Result<T, GitHubError>;
