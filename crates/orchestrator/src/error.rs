use generator::GeneratorError;
use github::GitHubError;
use pagesmith_core::CoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum OrchestratorError {
    #[error("Invalid secret")]
    Unauthorized,

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Generation failed in round {round}: {source}")]
    Generation {
        round: u32,
        #[source]
        source: GeneratorError,
    },

    #[error("Repository operation failed in round {round}: {source}")]
    Repository {
        round: u32,
        #[source]
        source: GitHubError,
    },

    #[error("No repository found for {identity}; round {round} requires a completed round 1")]
    BaselineNotFound { identity: String, round: u32 },

    #[error("Store error: {0}")]
    Store(#[from] CoreError),
}

impl OrchestratorError {
    pub fn generation(round: u32, source: GeneratorError) -> Self {
        Self::Generation { round, source }
    }

    pub fn repository(round: u32, source: GitHubError) -> Self {
        Self::Repository { round, source }
    }

    /// Name of the pipeline stage that failed.
    pub fn stage(&self) -> &'static str {
        match self {
            Self::Unauthorized => "authorization",
            Self::InvalidRequest(_) => "validation",
            Self::Generation { .. } => "generation",
            Self::Repository { .. } | Self::BaselineNotFound { .. } => "repository",
            Self::Store(_) => "store",
        }
    }

    pub fn round(&self) -> Option<u32> {
        match self {
            Self::Generation { round, .. }
            | Self::Repository { round, .. }
            | Self::BaselineNotFound { round, .. } => Some(*round),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, OrchestratorError>;
