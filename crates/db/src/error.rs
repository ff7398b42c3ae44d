use pagesmith_core::CoreError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DbError {
    #[error("Database error: {0}")]
    Sqlx(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("Corrupt file set for {identity}: {source}")]
    CorruptFiles {
        identity: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<DbError> for CoreError {
    fn from(err: DbError) -> Self {
        CoreError::Store(err.to_string())
    }
}
