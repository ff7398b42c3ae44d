use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Store error: {0}")]
    Store(String),
}

pub type Result<T> = std::result::Result<T, CoreError>;
