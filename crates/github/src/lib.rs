pub mod client;
pub mod error;
pub mod traits;
pub mod types;

pub use client::GitHubClient;
pub use error::{GitHubError, Result};
pub use traits::RepoHost;
pub use types::{CreateRepoRequest, CreatedRepository, PagesSource, RepoRef, DEFAULT_PAGES_DOMAIN};
