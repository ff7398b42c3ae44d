use async_trait::async_trait;

use crate::error::Result;
use crate::types::{CreateRepoRequest, CreatedRepository, PagesSource, RepoRef};

/// Operations the reconciler needs from a source-hosting service.
#[async_trait]
pub trait RepoHost: Send + Sync {
    /// Creates a repository owned by the authenticated account.
    async fn create_repository(&self, request: &CreateRepoRequest) -> Result<CreatedRepository>;

    /// Revision marker (blob sha) of `path` on the default branch, or `None`
    /// when the file does not exist.
    async fn file_revision(&self, repo: &RepoRef, path: &str) -> Result<Option<String>>;

    async fn create_file(&self, repo: &RepoRef, path: &str, message: &str, content: &str) -> Result<()>;

    /// Overwrites `path`; `revision` must be the sha of the content being replaced.
    async fn update_file(
        &self,
        repo: &RepoRef,
        path: &str,
        message: &str,
        content: &str,
        revision: &str,
    ) -> Result<()>;

    async fn latest_commit(&self, repo: &RepoRef) -> Result<Option<String>>;

    /// Turns on static hosting. Succeeds when hosting is already enabled.
    async fn enable_pages(&self, repo: &RepoRef, source: &PagesSource) -> Result<()>;
}
