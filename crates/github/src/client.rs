use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use octocrab::Octocrab;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{GitHubError, Result};
use crate::traits::RepoHost;
use crate::types::{CreateRepoRequest, CreatedRepository, PagesSource, RepoRef};

pub struct GitHubClient {
    octocrab: Octocrab,
}

impl GitHubClient {
    pub fn new(token: &str) -> Result<Self> {
        let octocrab = Octocrab::builder()
            .personal_token(token.to_string())
            .build()
            .map_err(|e| GitHubError::Config(e.to_string()))?;

        Ok(Self { octocrab })
    }

    /// Client for GitHub Enterprise or a mock API at `base_uri`.
    pub fn with_base_uri(token: &str, base_uri: &str) -> Result<Self> {
        let octocrab = Octocrab::builder()
            .personal_token(token.to_string())
            .base_uri(base_uri)
            .map_err(|e| GitHubError::Config(e.to_string()))?
            .build()
            .map_err(|e| GitHubError::Config(e.to_string()))?;

        Ok(Self { octocrab })
    }
}

#[derive(Debug, Deserialize)]
struct RepositoryResponse {
    name: String,
    html_url: String,
    owner: OwnerResponse,
    default_branch: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OwnerResponse {
    login: String,
}

#[derive(Debug, Deserialize)]
struct ContentResponse {
    sha: String,
}

#[derive(Debug, Deserialize)]
struct CommitResponse {
    sha: String,
}

#[derive(Serialize)]
struct CreateRepoBody<'a> {
    name: &'a str,
    description: &'a str,
    private: bool,
    auto_init: bool,
}

#[derive(Serialize)]
struct PutContentBody<'a> {
    message: &'a str,
    content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    sha: Option<&'a str>,
}

#[derive(Serialize)]
struct PagesBody<'a> {
    source: &'a PagesSource,
}

#[derive(Serialize)]
struct PageParams {
    per_page: u8,
}

fn contents_route(repo: &RepoRef, path: &str) -> String {
    format!(
        "/repos/{}/{}/contents/{}",
        repo.owner,
        repo.name,
        encode_path(path.trim_start_matches('/'))
    )
}

/// Percent-encodes each path segment, keeping `/` separators.
fn encode_path(path: &str) -> String {
    path.split('/')
        .map(|segment| urlencoding::encode(segment))
        .collect::<Vec<_>>()
        .join("/")
}

impl GitHubClient {
    async fn put_content(&self, repo: &RepoRef, path: &str, body: &PutContentBody<'_>) -> Result<()> {
        let _: serde_json::Value = self
            .octocrab
            .put(contents_route(repo, path), Some(body))
            .await?;
        Ok(())
    }
}

#[async_trait]
impl RepoHost for GitHubClient {
    async fn create_repository(&self, request: &CreateRepoRequest) -> Result<CreatedRepository> {
        info!("Creating repository: {}", request.name);

        let body = CreateRepoBody {
            name: &request.name,
            description: &request.description,
            private: request.private,
            auto_init: false,
        };

        let repo: RepositoryResponse = self.octocrab.post("/user/repos", Some(&body)).await?;

        Ok(CreatedRepository {
            repo: RepoRef::new(repo.owner.login, repo.name),
            html_url: repo.html_url,
            default_branch: repo.default_branch.unwrap_or_else(|| "main".to_string()),
        })
    }

    async fn file_revision(&self, repo: &RepoRef, path: &str) -> Result<Option<String>> {
        debug!("Looking up {} in {}", path, repo.full_name());

        let result: std::result::Result<ContentResponse, octocrab::Error> = self
            .octocrab
            .get(contents_route(repo, path), None::<&()>)
            .await;

        match result {
            Ok(content) => Ok(Some(content.sha)),
            Err(err) => {
                let err = GitHubError::from(err);
                if err.is_not_found() {
                    Ok(None)
                } else {
                    Err(err)
                }
            }
        }
    }

    async fn create_file(&self, repo: &RepoRef, path: &str, message: &str, content: &str) -> Result<()> {
        debug!("Creating {} in {}", path, repo.full_name());

        let body = PutContentBody {
            message,
            content: BASE64.encode(content),
            sha: None,
        };
        self.put_content(repo, path, &body).await
    }

    async fn update_file(
        &self,
        repo: &RepoRef,
        path: &str,
        message: &str,
        content: &str,
        revision: &str,
    ) -> Result<()> {
        debug!("Updating {} in {} (sha {})", path, repo.full_name(), revision);

        let body = PutContentBody {
            message,
            content: BASE64.encode(content),
            sha: Some(revision),
        };
        self.put_content(repo, path, &body).await
    }

    async fn latest_commit(&self, repo: &RepoRef) -> Result<Option<String>> {
        let commits: Vec<CommitResponse> = self
            .octocrab
            .get(
                format!("/repos/{}/{}/commits", repo.owner, repo.name),
                Some(&PageParams { per_page: 1 }),
            )
            .await?;

        Ok(commits.into_iter().next().map(|c| c.sha))
    }

    async fn enable_pages(&self, repo: &RepoRef, source: &PagesSource) -> Result<()> {
        info!(
            "Enabling pages for {} from {}:{}",
            repo.full_name(),
            source.branch,
            source.path
        );

        let result: std::result::Result<serde_json::Value, octocrab::Error> = self
            .octocrab
            .post(
                format!("/repos/{}/{}/pages", repo.owner, repo.name),
                Some(&PagesBody { source }),
            )
            .await;

        match result {
            Ok(_) => Ok(()),
            Err(err) => {
                let err = GitHubError::from(err);
                if err.status() == Some(409) {
                    debug!("Pages already enabled for {}", repo.full_name());
                    Ok(())
                } else {
                    Err(err)
                }
            }
        }
    }
}
