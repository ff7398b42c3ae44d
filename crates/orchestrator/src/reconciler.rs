//! Repository reconciliation
//!
//! Round 1 creates a fresh repository and records its files as the baseline.
//! Later rounds write only the paths they produced and merge them into the
//! stored baseline, so untouched files carry over from round to round.

use std::sync::Arc;

use chrono::Utc;
use github::{CreateRepoRequest, PagesSource, RepoHost, RepoRef, DEFAULT_PAGES_DOMAIN};
use pagesmith_core::{FileSet, RepositoryRecord, RepositoryStore, RoundSpec, TaskIdentity};
use tracing::{debug, info, warn};

use crate::error::{OrchestratorError, Result};
use crate::naming;

/// Commit id reported when the host cannot tell us the latest commit.
pub const UNKNOWN_COMMIT: &str = "unknown";

const README_PATH: &str = "README.md";

#[derive(Debug, Clone)]
pub struct ReconcilerConfig {
    pub pages_domain: String,
    /// Serve this branch instead of the repository's default branch.
    pub pages_branch: Option<String>,
    pub private: bool,
}

impl Default for ReconcilerConfig {
    fn default() -> Self {
        Self {
            pages_domain: DEFAULT_PAGES_DOMAIN.to_string(),
            pages_branch: None,
            private: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconcileOutcome {
    pub repo_name: String,
    pub repo_url: String,
    pub pages_url: String,
    pub commit_sha: String,
}

pub struct Reconciler {
    host: Arc<dyn RepoHost>,
    store: Arc<dyn RepositoryStore>,
    config: ReconcilerConfig,
}

impl Reconciler {
    pub fn new(
        host: Arc<dyn RepoHost>,
        store: Arc<dyn RepositoryStore>,
        config: ReconcilerConfig,
    ) -> Self {
        Self {
            host,
            store,
            config,
        }
    }

    /// Publishes `files` for `round` and records the result for `identity`.
    pub async fn reconcile(
        &self,
        identity: &TaskIdentity,
        round: &RoundSpec,
        files: &FileSet,
    ) -> Result<ReconcileOutcome> {
        if round.is_initial() {
            self.create(identity, round, files).await
        } else {
            self.update(identity, round, files).await
        }
    }

    async fn create(
        &self,
        identity: &TaskIdentity,
        round: &RoundSpec,
        files: &FileSet,
    ) -> Result<ReconcileOutcome> {
        let name = naming::repository_name(&identity.task, Utc::now());
        let mut request = CreateRepoRequest::new(&name).with_description(round.headline());
        if self.config.private {
            request = request.as_private();
        }

        let created = self
            .host
            .create_repository(&request)
            .await
            .map_err(|e| OrchestratorError::repository(round.number, e))?;
        let repo = created.repo;

        info!(
            identity = %identity,
            repo = %repo.full_name(),
            files = files.len(),
            "Created repository"
        );

        for (path, content) in files {
            self.host
                .create_file(&repo, path, &format!("Add {path}"), content)
                .await
                .map_err(|e| OrchestratorError::repository(round.number, e))?;
        }

        if !files.contains(README_PATH) {
            let readme = readme(round, &repo.pages_url(&self.config.pages_domain));
            self.host
                .create_file(&repo, README_PATH, "Add README", &readme)
                .await
                .map_err(|e| OrchestratorError::repository(round.number, e))?;
        }

        let published = Published {
            repo,
            repo_url: created.html_url,
            default_branch: created.default_branch,
        };
        self.finish(identity, round, published, files.clone()).await
    }

    async fn update(
        &self,
        identity: &TaskIdentity,
        round: &RoundSpec,
        files: &FileSet,
    ) -> Result<ReconcileOutcome> {
        let record = self.store.get(identity).await?.ok_or_else(|| {
            OrchestratorError::BaselineNotFound {
                identity: identity.to_string(),
                round: round.number,
            }
        })?;
        let repo = RepoRef::new(&record.owner, &record.repo_name);

        info!(
            identity = %identity,
            repo = %repo.full_name(),
            round = round.number,
            files = files.len(),
            "Updating repository"
        );

        for (path, content) in files {
            let revision = self
                .host
                .file_revision(&repo, path)
                .await
                .map_err(|e| OrchestratorError::repository(round.number, e))?;

            let written = match revision {
                Some(sha) => {
                    let message = format!("Update {path} (round {})", round.number);
                    self.host
                        .update_file(&repo, path, &message, content, &sha)
                        .await
                }
                None => {
                    let message = format!("Add {path} (round {})", round.number);
                    self.host.create_file(&repo, path, &message, content).await
                }
            };
            written.map_err(|e| OrchestratorError::repository(round.number, e))?;
        }

        let baseline = record.files.merged(files);
        let published = Published {
            repo,
            repo_url: record.repo_url,
            default_branch: record.default_branch,
        };
        self.finish(identity, round, published, baseline).await
    }

    async fn finish(
        &self,
        identity: &TaskIdentity,
        round: &RoundSpec,
        published: Published,
        files: FileSet,
    ) -> Result<ReconcileOutcome> {
        let Published {
            repo,
            repo_url,
            default_branch,
        } = published;

        let source = self.pages_source(&default_branch);
        if let Err(e) = self.host.enable_pages(&repo, &source).await {
            warn!(repo = %repo.full_name(), branch = %source.branch, error = %e, "Failed to enable pages");
        }

        let commit_sha = match self.host.latest_commit(&repo).await {
            Ok(Some(sha)) => sha,
            Ok(None) => {
                debug!(repo = %repo.full_name(), "Repository has no commits");
                UNKNOWN_COMMIT.to_string()
            }
            Err(e) => {
                warn!(repo = %repo.full_name(), error = %e, "Failed to fetch latest commit");
                UNKNOWN_COMMIT.to_string()
            }
        };

        let pages_url = repo.pages_url(&self.config.pages_domain);
        let outcome = ReconcileOutcome {
            repo_name: repo.name.clone(),
            repo_url: repo_url.clone(),
            pages_url: pages_url.clone(),
            commit_sha: commit_sha.clone(),
        };

        self.store
            .put(RepositoryRecord {
                identity: identity.clone(),
                owner: repo.owner,
                repo_name: repo.name,
                repo_url,
                pages_url,
                default_branch,
                commit_sha,
                updated_at: Utc::now(),
                files,
            })
            .await?;

        info!(
            identity = %identity,
            round = round.number,
            commit = %outcome.commit_sha,
            "Recorded repository state"
        );

        Ok(outcome)
    }

    fn pages_source(&self, default_branch: &str) -> PagesSource {
        let branch = self.config.pages_branch.as_deref().unwrap_or(default_branch);
        PagesSource::root_of(branch)
    }
}

/// Repository a round wrote to, as known after the writes.
struct Published {
    repo: RepoRef,
    repo_url: String,
    default_branch: String,
}

fn readme(round: &RoundSpec, pages_url: &str) -> String {
    let mut readme = format!("# {}\n\n{}\n", round.headline(), round.brief.trim());

    if !round.checks.is_empty() {
        readme.push_str("\n## Checks\n\n");
        for check in &round.checks {
            readme.push_str(&format!("- {check}\n"));
        }
    }

    readme.push_str(&format!(
        "\n## Live site\n\n{pages_url}\n\nGenerated by pagesmith in round {}.\n",
        round.number
    ));
    readme
}
