//! In-process fakes for the orchestrator's collaborators.
//!
//! Each fake counts its calls so tests can assert that a rejected request
//! never reached the model, the repository host or the callback endpoint.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use generator::{CodeGenerator, GenerationRequest, GeneratorError, GeneratorResult};
use github::{CreateRepoRequest, CreatedRepository, GitHubError, PagesSource, RepoHost, RepoRef};
use pagesmith_core::FileSet;

use crate::notifier::{NotificationPayload, Notifier};

#[derive(Default)]
struct HostState {
    repos: HashMap<String, FileSet>,
    revisions: HashMap<(String, String), String>,
    commits: usize,
    pages_branches: Vec<String>,
}

/// Repository host that keeps repositories in memory.
pub struct FakeRepoHost {
    owner: String,
    default_branch: String,
    state: Mutex<HostState>,
    fail_create: bool,
    fail_pages: bool,
    fail_commits: bool,
    create_repo_calls: AtomicUsize,
    create_file_calls: AtomicUsize,
    update_calls: AtomicUsize,
    revision_calls: AtomicUsize,
    commit_calls: AtomicUsize,
    pages_calls: AtomicUsize,
}

impl FakeRepoHost {
    pub fn new(owner: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            default_branch: "main".to_string(),
            state: Mutex::default(),
            fail_create: false,
            fail_pages: false,
            fail_commits: false,
            create_repo_calls: AtomicUsize::new(0),
            create_file_calls: AtomicUsize::new(0),
            update_calls: AtomicUsize::new(0),
            revision_calls: AtomicUsize::new(0),
            commit_calls: AtomicUsize::new(0),
            pages_calls: AtomicUsize::new(0),
        }
    }

    /// Branch reported for newly created repositories.
    pub fn with_default_branch(mut self, branch: impl Into<String>) -> Self {
        self.default_branch = branch.into();
        self
    }

    pub fn failing_create(mut self) -> Self {
        self.fail_create = true;
        self
    }

    pub fn failing_pages(mut self) -> Self {
        self.fail_pages = true;
        self
    }

    pub fn failing_commits(mut self) -> Self {
        self.fail_commits = true;
        self
    }

    /// Current files of repository `name`.
    pub fn files(&self, name: &str) -> FileSet {
        self.state()
            .repos
            .get(name)
            .cloned()
            .unwrap_or_default()
    }

    pub fn repository_count(&self) -> usize {
        self.state().repos.len()
    }

    pub fn create_repo_calls(&self) -> usize {
        self.create_repo_calls.load(Ordering::SeqCst)
    }

    pub fn create_file_calls(&self) -> usize {
        self.create_file_calls.load(Ordering::SeqCst)
    }

    pub fn update_calls(&self) -> usize {
        self.update_calls.load(Ordering::SeqCst)
    }

    pub fn pages_calls(&self) -> usize {
        self.pages_calls.load(Ordering::SeqCst)
    }

    /// Branches passed to `enable_pages`, in call order.
    pub fn pages_branches(&self) -> Vec<String> {
        self.state().pages_branches.clone()
    }

    pub fn total_calls(&self) -> usize {
        self.create_repo_calls()
            + self.create_file_calls()
            + self.update_calls()
            + self.revision_calls.load(Ordering::SeqCst)
            + self.commit_calls.load(Ordering::SeqCst)
            + self.pages_calls()
    }

    fn state(&self) -> std::sync::MutexGuard<'_, HostState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self, repo: &RepoRef, path: &str, content: &str) -> github::Result<()> {
        let mut state = self.state();
        state.commits += 1;
        let revision = format!("rev-{}", state.commits);

        let files = state.repos.get_mut(&repo.name).ok_or_else(|| GitHubError::Api {
            message: "Not Found".to_string(),
            status: Some(404),
        })?;
        files.insert(path, content);
        state
            .revisions
            .insert((repo.name.clone(), path.to_string()), revision);
        Ok(())
    }
}

#[async_trait]
impl RepoHost for FakeRepoHost {
    async fn create_repository(&self, request: &CreateRepoRequest) -> github::Result<CreatedRepository> {
        self.create_repo_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_create {
            return Err(GitHubError::Api {
                message: "Repository creation failed".to_string(),
                status: Some(422),
            });
        }

        self.state()
            .repos
            .insert(request.name.clone(), FileSet::new());

        let repo = RepoRef::new(&self.owner, &request.name);
        Ok(CreatedRepository {
            html_url: format!("https://github.com/{}", repo.full_name()),
            repo,
            default_branch: "main".to_string(),
        })
    }

    async fn file_revision(&self, repo: &RepoRef, path: &str) -> github::Result<Option<String>> {
        self.revision_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .state()
            .revisions
            .get(&(repo.name.clone(), path.to_string()))
            .cloned())
    }

    async fn create_file(&self, repo: &RepoRef, path: &str, _message: &str, content: &str) -> github::Result<()> {
        self.create_file_calls.fetch_add(1, Ordering::SeqCst);
        self.write(repo, path, content)
    }

    async fn update_file(
        &self,
        repo: &RepoRef,
        path: &str,
        _message: &str,
        content: &str,
        revision: &str,
    ) -> github::Result<()> {
        self.update_calls.fetch_add(1, Ordering::SeqCst);
        let current = self
            .state()
            .revisions
            .get(&(repo.name.clone(), path.to_string()))
            .cloned();
        if current.as_deref() != Some(revision) {
            return Err(GitHubError::Api {
                message: format!("{path} does not match {revision}"),
                status: Some(409),
            });
        }
        self.write(repo, path, content)
    }

    async fn latest_commit(&self, _repo: &RepoRef) -> github::Result<Option<String>> {
        self.commit_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_commits {
            return Err(GitHubError::api("commit listing unavailable"));
        }
        let commits = self.state().commits;
        Ok((commits > 0).then(|| format!("commit-{commits}")))
    }

    async fn enable_pages(&self, _repo: &RepoRef, source: &PagesSource) -> github::Result<()> {
        self.pages_calls.fetch_add(1, Ordering::SeqCst);
        self.state().pages_branches.push(source.branch.clone());
        if self.fail_pages {
            return Err(GitHubError::Api {
                message: "Pages unavailable".to_string(),
                status: Some(422),
            });
        }
        Ok(())
    }
}

/// Generator returning fixed files and recording every request it receives.
pub struct FakeGenerator {
    files: FileSet,
    by_brief: HashMap<String, FileSet>,
    delay: Option<Duration>,
    fail: bool,
    requests: Mutex<Vec<GenerationRequest>>,
}

impl FakeGenerator {
    pub fn returning(files: FileSet) -> Self {
        Self {
            files,
            by_brief: HashMap::new(),
            delay: None,
            fail: false,
            requests: Mutex::default(),
        }
    }

    /// Answers each brief with its own files; unknown briefs get an empty set.
    pub fn by_brief<B: Into<String>>(outputs: impl IntoIterator<Item = (B, FileSet)>) -> Self {
        let mut generator = Self::returning(FileSet::new());
        generator.by_brief = outputs
            .into_iter()
            .map(|(brief, files)| (brief.into(), files))
            .collect();
        generator
    }

    pub fn failing() -> Self {
        let mut generator = Self::returning(FileSet::new());
        generator.fail = true;
        generator
    }

    /// Sleeps before answering, so concurrent requests overlap.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> usize {
        self.requests().len()
    }

    pub fn requests(&self) -> Vec<GenerationRequest> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl CodeGenerator for FakeGenerator {
    async fn generate(&self, request: &GenerationRequest) -> GeneratorResult<FileSet> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(request.clone());

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail {
            return Err(GeneratorError::EmptyResponse);
        }
        Ok(self
            .by_brief
            .get(&request.brief)
            .cloned()
            .unwrap_or_else(|| self.files.clone()))
    }
}

/// Notifier recording payloads and answering with a fixed result.
pub struct FakeNotifier {
    delivered: bool,
    sent: Mutex<Vec<(String, NotificationPayload)>>,
}

impl FakeNotifier {
    pub fn new(delivered: bool) -> Self {
        Self {
            delivered,
            sent: Mutex::default(),
        }
    }

    pub fn calls(&self) -> usize {
        self.sent().len()
    }

    pub fn sent(&self) -> Vec<(String, NotificationPayload)> {
        self.sent
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl Default for FakeNotifier {
    fn default() -> Self {
        Self::new(true)
    }
}

#[async_trait]
impl Notifier for FakeNotifier {
    async fn notify(&self, url: &str, payload: &NotificationPayload) -> bool {
        self.sent
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((url.to_string(), payload.clone()));
        self.delivered
    }
}
