use std::sync::Arc;

use generator::{CodeGenerator, GenerationRequest};
use github::RepoHost;
use pagesmith_core::{FileSet, RepositoryStore, RoundSpec, TaskIdentity};
use tracing::{info, instrument, warn};

use crate::error::{OrchestratorError, Result};
use crate::notifier::{NotificationPayload, Notifier};
use crate::reconciler::{Reconciler, ReconcilerConfig};
use crate::request::{DeployRequest, DeployResponse, RoundResult};
use crate::store::IdentityLocks;

pub const DEFAULT_MAX_ROUNDS: usize = 10;

#[derive(Debug, Clone)]
pub struct CoordinatorConfig {
    /// Shared secret every request must carry. An empty secret rejects all requests.
    pub secret: String,
    pub max_rounds: usize,
    pub reconciler: ReconcilerConfig,
}

impl CoordinatorConfig {
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
            max_rounds: DEFAULT_MAX_ROUNDS,
            reconciler: ReconcilerConfig::default(),
        }
    }
}

/// Runs deploy requests: generation, reconciliation and notification per round.
pub struct TaskCoordinator {
    generator: Arc<dyn CodeGenerator>,
    reconciler: Reconciler,
    notifier: Arc<dyn Notifier>,
    store: Arc<dyn RepositoryStore>,
    locks: IdentityLocks,
    config: CoordinatorConfig,
}

impl TaskCoordinator {
    pub fn new(
        config: CoordinatorConfig,
        generator: Arc<dyn CodeGenerator>,
        host: Arc<dyn RepoHost>,
        store: Arc<dyn RepositoryStore>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        let reconciler = Reconciler::new(host, Arc::clone(&store), config.reconciler.clone());
        Self {
            generator,
            reconciler,
            notifier,
            store,
            locks: IdentityLocks::new(),
            config,
        }
    }

    #[instrument(skip_all, fields(task = request.task.as_deref().unwrap_or_default()))]
    pub async fn handle(&self, request: DeployRequest) -> Result<DeployResponse> {
        if !secrets_match(&self.config.secret, &request.secret) {
            warn!("Rejected request with invalid secret");
            return Err(OrchestratorError::Unauthorized);
        }

        if request.round_count() > self.config.max_rounds {
            return Err(OrchestratorError::InvalidRequest(format!(
                "at most {} rounds per request, got {}",
                self.config.max_rounds,
                request.round_count()
            )));
        }

        let rounds = request.round_specs()?;
        let identity = TaskIdentity::resolve(request.email.as_deref(), request.task.as_deref());
        let nonce = request.nonce.clone().unwrap_or_default();
        let callback = request
            .evaluation_url
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty());

        info!(identity = %identity, rounds = rounds.len(), "Handling deploy request");

        let _guard = self.locks.acquire(&identity).await;

        let mut results = Vec::with_capacity(rounds.len());
        for round in &rounds {
            let result = self.run_round(&identity, round, &nonce, callback).await?;
            results.push(result);
        }

        Ok(DeployResponse {
            status: "ok".to_string(),
            email: identity.submitter,
            task: identity.task,
            nonce,
            results,
        })
    }

    async fn run_round(
        &self,
        identity: &TaskIdentity,
        round: &RoundSpec,
        nonce: &str,
        callback: Option<&str>,
    ) -> Result<RoundResult> {
        let existing_files = self.baseline(identity, round).await?;

        let request = GenerationRequest {
            brief: round.brief.clone(),
            checks: round.checks.clone(),
            attachments: round.attachments.clone(),
            existing_files,
            round: round.number,
        };

        let mut files = self
            .generator
            .generate(&request)
            .await
            .map_err(|e| OrchestratorError::generation(round.number, e))?;
        files.overlay(&round.attachments);

        let outcome = self.reconciler.reconcile(identity, round, &files).await?;

        let notified = match callback {
            Some(url) => {
                let payload = NotificationPayload {
                    email: identity.submitter.clone(),
                    task: identity.task.clone(),
                    round: round.number,
                    nonce: nonce.to_string(),
                    repo_url: outcome.repo_url.clone(),
                    commit_sha: outcome.commit_sha.clone(),
                    pages_url: outcome.pages_url.clone(),
                };
                self.notifier.notify(url, &payload).await
            }
            None => false,
        };

        info!(
            identity = %identity,
            round = round.number,
            repo = %outcome.repo_url,
            notified,
            "Round complete"
        );

        Ok(RoundResult {
            round: round.number,
            repo_url: outcome.repo_url,
            pages_url: outcome.pages_url,
            commit_sha: outcome.commit_sha,
            notified,
        })
    }

    /// Files the generator builds on: nothing for round 1, the stored record otherwise.
    async fn baseline(&self, identity: &TaskIdentity, round: &RoundSpec) -> Result<FileSet> {
        if round.is_initial() {
            return Ok(FileSet::new());
        }

        let record = self.store.get(identity).await?.ok_or_else(|| {
            OrchestratorError::BaselineNotFound {
                identity: identity.to_string(),
                round: round.number,
            }
        })?;
        Ok(record.files)
    }
}

/// Compares secrets without short-circuiting on the first differing byte.
fn secrets_match(expected: &str, provided: &str) -> bool {
    let expected = expected.as_bytes();
    let provided = provided.as_bytes();

    if expected.is_empty() || expected.len() != provided.len() {
        return false;
    }

    expected
        .iter()
        .zip(provided)
        .fold(0u8, |diff, (a, b)| diff | (a ^ b))
        == 0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::InMemoryRepositoryStore;
    use crate::testing::{FakeGenerator, FakeNotifier, FakeRepoHost};
    use crate::request::RoundRequest;
    use serde_json::json;
    use std::time::Duration;

    struct Harness {
        host: Arc<FakeRepoHost>,
        generator: Arc<FakeGenerator>,
        notifier: Arc<FakeNotifier>,
        store: Arc<InMemoryRepositoryStore>,
        coordinator: TaskCoordinator,
    }

    fn harness_with(generator: FakeGenerator) -> Harness {
        let host = Arc::new(FakeRepoHost::new("octo"));
        let generator = Arc::new(generator);
        let notifier = Arc::new(FakeNotifier::default());
        let store = Arc::new(InMemoryRepositoryStore::new());
        let coordinator = TaskCoordinator::new(
            CoordinatorConfig::new("s"),
            generator.clone(),
            host.clone(),
            store.clone(),
            notifier.clone(),
        );
        Harness {
            host,
            generator,
            notifier,
            store,
            coordinator,
        }
    }

    fn harness() -> Harness {
        harness_with(FakeGenerator::returning(
            [("index.html", "<html>generated</html>")].into_iter().collect(),
        ))
    }

    fn request(value: serde_json::Value) -> DeployRequest {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_secrets_match() {
        assert!(secrets_match("s3cret", "s3cret"));
        assert!(!secrets_match("s3cret", "s3cres"));
        assert!(!secrets_match("s3cret", "s3cret-longer"));
        assert!(!secrets_match("", ""));
    }

    #[tokio::test]
    async fn test_wrong_secret_makes_no_calls() {
        let h = harness();
        let err = h
            .coordinator
            .handle(request(json!({
                "secret": "wrong",
                "task": "t1",
                "email": "a@x.com",
                "brief": "calculator app",
                "evaluation_url": "https://example.com/cb"
            })))
            .await
            .unwrap_err();

        assert!(matches!(err, OrchestratorError::Unauthorized));
        assert_eq!(h.generator.calls(), 0);
        assert_eq!(h.host.total_calls(), 0);
        assert_eq!(h.notifier.calls(), 0);
        assert!(h.store.is_empty().await);
    }

    #[tokio::test]
    async fn test_first_round_publishes_and_notifies() {
        let h = harness();
        let response = h
            .coordinator
            .handle(request(json!({
                "secret": "s",
                "task": "t1",
                "email": "a@x.com",
                "nonce": "n-1",
                "brief": "calculator app",
                "round": 1,
                "evaluation_url": "https://example.com/cb"
            })))
            .await
            .unwrap();

        assert_eq!(response.status, "ok");
        assert_eq!(response.email, "a@x.com");
        assert_eq!(response.nonce, "n-1");
        assert_eq!(response.results.len(), 1);

        let result = &response.results[0];
        assert_eq!(result.round, 1);
        assert!(!result.repo_url.is_empty());
        assert!(result.pages_url.starts_with("https://octo.github.io/t1-"));
        assert!(result.pages_url.ends_with('/'));
        assert!(result.notified);

        let sent = h.notifier.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].0, "https://example.com/cb");
        assert_eq!(sent[0].1.nonce, "n-1");
        assert_eq!(sent[0].1.repo_url, result.repo_url);
    }

    #[tokio::test]
    async fn test_second_round_without_first_is_not_found() {
        let h = harness();
        let err = h
            .coordinator
            .handle(request(json!({
                "secret": "s", "task": "t1", "email": "a@x.com", "brief": "fix", "round": 2
            })))
            .await
            .unwrap_err();

        assert!(matches!(err, OrchestratorError::BaselineNotFound { round: 2, .. }));
        assert_eq!(h.generator.calls(), 0);
        assert_eq!(h.host.total_calls(), 0);
    }

    #[tokio::test]
    async fn test_second_round_reuses_repository_and_files() {
        let h = harness();
        let first = h
            .coordinator
            .handle(request(json!({
                "secret": "s", "task": "t1", "email": "a@x.com", "brief": "calculator app"
            })))
            .await
            .unwrap();

        let second = h
            .coordinator
            .handle(request(json!({
                "secret": "s", "task": "t1", "email": "a@x.com",
                "brief": "fix the addition bug", "round": 2
            })))
            .await
            .unwrap();

        assert_eq!(second.results[0].round, 2);
        assert_eq!(second.results[0].repo_url, first.results[0].repo_url);
        assert_eq!(h.host.repository_count(), 1);

        let requests = h.generator.requests();
        assert_eq!(requests.len(), 2);
        assert!(requests[0].existing_files.is_empty());
        assert_eq!(
            requests[1].existing_files.get("index.html"),
            Some("<html>generated</html>")
        );
    }

    #[tokio::test]
    async fn test_rounds_in_one_request_chain_file_sets() {
        let h = harness();
        let mut deploy = DeployRequest::new("s", "build it");
        deploy.task = Some("t1".to_string());
        deploy.rounds.push(RoundRequest {
            brief: "add data".to_string(),
            checks: vec![],
            attachments: Some(crate::request::Attachments::Map(
                [("data.json".to_string(), "[1]".to_string())].into_iter().collect(),
            )),
        });

        let response = h.coordinator.handle(deploy).await.unwrap();
        assert_eq!(response.results.len(), 2);
        assert_eq!(response.results[1].round, 2);
        assert!(!response.results[0].notified);

        let identity = TaskIdentity::new(response.email.clone(), "t1");
        let after_first_round: FileSet = [("index.html", "<html>generated</html>")].into_iter().collect();
        let requests = h.generator.requests();
        assert_eq!(requests[1].existing_files, after_first_round);

        let record = h.store.get(&identity).await.unwrap().unwrap();
        assert_eq!(record.files.get("data.json"), Some("[1]"));
        assert_eq!(h.notifier.calls(), 0);
    }

    #[tokio::test]
    async fn test_attachments_win_over_generated_files() {
        let h = harness();
        let response = h
            .coordinator
            .handle(request(json!({
                "secret": "s", "task": "t1", "email": "a@x.com", "brief": "b",
                "attachments": { "index.html": "<html>attached</html>" }
            })))
            .await
            .unwrap();

        let identity = TaskIdentity::new("a@x.com", "t1");
        let record = h.store.get(&identity).await.unwrap().unwrap();
        assert_eq!(record.files.get("index.html"), Some("<html>attached</html>"));
        assert_eq!(record.repo_url, response.results[0].repo_url);
    }

    #[tokio::test]
    async fn test_generation_failure_aborts_request() {
        let h = harness_with(FakeGenerator::failing());
        let err = h
            .coordinator
            .handle(request(json!({ "secret": "s", "task": "t1", "brief": "b" })))
            .await
            .unwrap_err();

        assert!(matches!(err, OrchestratorError::Generation { round: 1, .. }));
        assert_eq!(h.host.total_calls(), 0);
        assert!(h.store.is_empty().await);
    }

    #[tokio::test]
    async fn test_too_many_rounds_is_invalid() {
        let h = harness();
        let mut deploy = DeployRequest::new("s", "b");
        deploy.rounds = vec![RoundRequest::default(); DEFAULT_MAX_ROUNDS];

        let err = h.coordinator.handle(deploy).await.unwrap_err();
        assert!(matches!(err, OrchestratorError::InvalidRequest(_)));
        assert_eq!(h.generator.calls(), 0);
    }

    #[tokio::test]
    async fn test_missing_identity_is_generated() {
        let h = harness();
        let response = h
            .coordinator
            .handle(request(json!({ "secret": "s", "brief": "b" })))
            .await
            .unwrap();

        assert!(response.email.starts_with("anonymous-"));
        assert!(response.task.starts_with("task-"));
    }

    #[tokio::test]
    async fn test_concurrent_later_rounds_keep_each_others_files() {
        fn files(pairs: &[(&str, &str)]) -> FileSet {
            pairs.iter().copied().collect()
        }

        let h = harness_with(
            FakeGenerator::by_brief([
                ("build", files(&[("index.html", "v1")])),
                ("add chart", files(&[("chart.js", "chart()")])),
                ("add table", files(&[("table.js", "table()")])),
            ])
            .with_delay(Duration::from_millis(20)),
        );
        let round = |brief: &str, number: u32| {
            request(json!({
                "secret": "s",
                "task": "t1",
                "email": "a@x.com",
                "brief": brief,
                "round": number
            }))
        };

        h.coordinator.handle(round("build", 1)).await.unwrap();
        let (chart, table) = tokio::join!(
            h.coordinator.handle(round("add chart", 2)),
            h.coordinator.handle(round("add table", 2)),
        );
        chart.unwrap();
        table.unwrap();

        let record = h
            .store
            .get(&TaskIdentity::new("a@x.com", "t1"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(
            record.files,
            files(&[("chart.js", "chart()"), ("index.html", "v1"), ("table.js", "table()")])
        );

        let requests = h.generator.requests();
        assert_eq!(requests.len(), 3);
        let last = &requests[2];
        assert!(last.existing_files.contains("chart.js") || last.existing_files.contains("table.js"));
    }
}
