use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use db::SqliteRepositoryStore;
use generator::LlmCodeGenerator;
use github::GitHubClient;
use orchestrator::{
    CoordinatorConfig, HttpNotifier, InMemoryRepositoryStore, ReconcilerConfig, TaskCoordinator,
};
use pagesmith_core::RepositoryStore;
use tracing::info;

use crate::config::ServerConfig;

#[derive(Clone)]
pub struct AppState {
    pub coordinator: Arc<TaskCoordinator>,
}

impl AppState {
    pub fn new(coordinator: TaskCoordinator) -> Self {
        Self {
            coordinator: Arc::new(coordinator),
        }
    }

    /// Wires the production collaborators described by `config`.
    pub async fn from_config(config: &ServerConfig) -> anyhow::Result<Self> {
        let generator = LlmCodeGenerator::new(config.llm.clone())
            .context("Failed to create code generator")?;

        let host = match &config.github.api_url {
            Some(url) => GitHubClient::with_base_uri(&config.github.token, url),
            None => GitHubClient::new(&config.github.token),
        }
        .context("Failed to create GitHub client")?;

        let store: Arc<dyn RepositoryStore> = match &config.database_url {
            Some(url) => {
                let pool = db::connect(url)
                    .await
                    .context("Failed to open record database")?;
                info!("Using SQLite repository records");
                Arc::new(SqliteRepositoryStore::new(pool))
            }
            None => {
                info!("Using in-memory repository records");
                Arc::new(InMemoryRepositoryStore::new())
            }
        };

        let notifier = HttpNotifier::new(Duration::from_secs(config.notify_timeout_secs));

        let coordinator_config = CoordinatorConfig {
            secret: config.secret.clone(),
            max_rounds: config.max_rounds,
            reconciler: ReconcilerConfig {
                pages_domain: config.github.pages_domain.clone(),
                pages_branch: config.github.pages_branch.clone(),
                private: config.github.private_repos,
            },
        };

        Ok(Self::new(TaskCoordinator::new(
            coordinator_config,
            Arc::new(generator),
            Arc::new(host),
            store,
            Arc::new(notifier),
        )))
    }
}
