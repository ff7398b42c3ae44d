use crate::error::DbError;
use crate::models::RepositoryRecordRow;
use async_trait::async_trait;
use chrono::Utc;
use pagesmith_core::{RepositoryRecord, RepositoryStore, TaskIdentity};
use sqlx::SqlitePool;
use tracing::debug;

/// `RepositoryStore` persisted in SQLite, keyed by (submitter, task).
#[derive(Clone)]
pub struct SqliteRepositoryStore {
    pool: SqlitePool,
}

impl SqliteRepositoryStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn find(&self, identity: &TaskIdentity) -> Result<Option<RepositoryRecord>, DbError> {
        let row: Option<RepositoryRecordRow> = sqlx::query_as(
            r#"
            SELECT submitter, task, owner, repo_name, repo_url, pages_url, default_branch,
                   commit_sha, files, updated_at
            FROM repository_records
            WHERE submitter = ? AND task = ?
            "#,
        )
        .bind(&identity.submitter)
        .bind(&identity.task)
        .fetch_optional(&self.pool)
        .await?;

        row.map(RepositoryRecordRow::into_domain).transpose()
    }

    pub async fn upsert(&self, record: &RepositoryRecord) -> Result<(), DbError> {
        let row = RepositoryRecordRow::from_domain(record)?;

        sqlx::query(
            r#"
            INSERT INTO repository_records
                (submitter, task, owner, repo_name, repo_url, pages_url, default_branch,
                 commit_sha, files, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT (submitter, task) DO UPDATE SET
                owner = excluded.owner,
                repo_name = excluded.repo_name,
                repo_url = excluded.repo_url,
                pages_url = excluded.pages_url,
                default_branch = excluded.default_branch,
                commit_sha = excluded.commit_sha,
                files = excluded.files,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(&row.submitter)
        .bind(&row.task)
        .bind(&row.owner)
        .bind(&row.repo_name)
        .bind(&row.repo_url)
        .bind(&row.pages_url)
        .bind(&row.default_branch)
        .bind(&row.commit_sha)
        .bind(&row.files)
        .bind(Utc::now().timestamp())
        .bind(row.updated_at)
        .execute(&self.pool)
        .await?;

        debug!(identity = %record.identity, repo = %record.repo_name, "Stored repository record");
        Ok(())
    }

    pub async fn count(&self) -> Result<i64, DbError> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM repository_records")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

#[async_trait]
impl RepositoryStore for SqliteRepositoryStore {
    async fn get(&self, identity: &TaskIdentity) -> pagesmith_core::Result<Option<RepositoryRecord>> {
        Ok(self.find(identity).await?)
    }

    async fn put(&self, record: RepositoryRecord) -> pagesmith_core::Result<()> {
        Ok(self.upsert(&record).await?)
    }
}
