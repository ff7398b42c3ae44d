use chrono::{DateTime, TimeZone, Utc};
use pagesmith_core::{FileSet, RepositoryRecord, TaskIdentity};

use crate::error::DbError;

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct RepositoryRecordRow {
    pub submitter: String,
    pub task: String,
    pub owner: String,
    pub repo_name: String,
    pub repo_url: String,
    pub pages_url: String,
    pub default_branch: String,
    pub commit_sha: String,
    /// File set as a JSON object of path to content.
    pub files: String,
    pub updated_at: i64,
}

impl RepositoryRecordRow {
    pub fn into_domain(self) -> Result<RepositoryRecord, DbError> {
        let identity = TaskIdentity::new(self.submitter, self.task);
        let files: FileSet =
            serde_json::from_str(&self.files).map_err(|source| DbError::CorruptFiles {
                identity: identity.to_string(),
                source,
            })?;

        Ok(RepositoryRecord {
            identity,
            owner: self.owner,
            repo_name: self.repo_name,
            repo_url: self.repo_url,
            pages_url: self.pages_url,
            default_branch: self.default_branch,
            commit_sha: self.commit_sha,
            updated_at: timestamp_to_datetime(self.updated_at),
            files,
        })
    }

    pub fn from_domain(record: &RepositoryRecord) -> Result<Self, DbError> {
        Ok(Self {
            submitter: record.identity.submitter.clone(),
            task: record.identity.task.clone(),
            owner: record.owner.clone(),
            repo_name: record.repo_name.clone(),
            repo_url: record.repo_url.clone(),
            pages_url: record.pages_url.clone(),
            default_branch: record.default_branch.clone(),
            commit_sha: record.commit_sha.clone(),
            files: serde_json::to_string(&record.files)?,
            updated_at: record.updated_at.timestamp(),
        })
    }
}

fn timestamp_to_datetime(ts: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(ts, 0).single().unwrap_or_default()
}
