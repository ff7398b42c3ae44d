use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::files::FileSet;
use super::identity::TaskIdentity;

/// Published state for a task identity, created by round 1 and updated in
/// place by every later round.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositoryRecord {
    pub identity: TaskIdentity,
    pub owner: String,
    pub repo_name: String,
    pub repo_url: String,
    pub pages_url: String,
    /// Branch the repository was created with; the static site serves it.
    pub default_branch: String,
    pub commit_sha: String,
    pub updated_at: DateTime<Utc>,
    pub files: FileSet,
}
