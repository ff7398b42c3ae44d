use async_trait::async_trait;

use crate::domain::identity::TaskIdentity;
use crate::domain::record::RepositoryRecord;
use crate::error::Result;

/// Keyed storage for repository records.
///
/// Implementations only need to provide last-writer-wins semantics per
/// identity; callers serialize writers for the same identity themselves.
#[async_trait]
pub trait RepositoryStore: Send + Sync {
    async fn get(&self, identity: &TaskIdentity) -> Result<Option<RepositoryRecord>>;

    /// Inserts or replaces the record for `record.identity`.
    async fn put(&self, record: RepositoryRecord) -> Result<()>;
}
