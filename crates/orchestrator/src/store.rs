use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use pagesmith_core::{RepositoryRecord, RepositoryStore, TaskIdentity};
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard, RwLock};

/// Process-lifetime record store. Records are lost on restart.
#[derive(Default)]
pub struct InMemoryRepositoryStore {
    records: RwLock<HashMap<TaskIdentity, RepositoryRecord>>,
}

impl InMemoryRepositoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }
}

#[async_trait]
impl RepositoryStore for InMemoryRepositoryStore {
    async fn get(&self, identity: &TaskIdentity) -> pagesmith_core::Result<Option<RepositoryRecord>> {
        Ok(self.records.read().await.get(identity).cloned())
    }

    async fn put(&self, record: RepositoryRecord) -> pagesmith_core::Result<()> {
        self.records
            .write()
            .await
            .insert(record.identity.clone(), record);
        Ok(())
    }
}

/// One async mutex per task identity.
///
/// Holding the guard gives exclusive access to that identity's record for
/// the read-modify-write cycle of a request.
#[derive(Clone, Default)]
pub struct IdentityLocks {
    locks: Arc<Mutex<HashMap<TaskIdentity, Arc<AsyncMutex<()>>>>>,
}

impl IdentityLocks {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn acquire(&self, identity: &TaskIdentity) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
            // Entries only referenced by the map are idle.
            locks.retain(|key, lock| key == identity || Arc::strong_count(lock) > 1);
            Arc::clone(
                locks
                    .entry(identity.clone())
                    .or_insert_with(|| Arc::new(AsyncMutex::new(()))),
            )
        };

        lock.lock_owned().await
    }

    pub fn tracked(&self) -> usize {
        self.locks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use pagesmith_core::FileSet;
    use std::time::Duration;

    fn record(identity: &TaskIdentity, sha: &str) -> RepositoryRecord {
        RepositoryRecord {
            identity: identity.clone(),
            owner: "octo".to_string(),
            repo_name: "app".to_string(),
            repo_url: "https://github.com/octo/app".to_string(),
            pages_url: "https://octo.github.io/app/".to_string(),
            default_branch: "main".to_string(),
            commit_sha: sha.to_string(),
            updated_at: Utc::now(),
            files: FileSet::new(),
        }
    }

    #[tokio::test]
    async fn test_in_memory_store_put_replaces() {
        let store = InMemoryRepositoryStore::new();
        let identity = TaskIdentity::new("a@x.com", "t1");

        assert!(store.get(&identity).await.unwrap().is_none());

        store.put(record(&identity, "one")).await.unwrap();
        store.put(record(&identity, "two")).await.unwrap();

        let stored = store.get(&identity).await.unwrap().unwrap();
        assert_eq!(stored.commit_sha, "two");
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_identity_lock_is_exclusive() {
        let locks = IdentityLocks::new();
        let identity = TaskIdentity::new("a@x.com", "t1");

        let guard = locks.acquire(&identity).await;

        let contender = {
            let locks = locks.clone();
            let identity = identity.clone();
            tokio::spawn(async move {
                let _guard = locks.acquire(&identity).await;
            })
        };

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!contender.is_finished());

        drop(guard);
        contender.await.unwrap();
    }

    #[tokio::test]
    async fn test_distinct_identities_do_not_block() {
        let locks = IdentityLocks::new();
        let _a = locks.acquire(&TaskIdentity::new("a", "t1")).await;
        let _b = tokio::time::timeout(
            Duration::from_millis(100),
            locks.acquire(&TaskIdentity::new("a", "t2")),
        )
        .await
        .expect("different identity must not wait");
    }

    #[tokio::test]
    async fn test_idle_locks_are_pruned() {
        let locks = IdentityLocks::new();
        for i in 0..5 {
            let _guard = locks.acquire(&TaskIdentity::new("a", format!("t{i}"))).await;
        }
        assert_eq!(locks.tracked(), 1);
    }
}
