use crate::domain::entities::{AcquireOutcome, ImportLock, LockStatus};
use crate::domain::errors::DomainResult;
use crate::domain::ports::import_lock_repository::ImportLockRepository;
use async_trait::async_trait;
use dashmap::{mapref::entry::Entry, DashMap};

/// Process-local lock store backed by a sharded map.
///
/// The entry API keeps the shard locked across the expiry check and the
/// takeover, so acquisition is atomic per URL.
#[derive(Default)]
pub struct InMemoryImportLockRepository {
    locks: DashMap<String, ImportLock>,
}

impl InMemoryImportLockRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.locks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locks.is_empty()
    }
}

#[async_trait]
impl ImportLockRepository for InMemoryImportLockRepository {
    async fn find_by_url(&self, url: &str) -> DomainResult<Option<ImportLock>> {
        Ok(self.locks.get(url).map(|lock| lock.value().clone()))
    }

    async fn try_acquire(
        &self,
        url: &str,
        owner_id: &str,
        now: i64,
        timeout_ms: i64,
    ) -> DomainResult<AcquireOutcome> {
        match self.locks.entry(url.to_string()) {
            Entry::Vacant(entry) => {
                let lock = ImportLock::new(url.to_string(), owner_id.to_string(), now);
                let lock_id = lock.id.clone();
                entry.insert(lock);
                Ok(AcquireOutcome::Granted { lock_id })
            }
            Entry::Occupied(mut entry) => {
                let lock = entry.get_mut();
                if lock.is_held(now, timeout_ms) {
                    return Ok(AcquireOutcome::Rejected {
                        holder: lock.holder(),
                    });
                }
                lock.take_over(owner_id, now);
                Ok(AcquireOutcome::Granted {
                    lock_id: lock.id.clone(),
                })
            }
        }
    }

    async fn update_status(&self, url: &str, status: LockStatus) -> DomainResult<bool> {
        match self.locks.get_mut(url) {
            Some(mut lock) => {
                lock.status = status;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete_started_before(&self, cutoff: i64) -> DomainResult<u64> {
        let mut deleted = 0u64;
        self.locks.retain(|_, lock| {
            let keep = lock.started_at >= cutoff;
            if !keep {
                deleted += 1;
            }
            keep
        });
        Ok(deleted)
    }
}
