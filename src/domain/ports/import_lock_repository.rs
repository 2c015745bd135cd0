use crate::domain::entities::{AcquireOutcome, ImportLock, LockStatus};
use crate::domain::errors::DomainResult;
use async_trait::async_trait;

/// Storage for import lock records, keyed by source URL.
///
/// Every method is a single atomic step against the store. In particular
/// `try_acquire` must perform its expiry check and its write without another
/// caller observing the state in between.
#[async_trait]
pub trait ImportLockRepository: Send + Sync {
    async fn find_by_url(&self, url: &str) -> DomainResult<Option<ImportLock>>;

    /// Insert a pending lock, or take over an expired or finished one.
    /// A live pending lock is left untouched and reported as the holder.
    async fn try_acquire(
        &self,
        url: &str,
        owner_id: &str,
        now: i64,
        timeout_ms: i64,
    ) -> DomainResult<AcquireOutcome>;

    /// Returns false when no record exists for the URL.
    async fn update_status(&self, url: &str, status: LockStatus) -> DomainResult<bool>;

    /// Delete every record started strictly before `cutoff`, whatever its status.
    async fn delete_started_before(&self, cutoff: i64) -> DomainResult<u64>;
}
