use crate::domain::entities::{
    AcquireOutcome, ImportLock, LockStatus, ReleaseStatus, SweepResult, DEFAULT_LOCK_TIMEOUT_MS,
};
use crate::domain::errors::DomainResult;
use crate::domain::ports::import_lock_repository::ImportLockRepository;
use crate::domain::ports::time_service::TimeService;
use std::sync::Arc;

/// Coordinates recipe imports so that only one runs per source URL.
///
/// Liveness comes solely from `lock_timeout_ms`: a pending lock that is not
/// released in time can be taken over by the next caller and is removed by
/// the next sweep.
#[derive(Clone)]
pub struct ImportLockService {
    repo: Arc<dyn ImportLockRepository>,
    time_service: Arc<dyn TimeService>,
    lock_timeout_ms: i64,
}

impl ImportLockService {
    pub fn new(repo: Arc<dyn ImportLockRepository>, time_service: Arc<dyn TimeService>) -> Self {
        Self::with_timeout(repo, time_service, DEFAULT_LOCK_TIMEOUT_MS)
    }

    pub fn with_timeout(
        repo: Arc<dyn ImportLockRepository>,
        time_service: Arc<dyn TimeService>,
        lock_timeout_ms: i64,
    ) -> Self {
        Self {
            repo,
            time_service,
            lock_timeout_ms,
        }
    }

    pub fn lock_timeout_ms(&self) -> i64 {
        self.lock_timeout_ms
    }

    /// Current lock for `url`, hiding pending locks that have timed out.
    pub async fn inspect(&self, url: &str) -> DomainResult<Option<ImportLock>> {
        let now = self.time_service.now_millis();
        let lock = self.repo.find_by_url(url).await?;

        Ok(lock.filter(|lock| {
            lock.status.is_terminal() || !lock.is_expired(now, self.lock_timeout_ms)
        }))
    }

    pub async fn acquire(&self, url: &str, owner_id: &str) -> DomainResult<AcquireOutcome> {
        let now = self.time_service.now_millis();
        let outcome = self
            .repo
            .try_acquire(url, owner_id, now, self.lock_timeout_ms)
            .await?;

        match &outcome {
            AcquireOutcome::Granted { lock_id } => {
                metrics::counter!("import_lock_acquired_total").increment(1);
                tracing::info!(
                    "Import lock granted: url={}, owner={}, lock_id={}",
                    url,
                    owner_id,
                    lock_id
                );
            }
            AcquireOutcome::Rejected { holder } => {
                metrics::counter!("import_lock_rejected_total").increment(1);
                tracing::debug!(
                    "Import already in progress: url={}, requested_by={}, held_by={}, age_ms={}",
                    url,
                    owner_id,
                    holder.owner_id,
                    now - holder.started_at
                );
            }
        }

        Ok(outcome)
    }

    /// Records the outcome of an import. Releasing a URL with no lock is a no-op.
    pub async fn release(&self, url: &str, status: ReleaseStatus) -> DomainResult<()> {
        let status = LockStatus::from(status);
        let updated = self.repo.update_status(url, status).await?;

        if updated {
            metrics::counter!("import_lock_released_total", "status" => status.as_str())
                .increment(1);
            tracing::info!("Import lock released: url={}, status={}", url, status);
        } else {
            tracing::debug!("Release for unknown import lock ignored: url={}", url);
        }

        Ok(())
    }

    /// Deletes every lock older than the timeout window, whatever its status.
    pub async fn sweep_expired(&self) -> DomainResult<SweepResult> {
        let cutoff = self.time_service.now_millis() - self.lock_timeout_ms;
        let deleted_count = self.repo.delete_started_before(cutoff).await?;

        if deleted_count > 0 {
            metrics::counter!("import_lock_swept_total").increment(deleted_count);
            tracing::info!("Swept {} stale import locks", deleted_count);
        }

        Ok(SweepResult { deleted_count })
    }
}
