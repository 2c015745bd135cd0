use super::ImportLockService;
use crate::domain::entities::{AcquireOutcome, LockHolder, ReleaseStatus};
use crate::domain::errors::DomainResult;
use std::fmt::Display;
use std::future::Future;

/// Result of running an import under the URL's lock.
#[derive(Debug)]
pub enum ImportRun<T, E> {
    /// The lock was granted and the work ran to completion or failure.
    Finished(Result<T, E>),
    /// Another import for the URL holds the lock; the work did not run.
    AlreadyInProgress(LockHolder),
}

impl<T, E> ImportRun<T, E> {
    pub fn is_finished(&self) -> bool {
        matches!(self, ImportRun::Finished(_))
    }
}

impl ImportLockService {
    /// Acquire, run `work`, release with its outcome, then sweep stale locks.
    ///
    /// Errors from the lock store abort before `work` runs or surface after it
    /// has finished; a failing sweep is only logged.
    pub async fn run_import<F, Fut, T, E>(
        &self,
        url: &str,
        owner_id: &str,
        work: F,
    ) -> DomainResult<ImportRun<T, E>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Display,
    {
        match self.acquire(url, owner_id).await? {
            AcquireOutcome::Rejected { holder } => Ok(ImportRun::AlreadyInProgress(holder)),
            AcquireOutcome::Granted { .. } => {
                let result = work().await;

                let status = match &result {
                    Ok(_) => ReleaseStatus::Completed,
                    Err(e) => {
                        tracing::warn!("Import of {} failed: {}", url, e);
                        ReleaseStatus::Failed
                    }
                };
                self.release(url, status).await?;

                if let Err(e) = self.sweep_expired().await {
                    tracing::error!("Failed to sweep stale import locks: {}", e);
                }

                Ok(ImportRun::Finished(result))
            }
        }
    }
}
