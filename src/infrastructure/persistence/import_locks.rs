use crate::domain::entities::{AcquireOutcome, ImportLock, LockStatus};
use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::ports::import_lock_repository::ImportLockRepository;
use crate::infrastructure::persistence::Database;
use async_trait::async_trait;
use sqlx::{any::AnyRow, Row};

// A sweep can delete the holder between the upsert and the read-back.
const MAX_ACQUIRE_ATTEMPTS: usize = 3;

fn row_to_import_lock(row: &AnyRow) -> DomainResult<ImportLock> {
    let status: String = row.try_get("status")?;
    Ok(ImportLock {
        id: row.try_get("id")?,
        url: row.try_get("url")?,
        owner_id: row.try_get("owner_id")?,
        started_at: row.try_get("started_at")?,
        status: LockStatus::try_from(status).map_err(DomainError::Internal)?,
    })
}

#[async_trait]
impl ImportLockRepository for Database {
    async fn find_by_url(&self, url: &str) -> DomainResult<Option<ImportLock>> {
        let row = sqlx::query(
            "SELECT id, url, owner_id, started_at, status
             FROM import_locks
             WHERE url = ?",
        )
        .bind(url)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(row_to_import_lock).transpose()
    }

    async fn try_acquire(
        &self,
        url: &str,
        owner_id: &str,
        now: i64,
        timeout_ms: i64,
    ) -> DomainResult<AcquireOutcome> {
        // The conflict branch only fires for finished or expired locks, so the
        // check and the takeover happen inside one statement.
        let query = r#"
            INSERT INTO import_locks (id, url, owner_id, started_at, status)
            VALUES (?, ?, ?, ?, 'pending')
            ON CONFLICT(url) DO UPDATE SET
                owner_id = excluded.owner_id,
                started_at = excluded.started_at,
                status = 'pending'
            WHERE import_locks.status <> 'pending'
               OR import_locks.started_at <= ?
            RETURNING id
        "#;

        for _ in 0..MAX_ACQUIRE_ATTEMPTS {
            let candidate = ImportLock::new(url.to_string(), owner_id.to_string(), now);

            let granted = sqlx::query(query)
                .bind(&candidate.id)
                .bind(url)
                .bind(owner_id)
                .bind(now)
                .bind(now - timeout_ms)
                .fetch_optional(&self.pool)
                .await?;

            if let Some(row) = granted {
                let lock_id: String = row.try_get("id")?;
                return Ok(AcquireOutcome::Granted { lock_id });
            }

            if let Some(existing) = self.find_by_url(url).await? {
                return Ok(AcquireOutcome::Rejected {
                    holder: existing.holder(),
                });
            }

            tracing::debug!("Import lock for {} vanished during acquisition, retrying", url);
        }

        Err(DomainError::Conflict(format!(
            "Import lock for {} changed repeatedly during acquisition",
            url
        )))
    }

    async fn update_status(&self, url: &str, status: LockStatus) -> DomainResult<bool> {
        let result = sqlx::query("UPDATE import_locks SET status = ? WHERE url = ?")
            .bind(status.as_str())
            .bind(url)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete_started_before(&self, cutoff: i64) -> DomainResult<u64> {
        let result = sqlx::query("DELETE FROM import_locks WHERE started_at < ?")
            .bind(cutoff)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }
}
