use serde::{Deserialize, Serialize};
use std::fmt;

/// Default time after which a pending import lock is considered abandoned.
pub const DEFAULT_LOCK_TIMEOUT_MS: i64 = 5 * 60 * 1000;

/// Reason code returned when an import for the URL is already running.
pub const IMPORT_IN_PROGRESS: &str = "IMPORT_IN_PROGRESS";

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum LockStatus {
    Pending,
    Completed,
    Failed,
}

impl LockStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            LockStatus::Pending => "pending",
            LockStatus::Completed => "completed",
            LockStatus::Failed => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, LockStatus::Pending)
    }
}

impl fmt::Display for LockStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<String> for LockStatus {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        match s.as_str() {
            "pending" => Ok(LockStatus::Pending),
            "completed" => Ok(LockStatus::Completed),
            "failed" => Ok(LockStatus::Failed),
            other => Err(format!("Unknown import lock status: {}", other)),
        }
    }
}

/// Terminal status a holder reports when its import finishes.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ReleaseStatus {
    Completed,
    Failed,
}

impl From<ReleaseStatus> for LockStatus {
    fn from(status: ReleaseStatus) -> Self {
        match status {
            ReleaseStatus::Completed => LockStatus::Completed,
            ReleaseStatus::Failed => LockStatus::Failed,
        }
    }
}

/// Persisted lock record, one per recipe source URL.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ImportLock {
    pub id: String,
    pub url: String,
    pub owner_id: String,
    /// Milliseconds since the Unix epoch when the lock was (re)acquired.
    pub started_at: i64,
    pub status: LockStatus,
}

impl ImportLock {
    pub fn new(url: String, owner_id: String, now: i64) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            url,
            owner_id,
            started_at: now,
            status: LockStatus::Pending,
        }
    }

    pub fn is_expired(&self, now: i64, timeout_ms: i64) -> bool {
        now - self.started_at >= timeout_ms
    }

    /// A pending lock that has not yet timed out.
    pub fn is_held(&self, now: i64, timeout_ms: i64) -> bool {
        self.status == LockStatus::Pending && !self.is_expired(now, timeout_ms)
    }

    /// Hands the record to a new owner, keeping its id.
    pub fn take_over(&mut self, owner_id: &str, now: i64) {
        self.owner_id = owner_id.to_string();
        self.started_at = now;
        self.status = LockStatus::Pending;
    }

    pub fn holder(&self) -> LockHolder {
        LockHolder {
            owner_id: self.owner_id.clone(),
            started_at: self.started_at,
        }
    }
}

/// Identity of the current holder, returned to rejected callers.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LockHolder {
    pub owner_id: String,
    pub started_at: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AcquireOutcome {
    Granted { lock_id: String },
    Rejected { holder: LockHolder },
}

impl AcquireOutcome {
    pub fn is_granted(&self) -> bool {
        matches!(self, AcquireOutcome::Granted { .. })
    }
}

/// Wire shape of an acquire result: callers branch on `granted`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum AcquireResponse {
    Granted {
        granted: bool,
        lock_id: String,
    },
    Rejected {
        granted: bool,
        reason: String,
        holder: LockHolder,
    },
}

impl From<AcquireOutcome> for AcquireResponse {
    fn from(outcome: AcquireOutcome) -> Self {
        match outcome {
            AcquireOutcome::Granted { lock_id } => AcquireResponse::Granted {
                granted: true,
                lock_id,
            },
            AcquireOutcome::Rejected { holder } => AcquireResponse::Rejected {
                granted: false,
                reason: IMPORT_IN_PROGRESS.to_string(),
                holder,
            },
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SweepResult {
    pub deleted_count: u64,
}
