use crate::application::services::ImportLockService;
use crate::domain::entities::SweepResult;
use crate::domain::errors::DomainResult;
use crate::domain::ports::time_service::TimeService;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{error, info};

/// Periodically removes stale import locks.
///
/// Imports already sweep after every run; this worker only matters when
/// imports are rare and stale records should not linger.
#[derive(Clone)]
pub struct LockSweeper {
    service: ImportLockService,
    time_service: Arc<dyn TimeService>,
    interval: Duration,
}

impl LockSweeper {
    pub fn new(
        service: ImportLockService,
        time_service: Arc<dyn TimeService>,
        interval: Duration,
    ) -> Self {
        Self {
            service,
            time_service,
            interval,
        }
    }

    pub fn start(&self) -> JoinHandle<()> {
        let sweeper = self.clone();
        tokio::spawn(async move { sweeper.run().await })
    }

    pub async fn run(&self) {
        info!("Starting LockSweeper every {:?}", self.interval);
        loop {
            self.time_service.sleep(self.interval).await;
            if let Err(e) = self.tick().await {
                error!("Error sweeping import locks: {}", e);
            }
        }
    }

    pub async fn tick(&self) -> DomainResult<SweepResult> {
        self.service.sweep_expired().await
    }
}
