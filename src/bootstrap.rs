use crate::application::services::ImportLockService;
use crate::config::{Config, LockStoreKind};
use crate::domain::ports::import_lock_repository::ImportLockRepository;
use crate::domain::ports::time_service::TimeService;
use crate::infrastructure::http::middleware::AppState;
use crate::infrastructure::persistence::{Database, InMemoryImportLockRepository};
use crate::infrastructure::runtime::TokioTimeService;
use crate::infrastructure::workers::LockSweeper;
use std::sync::Arc;
use tokio::task::JoinHandle;

pub async fn build_lock_repository(
    config: &Config,
) -> Result<Arc<dyn ImportLockRepository>, Box<dyn std::error::Error>> {
    match config.lock_store {
        LockStoreKind::Sqlite => {
            let db = Database::connect(&config.database_url).await?;
            tracing::info!("Database connection established");

            db.run_migrations().await?;
            tracing::info!("Database migrations applied");

            Ok(Arc::new(db) as Arc<dyn ImportLockRepository>)
        }
        LockStoreKind::Memory => {
            tracing::warn!("In-memory import lock store selected; locks are per process");
            let repo = InMemoryImportLockRepository::new();
            Ok(Arc::new(repo) as Arc<dyn ImportLockRepository>)
        }
    }
}

pub async fn build_app_state(config: &Config) -> Result<AppState, Box<dyn std::error::Error>> {
    let repo = build_lock_repository(config).await?;
    let time_service = Arc::new(TokioTimeService::new()) as Arc<dyn TimeService>;

    let import_lock_service =
        ImportLockService::with_timeout(repo, time_service, config.import_lock_timeout_ms);
    tracing::info!(
        "Import lock service initialized with timeout {}ms",
        config.import_lock_timeout_ms
    );

    Ok(AppState {
        import_lock_service,
    })
}

/// Spawns the periodic sweeper when `SWEEP_INTERVAL_SECS` is non-zero.
pub fn start_background_workers(state: &AppState, config: &Config) -> Option<JoinHandle<()>> {
    let interval = config.sweep_interval()?;
    let sweeper = LockSweeper::new(
        state.import_lock_service.clone(),
        Arc::new(TokioTimeService::new()),
        interval,
    );
    Some(sweeper.start())
}
