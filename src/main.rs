use pantry::bootstrap;
use pantry::config::Config;
use pantry::infrastructure::http::router::build_router;
use pantry::infrastructure::observability;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::from_env()?;

    let _guard = observability::init(&config)?;
    tracing::info!("Configuration loaded");

    let state = bootstrap::build_app_state(&config).await?;

    if bootstrap::start_background_workers(&state, &config).is_some() {
        tracing::info!("Background lock sweeper started");
    }

    let app = build_router(state);

    let addr = config.server_address();
    tracing::info!("listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
