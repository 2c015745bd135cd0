use crate::domain::entities::{AcquireResponse, ImportLock, ReleaseStatus, SweepResult};
use crate::infrastructure::http::middleware::{ApiError, ApiResult, AppState, AuthenticatedOwner};
use axum::{
    extract::{Query, State},
    http::StatusCode,
    Extension, Json,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub struct LockQuery {
    pub url: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LockResponse {
    pub lock: Option<ImportLock>,
}

#[derive(Debug, Deserialize)]
pub struct AcquireRequest {
    pub url: String,
}

#[derive(Debug, Deserialize)]
pub struct ReleaseRequest {
    pub url: String,
    pub status: ReleaseStatus,
}

fn require_url(url: &str) -> ApiResult<&str> {
    if url.trim().is_empty() {
        return Err(ApiError::BadRequest("url must not be empty".to_string()));
    }
    Ok(url)
}

/// GET /api/import-locks?url=...
///
/// Returns the live lock for a URL, or null when none exists or it has expired.
pub async fn get_import_lock(
    State(state): State<AppState>,
    Query(query): Query<LockQuery>,
) -> ApiResult<Json<LockResponse>> {
    let url = require_url(&query.url)?;
    let lock = state.import_lock_service.inspect(url).await?;
    Ok(Json(LockResponse { lock }))
}

/// POST /api/import-locks/acquire
///
/// Contention is part of the result (`granted: false`), not an error status.
pub async fn acquire_import_lock(
    State(state): State<AppState>,
    Extension(owner): Extension<AuthenticatedOwner>,
    Json(request): Json<AcquireRequest>,
) -> ApiResult<Json<AcquireResponse>> {
    let url = require_url(&request.url)?;
    let outcome = state.import_lock_service.acquire(url, &owner.0).await?;
    Ok(Json(outcome.into()))
}

/// POST /api/import-locks/release
pub async fn release_import_lock(
    State(state): State<AppState>,
    Json(request): Json<ReleaseRequest>,
) -> ApiResult<StatusCode> {
    let url = require_url(&request.url)?;
    state
        .import_lock_service
        .release(url, request.status)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/import-locks/sweep
pub async fn sweep_import_locks(State(state): State<AppState>) -> ApiResult<Json<SweepResult>> {
    let result = state.import_lock_service.sweep_expired().await?;
    Ok(Json(result))
}
