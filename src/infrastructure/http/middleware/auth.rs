use super::error::ApiError;
use crate::application::services::ImportLockService;
use axum::{extract::Request, middleware::Next, response::Response};

/// Header carrying the caller identity established by the upstream auth provider.
pub const USER_ID_HEADER: &str = "x-user-id";

#[derive(Clone)]
pub struct AppState {
    pub import_lock_service: ImportLockService,
}

/// Stable identifier of the caller, used as the lock owner.
#[derive(Clone, Debug)]
pub struct AuthenticatedOwner(pub String);

pub async fn require_identity(mut request: Request, next: Next) -> Result<Response, ApiError> {
    let owner = request
        .headers()
        .get(USER_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
        .ok_or(ApiError::Unauthorized)?;

    request.extensions_mut().insert(AuthenticatedOwner(owner));
    Ok(next.run(request).await)
}
