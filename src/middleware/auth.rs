use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};
use std::sync::Arc;

use crate::api::AppState;
use crate::models::session::Session;
use crate::utils::error::{AppError, AppResult};
use crate::utils::validation::validate_user_id;

pub fn bearer_token(request: &Request) -> Option<&str> {
    request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
}

/// Resolves a token into the session of a user that still exists.
pub async fn resolve_session(state: &AppState, token: &str) -> AppResult<Session> {
    let user_id = state
        .jwt_service
        .extract_user_id(token)
        .map_err(|e| AppError::Auth(format!("Invalid token: {}", e)))?;
    validate_user_id(&user_id)
        .map_err(|_| AppError::Auth("Invalid token subject".to_string()))?;

    let user = state
        .store
        .get_user(&user_id)
        .await
        .map_err(|_| AppError::Internal("Storage error during auth check".to_string()))?
        .ok_or_else(|| AppError::Auth("User no longer exists".to_string()))?;

    Ok(Session::from(&user))
}

pub async fn auth_middleware(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = bearer_token(&request)
        .ok_or_else(|| AppError::Auth("Missing or invalid authorization header".to_string()))?
        .to_string();

    let session = resolve_session(&state, &token).await?;
    request.extensions_mut().insert(session);

    Ok(next.run(request).await)
}
