use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};
use homeauth_model::User;
use tracing::error;

use crate::errors::AppError;
use crate::state::AppState;

/// Resolve the bearer token to an active user and stash it in the request
/// extensions.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = extract_bearer_token(&request)
        .ok_or_else(|| AppError::unauthorized("Missing bearer token"))?;
    let user = resolve_user(&state, &token).await?;

    request.extensions_mut().insert(user);
    Ok(next.run(request).await)
}

async fn resolve_user(state: &AppState, token: &str) -> Result<User, AppError> {
    let user_id = state
        .sessions
        .resolve(token)
        .await
        .map_err(|err| {
            error!(error = %err, "session lookup failed");
            AppError::internal("Session lookup failed")
        })?
        .ok_or_else(|| AppError::unauthorized("Invalid or expired token"))?;

    let user = state
        .store
        .get_user(user_id)
        .await
        .map_err(|err| {
            error!(error = %err, "user lookup failed");
            AppError::internal("User lookup failed")
        })?
        .ok_or_else(|| AppError::unauthorized("Invalid or expired token"))?;

    if !user.is_active {
        return Err(AppError::unauthorized("Account is disabled"));
    }
    Ok(user)
}

fn extract_bearer_token(request: &Request) -> Option<String> {
    let value = request
        .headers()
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?;
    let token = value.strip_prefix("Bearer ")?.trim();
    (!token.is_empty()).then(|| token.to_string())
}
