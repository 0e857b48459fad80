use axum::{Json, extract::State};
use homeauth_model::UserId;
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use crate::errors::{AppError, AppResult};
use crate::state::AppState;

#[derive(Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: String,
    pub user_id: UserId,
}

/// Exchange local-provider credentials for an opaque bearer token.
pub async fn issue_token(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> AppResult<Json<TokenResponse>> {
    let invalid = || AppError::unauthorized("Invalid username or password");

    state
        .provider
        .validate_login(&request.username, &request.password)
        .await
        .map_err(|_| invalid())?;

    let credential = state
        .provider
        .get_or_create_credentials(&request.username)
        .await
        .map_err(|err| {
            error!(error = %err, "credential lookup failed during login");
            AppError::internal("Login failed")
        })?;
    if credential.is_new {
        return Err(invalid());
    }

    let user = state
        .store
        .find_user_by_credential(credential.id)
        .await
        .map_err(|err| {
            error!(error = %err, "user lookup failed during login");
            AppError::internal("Login failed")
        })?
        .ok_or_else(invalid)?;
    if !user.is_active {
        return Err(AppError::forbidden("Account is disabled"));
    }

    let access_token = state.sessions.issue_token(user.id).await.map_err(|err| {
        error!(error = %err, "failed to issue token");
        AppError::internal("Login failed")
    })?;
    info!(user_id = %user.id, "issued access token");

    Ok(Json(TokenResponse {
        access_token,
        token_type: "Bearer".to_string(),
        user_id: user.id,
    }))
}
