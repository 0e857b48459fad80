use axum::{Extension, Json, extract::State, http::StatusCode};
use homeauth_core::commands::CommandResponse;
use homeauth_model::User;
use serde_json::Value;
use tracing::{info, warn};

use crate::errors::command_status;
use crate::state::AppState;

/// Run one credential command for the authenticated caller.
pub async fn run_command(
    State(state): State<AppState>,
    Extension(caller): Extension<User>,
    Json(raw): Json<Value>,
) -> (StatusCode, Json<CommandResponse>) {
    let dispatched = state.commands.dispatch(Some(&caller), raw).await;

    if let Some(user_id) = dispatched.password_reset {
        match state.sessions.revoke_user_tokens(user_id).await {
            Ok(revoked) => {
                info!(
                    user_id = %user_id,
                    revoked,
                    "revoked sessions after password reset"
                )
            }
            Err(err) => {
                warn!(
                    user_id = %user_id,
                    error = %err,
                    "failed to revoke sessions after password reset"
                )
            }
        }
    }

    let status = match &dispatched.result {
        Ok(()) => StatusCode::OK,
        Err(err) => command_status(err),
    };
    (status, Json(dispatched.response()))
}
