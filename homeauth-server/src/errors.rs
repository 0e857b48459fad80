use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use homeauth_core::CredentialCommandError;
use serde_json::json;
use std::fmt;

pub type AppResult<T> = Result<T, AppError>;

#[derive(Debug)]
pub struct AppError {
    pub status: StatusCode,
    pub message: String,
}

impl AppError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, message)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(StatusCode::FORBIDDEN, message)
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for AppError {}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = Json(json!({
            "error": {
                "message": self.message,
                "status": self.status.as_u16(),
            }
        }));

        (self.status, body).into_response()
    }
}

/// HTTP status carried alongside a failed command reply.
pub fn command_status(err: &CredentialCommandError) -> StatusCode {
    match err {
        CredentialCommandError::NotFound
        | CredentialCommandError::UserNotFound
        | CredentialCommandError::CredentialsNotFound => StatusCode::NOT_FOUND,
        CredentialCommandError::SystemGenerated
        | CredentialCommandError::UsernameExists => StatusCode::CONFLICT,
        CredentialCommandError::InvalidPassword { .. }
        | CredentialCommandError::InvalidCurrentPassword
        | CredentialCommandError::InvalidFormat(_) => StatusCode::BAD_REQUEST,
        CredentialCommandError::AdminRequired
        | CredentialCommandError::OwnerRequired => StatusCode::FORBIDDEN,
        CredentialCommandError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn authorization_failures_are_forbidden() {
        assert_eq!(
            command_status(&CredentialCommandError::OwnerRequired),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            command_status(&CredentialCommandError::AdminRequired),
            StatusCode::FORBIDDEN
        );
    }

    #[test]
    fn internal_errors_are_500() {
        assert_eq!(
            command_status(&CredentialCommandError::Internal("x".into())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
