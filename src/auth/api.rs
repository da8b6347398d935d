//! Authentication API Endpoints
//! Mission: Expose login and the current principal over HTTP

use crate::auth::{
    authenticator::Authenticator, errors::AuthFailure, guard::AccessGuard, models::LoginRequest,
    models::Principal,
};
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Extension, Form, Json,
};
use std::sync::Arc;
use tracing::{error, info};

/// Shared auth state
#[derive(Clone)]
pub struct AuthState {
    pub authenticator: Arc<Authenticator>,
    pub guard: Arc<AccessGuard>,
}

impl AuthState {
    pub fn new(authenticator: Arc<Authenticator>, guard: Arc<AccessGuard>) -> Self {
        Self {
            authenticator,
            guard,
        }
    }
}

/// Login endpoint - POST /api/auth/login
///
/// Form fields `username` and `password`; the token is returned as plain text.
pub async fn login(
    State(state): State<AuthState>,
    Form(payload): Form<LoginRequest>,
) -> Result<String, AuthApiError> {
    info!("🔐 Login attempt: {}", payload.username);

    let token = state
        .authenticator
        .login(&payload.username, &payload.password)
        .await?;

    Ok(token)
}

/// Current principal - GET /api/me
/// Built from the verified token alone (no store lookup)
pub async fn get_current_principal(Extension(principal): Extension<Principal>) -> Json<Principal> {
    Json(principal)
}

/// Auth API errors
#[derive(Debug)]
pub enum AuthApiError {
    UserNotFound,
    IncorrectPassword,
    InternalError,
}

impl From<AuthFailure> for AuthApiError {
    fn from(failure: AuthFailure) -> Self {
        match failure {
            AuthFailure::UserNotFound => AuthApiError::UserNotFound,
            AuthFailure::BadPassword => AuthApiError::IncorrectPassword,
            other => {
                error!(reason = other.as_str(), "Login failed: {other}");
                AuthApiError::InternalError
            }
        }
    }
}

impl IntoResponse for AuthApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AuthApiError::UserNotFound => (StatusCode::UNAUTHORIZED, "User not found."),
            AuthApiError::IncorrectPassword => (StatusCode::UNAUTHORIZED, "Incorrect password."),
            AuthApiError::InternalError => {
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
            }
        };

        (status, message).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::errors::IssueError;
    use anyhow::anyhow;

    #[test]
    fn test_auth_api_error_responses() {
        let not_found = AuthApiError::UserNotFound.into_response();
        assert_eq!(not_found.status(), StatusCode::UNAUTHORIZED);

        let bad_password = AuthApiError::IncorrectPassword.into_response();
        assert_eq!(bad_password.status(), StatusCode::UNAUTHORIZED);

        let internal = AuthApiError::InternalError.into_response();
        assert_eq!(internal.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_failure_mapping() {
        assert!(matches!(
            AuthApiError::from(AuthFailure::UserNotFound),
            AuthApiError::UserNotFound
        ));
        assert!(matches!(
            AuthApiError::from(AuthFailure::BadPassword),
            AuthApiError::IncorrectPassword
        ));
        assert!(matches!(
            AuthApiError::from(AuthFailure::Backend(anyhow!("disk full"))),
            AuthApiError::InternalError
        ));
        assert!(matches!(
            AuthApiError::from(AuthFailure::Issue(IssueError::EmptyRole)),
            AuthApiError::InternalError
        ));
    }
}
