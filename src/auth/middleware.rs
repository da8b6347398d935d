//! Authentication Middleware
//! Mission: Protect routes with bearer-token verification and a per-route role set

use crate::auth::errors::AccessDenied;
use crate::auth::guard::AccessGuard;
use crate::auth::models::RequiredRoles;
use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::sync::Arc;

/// State for one protected route group: the shared guard plus what it requires.
#[derive(Debug, Clone)]
pub struct RouteGuard {
    guard: Arc<AccessGuard>,
    required: Arc<RequiredRoles>,
}

impl RouteGuard {
    pub fn new(guard: Arc<AccessGuard>, required: RequiredRoles) -> Self {
        Self {
            guard,
            required: Arc::new(required),
        }
    }

    pub fn any_authenticated(guard: Arc<AccessGuard>) -> Self {
        Self::new(guard, RequiredRoles::AnyAuthenticated)
    }
}

/// Auth middleware that validates the bearer token and enforces the route's roles.
///
/// On success the [`Principal`](crate::auth::Principal) is placed in request extensions for handlers.
pub async fn auth_middleware(
    State(route): State<RouteGuard>,
    mut req: Request,
    next: Next,
) -> Result<Response, AccessError> {
    // A non-UTF-8 header value is treated the same as a missing one
    let authorization = req
        .headers()
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok());

    let principal = route
        .guard
        .check(authorization, &route.required)
        .map_err(AccessError)?;

    req.extensions_mut().insert(principal);

    Ok(next.run(req).await)
}

/// Rejection produced by [`auth_middleware`]
#[derive(Debug)]
pub struct AccessError(pub AccessDenied);

impl IntoResponse for AccessError {
    fn into_response(self) -> Response {
        // Invalid-token causes stay in the logs; clients only see 401.
        let (status, message) = match self.0 {
            AccessDenied::Unauthenticated(_) => {
                (StatusCode::UNAUTHORIZED, "Authentication required")
            }
            AccessDenied::Forbidden(_) => (StatusCode::FORBIDDEN, "Insufficient permissions"),
        };

        (status, message).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::errors::{Forbidden, InvalidToken, Unauthenticated};
    use crate::auth::models::{Role, ROLE_ADMIN, ROLE_USER};

    #[test]
    fn test_access_error_responses() {
        let missing = AccessError(Unauthenticated::NoCredential.into()).into_response();
        assert_eq!(missing.status(), StatusCode::UNAUTHORIZED);

        let expired = AccessError(
            Unauthenticated::InvalidCredential(InvalidToken::Expired).into(),
        )
        .into_response();
        assert_eq!(expired.status(), StatusCode::UNAUTHORIZED);

        let forbidden = AccessError(
            Forbidden {
                role: Role::new(ROLE_USER),
                required: RequiredRoles::single(ROLE_ADMIN),
            }
            .into(),
        )
        .into_response();
        assert_eq!(forbidden.status(), StatusCode::FORBIDDEN);
    }
}
