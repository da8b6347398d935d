//! Authentication Errors
//! Mission: Keep every rejection cause distinguishable, from login to role check

use crate::auth::models::{RequiredRoles, Role};
use thiserror::Error;

/// Why a presented token was rejected by the codec.
///
/// Callers at the HTTP edge usually collapse all of these into a single 401,
/// but the discriminator stays available to logs and tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum InvalidToken {
    #[error("malformed token")]
    Malformed,
    #[error("token signature does not verify")]
    BadSignature,
    #[error("token has expired")]
    Expired,
    #[error("token is missing a required claim")]
    MissingClaim,
}

impl InvalidToken {
    /// Stable label for structured logging.
    pub fn as_str(&self) -> &'static str {
        match self {
            InvalidToken::Malformed => "malformed",
            InvalidToken::BadSignature => "bad-signature",
            InvalidToken::Expired => "expired",
            InvalidToken::MissingClaim => "missing-claim",
        }
    }
}

/// Token issuance failures
#[derive(Debug, Error)]
pub enum IssueError {
    #[error("subject must not be empty")]
    EmptySubject,
    #[error("role must not be empty")]
    EmptyRole,
    #[error("token TTL must be at least one second")]
    NonPositiveTtl,
    #[error("token TTL is out of range")]
    TtlOutOfRange,
    #[error("failed to sign token: {0}")]
    Signing(#[from] jsonwebtoken::errors::Error),
}

/// Login-time failures
#[derive(Debug, Error)]
pub enum AuthFailure {
    #[error("user not found")]
    UserNotFound,
    #[error("incorrect password")]
    BadPassword,
    #[error("credential backend failed: {0:#}")]
    Backend(#[source] anyhow::Error),
    #[error(transparent)]
    Issue(#[from] IssueError),
}

impl AuthFailure {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuthFailure::UserNotFound => "user-not-found",
            AuthFailure::BadPassword => "bad-password",
            AuthFailure::Backend(_) => "backend",
            AuthFailure::Issue(_) => "issue",
        }
    }
}

/// Request-time failure: the caller has not proven who they are.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Unauthenticated {
    #[error("no bearer credential presented")]
    NoCredential,
    #[error("invalid credential: {0}")]
    InvalidCredential(InvalidToken),
}

impl Unauthenticated {
    pub fn as_str(&self) -> &'static str {
        match self {
            Unauthenticated::NoCredential => "no-credential",
            Unauthenticated::InvalidCredential(_) => "invalid-credential",
        }
    }
}

/// Request-time failure: authenticated, but the role is not allowed here.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("role {role} is not permitted (requires {required})")]
pub struct Forbidden {
    pub role: Role,
    pub required: RequiredRoles,
}

/// Outcome of a rejected protected request
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AccessDenied {
    #[error(transparent)]
    Unauthenticated(#[from] Unauthenticated),
    #[error(transparent)]
    Forbidden(#[from] Forbidden),
}

/// Startup configuration problems. Any of these keeps the process from starting.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("signing secret is not configured")]
    MissingSecret,
    #[error("signing secret is {len} bytes, at least {min} are required")]
    WeakSecret { len: usize, min: usize },
    #[error("unsupported signing algorithm: {0}")]
    UnsupportedAlgorithm(String),
    #[error("default token TTL must be at least one second")]
    NonPositiveTtl,
    #[error("at least one role label must be recognized")]
    NoRoles,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reason_labels() {
        assert_eq!(InvalidToken::Malformed.as_str(), "malformed");
        assert_eq!(InvalidToken::BadSignature.as_str(), "bad-signature");
        assert_eq!(InvalidToken::Expired.as_str(), "expired");
        assert_eq!(InvalidToken::MissingClaim.as_str(), "missing-claim");

        assert_eq!(Unauthenticated::NoCredential.as_str(), "no-credential");
        assert_eq!(
            Unauthenticated::InvalidCredential(InvalidToken::Expired).as_str(),
            "invalid-credential"
        );
    }

    #[test]
    fn test_forbidden_message_names_role() {
        let err = Forbidden {
            role: Role::new("ROLE_USER"),
            required: RequiredRoles::single("ROLE_ADMIN"),
        };
        let msg = err.to_string();
        assert!(msg.contains("ROLE_USER"));
        assert!(msg.contains("ROLE_ADMIN"));
    }

    #[test]
    fn test_access_denied_from_parts() {
        let denied: AccessDenied = Unauthenticated::NoCredential.into();
        assert_eq!(
            denied,
            AccessDenied::Unauthenticated(Unauthenticated::NoCredential)
        );
    }
}
