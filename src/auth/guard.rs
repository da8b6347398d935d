//! Access Guard
//! Mission: Gate protected resources on a verified bearer token and its role

use crate::auth::errors::{AccessDenied, Forbidden, Unauthenticated};
use crate::auth::jwt::TokenCodec;
use crate::auth::models::{Principal, RequiredRoles, Role};
use chrono::{DateTime, Utc};
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::{debug, info, warn};

const BEARER_PREFIX: &str = "Bearer ";

/// Pull the token out of an `Authorization` header value.
///
/// Anything other than `Bearer <token>` counts as no credential at all.
pub fn bearer_token(authorization: Option<&str>) -> Option<&str> {
    authorization?
        .strip_prefix(BEARER_PREFIX)
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

/// Stateless per-request authentication and role check
#[derive(Debug, Clone)]
pub struct AccessGuard {
    codec: Arc<TokenCodec>,
    recognized_roles: Arc<BTreeSet<Role>>,
}

impl AccessGuard {
    pub fn new<I, R>(codec: Arc<TokenCodec>, recognized_roles: I) -> Self
    where
        I: IntoIterator<Item = R>,
        R: Into<Role>,
    {
        Self {
            codec,
            recognized_roles: Arc::new(recognized_roles.into_iter().map(Into::into).collect()),
        }
    }

    pub fn is_recognized(&self, role: &Role) -> bool {
        self.recognized_roles.contains(role)
    }

    /// Resolve the caller from the raw `Authorization` header value.
    pub fn authenticate(&self, authorization: Option<&str>) -> Result<Principal, Unauthenticated> {
        self.authenticate_at(authorization, Utc::now())
    }

    pub fn authenticate_at(
        &self,
        authorization: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<Principal, Unauthenticated> {
        let token = bearer_token(authorization).ok_or(Unauthenticated::NoCredential)?;

        let claims = self.codec.verify_at(token, now).map_err(|reason| {
            info!(reason = reason.as_str(), "Rejected bearer credential");
            Unauthenticated::InvalidCredential(reason)
        })?;

        if !self.is_recognized(&claims.role) {
            warn!(
                subject = %claims.subject,
                role = %claims.role,
                "Verified token carries an unrecognized role"
            );
        }

        Ok(claims.principal())
    }

    /// Allow iff the principal's role is accepted by `required`.
    pub fn authorize(principal: &Principal, required: &RequiredRoles) -> Result<(), Forbidden> {
        if required.permits(&principal.role) {
            Ok(())
        } else {
            Err(Forbidden {
                role: principal.role.clone(),
                required: required.clone(),
            })
        }
    }

    /// Full decision for one protected request.
    pub fn check(
        &self,
        authorization: Option<&str>,
        required: &RequiredRoles,
    ) -> Result<Principal, AccessDenied> {
        self.check_at(authorization, required, Utc::now())
    }

    pub fn check_at(
        &self,
        authorization: Option<&str>,
        required: &RequiredRoles,
        now: DateTime<Utc>,
    ) -> Result<Principal, AccessDenied> {
        let principal = self.authenticate_at(authorization, now)?;

        if let Err(forbidden) = Self::authorize(&principal, required) {
            info!(
                subject = %principal.subject,
                role = %principal.role,
                required = %required,
                "Access forbidden"
            );
            return Err(forbidden.into());
        }

        debug!(subject = %principal.subject, role = %principal.role, "Access allowed");
        Ok(principal)
    }
}
