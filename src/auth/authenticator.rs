//! Authenticator
//! Mission: Turn a username/password pair into a signed token

use crate::auth::errors::AuthFailure;
use crate::auth::jwt::TokenCodec;
use crate::auth::models::CredentialRecord;
use anyhow::{Context, Result};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// Read-only lookup of stored credentials.
///
/// Implementations may block or await I/O; the authenticator holds no lock
/// of its own across the call.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// `Ok(None)` when no record exists for `username`.
    async fn find_credential(&self, username: &str) -> Result<Option<CredentialRecord>>;
}

/// One-way comparison of a plaintext password with a stored hash.
///
/// Called from the blocking thread pool, so implementations may be slow.
pub trait PasswordVerifier: Send + Sync {
    fn verify_password(&self, plain: &str, hash: &str) -> Result<bool>;
}

/// Login orchestration
#[derive(Clone)]
pub struct Authenticator {
    store: Arc<dyn CredentialStore>,
    verifier: Arc<dyn PasswordVerifier>,
    codec: Arc<TokenCodec>,
    default_ttl: Duration,
}

impl Authenticator {
    /// Tokens are issued with the codec's configured default TTL.
    pub fn new(
        store: Arc<dyn CredentialStore>,
        verifier: Arc<dyn PasswordVerifier>,
        codec: Arc<TokenCodec>,
    ) -> Self {
        let default_ttl = codec.default_ttl();
        Self {
            store,
            verifier,
            codec,
            default_ttl,
        }
    }

    #[cfg(test)]
    fn codec(&self) -> &Arc<TokenCodec> {
        &self.codec
    }

    /// Check credentials and issue a token.
    ///
    /// Unknown user and wrong password are separate failures here; whether a
    /// client gets to see the difference is up to the transport.
    pub async fn login(&self, username: &str, password: &str) -> Result<String, AuthFailure> {
        let record = self
            .store
            .find_credential(username)
            .await
            .map_err(AuthFailure::Backend)?;

        let Some(record) = record else {
            warn!(username, reason = "user-not-found", "Failed login attempt");
            return Err(AuthFailure::UserNotFound);
        };

        // Hash comparison runs on the blocking pool, never on an async worker
        let verifier = Arc::clone(&self.verifier);
        let plain = password.to_string();
        let hash = record.password_hash.clone();
        let matches = tokio::task::spawn_blocking(move || verifier.verify_password(&plain, &hash))
            .await
            .context("Password check task failed")
            .and_then(|checked| checked)
            .map_err(AuthFailure::Backend)?;

        if !matches {
            warn!(username, reason = "bad-password", "Failed login attempt");
            return Err(AuthFailure::BadPassword);
        }

        let token = self
            .codec
            .issue(&record.username, &record.role, self.default_ttl)?;

        info!(
            username = %record.username,
            role = %record.role,
            "Login successful"
        );

        Ok(token)
    }
}
