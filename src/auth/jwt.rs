//! JWT Token Codec
//! Mission: Issue and verify signed, time-bound tokens under one process key

use crate::auth::errors::{ConfigError, InvalidToken, IssueError};
use crate::auth::models::{Claims, Role};
use chrono::{DateTime, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{
    decode, decode_header, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Shortest HMAC secret accepted at startup
pub const MIN_SECRET_LEN: usize = 32;

/// Signing configuration, fixed at process start.
#[derive(Clone)]
pub struct JwtConfig {
    pub secret: String,
    pub algorithm: Algorithm,
    pub default_ttl: Duration,
}

impl JwtConfig {
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
            algorithm: Algorithm::HS256,
            default_ttl: Duration::from_secs(3600), // 1 hour
        }
    }

    pub fn with_algorithm(mut self, algorithm: Algorithm) -> Self {
        self.algorithm = algorithm;
        self
    }

    pub fn with_default_ttl(mut self, ttl: Duration) -> Self {
        self.default_ttl = ttl;
        self
    }

    /// Reject configurations under which no token could be trusted.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.secret.is_empty() {
            return Err(ConfigError::MissingSecret);
        }
        if self.secret.len() < MIN_SECRET_LEN {
            return Err(ConfigError::WeakSecret {
                len: self.secret.len(),
                min: MIN_SECRET_LEN,
            });
        }
        if !matches!(
            self.algorithm,
            Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512
        ) {
            return Err(ConfigError::UnsupportedAlgorithm(format!(
                "{:?}",
                self.algorithm
            )));
        }
        if self.default_ttl.as_secs() == 0 {
            return Err(ConfigError::NonPositiveTtl);
        }
        Ok(())
    }
}

impl std::fmt::Debug for JwtConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtConfig")
            .field("algorithm", &self.algorithm)
            .field("default_ttl", &self.default_ttl)
            .finish_non_exhaustive()
    }
}

/// Parse an algorithm name from configuration. Only HMAC variants are supported.
pub fn parse_algorithm(name: &str) -> Result<Algorithm, ConfigError> {
    match name.trim().to_ascii_uppercase().as_str() {
        "HS256" => Ok(Algorithm::HS256),
        "HS384" => Ok(Algorithm::HS384),
        "HS512" => Ok(Algorithm::HS512),
        _ => Err(ConfigError::UnsupportedAlgorithm(name.to_string())),
    }
}

/// Payload as signed on the wire
#[derive(Debug, Serialize)]
struct SignedClaims<'a> {
    sub: &'a str,
    role: &'a str,
    iat: i64,
    exp: i64,
}

/// Payload as read back; every field optional so absence is reported as
/// `MissingClaim` rather than a parse failure.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct PresentedClaims {
    sub: Option<String>,
    role: Option<String>,
    iat: Option<i64>,
    exp: Option<i64>,
}

/// Issues and verifies tokens.
///
/// Cheap to clone; the keys and validation rules sit behind `Arc` and are
/// never mutated after construction.
#[derive(Clone)]
pub struct TokenCodec {
    algorithm: Algorithm,
    default_ttl: Duration,
    encoding_key: Arc<EncodingKey>,
    decoding_key: Arc<DecodingKey>,
    validation: Arc<Validation>,
}

impl TokenCodec {
    pub fn new(config: &JwtConfig) -> Result<Self, ConfigError> {
        config.validate()?;

        // Pin the accepted algorithm; the header of a presented token never
        // gets to choose it. Expiry and required claims are checked by hand
        // below so that exp == now counts as expired.
        let mut validation = Validation::new(config.algorithm);
        validation.leeway = 0;
        validation.validate_exp = false;
        validation.validate_nbf = false;
        validation.validate_aud = false;
        validation.required_spec_claims.clear();

        Ok(Self {
            algorithm: config.algorithm,
            default_ttl: config.default_ttl,
            encoding_key: Arc::new(EncodingKey::from_secret(config.secret.as_bytes())),
            decoding_key: Arc::new(DecodingKey::from_secret(config.secret.as_bytes())),
            validation: Arc::new(validation),
        })
    }

    pub fn algorithm(&self) -> Algorithm {
        self.algorithm
    }

    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }

    /// Issue a token for `subject` carrying `role`, valid for `ttl`.
    pub fn issue(&self, subject: &str, role: &Role, ttl: Duration) -> Result<String, IssueError> {
        self.issue_at(subject, role, ttl, Utc::now())
    }

    /// Issue with an explicit clock reading.
    pub fn issue_at(
        &self,
        subject: &str,
        role: &Role,
        ttl: Duration,
        now: DateTime<Utc>,
    ) -> Result<String, IssueError> {
        if subject.is_empty() {
            return Err(IssueError::EmptySubject);
        }
        if role.is_empty() {
            return Err(IssueError::EmptyRole);
        }
        if ttl.as_secs() == 0 {
            return Err(IssueError::NonPositiveTtl);
        }

        let iat = now.timestamp();
        let exp = i64::try_from(ttl.as_secs())
            .ok()
            .and_then(|secs| iat.checked_add(secs))
            .ok_or(IssueError::TtlOutOfRange)?;

        let claims = SignedClaims {
            sub: subject,
            role: role.as_str(),
            iat,
            exp,
        };

        let token = encode(&Header::new(self.algorithm), &claims, &self.encoding_key)?;

        debug!(
            subject,
            role = %role,
            ttl_secs = ttl.as_secs(),
            "Issued token"
        );

        Ok(token)
    }

    /// Verify a token against the current time.
    pub fn verify(&self, token: &str) -> Result<Claims, InvalidToken> {
        self.verify_at(token, Utc::now())
    }

    /// Verify a token against an explicit clock reading. All-or-nothing.
    pub fn verify_at(&self, token: &str, now: DateTime<Utc>) -> Result<Claims, InvalidToken> {
        let result = self.check(token, now);
        match &result {
            Ok(claims) => debug!(subject = %claims.subject, role = %claims.role, "Verified token"),
            Err(reason) => debug!(reason = reason.as_str(), "Rejected token"),
        }
        result
    }

    /// Subject of a verified token. Fails exactly like [`TokenCodec::verify`].
    pub fn subject(&self, token: &str) -> Result<String, InvalidToken> {
        self.verify(token).map(|claims| claims.subject)
    }

    /// Role of a verified token. Fails exactly like [`TokenCodec::verify`].
    pub fn role(&self, token: &str) -> Result<Role, InvalidToken> {
        self.verify(token).map(|claims| claims.role)
    }

    fn check(&self, token: &str, now: DateTime<Utc>) -> Result<Claims, InvalidToken> {
        if token.split('.').count() != 3 {
            return Err(InvalidToken::Malformed);
        }
        let header = decode_header(token).map_err(|_| InvalidToken::Malformed)?;

        if header.alg != self.algorithm {
            warn!(
                presented = ?header.alg,
                expected = ?self.algorithm,
                "Token declares an unexpected signing algorithm"
            );
            return Err(self.signature_failure(token, now));
        }

        let presented = match decode::<PresentedClaims>(token, &self.decoding_key, &self.validation)
        {
            Ok(data) => data.claims,
            Err(e) => {
                return Err(match e.kind() {
                    ErrorKind::InvalidSignature | ErrorKind::InvalidAlgorithm => {
                        self.signature_failure(token, now)
                    }
                    _ => InvalidToken::Malformed,
                })
            }
        };

        let exp = presented.exp.ok_or(InvalidToken::MissingClaim)?;
        let expires_at = DateTime::from_timestamp(exp, 0).ok_or(InvalidToken::Malformed)?;
        if expires_at <= now {
            return Err(InvalidToken::Expired);
        }

        let subject = presented
            .sub
            .filter(|s| !s.is_empty())
            .ok_or(InvalidToken::MissingClaim)?;
        let role = presented
            .role
            .filter(|r| !r.is_empty())
            .map(Role::from)
            .ok_or(InvalidToken::MissingClaim)?;
        let iat = presented.iat.ok_or(InvalidToken::MissingClaim)?;
        let issued_at = DateTime::from_timestamp(iat, 0).ok_or(InvalidToken::Malformed)?;

        Ok(Claims {
            subject,
            role,
            issued_at,
            expires_at,
        })
    }

    /// The signature did not verify. A token that is already past its expiry
    /// is reported as expired either way; nothing read here is trusted beyond
    /// choosing the rejection reason.
    fn signature_failure(&self, token: &str, now: DateTime<Utc>) -> InvalidToken {
        match self.unverified_expiry(token) {
            Some(expires_at) if expires_at <= now => InvalidToken::Expired,
            _ => InvalidToken::BadSignature,
        }
    }

    fn unverified_expiry(&self, token: &str) -> Option<DateTime<Utc>> {
        let mut validation = Validation::new(self.algorithm);
        validation.insecure_disable_signature_validation();
        validation.validate_exp = false;
        validation.validate_nbf = false;
        validation.validate_aud = false;
        validation.required_spec_claims.clear();

        let exp = decode::<PresentedClaims>(token, &self.decoding_key, &validation)
            .ok()?
            .claims
            .exp?;
        DateTime::from_timestamp(exp, 0)
    }
}

impl std::fmt::Debug for TokenCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenCodec")
            .field("algorithm", &self.algorithm)
            .field("default_ttl", &self.default_ttl)
            .finish_non_exhaustive()
    }
}
