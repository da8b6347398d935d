//! Authentication Models
//! Mission: Define the claims, principals and role labels that flow through the core

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

pub const ROLE_ADMIN: &str = "ROLE_ADMIN";
pub const ROLE_USER: &str = "ROLE_USER";

/// Role label.
///
/// Kept as an open string rather than an enum: a token may carry a label this
/// process has never heard of, and that must be denied at authorization time,
/// not rejected as unparseable.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Role(String);

impl Role {
    pub fn new(label: impl Into<String>) -> Self {
        Self(label.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Role {
    fn from(label: &str) -> Self {
        Self::new(label)
    }
}

impl From<String> for Role {
    fn from(label: String) -> Self {
        Self(label)
    }
}

/// Roles a protected resource accepts
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequiredRoles {
    /// Any principal that authenticated successfully.
    AnyAuthenticated,
    /// The principal's role must be one of these.
    OneOf(BTreeSet<Role>),
}

impl RequiredRoles {
    pub fn single(role: impl Into<Role>) -> Self {
        Self::OneOf(BTreeSet::from([role.into()]))
    }

    pub fn one_of<I, R>(roles: I) -> Self
    where
        I: IntoIterator<Item = R>,
        R: Into<Role>,
    {
        Self::OneOf(roles.into_iter().map(Into::into).collect())
    }

    /// Membership test. An unknown label is simply not a member.
    pub fn permits(&self, role: &Role) -> bool {
        match self {
            RequiredRoles::AnyAuthenticated => true,
            RequiredRoles::OneOf(roles) => roles.contains(role),
        }
    }
}

impl fmt::Display for RequiredRoles {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RequiredRoles::AnyAuthenticated => f.write_str("any authenticated principal"),
            RequiredRoles::OneOf(roles) => {
                let labels: Vec<&str> = roles.iter().map(Role::as_str).collect();
                write!(f, "one of [{}]", labels.join(", "))
            }
        }
    }
}

/// Verified token payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Claims {
    pub subject: String,
    pub role: Role,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl Claims {
    pub fn principal(&self) -> Principal {
        Principal {
            subject: self.subject.clone(),
            role: self.role.clone(),
        }
    }
}

/// Authenticated identity derived from a verified token
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Principal {
    pub subject: String,
    pub role: Role,
}

/// Stored credential as returned by a [`CredentialStore`](crate::auth::CredentialStore)
#[derive(Debug, Clone)]
pub struct CredentialRecord {
    pub username: String,
    pub password_hash: String, // never serialize
    pub role: Role,
}

/// Login form body
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}
