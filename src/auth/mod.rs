//! Authentication Module
//! Mission: Issue signed tokens, verify them on every request, and gate resources by role

pub mod api;
pub mod authenticator;
pub mod errors;
pub mod guard;
pub mod jwt;
pub mod middleware;
pub mod models;
pub mod user_store;

pub use api::AuthState;
pub use authenticator::{Authenticator, CredentialStore, PasswordVerifier};
pub use errors::{AccessDenied, AuthFailure, Forbidden, InvalidToken, IssueError, Unauthenticated};
pub use guard::AccessGuard;
pub use jwt::{JwtConfig, TokenCodec};
pub use middleware::{auth_middleware, RouteGuard};
pub use models::{Claims, CredentialRecord, Principal, RequiredRoles, Role, ROLE_ADMIN, ROLE_USER};
pub use user_store::{BcryptVerifier, InMemoryCredentialStore, SqliteCredentialStore};
