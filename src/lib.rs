//! authgate Library
//!
//! Token issuance, verification and role-based access control, plus the thin
//! HTTP and storage plumbing used by the `authgate` binary and the tests.

pub mod auth;
pub mod config;
pub mod routes;

pub use routes::build_router;
