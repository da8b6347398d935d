//! Server Configuration
//! Mission: Read signing, TTL and role settings once at startup
//!
//! Every flag can also come from the environment (a `.env` file is loaded
//! first by the binary):
//!   JWT_SECRET         - HMAC signing secret, at least 32 bytes (required)
//!   JWT_ALGORITHM      - HS256 | HS384 | HS512 (default: HS256)
//!   TOKEN_TTL_SECS     - Default token lifetime (default: 3600)
//!   AUTH_ROLES         - Comma-separated recognized roles (default: ROLE_ADMIN,ROLE_USER)
//!   AUTH_DB_PATH       - SQLite credential database (default: authgate_auth.db)
//!   AUTHGATE_BIND      - Listen address (default: 0.0.0.0:3000)
//!   AUTHGATE_SEED_DEMO - Seed admin/user demo accounts (default: false)

use crate::auth::errors::ConfigError;
use crate::auth::jwt::{parse_algorithm, JwtConfig};
use crate::auth::models::Role;
use clap::Parser;
use std::net::SocketAddr;
use std::time::Duration;

#[derive(Parser, Debug, Clone)]
#[command(name = "authgate")]
#[command(about = "Token authentication and role-based access control service")]
pub struct Args {
    /// HMAC signing secret
    #[arg(long, env = "JWT_SECRET", hide_env_values = true)]
    pub jwt_secret: Option<String>,

    /// Signing algorithm
    #[arg(long, env = "JWT_ALGORITHM", default_value = "HS256")]
    pub jwt_algorithm: String,

    /// Default token lifetime in seconds
    #[arg(long, env = "TOKEN_TTL_SECS", default_value = "3600")]
    pub token_ttl_secs: u64,

    /// Recognized role labels (comma-separated)
    #[arg(long, env = "AUTH_ROLES", default_value = "ROLE_ADMIN,ROLE_USER")]
    pub roles: String,

    /// SQLite credential database path
    #[arg(long, env = "AUTH_DB_PATH", default_value = "authgate_auth.db")]
    pub auth_db_path: String,

    /// Address to listen on
    #[arg(long, env = "AUTHGATE_BIND", default_value = "0.0.0.0:3000")]
    pub bind: SocketAddr,

    /// Seed the demo admin/user accounts if missing
    #[arg(long, env = "AUTHGATE_SEED_DEMO")]
    pub seed_demo_users: bool,
}

impl Args {
    /// Signing configuration, validated. Fails when no token could be trusted.
    pub fn jwt_config(&self) -> Result<JwtConfig, ConfigError> {
        let secret = self
            .jwt_secret
            .as_deref()
            .filter(|s| !s.is_empty())
            .ok_or(ConfigError::MissingSecret)?;

        let config = JwtConfig::new(secret)
            .with_algorithm(parse_algorithm(&self.jwt_algorithm)?)
            .with_default_ttl(Duration::from_secs(self.token_ttl_secs));
        config.validate()?;

        Ok(config)
    }

    pub fn recognized_roles(&self) -> Result<Vec<Role>, ConfigError> {
        let roles: Vec<Role> = self
            .roles
            .split(',')
            .map(str::trim)
            .filter(|r| !r.is_empty())
            .map(Role::from)
            .collect();

        if roles.is_empty() {
            return Err(ConfigError::NoRoles);
        }
        Ok(roles)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::Algorithm;

    const SECRET: &str = "test-secret-key-that-is-long-enough-for-testing";

    fn parse(extra: &[&str]) -> Args {
        let mut argv = vec!["authgate"];
        argv.extend_from_slice(extra);
        Args::try_parse_from(argv).unwrap()
    }

    #[test]
    fn test_explicit_flags() {
        let args = parse(&[
            "--jwt-secret",
            SECRET,
            "--jwt-algorithm",
            "HS512",
            "--token-ttl-secs",
            "60",
            "--roles",
            "ROLE_ADMIN, ROLE_USER ,ROLE_AUDITOR",
            "--bind",
            "127.0.0.1:8080",
            "--seed-demo-users",
        ]);

        let jwt = args.jwt_config().unwrap();
        assert_eq!(jwt.algorithm, Algorithm::HS512);
        assert_eq!(jwt.default_ttl, Duration::from_secs(60));

        let roles = args.recognized_roles().unwrap();
        assert_eq!(
            roles,
            vec![
                Role::new("ROLE_ADMIN"),
                Role::new("ROLE_USER"),
                Role::new("ROLE_AUDITOR")
            ]
        );
        assert_eq!(args.bind.port(), 8080);
        assert!(args.seed_demo_users);
    }

    #[test]
    fn test_invalid_settings_prevent_startup() {
        let weak = parse(&["--jwt-secret", "short"]);
        assert!(matches!(
            weak.jwt_config(),
            Err(ConfigError::WeakSecret { len: 5, .. })
        ));

        let bad_alg = parse(&["--jwt-secret", SECRET, "--jwt-algorithm", "none"]);
        assert!(matches!(
            bad_alg.jwt_config(),
            Err(ConfigError::UnsupportedAlgorithm(_))
        ));

        let zero_ttl = parse(&["--jwt-secret", SECRET, "--token-ttl-secs", "0"]);
        assert!(matches!(
            zero_ttl.jwt_config(),
            Err(ConfigError::NonPositiveTtl)
        ));

        let no_roles = parse(&["--jwt-secret", SECRET, "--roles", " , "]);
        assert!(matches!(
            no_roles.recognized_roles(),
            Err(ConfigError::NoRoles)
        ));
    }
}
