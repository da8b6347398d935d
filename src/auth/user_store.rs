//! Credential Storage
//! Mission: Supply stored credentials and password checks to the authenticator

use crate::auth::authenticator::{CredentialStore, PasswordVerifier};
use crate::auth::models::{CredentialRecord, Role, ROLE_ADMIN, ROLE_USER};
use anyhow::{Context, Result};
use async_trait::async_trait;
use parking_lot::RwLock;
use rusqlite::{params, Connection, OptionalExtension};
use std::collections::HashMap;
use tracing::{info, warn};

/// Hash a plaintext password with bcrypt at the given cost.
pub fn hash_password(plain: &str, cost: u32) -> Result<String> {
    bcrypt::hash(plain, cost).context("Failed to hash password")
}

/// bcrypt-backed [`PasswordVerifier`]
#[derive(Debug, Default, Clone, Copy)]
pub struct BcryptVerifier;

impl PasswordVerifier for BcryptVerifier {
    fn verify_password(&self, plain: &str, hash: &str) -> Result<bool> {
        bcrypt::verify(plain, hash).context("Failed to verify password")
    }
}

/// Credentials held in process memory (tests, demos)
#[derive(Debug, Default)]
pub struct InMemoryCredentialStore {
    records: RwLock<HashMap<String, CredentialRecord>>,
}

impl InMemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_credential(
        self,
        username: &str,
        password_hash: &str,
        role: impl Into<Role>,
    ) -> Self {
        self.insert(username, password_hash, role);
        self
    }

    /// Insert or replace the record for `username`.
    pub fn insert(&self, username: &str, password_hash: &str, role: impl Into<Role>) {
        self.records.write().insert(
            username.to_string(),
            CredentialRecord {
                username: username.to_string(),
                password_hash: password_hash.to_string(),
                role: role.into(),
            },
        );
    }
}

#[async_trait]
impl CredentialStore for InMemoryCredentialStore {
    async fn find_credential(&self, username: &str) -> Result<Option<CredentialRecord>> {
        Ok(self.records.read().get(username).cloned())
    }
}

/// Credential storage with SQLite backend
#[derive(Debug, Clone)]
pub struct SqliteCredentialStore {
    db_path: String,
}

impl SqliteCredentialStore {
    /// Open the store and create its schema if needed
    pub fn new(db_path: &str) -> Result<Self> {
        let store = Self {
            db_path: db_path.to_string(),
        };
        store.init_db()?;
        Ok(store)
    }

    fn init_db(&self) -> Result<()> {
        let conn = Connection::open(&self.db_path)
            .with_context(|| format!("Failed to open credential DB at {}", self.db_path))?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS credentials (
                username TEXT PRIMARY KEY,
                password_hash TEXT NOT NULL,
                role TEXT NOT NULL
            )",
            [],
        )?;

        Ok(())
    }

    /// Store a credential unless one already exists for `username`.
    ///
    /// Returns `true` when a row was written. Used for startup seeding only.
    pub fn seed_credential(
        &self,
        username: &str,
        password_hash: &str,
        role: &Role,
    ) -> Result<bool> {
        let conn = Connection::open(&self.db_path)?;
        let inserted = conn
            .execute(
                "INSERT OR IGNORE INTO credentials (username, password_hash, role)
                 VALUES (?1, ?2, ?3)",
                params![username, password_hash, role.as_str()],
            )
            .context("Failed to seed credential")?;

        if inserted > 0 {
            info!(username, role = %role, "Seeded credential");
        }
        Ok(inserted > 0)
    }

    fn lookup(db_path: &str, username: &str) -> Result<Option<CredentialRecord>> {
        let conn = Connection::open(db_path)?;

        conn.query_row(
            "SELECT username, password_hash, role FROM credentials WHERE username = ?1",
            params![username],
            |row| {
                let role: String = row.get(2)?;
                Ok(CredentialRecord {
                    username: row.get(0)?,
                    password_hash: row.get(1)?,
                    role: Role::from(role),
                })
            },
        )
        .optional()
        .context("Failed to look up credential")
    }
}

#[async_trait]
impl CredentialStore for SqliteCredentialStore {
    async fn find_credential(&self, username: &str) -> Result<Option<CredentialRecord>> {
        let db_path = self.db_path.clone();
        let username = username.to_string();

        tokio::task::spawn_blocking(move || Self::lookup(&db_path, &username))
            .await
            .context("Credential lookup task failed")?
    }
}

/// Seed the two demo accounts (`admin` / `user`) when they are missing.
pub fn seed_demo_credentials(store: &SqliteCredentialStore, cost: u32) -> Result<()> {
    let demo = [
        ("admin", "123456", ROLE_ADMIN),
        ("user", "password", ROLE_USER),
    ];

    let mut created = 0;
    for (username, password, role) in demo {
        let hash = hash_password(password, cost)?;
        if store.seed_credential(username, &hash, &Role::new(role))? {
            created += 1;
        }
    }

    if created > 0 {
        warn!("⚠️  Demo credentials seeded (admin/123456, user/password). Do not use in production!");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    // Lowest cost bcrypt accepts; keeps the tests fast.
    const TEST_COST: u32 = 4;

    fn create_test_store() -> (SqliteCredentialStore, NamedTempFile) {
        let temp_file = NamedTempFile::new().unwrap();
        let db_path = temp_file.path().to_str().unwrap();
        let store = SqliteCredentialStore::new(db_path).unwrap();
        (store, temp_file)
    }

    #[test]
    fn test_bcrypt_verifier() {
        let hash = hash_password("123456", TEST_COST).unwrap();
        assert_ne!(hash, "123456");

        assert!(BcryptVerifier.verify_password("123456", &hash).unwrap());
        assert!(!BcryptVerifier.verify_password("wrongpass", &hash).unwrap());
    }

    #[test]
    fn test_bcrypt_verifier_rejects_garbage_hash() {
        assert!(BcryptVerifier.verify_password("123456", "not-a-hash").is_err());
    }

    #[tokio::test]
    async fn test_in_memory_lookup() {
        let store = InMemoryCredentialStore::new().with_credential("admin", "hash", ROLE_ADMIN);

        let record = store.find_credential("admin").await.unwrap().unwrap();
        assert_eq!(record.username, "admin");
        assert_eq!(record.role, Role::new(ROLE_ADMIN));

        assert!(store.find_credential("nobody").await.unwrap().is_none());

        store.insert("admin", "hash2", ROLE_USER);
        let record = store.find_credential("admin").await.unwrap().unwrap();
        assert_eq!(record.role, Role::new(ROLE_USER));
    }

    #[tokio::test]
    async fn test_sqlite_seed_and_lookup() {
        let (store, _temp) = create_test_store();

        assert!(store
            .seed_credential("admin", "hash", &Role::new(ROLE_ADMIN))
            .unwrap());
        // Second seed is a no-op and keeps the original row
        assert!(!store
            .seed_credential("admin", "other", &Role::new(ROLE_USER))
            .unwrap());

        let record = store.find_credential("admin").await.unwrap().unwrap();
        assert_eq!(record.username, "admin");
        assert_eq!(record.password_hash, "hash");
        assert_eq!(record.role, Role::new(ROLE_ADMIN));

        assert!(store.find_credential("nonexistent").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_unknown_role_label_survives_storage() {
        let (store, _temp) = create_test_store();
        store
            .seed_credential("odd", "hash", &Role::new("ROLE_UNKNOWN"))
            .unwrap();

        let record = store.find_credential("odd").await.unwrap().unwrap();
        assert_eq!(record.role.as_str(), "ROLE_UNKNOWN");
    }

    #[tokio::test]
    async fn test_seed_demo_credentials() {
        let (store, _temp) = create_test_store();
        seed_demo_credentials(&store, TEST_COST).unwrap();
        seed_demo_credentials(&store, TEST_COST).unwrap();

        let admin = store.find_credential("admin").await.unwrap().unwrap();
        assert_eq!(admin.role, Role::new(ROLE_ADMIN));
        assert!(BcryptVerifier
            .verify_password("123456", &admin.password_hash)
            .unwrap());

        let user = store.find_credential("user").await.unwrap().unwrap();
        assert_eq!(user.role, Role::new(ROLE_USER));
        assert!(BcryptVerifier
            .verify_password("password", &user.password_hash)
            .unwrap());
    }
}
