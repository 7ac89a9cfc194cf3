//! Durable credential store.
//!
//! One SQLite table, `users`, holds the OAuth token pair and profile
//! metadata for each authorized identity:
//!
//! ```text
//! id            INTEGER PRIMARY KEY AUTOINCREMENT
//! email         TEXT UNIQUE          -- the identity key
//! name          TEXT
//! picture       TEXT
//! access_token  TEXT
//! refresh_token TEXT
//! ```
//!
//! "Who is logged in" is deliberately a query, not a session: the most
//! recently inserted row wins ([`CredentialStore::current_identity`]).
//! That single-slot, last-writer-wins model is the design, stated
//! explicitly rather than hidden in a global.
//!
//! Tokens are stored in plaintext. That matches the contract of the tool
//! (single-user, local, interactive) but is a known weakness — moving to
//! the OS keychain or encrypted-at-rest storage is the required follow-up
//! before this grows beyond personal use.
//!
//! Access is read-modify-write with no transaction around the lifecycle's
//! load-then-refresh-then-persist sequence. Two interleaved operations on
//! the same identity can lose an update; acceptable for a single-user,
//! single-process tool and documented here as a scaling limit.

use rusqlite::{Connection, OptionalExtension, params};
use std::fmt;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// A unique user handle (an email-like string) — the natural key for all
/// credential operations.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Identity(String);

impl Identity {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Identity {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// Stored token pair plus profile metadata for one identity.
///
/// At most one record exists per identity (`email` is a unique key). The
/// access token may be stale server-side independent of the record's
/// presence; staleness is the lifecycle manager's concern, not the store's.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CredentialRecord {
    pub id: i64,
    pub identity: Identity,
    pub name: Option<String>,
    pub picture: Option<String>,
    pub access_token: String,
    pub refresh_token: Option<String>,
}

/// SQLite-backed store of [`CredentialRecord`]s.
pub struct CredentialStore {
    conn: Connection,
}

impl CredentialStore {
    /// Open (or create) the store at `path` and ensure the schema exists.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)?;
        let store = Self { conn };
        store.init_schema()?;
        log::debug!("credential store ready at {}", path.display());
        Ok(store)
    }

    /// In-memory store for tests.
    pub fn open_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        let store = Self { conn };
        store.init_schema()?;
        Ok(store)
    }

    fn init_schema(&self) -> Result<(), StoreError> {
        self.conn.execute(
            "CREATE TABLE IF NOT EXISTS users (
                id            INTEGER PRIMARY KEY AUTOINCREMENT,
                email         TEXT UNIQUE,
                name          TEXT,
                picture       TEXT,
                access_token  TEXT,
                refresh_token TEXT
            )",
            [],
        )?;
        Ok(())
    }

    /// Insert or refresh the record for `identity`.
    ///
    /// Two steps: an `INSERT OR IGNORE` that only takes effect for a new
    /// identity (so `name`/`picture` captured at first authorization are
    /// preserved), then an unconditional `UPDATE` of the token fields.
    /// Never creates a duplicate row for the same identity.
    pub fn upsert(
        &self,
        identity: &Identity,
        access_token: &str,
        refresh_token: Option<&str>,
        name: Option<&str>,
        picture: Option<&str>,
    ) -> Result<(), StoreError> {
        self.conn.execute(
            "INSERT OR IGNORE INTO users (email, name, picture, access_token, refresh_token)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![identity.as_str(), name, picture, access_token, refresh_token],
        )?;
        self.conn.execute(
            "UPDATE users SET access_token = ?1, refresh_token = ?2 WHERE email = ?3",
            params![access_token, refresh_token, identity.as_str()],
        )?;
        log::info!("tokens saved for {identity}");
        Ok(())
    }

    /// Overwrite only the access token — used after a refresh exchange,
    /// which does not rotate the refresh token.
    pub fn update_access_token(
        &self,
        identity: &Identity,
        access_token: &str,
    ) -> Result<(), StoreError> {
        self.conn.execute(
            "UPDATE users SET access_token = ?1 WHERE email = ?2",
            params![access_token, identity.as_str()],
        )?;
        Ok(())
    }

    /// Fetch the record for one identity, if present.
    pub fn get(&self, identity: &Identity) -> Result<Option<CredentialRecord>, StoreError> {
        let record = self
            .conn
            .query_row(
                "SELECT id, email, name, picture, access_token, refresh_token
                 FROM users WHERE email = ?1",
                params![identity.as_str()],
                |row| {
                    Ok(CredentialRecord {
                        id: row.get(0)?,
                        identity: Identity::new(row.get::<_, String>(1)?),
                        name: row.get(2)?,
                        picture: row.get(3)?,
                        access_token: row.get(4)?,
                        refresh_token: row.get(5)?,
                    })
                },
            )
            .optional()?;
        Ok(record)
    }

    /// The most recently inserted identity — the system's only notion of
    /// "logged in". `None` when the store is empty.
    pub fn current_identity(&self) -> Result<Option<Identity>, StoreError> {
        let email = self
            .conn
            .query_row(
                "SELECT email FROM users ORDER BY id DESC LIMIT 1",
                [],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(email.map(Identity::new))
    }

    /// Remove the record for one identity (logout).
    pub fn delete(&self, identity: &Identity) -> Result<(), StoreError> {
        self.conn.execute(
            "DELETE FROM users WHERE email = ?1",
            params![identity.as_str()],
        )?;
        log::info!("credentials removed for {identity}");
        Ok(())
    }

    /// Remove every record (administrative wipe).
    pub fn clear_all(&self) -> Result<(), StoreError> {
        self.conn.execute("DELETE FROM users", [])?;
        log::info!("all credentials cleared");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> CredentialStore {
        CredentialStore::open_in_memory().unwrap()
    }

    #[test]
    fn upsert_then_get_returns_stored_tokens() {
        let store = store();
        let id = Identity::from("ada@example.com");
        store
            .upsert(&id, "tok-1", Some("refresh-1"), Some("Ada"), Some("pic"))
            .unwrap();

        let record = store.get(&id).unwrap().unwrap();
        assert_eq!(record.access_token, "tok-1");
        assert_eq!(record.refresh_token.as_deref(), Some("refresh-1"));
        assert_eq!(record.name.as_deref(), Some("Ada"));
    }

    #[test]
    fn get_unknown_identity_is_none() {
        let store = store();
        assert!(
            store
                .get(&Identity::from("nobody@example.com"))
                .unwrap()
                .is_none()
        );
    }

    #[test]
    fn second_upsert_does_not_duplicate_and_refreshes_tokens() {
        let store = store();
        let id = Identity::from("ada@example.com");
        store
            .upsert(&id, "tok-1", Some("refresh-1"), Some("Ada"), None)
            .unwrap();
        store
            .upsert(&id, "tok-2", Some("refresh-2"), None, None)
            .unwrap();

        let count: i64 = store
            .conn
            .query_row("SELECT COUNT(*) FROM users", [], |r| r.get(0))
            .unwrap();
        assert_eq!(count, 1);

        let record = store.get(&id).unwrap().unwrap();
        assert_eq!(record.access_token, "tok-2");
        // First-authorization profile fields survive the re-auth path
        assert_eq!(record.name.as_deref(), Some("Ada"));
    }

    #[test]
    fn current_identity_is_last_inserted() {
        let store = store();
        store
            .upsert(&Identity::from("a@example.com"), "t", None, None, None)
            .unwrap();
        store
            .upsert(&Identity::from("b@example.com"), "t", None, None, None)
            .unwrap();

        assert_eq!(
            store.current_identity().unwrap(),
            Some(Identity::from("b@example.com"))
        );
    }

    #[test]
    fn current_identity_empty_store_is_none() {
        assert_eq!(store().current_identity().unwrap(), None);
    }

    #[test]
    fn update_access_token_leaves_refresh_token_alone() {
        let store = store();
        let id = Identity::from("ada@example.com");
        store
            .upsert(&id, "tok-1", Some("refresh-1"), None, None)
            .unwrap();
        store.update_access_token(&id, "tok-2").unwrap();

        let record = store.get(&id).unwrap().unwrap();
        assert_eq!(record.access_token, "tok-2");
        assert_eq!(record.refresh_token.as_deref(), Some("refresh-1"));
    }

    #[test]
    fn delete_removes_only_that_identity() {
        let store = store();
        let a = Identity::from("a@example.com");
        let b = Identity::from("b@example.com");
        store.upsert(&a, "t", None, None, None).unwrap();
        store.upsert(&b, "t", None, None, None).unwrap();

        store.delete(&a).unwrap();
        assert!(store.get(&a).unwrap().is_none());
        assert!(store.get(&b).unwrap().is_some());
    }

    #[test]
    fn clear_all_empties_the_store() {
        let store = store();
        store
            .upsert(&Identity::from("a@example.com"), "t", None, None, None)
            .unwrap();
        store.clear_all().unwrap();
        assert_eq!(store.current_identity().unwrap(), None);
    }

    #[test]
    fn open_persists_across_reopen() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("data/users.db");
        {
            let store = CredentialStore::open(&path).unwrap();
            store
                .upsert(&Identity::from("ada@example.com"), "tok", None, None, None)
                .unwrap();
        }
        let store = CredentialStore::open(&path).unwrap();
        assert_eq!(
            store.current_identity().unwrap(),
            Some(Identity::from("ada@example.com"))
        );
    }
}
