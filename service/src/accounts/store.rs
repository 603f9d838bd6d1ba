//! File-backed account persistence.
//!
//! The whole collection is a single JSON array on disk, loaded fresh on every
//! operation and rewritten in full on every mutation. An internal
//! [`tokio::sync::RwLock`] serializes the load-check-append-save cycle of
//! `register` as one critical section; `authenticate` calls share the read
//! half and may run concurrently with each other.

use std::io;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

/// A persisted registration record.
///
/// `email` is the unique key, compared byte-exact (no trimming, no case
/// folding). `password` is stored as received; see DESIGN.md for the hashing
/// deviation any production deployment must make.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub name: Option<String>,
    pub email: String,
    pub password: String,
}

/// Error types for account store operations.
#[derive(Debug, thiserror::Error)]
pub enum AccountStoreError {
    #[error("email already registered")]
    DuplicateEmail,
    #[error("incorrect email or password")]
    InvalidCredentials,
    #[error("account file unavailable: {0}")]
    Io(#[from] io::Error),
    #[error("account file corrupted: {0}")]
    Corrupted(#[from] serde_json::Error),
}

/// Persistence contract for account records.
///
/// Implementations own the durable collection exclusively; nothing else
/// mutates it. Injected into the HTTP layer as `Arc<dyn AccountStore>` so
/// tests can swap in [`mock::MemoryStore`].
#[async_trait]
pub trait AccountStore: Send + Sync {
    /// Append `candidate` to the collection.
    ///
    /// # Errors
    ///
    /// Returns [`AccountStoreError::DuplicateEmail`] if a record with the same
    /// email already exists, or `Io`/`Corrupted` if the backing file cannot be
    /// read or written.
    async fn register(&self, candidate: Account) -> Result<(), AccountStoreError>;

    /// Return the first record whose email and password both match exactly.
    ///
    /// # Errors
    ///
    /// Returns [`AccountStoreError::InvalidCredentials`] on any mismatch.
    /// Whether the email was unknown or the password wrong is deliberately
    /// not distinguishable from the result.
    async fn authenticate(&self, email: &str, password: &str)
        -> Result<Account, AccountStoreError>;
}

/// Production [`AccountStore`] backed by a JSON file.
pub struct JsonFileStore {
    path: PathBuf,
    lock: RwLock<()>,
}

impl JsonFileStore {
    /// Open the store, creating an empty collection if the file is missing.
    ///
    /// # Errors
    ///
    /// Returns an error if the path cannot be probed or the initial empty
    /// collection cannot be written.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, AccountStoreError> {
        let path = path.into();
        if !tokio::fs::try_exists(&path).await? {
            write_atomic(&path, b"[]").await?;
        }
        Ok(Self {
            path,
            lock: RwLock::new(()),
        })
    }

    /// Path of the backing file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn load(&self) -> Result<Vec<Account>, AccountStoreError> {
        let bytes = tokio::fs::read(&self.path).await?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    async fn save(&self, accounts: &[Account]) -> Result<(), AccountStoreError> {
        let bytes = serde_json::to_vec_pretty(accounts)?;
        write_atomic(&self.path, &bytes).await
    }
}

/// Write `bytes` to a sibling temp file, then rename over `path`.
///
/// The rename keeps the previous collection intact on a crash mid-write, and
/// concurrent loads never observe a torn file.
async fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), AccountStoreError> {
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);

    tokio::fs::write(&tmp, bytes).await?;
    tokio::fs::rename(&tmp, path).await?;
    Ok(())
}

#[async_trait]
impl AccountStore for JsonFileStore {
    async fn register(&self, candidate: Account) -> Result<(), AccountStoreError> {
        let _guard = self.lock.write().await;

        let mut accounts = self.load().await?;
        if accounts.iter().any(|a| a.email == candidate.email) {
            return Err(AccountStoreError::DuplicateEmail);
        }
        accounts.push(candidate);
        self.save(&accounts).await
    }

    async fn authenticate(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Account, AccountStoreError> {
        let _guard = self.lock.read().await;

        let accounts = self.load().await?;
        accounts
            .into_iter()
            .find(|a| a.email == email && a.password == password)
            .ok_or(AccountStoreError::InvalidCredentials)
    }
}

#[cfg(any(test, feature = "test-utils"))]
#[allow(clippy::expect_used)]
pub mod mock {
    //! In-memory account store for unit and integration tests.

    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Mutex;

    use super::{async_trait, Account, AccountStore, AccountStoreError};

    /// [`AccountStore`] over a plain `Vec`, with a switch to simulate an
    /// unavailable backing file.
    pub struct MemoryStore {
        accounts: Mutex<Vec<Account>>,
        unavailable: AtomicBool,
    }

    impl MemoryStore {
        #[must_use]
        pub const fn new() -> Self {
            Self {
                accounts: Mutex::new(Vec::new()),
                unavailable: AtomicBool::new(false),
            }
        }

        /// Seed the store with existing records.
        #[must_use]
        pub fn with_accounts(accounts: Vec<Account>) -> Self {
            Self {
                accounts: Mutex::new(accounts),
                unavailable: AtomicBool::new(false),
            }
        }

        /// Make subsequent operations fail with an I/O error.
        pub fn set_unavailable(&self, unavailable: bool) {
            self.unavailable.store(unavailable, Ordering::SeqCst);
        }

        fn check_available(&self) -> Result<(), AccountStoreError> {
            if self.unavailable.load(Ordering::SeqCst) {
                return Err(AccountStoreError::Io(std::io::Error::new(
                    std::io::ErrorKind::Other,
                    "simulated storage outage",
                )));
            }
            Ok(())
        }
    }

    impl Default for MemoryStore {
        fn default() -> Self {
            Self::new()
        }
    }

    #[async_trait]
    impl AccountStore for MemoryStore {
        async fn register(&self, candidate: Account) -> Result<(), AccountStoreError> {
            self.check_available()?;
            let mut accounts = self.accounts.lock().expect("lock poisoned");
            if accounts.iter().any(|a| a.email == candidate.email) {
                return Err(AccountStoreError::DuplicateEmail);
            }
            accounts.push(candidate);
            Ok(())
        }

        async fn authenticate(
            &self,
            email: &str,
            password: &str,
        ) -> Result<Account, AccountStoreError> {
            self.check_available()?;
            let accounts = self.accounts.lock().expect("lock poisoned");
            accounts
                .iter()
                .find(|a| a.email == email && a.password == password)
                .cloned()
                .ok_or(AccountStoreError::InvalidCredentials)
        }
    }
}
