//! Persistent store of named account secrets.
//!
//! The store owns an ordered name to base32-secret mapping and mirrors it
//! to a JSON record on disk after every mutation. The record is the sole
//! source of truth across restarts; nothing else writes it. Loading never
//! fails: a missing or corrupt record yields an empty, usable store.

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::PathBuf;
use std::sync::{Mutex, MutexGuard, PoisonError};

use tracing::warn;

use crate::{StoreError, TotpEngine};

/// Ordered mapping from account name to base32 secret, persisted as JSON.
///
/// Mutations (`add`, `delete`, `import`) take `&self` and serialize through
/// an internal mutex held across the whole read-modify-write-persist
/// sequence, so two concurrent `add`s of the same name can't both succeed
/// and the record on disk never reflects a half-applied change. Reads only
/// lock long enough to copy what they return.
///
/// Account names are trimmed and upper-cased on the way in; every
/// name-taking operation applies the same normalization, so lookups are
/// case-insensitive in the same sense additions are.
#[derive(Debug)]
pub struct SecretStore {
    path: PathBuf,
    accounts: Mutex<BTreeMap<String, String>>,
}

fn normalize(name: &str) -> String {
    name.trim().to_uppercase()
}

impl SecretStore {
    /// Load the store persisted at `path`, or start empty.
    ///
    /// A missing file is the normal first run. An unreadable or malformed
    /// record is logged and treated the same way; it is never fatal.
    pub fn load(path: impl Into<PathBuf>) -> SecretStore {
        let path = path.into();
        let accounts = match fs::read_to_string(&path) {
            Ok(raw) => match serde_json::from_str(&raw) {
                Ok(accounts) => accounts,
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "malformed account record, starting empty");
                    BTreeMap::new()
                }
            },
            Err(e) if e.kind() == io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "could not read account record, starting empty");
                BTreeMap::new()
            }
        };
        SecretStore {
            path,
            accounts: Mutex::new(accounts),
        }
    }

    fn guard(&self) -> MutexGuard<'_, BTreeMap<String, String>> {
        self.accounts.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Add an account.
    ///
    /// The name is trimmed and upper-cased before comparison and storage.
    /// The secret must survive one TOTP computation, so the store never
    /// holds a secret that can't produce codes.
    ///
    /// # Errors
    ///
    /// `EmptyName`, `InvalidSecret` and `DuplicateName` leave the store
    /// untouched. `Persistence` means the entry *was* added in memory but
    /// the record could not be written; the caller decides whether to warn
    /// or retry, the entry is not dropped.
    pub fn add(&self, name: &str, secret: &str) -> Result<(), StoreError> {
        let name = normalize(name);
        if name.is_empty() {
            return Err(StoreError::EmptyName);
        }
        let secret = secret.trim();
        TotpEngine::default().compute(secret, 0)?;

        let mut accounts = self.guard();
        if accounts.contains_key(&name) {
            return Err(StoreError::DuplicateName(name));
        }
        accounts.insert(name, secret.to_string());
        self.persist(&accounts)
    }

    /// Remove an account.
    ///
    /// # Errors
    ///
    /// `NotFound` leaves the store untouched; `Persistence` follows the
    /// same committed-in-memory policy as [`SecretStore::add`].
    pub fn delete(&self, name: &str) -> Result<(), StoreError> {
        let name = normalize(name);
        let mut accounts = self.guard();
        if accounts.remove(&name).is_none() {
            return Err(StoreError::NotFound(name));
        }
        self.persist(&accounts)
    }

    /// Secret for `name`, if present. No side effects.
    pub fn get(&self, name: &str) -> Option<String> {
        self.guard().get(&normalize(name)).cloned()
    }

    /// All account names, lexicographically sorted.
    ///
    /// Regenerated from the live mapping on every call rather than cached.
    pub fn list(&self) -> Vec<String> {
        self.guard().keys().cloned().collect()
    }

    /// Read-only snapshot of the full mapping.
    pub fn export(&self) -> BTreeMap<String, String> {
        self.guard().clone()
    }

    /// Merge `incoming` into the store, additively.
    ///
    /// A name that already exists is skipped, never overwritten; imports
    /// must not clobber local edits. Incoming names are normalized before
    /// comparison. Entries with an empty name or an unusable secret are
    /// skipped and logged. Returns how many entries were actually added.
    ///
    /// # Errors
    ///
    /// `Persistence`, after all additions were committed in memory.
    pub fn import(&self, incoming: &BTreeMap<String, String>) -> Result<usize, StoreError> {
        let engine = TotpEngine::default();
        let mut accounts = self.guard();
        let mut added = 0;
        for (name, secret) in incoming {
            let name = normalize(name);
            let secret = secret.trim();
            if name.is_empty() || accounts.contains_key(&name) {
                continue;
            }
            if let Err(e) = engine.compute(secret, 0) {
                warn!(account = %name, error = %e, "skipping import entry with unusable secret");
                continue;
            }
            accounts.insert(name, secret.to_string());
            added += 1;
        }
        if added > 0 {
            self.persist(&accounts)?;
        }
        Ok(added)
    }

    /// Write the current mapping out, for shutdown flushes.
    ///
    /// Mutating operations already persist on their own; this exists so a
    /// closing caller can make a final attempt after an earlier write error.
    pub fn save(&self) -> Result<(), StoreError> {
        self.persist(&self.guard())
    }

    fn persist(&self, accounts: &BTreeMap<String, String>) -> Result<(), StoreError> {
        let raw = serde_json::to_string_pretty(accounts)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        fs::write(&self.path, raw)?;
        Ok(())
    }
}
