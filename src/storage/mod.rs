// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Durable client-side key/value storage.
//!
//! The session layer keeps everything it persists (bearer token, profile,
//! pending login intent) under a handful of fixed keys. Writes that touch
//! several keys go through [`KeyValueStore::set_many`] so they land together.

pub mod file;

pub use file::FileStore;

use std::collections::BTreeMap;
use std::sync::{Mutex, PoisonError};

use crate::error::Result;

/// Well-known storage keys.
pub mod keys {
    pub const ACCESS_TOKEN: &str = "access_token";
    pub const USER_INFO: &str = "user_info";
    /// Pending OAuth login intent (nonce)
    pub const LOGIN_STATE: &str = "LOGIN_STATE";
}

/// Durable string storage, in the spirit of browser `localStorage`.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Write all entries, or none of them.
    fn set_many(&self, entries: &[(&str, String)]) -> Result<()>;

    /// Remove the keys. Missing keys are not an error.
    fn remove_many(&self, keys: &[&str]) -> Result<()>;

    fn set(&self, key: &str, value: String) -> Result<()> {
        self.set_many(&[(key, value)])
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.remove_many(&[key])
    }

    /// Remove `key` and return what it held, as one step. Of any number of
    /// concurrent callers at most one sees the value.
    fn take(&self, key: &str) -> Result<Option<String>>;
}

/// In-process store. Nothing survives a restart.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<BTreeMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(entries.get(key).cloned())
    }

    fn set_many(&self, new_entries: &[(&str, String)]) -> Result<()> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        for (key, value) in new_entries {
            entries.insert((*key).to_string(), value.clone());
        }
        Ok(())
    }

    fn remove_many(&self, keys: &[&str]) -> Result<()> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        for key in keys {
            entries.remove(*key);
        }
        Ok(())
    }

    fn take(&self, key: &str) -> Result<Option<String>> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(entries.remove(key))
    }
}
