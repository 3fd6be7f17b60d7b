//! Local key-value persistence.
//!
//! The store only needs an opaque async get/set string API; everything
//! about value formats lives in the goal store. [`FileKv`] is the shipped
//! implementation: one JSON object of string keys to string values,
//! rewritten whole on every set, which is fine at this size.

use std::collections::BTreeMap;
use std::io;
use std::path::PathBuf;

/// Storage keys for the planner's local data.
pub mod keys {
    pub const MONTHLY_INCOME: &str = "monthlyIncome";
    pub const SAVINGS_GOALS: &str = "savingsGoals";
    /// Monotonic goal-id counter, kept under its own key so the
    /// `savingsGoals` value stays a plain array.
    pub const GOAL_ID_SEQ: &str = "savingsGoalSeq";
    pub const USER_THEME: &str = "userTheme";
}

/// Opaque async string store. `get` of an absent key is `Ok(None)`, never
/// an error; errors mean the underlying medium failed.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> impl std::future::Future<Output = io::Result<Option<String>>> + Send;
    fn set(&self, key: &str, value: &str)
        -> impl std::future::Future<Output = io::Result<()>> + Send;
}

/// File-backed store. A missing file reads as empty.
#[derive(Debug, Clone)]
pub struct FileKv {
    path: PathBuf,
}

impl FileKv {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    async fn read_map(&self) -> io::Result<BTreeMap<String, String>> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(text) => serde_json::from_str(&text).map_err(io::Error::from),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(err) => Err(err),
        }
    }
}

impl KeyValueStore for FileKv {
    async fn get(&self, key: &str) -> io::Result<Option<String>> {
        Ok(self.read_map().await?.remove(key))
    }

    async fn set(&self, key: &str, value: &str) -> io::Result<()> {
        let mut map = self.read_map().await?;
        map.insert(key.to_string(), value.to_string());
        let text = serde_json::to_string_pretty(&map).map_err(io::Error::from)?;
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }
        tokio::fs::write(&self.path, text).await
    }
}

/// Shared in-memory store for tests.
#[cfg(test)]
#[derive(Debug, Clone, Default)]
pub(crate) struct MemoryKv(std::sync::Arc<std::sync::Mutex<BTreeMap<String, String>>>);

#[cfg(test)]
impl MemoryKv {
    pub(crate) fn value(&self, key: &str) -> Option<String> {
        self.0.lock().unwrap().get(key).cloned()
    }

    pub(crate) fn insert(&self, key: &str, value: &str) {
        self.0.lock().unwrap().insert(key.to_string(), value.to_string());
    }
}

#[cfg(test)]
impl KeyValueStore for MemoryKv {
    async fn get(&self, key: &str) -> io::Result<Option<String>> {
        Ok(self.0.lock().unwrap().get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> io::Result<()> {
        self.insert(key, value);
        Ok(())
    }
}
