// SPDX-FileCopyrightText: 2026 Magpie Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Backend trait and the history store facade.
//!
//! Backend selection happens once at open time and holds for the process
//! lifetime: the durable SQLite backend is attempted first, and any
//! initialization failure permanently falls back to the in-process map.
//! Callers cannot observe which backend is active; both produce identical
//! results for the same call sequence.

use async_trait::async_trait;
use magpie_config::HistoryConfig;
use magpie_core::{ConversationKey, HistoryEntry, MagpieError, Role};
use strum::Display;
use tracing::{info, warn};

use crate::memory::MemoryHistory;
use crate::sqlite::SqliteHistory;

/// Storage operations for per-conversation transcripts.
///
/// Implementations must keep entries in insertion order within equal
/// timestamps and retain only the newest `keep` entries per key after each
/// append.
#[async_trait]
pub trait HistoryBackend: Send + Sync {
    /// Writes one entry stamped with the current time, then prunes the
    /// key's bucket to at most `keep` entries (newest kept).
    async fn append(
        &self,
        key: &ConversationKey,
        role: Role,
        content: &str,
        keep: usize,
    ) -> Result<(), MagpieError>;

    /// Returns up to `limit` most recent entries in chronological
    /// (oldest-first) order.
    async fn recent(
        &self,
        key: &ConversationKey,
        limit: usize,
    ) -> Result<Vec<HistoryEntry>, MagpieError>;

    /// Removes all entries for the key.
    async fn clear(&self, key: &ConversationKey) -> Result<(), MagpieError>;
}

/// Which backend a store ended up on. Diagnostic only; behavior is
/// identical either way.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "lowercase")]
pub enum BackendKind {
    Durable,
    Memory,
}

/// Per-conversation rolling transcript store.
pub struct HistoryStore {
    backend: Box<dyn HistoryBackend>,
    kind: BackendKind,
    keep_count: usize,
}

impl HistoryStore {
    /// Opens the store, deciding the backend for the process lifetime.
    ///
    /// A durable backend initialization failure is recovered here with a
    /// one-time warning; it is never surfaced to callers.
    pub async fn open(config: &HistoryConfig) -> Self {
        match SqliteHistory::open(&config.database_path).await {
            Ok(backend) => {
                info!(path = %config.database_path, "history store opened");
                Self {
                    backend: Box::new(backend),
                    kind: BackendKind::Durable,
                    keep_count: config.keep_count,
                }
            }
            Err(e) => {
                warn!(
                    path = %config.database_path,
                    error = %e,
                    "durable history backend unavailable, keeping transcripts in memory for this process"
                );
                Self {
                    backend: Box::new(MemoryHistory::new()),
                    kind: BackendKind::Memory,
                    keep_count: config.keep_count,
                }
            }
        }
    }

    /// Creates a store on the in-memory backend directly.
    pub fn in_memory(keep_count: usize) -> Self {
        Self {
            backend: Box::new(MemoryHistory::new()),
            kind: BackendKind::Memory,
            keep_count,
        }
    }

    /// Reports which backend the open-time decision landed on.
    pub fn backend_kind(&self) -> BackendKind {
        self.kind
    }

    /// The configured per-key retention count.
    pub fn keep_count(&self) -> usize {
        self.keep_count
    }

    /// Appends one entry, retaining the newest `keep_count` for the key.
    pub async fn append(
        &self,
        key: &ConversationKey,
        role: Role,
        content: &str,
    ) -> Result<(), MagpieError> {
        self.backend.append(key, role, content, self.keep_count).await
    }

    /// Reads up to `keep_count` recent entries, oldest first.
    pub async fn recent(&self, key: &ConversationKey) -> Result<Vec<HistoryEntry>, MagpieError> {
        self.backend.recent(key, self.keep_count).await
    }

    /// Reads up to `limit` recent entries, oldest first.
    pub async fn recent_with_limit(
        &self,
        key: &ConversationKey,
        limit: usize,
    ) -> Result<Vec<HistoryEntry>, MagpieError> {
        self.backend.recent(key, limit).await
    }

    /// Removes all entries for the key.
    pub async fn clear(&self, key: &ConversationKey) -> Result<(), MagpieError> {
        self.backend.clear(key).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn open_falls_back_to_memory_on_bad_path() {
        // A path under /dev/null can never be created.
        let config = HistoryConfig {
            database_path: "/dev/null/magpie/history.db".to_string(),
            keep_count: 20,
        };
        let store = HistoryStore::open(&config).await;
        assert_eq!(store.backend_kind(), BackendKind::Memory);

        // The fallback store still works.
        let key = ConversationKey::direct("u1");
        store.append(&key, Role::User, "hello").await.unwrap();
        let entries = store.recent(&key).await.unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].content, "hello");
    }

    #[tokio::test]
    async fn open_uses_durable_backend_when_path_is_writable() {
        let dir = tempfile::tempdir().unwrap();
        let config = HistoryConfig {
            database_path: dir
                .path()
                .join("history.db")
                .to_string_lossy()
                .into_owned(),
            keep_count: 20,
        };
        let store = HistoryStore::open(&config).await;
        assert_eq!(store.backend_kind(), BackendKind::Durable);
    }

    #[tokio::test]
    async fn facade_applies_configured_keep_count() {
        let store = HistoryStore::in_memory(3);
        let key = ConversationKey::direct("u1");
        for i in 1..=5 {
            store
                .append(&key, Role::User, &format!("m{i}"))
                .await
                .unwrap();
        }
        let entries = store.recent(&key).await.unwrap();
        let contents: Vec<_> = entries.iter().map(|e| e.content.as_str()).collect();
        assert_eq!(contents, vec!["m3", "m4", "m5"]);
    }

    #[tokio::test]
    async fn clear_empties_the_bucket() {
        let store = HistoryStore::in_memory(20);
        let key = ConversationKey::direct("u1");
        store.append(&key, Role::User, "hi").await.unwrap();
        store.append(&key, Role::Assistant, "hello").await.unwrap();
        store.clear(&key).await.unwrap();
        assert!(store.recent(&key).await.unwrap().is_empty());
    }

    #[test]
    fn backend_kind_displays_lowercase() {
        assert_eq!(BackendKind::Durable.to_string(), "durable");
        assert_eq!(BackendKind::Memory.to_string(), "memory");
    }
}
