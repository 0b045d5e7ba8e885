// SPDX-FileCopyrightText: 2026 Magpie Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-process fallback transcript store.
//!
//! Used for the remainder of the process when the durable backend fails to
//! initialize. Observable behavior matches [`crate::sqlite::SqliteHistory`]
//! for every call sequence; only durability differs.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use magpie_core::{ConversationKey, HistoryEntry, MagpieError, Role};
use tokio::sync::Mutex;

use crate::store::HistoryBackend;

/// Process-lifetime transcript store keyed by conversation.
#[derive(Default)]
pub struct MemoryHistory {
    buckets: Mutex<HashMap<ConversationKey, Vec<HistoryEntry>>>,
}

impl MemoryHistory {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl HistoryBackend for MemoryHistory {
    async fn append(
        &self,
        key: &ConversationKey,
        role: Role,
        content: &str,
        keep: usize,
    ) -> Result<(), MagpieError> {
        let mut buckets = self.buckets.lock().await;
        let bucket = buckets.entry(key.clone()).or_default();
        bucket.push(HistoryEntry {
            role,
            content: content.to_string(),
            ts: Utc::now().timestamp_millis(),
        });
        // Vec order is insertion order, so trimming the front keeps the
        // newest `keep` entries.
        if bucket.len() > keep {
            let excess = bucket.len() - keep;
            bucket.drain(..excess);
        }
        Ok(())
    }

    async fn recent(
        &self,
        key: &ConversationKey,
        limit: usize,
    ) -> Result<Vec<HistoryEntry>, MagpieError> {
        let buckets = self.buckets.lock().await;
        let entries = buckets
            .get(key)
            .map(|bucket| bucket[bucket.len().saturating_sub(limit)..].to_vec())
            .unwrap_or_default();
        Ok(entries)
    }

    async fn clear(&self, key: &ConversationKey) -> Result<(), MagpieError> {
        let mut buckets = self.buckets.lock().await;
        buckets.remove(key);
        Ok(())
    }
}
