// SPDX-FileCopyrightText: 2026 Magpie Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite-backed durable transcript store.
//!
//! All access is serialized through tokio-rusqlite's single background
//! thread; insert-and-prune runs in one transaction per append so a
//! concurrent prune can never drop an entry written after it started.

use std::path::Path;
use std::str::FromStr;

use async_trait::async_trait;
use chrono::Utc;
use magpie_core::{ConversationKey, HistoryEntry, MagpieError, Role};
use rusqlite::params;
use tokio_rusqlite::Connection;
use tracing::debug;

use crate::store::HistoryBackend;

/// Transcript schema. Null guild/channel ids are distinct buckets, matched
/// with `IS` rather than `=` in every query.
const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS messages (
        id          INTEGER PRIMARY KEY AUTOINCREMENT,
        user_id     TEXT NOT NULL,
        guild_id    TEXT,
        channel_id  TEXT,
        role        TEXT NOT NULL CHECK (role IN ('user', 'assistant')),
        content     TEXT NOT NULL,
        ts          INTEGER NOT NULL
    );
    CREATE INDEX IF NOT EXISTS idx_messages_key_ts
        ON messages(user_id, guild_id, channel_id, ts);
";

/// Durable history backend over a single SQLite database file.
pub struct SqliteHistory {
    conn: Connection,
}

impl SqliteHistory {
    /// Creates or opens the database at `path`, creating parent
    /// directories as needed.
    pub async fn open(path: &str) -> Result<Self, MagpieError> {
        if let Some(parent) = Path::new(path).parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(|e| MagpieError::Storage {
                source: Box::new(e),
            })?;
        }

        let conn = Connection::open(path.to_owned())
            .await
            .map_err(map_open_err)?;
        conn.call(|conn| {
            conn.execute_batch("PRAGMA journal_mode=WAL;")?;
            conn.execute_batch(SCHEMA)?;
            Ok(())
        })
        .await
        .map_err(map_call_err)?;

        debug!(path, "transcript database ready");
        Ok(Self { conn })
    }

    /// Opens an in-memory database (for tests).
    pub async fn open_in_memory() -> Result<Self, MagpieError> {
        let conn = Connection::open_in_memory().await.map_err(map_open_err)?;
        conn.call(|conn| {
            conn.execute_batch(SCHEMA)?;
            Ok(())
        })
        .await
        .map_err(map_call_err)?;
        Ok(Self { conn })
    }
}

#[async_trait]
impl HistoryBackend for SqliteHistory {
    async fn append(
        &self,
        key: &ConversationKey,
        role: Role,
        content: &str,
        keep: usize,
    ) -> Result<(), MagpieError> {
        let key = key.clone();
        let role = role.to_string();
        let content = content.to_string();
        let ts = Utc::now().timestamp_millis();

        self.conn
            .call(move |conn| {
                let tx = conn.transaction()?;
                tx.execute(
                    "INSERT INTO messages (user_id, guild_id, channel_id, role, content, ts)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                    params![key.user_id, key.guild_id, key.channel_id, role, content, ts],
                )?;
                tx.execute(
                    "DELETE FROM messages
                     WHERE user_id = ?1 AND guild_id IS ?2 AND channel_id IS ?3
                       AND id NOT IN (
                           SELECT id FROM messages
                           WHERE user_id = ?1 AND guild_id IS ?2 AND channel_id IS ?3
                           ORDER BY ts DESC, id DESC
                           LIMIT ?4
                       )",
                    params![key.user_id, key.guild_id, key.channel_id, keep as i64],
                )?;
                tx.commit()?;
                Ok(())
            })
            .await
            .map_err(map_call_err)
    }

    async fn recent(
        &self,
        key: &ConversationKey,
        limit: usize,
    ) -> Result<Vec<HistoryEntry>, MagpieError> {
        let key = key.clone();

        let mut entries = self
            .conn
            .call(move |conn| {
                let mut stmt = conn.prepare(
                    "SELECT role, content, ts FROM messages
                     WHERE user_id = ?1 AND guild_id IS ?2 AND channel_id IS ?3
                     ORDER BY ts DESC, id DESC
                     LIMIT ?4",
                )?;
                let rows = stmt
                    .query_map(
                        params![key.user_id, key.guild_id, key.channel_id, limit as i64],
                        row_to_entry,
                    )?
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(rows)
            })
            .await
            .map_err(map_call_err)?;

        // Newest-first from the query; callers get oldest-first.
        entries.reverse();
        Ok(entries)
    }

    async fn clear(&self, key: &ConversationKey) -> Result<(), MagpieError> {
        let key = key.clone();
        self.conn
            .call(move |conn| {
                conn.execute(
                    "DELETE FROM messages
                     WHERE user_id = ?1 AND guild_id IS ?2 AND channel_id IS ?3",
                    params![key.user_id, key.guild_id, key.channel_id],
                )?;
                Ok(())
            })
            .await
            .map_err(map_call_err)
    }
}

fn row_to_entry(row: &rusqlite::Row) -> rusqlite::Result<HistoryEntry> {
    let role_str: String = row.get(0)?;
    let role = Role::from_str(&role_str).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(0, rusqlite::types::Type::Text, Box::new(e))
    })?;
    Ok(HistoryEntry {
        role,
        content: row.get(1)?,
        ts: row.get(2)?,
    })
}

fn map_call_err(e: tokio_rusqlite::Error) -> MagpieError {
    MagpieError::Storage {
        source: Box::new(e),
    }
}

fn map_open_err(e: rusqlite::Error) -> MagpieError {
    MagpieError::Storage {
        source: Box::new(e),
    }
}
