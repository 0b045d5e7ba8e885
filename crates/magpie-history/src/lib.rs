// SPDX-FileCopyrightText: 2026 Magpie Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Bounded per-conversation transcript store for the Magpie ingestion layer.
//!
//! Appends role-tagged messages per `(user, guild, channel)` key, retains
//! only the most recent N per key, and answers chronological reads. Backed
//! by SQLite when available, with a process-lifetime in-memory fallback
//! selected once at open time.

pub mod memory;
pub mod sqlite;
pub mod store;

pub use memory::MemoryHistory;
pub use sqlite::SqliteHistory;
pub use store::{BackendKind, HistoryBackend, HistoryStore};
