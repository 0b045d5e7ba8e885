// SPDX-FileCopyrightText: 2026 Magpie Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the Magpie ingestion layer.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use serde::{Deserialize, Serialize};

/// Top-level Magpie configuration.
///
/// Loaded from TOML files following XDG hierarchy, with environment variable
/// overrides. All sections are optional and default to sensible values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct MagpieConfig {
    /// Attachment ingestion settings.
    #[serde(default)]
    pub ingest: IngestConfig,

    /// Conversation history settings.
    #[serde(default)]
    pub history: HistoryConfig,

    /// Gemini API settings (file uploads).
    #[serde(default)]
    pub gemini: GeminiConfig,
}

/// Attachment ingestion configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct IngestConfig {
    /// Largest image, in bytes, carried inline (base64) in the request
    /// body. Larger images go through the file upload path.
    #[serde(default = "default_inline_image_max_bytes")]
    pub inline_image_max_bytes: u64,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            inline_image_max_bytes: default_inline_image_max_bytes(),
        }
    }
}

fn default_inline_image_max_bytes() -> u64 {
    4 * 1024 * 1024
}

/// Conversation history configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct HistoryConfig {
    /// Path to the SQLite history database file.
    #[serde(default = "default_database_path")]
    pub database_path: String,

    /// Number of most-recent entries retained per conversation key.
    #[serde(default = "default_keep_count")]
    pub keep_count: usize,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            keep_count: default_keep_count(),
        }
    }
}

fn default_database_path() -> String {
    dirs::data_dir()
        .map(|p| p.join("magpie").join("history.db"))
        .unwrap_or_else(|| std::path::PathBuf::from("history.db"))
        .to_string_lossy()
        .into_owned()
}

fn default_keep_count() -> usize {
    20
}

/// Gemini API configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct GeminiConfig {
    /// API key used as the file-upload credential. `None` disables uploads;
    /// oversized attachments then fall back to textual notices.
    #[serde(default)]
    pub api_key: Option<String>,
}
