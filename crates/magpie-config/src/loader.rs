// SPDX-FileCopyrightText: 2026 Magpie Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./magpie.toml` > `~/.config/magpie/magpie.toml`
//! > `/etc/magpie/magpie.toml` with environment variable overrides via the
//! `MAGPIE_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::Path;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};

use crate::model::MagpieConfig;

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/magpie/magpie.toml` (system-wide)
/// 3. `~/.config/magpie/magpie.toml` (user XDG config)
/// 4. `./magpie.toml` (local directory)
/// 5. `MAGPIE_*` environment variables
pub fn load_config() -> Result<MagpieConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(MagpieConfig::default()))
        .merge(Toml::file("/etc/magpie/magpie.toml"))
        .merge(Toml::file(
            dirs::config_dir()
                .map(|d| d.join("magpie/magpie.toml"))
                .unwrap_or_default(),
        ))
        .merge(Toml::file("magpie.toml"))
        .merge(env_provider())
        .extract()
}

/// Load configuration from a TOML string only (no XDG lookup, no env vars).
///
/// Used for testing and explicit config specification.
pub fn load_config_from_str(toml_content: &str) -> Result<MagpieConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(MagpieConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<MagpieConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(MagpieConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Create the environment variable provider using explicit `map()` for
/// section-to-dot mapping.
///
/// Uses `Env::map()` NOT `Env::split("_")` to avoid ambiguity with
/// underscore-containing key names: `MAGPIE_GEMINI_API_KEY` must map to
/// `gemini.api_key`, not `gemini.api.key`.
fn env_provider() -> Env {
    Env::prefixed("MAGPIE_").map(|key| {
        // `key` is the lowercased env var name with prefix stripped.
        // Example: MAGPIE_HISTORY_KEEP_COUNT -> "history_keep_count"
        let mapped = key
            .as_str()
            .replacen("ingest_", "ingest.", 1)
            .replacen("history_", "history.", 1)
            .replacen("gemini_", "gemini.", 1);
        mapped.into()
    })
}
