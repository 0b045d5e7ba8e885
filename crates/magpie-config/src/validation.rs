// SPDX-FileCopyrightText: 2026 Magpie Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Validates semantic constraints that cannot be expressed via serde
//! attributes, such as non-empty paths and positive retention counts.

use crate::diagnostic::ConfigError;
use crate::model::MagpieConfig;

/// Validate a deserialized configuration for semantic correctness.
///
/// Returns `Ok(())` if all validations pass, or `Err(Vec<ConfigError>)` with
/// all collected validation errors (does not fail fast).
pub fn validate_config(config: &MagpieConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    if config.history.database_path.trim().is_empty() {
        errors.push(ConfigError::Validation {
            message: "history.database_path must not be empty".to_string(),
        });
    }

    if config.history.keep_count == 0 {
        errors.push(ConfigError::Validation {
            message: "history.keep_count must be at least 1".to_string(),
        });
    }

    if config.ingest.inline_image_max_bytes == 0 {
        errors.push(ConfigError::Validation {
            message: "ingest.inline_image_max_bytes must be positive".to_string(),
        });
    }

    if let Some(key) = &config.gemini.api_key
        && key.trim().is_empty()
    {
        errors.push(ConfigError::Validation {
            message: "gemini.api_key must not be blank; omit the key to disable uploads"
                .to_string(),
        });
    }

    if errors.is_empty() { Ok(()) } else { Err(errors) }
}
