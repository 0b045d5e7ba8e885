// SPDX-FileCopyrightText: 2026 Magpie Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Attachment ingestion pipeline for multimodal requests.
//!
//! Converts attachment descriptors supplied by the conversation driver into
//! an ordered list of request parts: classification from declared metadata,
//! download with bounded retries, then an inline/upload decision per
//! attachment with textual fallbacks for anything that fails.

pub mod classify;
pub mod fetch;
pub mod parts;
pub mod upload;

pub use classify::{classify, format_size, is_text_like};
pub use fetch::Fetcher;
pub use parts::{BuildInput, INLINE_TEXT_MAX_BYTES, PartBuilder};
pub use upload::UploadClient;
