// SPDX-FileCopyrightText: 2026 Magpie Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Magpie ingestion layer.
//!
//! This crate provides the error type and shared domain types used by the
//! attachment pipeline and the history store. The conversation driver that
//! produces [`types::AttachmentDescriptor`]s and consumes
//! [`types::RequestPart`] lists lives outside this workspace.

pub mod error;
pub mod types;

pub use error::MagpieError;
pub use types::{
    AttachmentDescriptor, ClassifiedAttachment, ConversationKey, FileData, HistoryEntry,
    InlineData, RequestPart, Role,
};
