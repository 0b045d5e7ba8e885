// SPDX-FileCopyrightText: 2026 Magpie Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Shared domain types for attachment ingestion and conversation history.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

// --- Attachment types ---

/// Raw attachment metadata as supplied by the conversation driver.
///
/// All fields are optional signals except `url`; classification works with
/// whatever subset is present. `width`/`height` are set only for
/// rasterizable media.
#[derive(Debug, Clone, Default)]
pub struct AttachmentDescriptor {
    /// Remote location of the attachment bytes. Empty or absent means the
    /// attachment cannot be fetched and is skipped.
    pub url: Option<String>,
    /// Original filename, if the platform exposed one.
    pub name: Option<String>,
    /// MIME type declared by the platform (e.g. Discord's `content_type`).
    pub content_type: Option<String>,
    /// Declared size in bytes.
    pub size: Option<u64>,
    /// Pixel width, present only for rasterizable media.
    pub width: Option<u32>,
    /// Pixel height, present only for rasterizable media.
    pub height: Option<u32>,
}

/// Classification result for one attachment.
///
/// `mime_type` is always non-empty; unknown types resolve to
/// `application/octet-stream`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassifiedAttachment {
    pub is_image: bool,
    pub mime_type: String,
    pub name: Option<String>,
    pub size: Option<u64>,
    pub url: Option<String>,
    pub width: Option<u32>,
    pub height: Option<u32>,
}

impl ClassifiedAttachment {
    /// Name to use in user-facing notices when the platform gave none.
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or("attachment")
    }
}

// --- Request part types ---

/// One segment of a multimodal `generateContent` request body.
///
/// Serializes to the Gemini wire shapes `{"text"}`,
/// `{"inlineData": {"mimeType", "data"}}` and
/// `{"fileData": {"fileUri", "mimeType"}}`. Ordering within the parts list
/// is significant and preserved by the part builder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RequestPart {
    /// Plain text segment.
    Text { text: String },
    /// Base64-encoded bytes carried directly in the request.
    InlineData {
        #[serde(rename = "inlineData")]
        inline_data: InlineData,
    },
    /// Reference to a previously uploaded remote file.
    FileData {
        #[serde(rename = "fileData")]
        file_data: FileData,
    },
}

/// Payload of an inline-data part.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InlineData {
    pub mime_type: String,
    /// Base64 encoding of the attachment bytes.
    pub data: String,
}

/// Payload of a file-reference part.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileData {
    pub file_uri: String,
    pub mime_type: String,
}

impl RequestPart {
    /// Creates a text part.
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text { text: text.into() }
    }

    /// Creates an inline-data part from a MIME type and base64 payload.
    pub fn inline(mime_type: impl Into<String>, data: impl Into<String>) -> Self {
        Self::InlineData {
            inline_data: InlineData {
                mime_type: mime_type.into(),
                data: data.into(),
            },
        }
    }

    /// Creates a file-reference part.
    pub fn file_ref(file_uri: impl Into<String>, mime_type: impl Into<String>) -> Self {
        Self::FileData {
            file_data: FileData {
                file_uri: file_uri.into(),
                mime_type: mime_type.into(),
            },
        }
    }

    /// Returns the text content if this is a text part.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text { text } => Some(text),
            _ => None,
        }
    }
}

// --- History types ---

/// Author of a history entry.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// One stored transcript message.
///
/// Owned exclusively by the history store; returned copies are never
/// written back.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub role: Role,
    pub content: String,
    /// Write time in epoch milliseconds.
    pub ts: i64,
}

/// Identifies one rolling history bucket.
///
/// `guild_id` and `channel_id` are nullable; `None` is a distinct bucket
/// from any string value, including the empty string.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ConversationKey {
    pub user_id: String,
    pub guild_id: Option<String>,
    pub channel_id: Option<String>,
}

impl ConversationKey {
    pub fn new(
        user_id: impl Into<String>,
        guild_id: Option<String>,
        channel_id: Option<String>,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            guild_id,
            channel_id,
        }
    }

    /// Key for a direct-message conversation (no guild, no channel).
    pub fn direct(user_id: impl Into<String>) -> Self {
        Self::new(user_id, None, None)
    }
}
