// SPDX-FileCopyrightText: 2026 Magpie Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Request part assembly from message text and attachments.
//!
//! Each attachment runs classify -> fetch -> (inline | upload | notice) as
//! an independent unit of work; a failing attachment becomes a textual
//! notice in the output, never an error for the batch. The produced list
//! always starts with the user's text part and preserves per-list
//! processing order.

use base64::{Engine as _, engine::general_purpose::STANDARD};
use magpie_config::{GeminiConfig, IngestConfig};
use magpie_core::{AttachmentDescriptor, ClassifiedAttachment, MagpieError, RequestPart};
use tracing::{debug, warn};

use crate::classify::{classify, format_size, is_text_like};
use crate::fetch::Fetcher;
use crate::upload::UploadClient;

/// Largest text-like file, in bytes, whose decoded contents are inlined
/// into the request as an additional text part.
pub const INLINE_TEXT_MAX_BYTES: u64 = 1024 * 1024;

/// Message text plus the attachment descriptors to ingest.
///
/// Images and files are separate ordered sequences; each is processed
/// strictly in order.
#[derive(Debug, Clone, Copy, Default)]
pub struct BuildInput<'a> {
    pub text: &'a str,
    pub images: &'a [AttachmentDescriptor],
    pub files: &'a [AttachmentDescriptor],
}

/// Builds the multimodal request parts list for one message.
#[derive(Debug, Clone)]
pub struct PartBuilder {
    fetcher: Fetcher,
    uploader: Option<UploadClient>,
    inline_image_max_bytes: u64,
}

impl PartBuilder {
    /// Creates a part builder.
    ///
    /// Without an upload credential, attachments that cannot be inlined are
    /// rendered as textual notices instead of file references.
    pub fn new(
        inline_image_max_bytes: u64,
        upload_credential: Option<&str>,
    ) -> Result<Self, MagpieError> {
        let uploader = upload_credential
            .map(UploadClient::new)
            .transpose()?;
        Ok(Self {
            fetcher: Fetcher::new()?,
            uploader,
            inline_image_max_bytes,
        })
    }

    /// Creates a part builder from loaded configuration sections.
    pub fn from_config(ingest: &IngestConfig, gemini: &GeminiConfig) -> Result<Self, MagpieError> {
        Self::new(ingest.inline_image_max_bytes, gemini.api_key.as_deref())
    }

    /// Assembles the ordered parts list for a message.
    ///
    /// The result is never empty: the first element is always a text part
    /// carrying `input.text` (possibly the empty string).
    pub async fn build(&self, input: BuildInput<'_>) -> Vec<RequestPart> {
        let mut parts = vec![RequestPart::text(input.text)];

        for desc in input.images {
            self.push_image(&mut parts, desc).await;
        }
        for desc in input.files {
            self.push_file(&mut parts, desc).await;
        }

        parts
    }

    /// Runs one image attachment to completion, recovering failures as
    /// notices.
    async fn push_image(&self, parts: &mut Vec<RequestPart>, desc: &AttachmentDescriptor) {
        let item = classify(desc);
        let Some(url) = item.url.clone() else {
            debug!(name = item.display_name(), "skipping attachment without a URL");
            return;
        };

        match self.image_part(&item, &url).await {
            Ok(part) => parts.push(part),
            Err(e @ MagpieError::Fetch { .. }) => {
                warn!(name = item.display_name(), error = %e, "image download failed");
                parts.push(could_not_be_processed(&item));
            }
            Err(e @ MagpieError::Upload { .. }) => {
                warn!(name = item.display_name(), error = %e, "image upload failed");
                parts.push(RequestPart::text(format!(
                    "[image \"{}\" was too large to inline and could not be uploaded]",
                    item.display_name()
                )));
            }
            Err(e) => {
                warn!(name = item.display_name(), error = %e, "image ingestion failed");
                parts.push(preview_unavailable(&item));
            }
        }
    }

    /// Fetches an image and produces its inline or file-reference part.
    async fn image_part(
        &self,
        item: &ClassifiedAttachment,
        url: &str,
    ) -> Result<RequestPart, MagpieError> {
        let bytes = self.fetcher.fetch(url).await?;

        let measured = bytes.len() as u64;
        if item.mime_type.starts_with("image/") && measured <= self.inline_image_max_bytes {
            return Ok(RequestPart::inline(
                item.mime_type.clone(),
                STANDARD.encode(&bytes),
            ));
        }

        let uploader = self
            .uploader
            .as_ref()
            .ok_or_else(|| MagpieError::upload("no upload credential configured"))?;
        let file = uploader
            .upload(&bytes, &item.mime_type, item.name.as_deref())
            .await?;
        Ok(RequestPart::FileData { file_data: file })
    }

    /// Runs one non-image attachment to completion, recovering failures as
    /// notices.
    async fn push_file(&self, parts: &mut Vec<RequestPart>, desc: &AttachmentDescriptor) {
        let item = classify(desc);
        let Some(url) = item.url.clone() else {
            debug!(name = item.display_name(), "skipping attachment without a URL");
            return;
        };

        match self.file_parts(&item, &url).await {
            Ok(mut file_parts) => parts.append(&mut file_parts),
            Err(e @ MagpieError::Fetch { .. }) => {
                warn!(name = item.display_name(), error = %e, "file download failed");
                parts.push(could_not_be_processed(&item));
            }
            Err(e) => {
                warn!(name = item.display_name(), error = %e, "file ingestion failed");
                parts.push(preview_unavailable(&item));
            }
        }
    }

    /// Fetches a file and produces its descriptive part, optional inline
    /// text contents, and optional file reference.
    async fn file_parts(
        &self,
        item: &ClassifiedAttachment,
        url: &str,
    ) -> Result<Vec<RequestPart>, MagpieError> {
        let bytes = self.fetcher.fetch(url).await?;
        let measured = bytes.len() as u64;
        let display_size = item.size.unwrap_or(measured) as f64;

        let mut out = vec![RequestPart::text(format!(
            "{} ({}, {})",
            item.display_name(),
            item.mime_type,
            format_size(display_size)
        ))];

        if is_text_like(&item.mime_type, item.name.as_deref())
            && measured <= INLINE_TEXT_MAX_BYTES
        {
            let contents = String::from_utf8_lossy(&bytes);
            out.push(RequestPart::text(format!(
                "contents of {}:\n{}",
                item.display_name(),
                contents
            )));
        }

        match &self.uploader {
            Some(uploader) => {
                match uploader
                    .upload(&bytes, &item.mime_type, item.name.as_deref())
                    .await
                {
                    Ok(file) => out.push(RequestPart::FileData { file_data: file }),
                    Err(e) => {
                        warn!(name = item.display_name(), error = %e, "file upload failed");
                        out.push(RequestPart::text(format!(
                            "[the file \"{}\" could not be uploaded]",
                            item.display_name()
                        )));
                    }
                }
            }
            None => {
                debug!(
                    name = item.display_name(),
                    "no upload credential configured, skipping file upload"
                );
            }
        }

        Ok(out)
    }
}

fn could_not_be_processed(item: &ClassifiedAttachment) -> RequestPart {
    RequestPart::text(format!(
        "[attachment \"{}\" could not be processed]",
        item.display_name()
    ))
}

fn preview_unavailable(item: &ClassifiedAttachment) -> RequestPart {
    RequestPart::text(format!(
        "[\"{}\" attached but preview unavailable]",
        item.display_name()
    ))
}
