// SPDX-FileCopyrightText: 2026 Magpie Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Remote file-storage client for attachments too large to inline.
//!
//! Uploads go through the Gemini Files API as a `multipart/related` request
//! carrying JSON metadata plus the raw media. The buffer is staged in a
//! scoped temporary directory that is removed on every exit path; cleanup
//! failures are logged, never returned.

use std::path::Path;
use std::time::Duration;

use magpie_core::{FileData, MagpieError};
use rand::{Rng, distributions::Alphanumeric};
use tracing::{debug, warn};

/// Base URL for the Gemini Files upload endpoint.
const UPLOAD_BASE_URL: &str = "https://generativelanguage.googleapis.com/upload/v1beta/files";

/// Per-upload timeout, covering the full multipart transfer.
const UPLOAD_TIMEOUT: Duration = Duration::from_secs(120);

/// Client for pushing attachment buffers to the remote file store.
#[derive(Debug, Clone)]
pub struct UploadClient {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl UploadClient {
    /// Creates an upload client with the given API credential.
    pub fn new(api_key: impl Into<String>) -> Result<Self, MagpieError> {
        let client = reqwest::Client::builder()
            .timeout(UPLOAD_TIMEOUT)
            .build()
            .map_err(|e| MagpieError::Upload {
                message: format!("failed to build HTTP client: {e}"),
                source: Some(Box::new(e)),
            })?;
        Ok(Self {
            client,
            api_key: api_key.into(),
            base_url: UPLOAD_BASE_URL.to_string(),
        })
    }

    /// Overrides the base URL (for testing with wiremock).
    #[cfg(test)]
    pub fn with_base_url(mut self, url: String) -> Self {
        self.base_url = url;
        self
    }

    /// Uploads a buffer and returns the durable file reference.
    ///
    /// The buffer is written to a file under a freshly created temporary
    /// directory, uploaded from there, and both are removed whether the
    /// upload succeeds or fails.
    pub async fn upload(
        &self,
        bytes: &[u8],
        mime_type: &str,
        name: Option<&str>,
    ) -> Result<FileData, MagpieError> {
        let dir = tempfile::TempDir::new().map_err(|e| MagpieError::Upload {
            message: format!("failed to create scratch directory: {e}"),
            source: Some(Box::new(e)),
        })?;

        let filename = scratch_filename(name);
        let path = dir.path().join(&filename);
        let outcome = self.upload_from(&path, bytes, mime_type, &filename).await;

        // TempDir removes the staged file and the directory together.
        if let Err(e) = dir.close() {
            warn!(error = %e, "failed to remove upload scratch directory");
        }

        outcome
    }

    /// Stages the buffer at `path` and sends it to the Files API.
    async fn upload_from(
        &self,
        path: &Path,
        bytes: &[u8],
        mime_type: &str,
        display_name: &str,
    ) -> Result<FileData, MagpieError> {
        tokio::fs::write(path, bytes)
            .await
            .map_err(|e| MagpieError::Upload {
                message: format!("failed to stage upload file: {e}"),
                source: Some(Box::new(e)),
            })?;
        let payload = tokio::fs::read(path)
            .await
            .map_err(|e| MagpieError::Upload {
                message: format!("failed to read staged upload file: {e}"),
                source: Some(Box::new(e)),
            })?;

        let boundary = format!("magpie-{}", random_token(16));
        let metadata = serde_json::json!({ "file": { "display_name": display_name } });

        let mut body: Vec<u8> = Vec::with_capacity(payload.len() + 512);
        body.extend_from_slice(
            format!(
                "--{boundary}\r\ncontent-type: application/json; charset=utf-8\r\n\r\n{metadata}\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(
            format!("--{boundary}\r\ncontent-type: {mime_type}\r\n\r\n").as_bytes(),
        );
        body.extend_from_slice(&payload);
        body.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());

        let url = format!(
            "{}?uploadType=multipart&key={}",
            self.base_url, self.api_key
        );
        let response = self
            .client
            .post(&url)
            .header(
                "content-type",
                format!("multipart/related; boundary={boundary}"),
            )
            .body(body)
            .send()
            .await
            .map_err(|e| MagpieError::Upload {
                message: format!("upload request failed: {e}"),
                source: Some(Box::new(e)),
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(MagpieError::upload(format!(
                "upload API returned {status}: {body}"
            )));
        }

        let value: serde_json::Value =
            response.json().await.map_err(|e| MagpieError::Upload {
                message: format!("failed to parse upload response: {e}"),
                source: Some(Box::new(e)),
            })?;

        let file_uri = extract_file_handle(&value).ok_or_else(|| {
            MagpieError::upload("upload response carried no usable file handle")
        })?;
        let mime_type = value
            .pointer("/file/mimeType")
            .and_then(|v| v.as_str())
            .unwrap_or(mime_type)
            .to_string();

        debug!(uri = %file_uri, "uploaded attachment to remote file store");
        Ok(FileData {
            file_uri,
            mime_type,
        })
    }
}

/// Pulls the file handle out of an upload response.
///
/// Deployed API versions have answered with `file.uri`, `file.name`, and
/// bare `uri`/`name`; all spellings are accepted, in that order.
fn extract_file_handle(value: &serde_json::Value) -> Option<String> {
    ["/file/uri", "/file/name", "/uri", "/name"]
        .iter()
        .filter_map(|p| value.pointer(p))
        .filter_map(|v| v.as_str())
        .find(|s| !s.is_empty())
        .map(str::to_string)
}

/// Staging filename restricted to `[A-Za-z0-9_.-]`, with a random fallback
/// when the attachment carries no name.
fn scratch_filename(name: Option<&str>) -> String {
    let sanitized: String = name
        .unwrap_or("")
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect();

    if sanitized.is_empty() {
        format!("upload-{}", random_token(10))
    } else {
        sanitized
    }
}

fn random_token(len: usize) -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(len)
        .map(char::from)
        .collect()
}
