// SPDX-FileCopyrightText: 2026 Magpie Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Attachment download with bounded retries and a response-size ceiling.
//!
//! The fetcher is the only internal suspension-with-backoff in the
//! pipeline. It is not cancellable mid-attempt; callers wanting
//! cancellation race the whole build against an external timeout.

use std::time::Duration;

use futures::StreamExt;
use magpie_core::MagpieError;
use tracing::{debug, warn};

/// Attempts per fetch before the last error is propagated.
const MAX_ATTEMPTS: u32 = 3;

/// Per-request timeout, covering connect and body read.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(20);

/// Hard ceiling on response size. An attempt exceeding it aborts
/// immediately rather than buffering further.
const MAX_RESPONSE_BYTES: u64 = 50 * 1024 * 1024;

/// Base delay for linear backoff between attempts (attempt index x base).
const BACKOFF_BASE: Duration = Duration::from_millis(500);

/// HTTP downloader for attachment bytes.
#[derive(Debug, Clone)]
pub struct Fetcher {
    client: reqwest::Client,
    max_response_bytes: u64,
}

impl Fetcher {
    /// Creates a fetcher with the standard retry and size policy.
    pub fn new() -> Result<Self, MagpieError> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| MagpieError::Fetch {
                message: format!("failed to build HTTP client: {e}"),
                source: Some(Box::new(e)),
            })?;
        Ok(Self {
            client,
            max_response_bytes: MAX_RESPONSE_BYTES,
        })
    }

    /// Lowers the size ceiling (for testing the abort path).
    #[cfg(test)]
    pub fn with_max_response_bytes(mut self, max: u64) -> Self {
        self.max_response_bytes = max;
        self
    }

    /// Downloads the full body at `url`.
    ///
    /// Retries up to three times with linear backoff; on exhaustion the last
    /// underlying error is returned unchanged. Callers translate failures to
    /// user-facing fallbacks rather than aborting a whole build.
    pub async fn fetch(&self, url: &str) -> Result<Vec<u8>, MagpieError> {
        let mut last_error = None;

        for attempt in 1..=MAX_ATTEMPTS {
            if attempt > 1 {
                let delay = BACKOFF_BASE * (attempt - 1);
                debug!(attempt, delay_ms = delay.as_millis() as u64, url, "retrying fetch");
                tokio::time::sleep(delay).await;
            }

            match self.attempt(url).await {
                Ok(bytes) => {
                    debug!(url, size = bytes.len(), attempt, "fetched attachment");
                    return Ok(bytes);
                }
                Err(e) => {
                    warn!(url, attempt, error = %e, "fetch attempt failed");
                    last_error = Some(e);
                }
            }
        }

        Err(last_error
            .unwrap_or_else(|| MagpieError::fetch(format!("fetch failed after retries: {url}"))))
    }

    /// One download attempt, streaming the body under the size ceiling.
    async fn attempt(&self, url: &str) -> Result<Vec<u8>, MagpieError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| MagpieError::Fetch {
                message: format!("request failed: {e}"),
                source: Some(Box::new(e)),
            })?;

        let response = response
            .error_for_status()
            .map_err(|e| MagpieError::Fetch {
                message: format!("server returned error status: {e}"),
                source: Some(Box::new(e)),
            })?;

        // Fast-fail on an advertised length over the ceiling before
        // reading anything.
        if let Some(len) = response.content_length()
            && len > self.max_response_bytes
        {
            return Err(MagpieError::fetch(format!(
                "response of {len} bytes exceeds the {} byte ceiling",
                self.max_response_bytes
            )));
        }

        let mut buf: Vec<u8> = Vec::new();
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| MagpieError::Fetch {
                message: format!("failed reading response body: {e}"),
                source: Some(Box::new(e)),
            })?;
            if (buf.len() + chunk.len()) as u64 > self.max_response_bytes {
                return Err(MagpieError::fetch(format!(
                    "response exceeded the {} byte ceiling",
                    self.max_response_bytes
                )));
            }
            buf.extend_from_slice(&chunk);
        }

        Ok(buf)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn fetch_returns_body_on_success() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/cat.png"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"png-bytes".to_vec()))
            .mount(&server)
            .await;

        let fetcher = Fetcher::new().unwrap();
        let bytes = fetcher
            .fetch(&format!("{}/cat.png", server.uri()))
            .await
            .unwrap();
        assert_eq!(bytes, b"png-bytes");
    }

    #[tokio::test]
    async fn fetch_succeeds_on_second_attempt_without_a_third() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/flaky"))
            .respond_with(ResponseTemplate::new(500))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/flaky"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"ok".to_vec()))
            .expect(1)
            .mount(&server)
            .await;

        let fetcher = Fetcher::new().unwrap();
        let bytes = fetcher
            .fetch(&format!("{}/flaky", server.uri()))
            .await
            .unwrap();
        assert_eq!(bytes, b"ok");
    }

    #[tokio::test]
    async fn fetch_gives_up_after_three_attempts() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/down"))
            .respond_with(ResponseTemplate::new(503))
            .expect(3)
            .mount(&server)
            .await;

        let fetcher = Fetcher::new().unwrap();
        let err = fetcher
            .fetch(&format!("{}/down", server.uri()))
            .await
            .unwrap_err();
        assert!(matches!(err, MagpieError::Fetch { .. }), "got: {err}");
        assert!(err.to_string().contains("error status"), "got: {err}");
    }

    #[tokio::test]
    async fn fetch_aborts_when_body_exceeds_ceiling() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/big"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![0u8; 4096]))
            .mount(&server)
            .await;

        let fetcher = Fetcher::new().unwrap().with_max_response_bytes(1024);
        let err = fetcher
            .fetch(&format!("{}/big", server.uri()))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("ceiling"), "got: {err}");
    }
}
