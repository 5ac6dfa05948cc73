//! Fetching collected coverage from the application under test.
//!
//! The application exposes a test-only export route. Asking it for a group
//! returns everything recorded under that group, serialized by the
//! application's coverage library. The fetcher builds the request, hands it
//! to an [`ExportTransport`] and decodes the answer; any answer that is not
//! coverage data fails the flush with the URL and raw body in the error.
//! There are no retries.

use crate::correlator::CoverageGroup;
use crate::result::{CoverageError, CoverageResult};
use crate::snapshot::CoverageData;

/// Raw answer of the export endpoint
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportResponse {
    /// HTTP status code
    pub status: u16,
    /// Response body
    pub body: Vec<u8>,
}

impl ExportResponse {
    /// A 200 response with `body`
    #[must_use]
    pub fn ok(body: impl Into<Vec<u8>>) -> Self {
        Self {
            status: 200,
            body: body.into(),
        }
    }

    /// Whether the status is 2xx
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.status >= 200 && self.status < 300
    }

    /// Body as text for error messages
    #[must_use]
    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// Performs the GET against the export endpoint
pub trait ExportTransport {
    /// Issue a GET for `url`
    fn get(&self, url: &str) -> CoverageResult<ExportResponse>;
}

/// Export URL for a group: `{base}/?export_code_coverage=true&coverage_group={group}`
#[must_use]
pub fn export_url(base_url: &str, group: &CoverageGroup) -> String {
    let group: String = url::form_urlencoded::byte_serialize(group.as_str().as_bytes()).collect();
    format!(
        "{}/?export_code_coverage=true&coverage_group={group}",
        base_url.trim_end_matches('/')
    )
}

/// Fetches and decodes coverage for a group
#[derive(Debug, Clone)]
pub struct RemoteFetcher<T> {
    transport: T,
}

impl<T: ExportTransport> RemoteFetcher<T> {
    /// Create a fetcher over `transport`
    pub const fn new(transport: T) -> Self {
        Self { transport }
    }

    /// Underlying transport
    pub const fn transport(&self) -> &T {
        &self.transport
    }

    /// Fetch coverage recorded under `group`
    pub fn fetch<C: CoverageData>(
        &self,
        base_url: &str,
        group: &CoverageGroup,
    ) -> CoverageResult<C> {
        let url = export_url(base_url, group);
        tracing::debug!(%url, "requesting coverage export");

        let response = self.transport.get(&url)?;
        if !response.is_success() {
            return Err(CoverageError::MalformedPayload {
                url,
                reason: format!("HTTP status {}", response.status),
                body: response.body_text(),
            });
        }

        C::decode(&response.body).map_err(|e| CoverageError::MalformedPayload {
            reason: e.to_string(),
            body: response.body_text(),
            url,
        })
    }
}

#[cfg(feature = "http")]
pub use http::HttpTransport;

#[cfg(feature = "http")]
mod http {
    use super::{ExportResponse, ExportTransport};
    use crate::result::{CoverageError, CoverageResult};
    use reqwest::blocking::Client;
    use std::time::Duration;

    /// Blocking reqwest transport with a bounded timeout
    #[derive(Debug, Clone)]
    pub struct HttpTransport {
        client: Client,
        timeout: Duration,
    }

    impl HttpTransport {
        /// Create a transport whose requests give up after `timeout`
        pub fn new(timeout: Duration) -> CoverageResult<Self> {
            let client = Client::builder().timeout(timeout).build().map_err(|e| {
                CoverageError::Transport {
                    url: String::new(),
                    message: format!("failed to build HTTP client: {e}"),
                }
            })?;
            Ok(Self { client, timeout })
        }

        /// Configured timeout
        #[must_use]
        pub const fn timeout(&self) -> Duration {
            self.timeout
        }

        fn map_error(&self, url: &str, error: &reqwest::Error) -> CoverageError {
            if error.is_timeout() {
                CoverageError::Timeout {
                    url: url.to_string(),
                    secs: self.timeout.as_secs(),
                }
            } else {
                CoverageError::Transport {
                    url: url.to_string(),
                    message: error.to_string(),
                }
            }
        }
    }

    impl ExportTransport for HttpTransport {
        fn get(&self, url: &str) -> CoverageResult<ExportResponse> {
            let response = self
                .client
                .get(url)
                .send()
                .map_err(|e| self.map_error(url, &e))?;
            let status = response.status().as_u16();
            let body = response.bytes().map_err(|e| self.map_error(url, &e))?;
            Ok(ExportResponse {
                status,
                body: body.to_vec(),
            })
        }
    }
}
