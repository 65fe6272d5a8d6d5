//! Blocking HTTP fetcher backed by reqwest.

use std::time::Duration;

use reqwest::blocking::Client;
use tracing::debug;

use super::{FetchFailure, FetchOutcome, Fetcher};

/// GETs pages over HTTP(S) with a bounded timeout.
///
/// Any non-2xx status counts as a failure.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    /// Builds a fetcher with the given total request timeout and user agent.
    ///
    /// # Errors
    ///
    /// Returns the reqwest error if the TLS backend cannot be initialized.
    pub fn new(timeout: Duration, user_agent: &str) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .build()?;
        Ok(Self { client })
    }
}

impl Fetcher for HttpFetcher {
    fn fetch(&self, url: &str) -> FetchOutcome {
        let response = self
            .client
            .get(url)
            .send()
            .and_then(reqwest::blocking::Response::error_for_status)
            .map_err(|e| FetchFailure::new(url, e.to_string()))?;

        let body = response
            .text()
            .map_err(|e| FetchFailure::new(url, format!("reading body: {e}")))?;
        debug!(url = %url, bytes = body.len(), "fetched page");
        Ok(body)
    }
}
