//! Mock HTTP Client
//!
//! Records every request instead of sending it. For tests and dry runs.

use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use reqwest::header::HeaderMap;

use super::{HttpClient, HttpResponse};
use crate::error::{ConnectError, Result};

/// A request captured by [`MockHttpClient`]
#[derive(Clone, Debug)]
pub struct RecordedRequest {
    pub url: String,
    pub headers: HeaderMap,
    pub body: String,
}

/// HTTP client that records requests and answers with a fixed status
pub struct MockHttpClient {
    status: u16,
    requests: Mutex<Vec<RecordedRequest>>,
}

impl Default for MockHttpClient {
    fn default() -> Self {
        Self::new()
    }
}

impl MockHttpClient {
    pub fn new() -> Self {
        Self::with_status(200)
    }

    /// Answer every request with `status` (non-2xx yields an error)
    pub const fn with_status(status: u16) -> Self {
        Self {
            status,
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Requests seen so far
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl HttpClient for MockHttpClient {
    async fn post(&self, url: &str, headers: HeaderMap, body: String) -> Result<HttpResponse> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(RecordedRequest {
                url: url.to_string(),
                headers,
                body,
            });

        if !(200..300).contains(&self.status) {
            return Err(ConnectError::HttpStatus {
                status: self.status,
                body: String::new(),
            });
        }

        Ok(HttpResponse {
            status: self.status,
            body: "{}".into(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_records_requests() {
        let client = MockHttpClient::new();
        let response = client
            .post("https://example.com", HeaderMap::new(), "{}".into())
            .await
            .unwrap();

        assert_eq!(response.status, 200);
        let requests = client.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].url, "https://example.com");
    }

    #[tokio::test]
    async fn test_error_status() {
        let client = MockHttpClient::with_status(502);
        let result = client.post("https://example.com", HeaderMap::new(), String::new()).await;

        assert!(matches!(result, Err(ConnectError::HttpStatus { status: 502, .. })));
        assert_eq!(client.requests().len(), 1);
    }
}
