//! HTTP Collaborator
//!
//! The only network call in the Connect flow is the confirmation POST. It goes
//! through [`HttpClient`] so the transport can be swapped or recorded.

mod mock;

pub use mock::{MockHttpClient, RecordedRequest};

use std::time::Duration;

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use reqwest::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};

use crate::error::{ConnectError, Result};

const USER_AGENT: &str = concat!("gocardless-connect-rust/", env!("CARGO_PKG_VERSION"));

/// Response from the provider
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

/// HTTP client trait
///
/// Implementations report transport failures and non-success statuses as
/// errors; callers propagate them unmodified.
#[async_trait]
pub trait HttpClient: Send + Sync {
    /// Headers carrying HTTP Basic credentials plus the JSON content headers
    fn basic_auth(&self, id: &str, secret: &str) -> Result<HeaderMap> {
        let token = BASE64_STANDARD.encode(format!("{id}:{secret}"));
        let mut value = HeaderValue::from_str(&format!("Basic {token}"))
            .map_err(|e| ConnectError::Config(format!("invalid basic auth header: {e}")))?;
        value.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, value);
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        Ok(headers)
    }

    /// POST `body` to `url`
    async fn post(&self, url: &str, headers: HeaderMap, body: String) -> Result<HttpResponse>;
}

/// [`HttpClient`] backed by `reqwest`
#[derive(Clone, Debug)]
pub struct ReqwestHttpClient {
    client: reqwest::Client,
}

impl ReqwestHttpClient {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()?;
        Ok(Self { client })
    }

    /// Wrap an already configured client
    pub const fn from_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

impl Default for ReqwestHttpClient {
    fn default() -> Self {
        Self::from_client(reqwest::Client::new())
    }
}

#[async_trait]
impl HttpClient for ReqwestHttpClient {
    async fn post(&self, url: &str, headers: HeaderMap, body: String) -> Result<HttpResponse> {
        let response = self.client.post(url).headers(headers).body(body).send().await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(ConnectError::HttpStatus {
                status: status.as_u16(),
                body,
            });
        }

        Ok(HttpResponse {
            status: status.as_u16(),
            body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_auth_header() {
        let client = ReqwestHttpClient::default();
        let headers = client.basic_auth("app1", "secret").unwrap();

        // base64("app1:secret")
        assert_eq!(headers.get(AUTHORIZATION).unwrap(), "Basic YXBwMTpzZWNyZXQ=");
        assert!(headers.get(AUTHORIZATION).unwrap().is_sensitive());
        assert_eq!(headers.get(CONTENT_TYPE).unwrap(), "application/json");
    }

    #[test]
    fn test_client_with_timeout() {
        assert!(ReqwestHttpClient::new(Duration::from_secs(5)).is_ok());
    }
}
