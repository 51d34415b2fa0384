//! Connect Client
//!
//! Builds signed redirect URLs for the hosted payment pages and confirms the
//! signed callbacks that come back.

use std::sync::Arc;

use crate::config::{AccountCredentials, ApiPaths, ConnectConfig};
use crate::confirm::{ConfirmPayload, ConfirmResource};
use crate::error::{ConnectError, Result};
use crate::http::{HttpClient, HttpResponse, ReqwestHttpClient};
use crate::params::{RequestParams, nonce, utc_timestamp};
use crate::resource::{Bill, PreAuthorization, SignableResource, Subscription};
use crate::signature::{sign_params, verify_signature};

/// Where the customer goes after the hosted page, and what comes back
#[derive(Clone, Copy, Debug, Default)]
pub struct Redirect<'a> {
    pub redirect_uri: Option<&'a str>,
    pub cancel_uri: Option<&'a str>,
    pub state: Option<&'a str>,
}

/// Connect client
pub struct Connect {
    credentials: AccountCredentials,
    config: ConnectConfig,
    paths: ApiPaths,
    http: Arc<dyn HttpClient>,
}

impl Connect {
    /// Create a client that confirms over `reqwest`
    pub fn new(credentials: AccountCredentials, config: ConnectConfig) -> Result<Self> {
        let paths = config.api_paths()?;
        Ok(Self {
            credentials,
            config,
            paths,
            http: Arc::new(ReqwestHttpClient::default()),
        })
    }

    /// Create from environment variables
    pub fn from_env() -> Result<Self> {
        Self::new(AccountCredentials::from_env()?, ConnectConfig::from_env()?)
    }

    /// Replace the HTTP client used for confirmation
    #[must_use]
    pub fn with_http_client(mut self, http: Arc<dyn HttpClient>) -> Self {
        self.http = http;
        self
    }

    pub const fn config(&self) -> &ConnectConfig {
        &self.config
    }

    pub const fn paths(&self) -> &ApiPaths {
        &self.paths
    }

    pub fn new_bill_url(&self, bill: &Bill, redirect: Redirect<'_>) -> Result<String> {
        self.new_url(bill, &self.paths.new_bill, redirect)
    }

    pub fn new_subscription_url(
        &self,
        subscription: &Subscription,
        redirect: Redirect<'_>,
    ) -> Result<String> {
        self.new_url(subscription, &self.paths.new_subscription, redirect)
    }

    pub fn new_pre_authorization_url(
        &self,
        pre_authorization: &PreAuthorization,
        redirect: Redirect<'_>,
    ) -> Result<String> {
        self.new_url(pre_authorization, &self.paths.new_pre_authorization, redirect)
    }

    /// Signed URL for `resource` under `api_path`.
    ///
    /// Adds `client_id`, `nonce`, `timestamp` and `signature` automatically.
    /// Values are percent-encoded only after signing.
    pub fn new_url<R: SignableResource + ?Sized>(
        &self,
        resource: &R,
        api_path: &str,
        redirect: Redirect<'_>,
    ) -> Result<String> {
        resource.validate()?;

        let mut params = self.params(redirect);
        params.extend(resource.to_params().iter());

        let signature = sign_params(
            &params,
            self.credentials.app_secret(),
            self.config.signature_algorithm,
        );
        params.insert("signature", signature);

        tracing::debug!(
            resource = resource.resource_key(),
            params = params.len(),
            algorithm = self.config.signature_algorithm.as_str(),
            "Built signed Connect URL"
        );

        Ok(format!("{api_path}?{}", params.to_query_string()))
    }

    /// Base parameters of an outbound request. Absent redirect fields are
    /// left out entirely.
    pub fn params(&self, redirect: Redirect<'_>) -> RequestParams {
        let mut params = RequestParams::new();
        params.insert("client_id", self.credentials.app_id());
        params.insert("nonce", nonce());
        params.insert("timestamp", utc_timestamp());
        params.insert_opt("redirect_uri", redirect.redirect_uri);
        params.insert_opt("cancel_uri", redirect.cancel_uri);
        params.insert_opt("state", redirect.state);
        params
    }

    /// Check a callback's signature without confirming it
    pub fn verify(&self, resource: &ConfirmResource) -> Result<()> {
        resource.validate()?;

        verify_signature(
            &resource.signed_params(),
            self.credentials.app_secret(),
            self.config.signature_algorithm,
            &resource.signature,
        )
        .map_err(|e| {
            tracing::warn!(
                resource_id = %resource.resource_id,
                resource_type = %resource.resource_type,
                error = %e,
                "Rejected Connect callback"
            );
            ConnectError::Signature("invalid signature when confirming resource".into())
        })
    }

    /// Verify a callback and confirm the resource with the provider.
    ///
    /// Nothing is sent unless the signature matches.
    pub async fn confirm(&self, resource: &ConfirmResource) -> Result<HttpResponse> {
        self.verify(resource)?;

        let payload = serde_json::to_string(&ConfirmPayload::from(resource))?;
        let headers = self
            .http
            .basic_auth(self.credentials.app_id(), self.credentials.app_secret())?;

        let response = self.http.post(&self.paths.confirm, headers, payload).await?;

        tracing::info!(
            resource_id = %resource.resource_id,
            resource_type = %resource.resource_type,
            status = response.status,
            "Confirmed Connect resource"
        );

        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::MockHttpClient;
    use crate::resource::IntervalUnit;
    use crate::signature::SignatureAlgorithm;
    use reqwest::header::AUTHORIZATION;
    use rust_decimal_macros::dec;
    use url::Url;

    const SECRET: &str = "secret123";

    fn connect() -> Connect {
        Connect::new(
            AccountCredentials::new("acc1", SECRET),
            ConnectConfig::default().with_base_url("https://connect.test"),
        )
        .unwrap()
    }

    fn query_params(url: &str) -> RequestParams {
        Url::parse(url)
            .unwrap()
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect()
    }

    fn signed_callback(connect: &Connect, state: Option<&str>) -> ConfirmResource {
        let mut resource = ConfirmResource {
            resource_id: "VZUG2SC3PRT5EM".into(),
            resource_type: "bill".into(),
            resource_uri: "https://connect.test/api/v1/bills/VZUG2SC3PRT5EM".into(),
            state: state.map(Into::into),
            signature: String::new(),
        };
        resource.signature = sign_params(
            &resource.signed_params(),
            SECRET,
            connect.config().signature_algorithm,
        );
        resource
    }

    #[test]
    fn test_bill_url_round_trip() {
        let connect = connect();
        let bill = Bill::new("M123", dec!(12.5)).with_name("Two coffees & cake");
        let redirect = Redirect {
            redirect_uri: Some("https://shop.test/done"),
            cancel_uri: Some("https://shop.test/cancel"),
            state: Some("order 42"),
        };

        let url = connect.new_bill_url(&bill, redirect).unwrap();
        assert!(url.starts_with("https://connect.test/connect/bills/new?"));
        assert!(url.contains("state=order%2042"));

        let mut params = query_params(&url);
        let embedded = params.remove("signature").unwrap();
        assert_eq!(params.get("client_id"), Some("acc1"));
        assert_eq!(params.get("bill[name]"), Some("Two coffees & cake"));
        assert_eq!(params.get("bill[amount]"), Some("12.50"));
        assert_eq!(embedded, sign_params(&params, SECRET, SignatureAlgorithm::HmacSha1));
    }

    #[test]
    fn test_subscription_and_pre_authorization_paths() {
        let connect = connect();
        let sub = Subscription::new("M123", dec!(5), 1, IntervalUnit::Month);
        let url = connect.new_subscription_url(&sub, Redirect::default()).unwrap();
        assert!(url.starts_with("https://connect.test/connect/subscriptions/new?"));

        let pre_auth = PreAuthorization::new("M123", dec!(50), 1, IntervalUnit::Week);
        let url = connect.new_pre_authorization_url(&pre_auth, Redirect::default()).unwrap();
        assert!(url.starts_with("https://connect.test/connect/pre_authorizations/new?"));
        assert!(query_params(&url).contains_key("pre_authorization[max_amount]"));
    }

    #[test]
    fn test_optional_fields_omitted() {
        let params = connect().params(Redirect::default());
        let canonical = params.canonical_string();

        assert!(!canonical.contains("redirect_uri"));
        assert!(!canonical.contains("cancel_uri"));
        assert!(!canonical.contains("state"));
        assert_eq!(params.len(), 3);
    }

    #[test]
    fn test_fresh_nonce_per_url() {
        let connect = connect();
        let bill = Bill::new("M123", dec!(1));
        let first = query_params(&connect.new_bill_url(&bill, Redirect::default()).unwrap());
        let second = query_params(&connect.new_bill_url(&bill, Redirect::default()).unwrap());
        assert_ne!(first.get("nonce"), second.get("nonce"));
    }

    #[test]
    fn test_invalid_resource_not_signed() {
        let result = connect().new_bill_url(&Bill::new("", dec!(1)), Redirect::default());
        assert!(matches!(result, Err(ConnectError::InvalidResource(_))));
    }

    #[test]
    fn test_sub_cent_amount_not_signed() {
        let result = connect().new_bill_url(&Bill::new("M1", dec!(0.004)), Redirect::default());
        assert!(matches!(result, Err(ConnectError::InvalidResource(_))));
    }

    #[test]
    fn test_sha256_configuration() {
        let connect = Connect::new(
            AccountCredentials::new("acc1", SECRET),
            ConnectConfig::default().with_signature_algorithm(SignatureAlgorithm::HmacSha256),
        )
        .unwrap();

        let url = connect
            .new_bill_url(&Bill::new("M123", dec!(3)), Redirect::default())
            .unwrap();
        let mut params = query_params(&url);
        let embedded = params.remove("signature").unwrap();
        assert_eq!(embedded.len(), 64);
        assert_eq!(embedded, sign_params(&params, SECRET, SignatureAlgorithm::HmacSha256));
    }

    #[tokio::test]
    async fn test_confirm_posts_once() {
        let http = Arc::new(MockHttpClient::new());
        let connect = connect().with_http_client(http.clone());
        let callback = signed_callback(&connect, Some("order-42"));

        let response = connect.confirm(&callback).await.unwrap();
        assert_eq!(response.status, 200);

        let requests = http.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].url, "https://connect.test/connect/confirm");
        assert_eq!(
            requests[0].body,
            r#"{"resource_id":"VZUG2SC3PRT5EM","resource_type":"bill"}"#
        );
        // base64("acc1:secret123")
        assert_eq!(
            requests[0].headers.get(AUTHORIZATION).unwrap(),
            "Basic YWNjMTpzZWNyZXQxMjM="
        );
    }

    #[tokio::test]
    async fn test_confirm_rejects_tampering() {
        let http = Arc::new(MockHttpClient::new());
        let connect = connect().with_http_client(http.clone());
        let mut callback = signed_callback(&connect, None);
        callback.resource_id.replace_range(0..1, "W");

        let result = connect.confirm(&callback).await;
        assert!(matches!(result, Err(ConnectError::Signature(_))));
        assert!(http.requests().is_empty());
    }

    #[tokio::test]
    async fn test_confirm_rejects_reformatted_signature() {
        let http = Arc::new(MockHttpClient::new());
        let connect = connect().with_http_client(http.clone());

        let mut callback = signed_callback(&connect, None);
        callback.signature = callback.signature.to_uppercase();
        let result = connect.confirm(&callback).await;
        assert!(matches!(result, Err(ConnectError::Signature(_))));

        let mut callback = signed_callback(&connect, None);
        callback.signature = format!("  {}\n", callback.signature);
        assert!(matches!(connect.confirm(&callback).await, Err(ConnectError::Signature(_))));

        assert!(http.requests().is_empty());
    }

    #[tokio::test]
    async fn test_confirm_rejects_changed_state() {
        let http = Arc::new(MockHttpClient::new());
        let connect = connect().with_http_client(http.clone());
        let mut callback = signed_callback(&connect, Some("order-42"));
        callback.state = Some("order-43".into());

        assert!(connect.confirm(&callback).await.is_err());
        assert!(http.requests().is_empty());
    }

    #[tokio::test]
    async fn test_confirm_missing_field() {
        let http = Arc::new(MockHttpClient::new());
        let connect = connect().with_http_client(http.clone());
        let mut callback = signed_callback(&connect, None);
        callback.resource_uri = " ".into();

        let result = connect.confirm(&callback).await;
        assert!(matches!(result, Err(ConnectError::MissingField("resource_uri"))));
        assert!(http.requests().is_empty());
    }

    #[tokio::test]
    async fn test_transport_error_propagates() {
        let http = Arc::new(MockHttpClient::with_status(500));
        let connect = connect().with_http_client(http.clone());
        let callback = signed_callback(&connect, None);

        let result = connect.confirm(&callback).await;
        assert!(matches!(result, Err(ConnectError::HttpStatus { status: 500, .. })));
        assert_eq!(http.requests().len(), 1);
    }
}
