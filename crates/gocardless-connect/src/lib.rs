//! # gocardless-connect
//!
//! Signed redirect URLs and callback confirmation for the GoCardless
//! Connect flow.
//!
//! ## Flow
//!
//! ```text
//! ┌─────────────┐  signed URL   ┌─────────────────┐  signed callback  ┌─────────────┐
//! │  Your Site  │──────────────▶│  GoCardless     │──────────────────▶│  Your Site  │
//! │  (checkout) │               │  Hosted Page    │                   │ (redirect)  │
//! └─────────────┘               └─────────────────┘                   └──────┬──────┘
//!                                                                            │ verify + POST
//!                                                                            ▼
//!                                                                   /connect/confirm
//! ```
//!
//! 1. Build a bill, subscription or pre-authorization and turn it into a
//!    signed URL. The customer is redirected there.
//! 2. The provider redirects back with `resource_id`, `resource_type`,
//!    `resource_uri`, `state` and `signature`.
//! 3. [`Connect::confirm`] recomputes the signature and, only on a match,
//!    confirms the resource with a Basic-Auth POST.
//!
//! Signatures are HMAC-SHA1 (or HMAC-SHA256 when configured) over the
//! key-sorted, unencoded `key=value&...` string, hex encoded.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use gocardless_connect::{AccountCredentials, Bill, Connect, ConnectConfig, Redirect};
//! use rust_decimal_macros::dec;
//!
//! let connect = Connect::new(
//!     AccountCredentials::new("app_id", "app_secret"),
//!     ConnectConfig::default(),
//! )?;
//!
//! let url = connect.new_bill_url(
//!     &Bill::new("MERCHANT_ID", dec!(10)).with_name("Coffee"),
//!     Redirect { redirect_uri: Some("https://shop.example/done"), ..Default::default() },
//! )?;
//!
//! // later, in the redirect handler
//! connect.confirm(&callback).await?;
//! ```

mod config;
mod confirm;
mod connect;
mod error;
pub mod http;
mod params;
mod resource;
mod signature;

pub use config::{AccountCredentials, ApiPaths, ConnectConfig, Environment};
pub use confirm::{ConfirmPayload, ConfirmResource};
pub use connect::{Connect, Redirect};
pub use error::{ConnectError, Result};
pub use http::{HttpClient, HttpResponse, MockHttpClient, ReqwestHttpClient};
pub use params::{RequestParams, format_timestamp, nonce, utc_timestamp};
pub use resource::{Bill, IntervalUnit, PreAuthorization, SignableResource, Subscription, User};
pub use signature::{SignatureAlgorithm, sign_params, verify_signature};
