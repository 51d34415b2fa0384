//! Request Signing
//!
//! Keyed hash over the canonical parameter string. Signing is a pure
//! function of the parameters, the secret and the algorithm, so client and
//! provider derive the same hex digest regardless of map construction order.
//!
//! ```text
//! {timestamp, client_id, nonce}
//!        │  sort by key
//!        ▼
//! client_id=acc1&nonce=abc&timestamp=2024-01-01T00:00:00Z
//!        │  HMAC(secret)
//!        ▼
//! 20107a65f08ef0ce98a5411d8d37b1fb8007fead
//! ```

use std::str::FromStr;

use hmac::digest::KeyInit;
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha1::Sha1;
use sha2::Sha256;

use crate::error::{ConnectError, Result};
use crate::params::RequestParams;

type HmacSha1 = Hmac<Sha1>;
type HmacSha256 = Hmac<Sha256>;

/// Keyed hash used for signatures
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SignatureAlgorithm {
    #[default]
    HmacSha1,
    HmacSha256,
}

impl SignatureAlgorithm {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::HmacSha1 => "hmac-sha1",
            Self::HmacSha256 => "hmac-sha256",
        }
    }

    /// Length of the hex-encoded digest
    pub const fn hex_len(self) -> usize {
        match self {
            Self::HmacSha1 => 40,
            Self::HmacSha256 => 64,
        }
    }
}

impl FromStr for SignatureAlgorithm {
    type Err = ConnectError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "sha1" | "hmac-sha1" => Ok(Self::HmacSha1),
            "sha256" | "hmac-sha256" => Ok(Self::HmacSha256),
            other => Err(ConnectError::Config(format!(
                "unknown signature algorithm '{other}'"
            ))),
        }
    }
}

fn keyed<M: Mac + KeyInit>(secret: &str, message: &str) -> M {
    let mut mac =
        <M as Mac>::new_from_slice(secret.as_bytes()).expect("HMAC can take key of any size");
    mac.update(message.as_bytes());
    mac
}

/// Sign `params` with `secret`, returning the lower-case hex digest
pub fn sign_params(params: &RequestParams, secret: &str, algorithm: SignatureAlgorithm) -> String {
    let canonical = params.canonical_string();
    match algorithm {
        SignatureAlgorithm::HmacSha1 => {
            hex::encode(keyed::<HmacSha1>(secret, &canonical).finalize().into_bytes())
        }
        SignatureAlgorithm::HmacSha256 => {
            hex::encode(keyed::<HmacSha256>(secret, &canonical).finalize().into_bytes())
        }
    }
}

/// Check `signature` against the digest recomputed over `params`.
///
/// The signature must be exactly the lower-case hex digest; padding, upper
/// case or a wrong length is rejected before the constant time comparison.
pub fn verify_signature(
    params: &RequestParams,
    secret: &str,
    algorithm: SignatureAlgorithm,
    signature: &str,
) -> Result<()> {
    let well_formed = signature.len() == algorithm.hex_len()
        && signature.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'));
    if !well_formed {
        return Err(ConnectError::Signature("signature is not lower-case hex".into()));
    }

    let provided = hex::decode(signature)
        .map_err(|_| ConnectError::Signature("signature is not valid hex".into()))?;

    let canonical = params.canonical_string();
    let verified = match algorithm {
        SignatureAlgorithm::HmacSha1 => {
            keyed::<HmacSha1>(secret, &canonical).verify_slice(&provided)
        }
        SignatureAlgorithm::HmacSha256 => {
            keyed::<HmacSha256>(secret, &canonical).verify_slice(&provided)
        }
    };

    verified.map_err(|_| ConnectError::Signature("signature mismatch".into()))
}
