//! Request Parameters
//!
//! Key-ordered parameter map shared by signing and URL serialization.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};

/// Everything outside the RFC 3986 unreserved set gets encoded
const QUERY_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

/// Parameters of one outbound request, ordered by key
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RequestParams(BTreeMap<String, String>);

impl RequestParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.insert(key.into(), value.into());
    }

    /// Insert only when a value is present; absent values never become keys
    pub fn insert_opt(&mut self, key: impl Into<String>, value: Option<impl Into<String>>) {
        if let Some(value) = value {
            self.insert(key, value);
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn remove(&mut self, key: &str) -> Option<String> {
        self.0.remove(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// `k1=v1&k2=v2` over raw values in key order. This is the exact input
    /// to the signature hash.
    pub fn canonical_string(&self) -> String {
        self.iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect::<Vec<_>>()
            .join("&")
    }

    /// Percent-encoded query string for the final URL
    pub fn to_query_string(&self) -> String {
        self.iter()
            .map(|(k, v)| {
                format!(
                    "{}={}",
                    utf8_percent_encode(k, QUERY_ENCODE_SET),
                    utf8_percent_encode(v, QUERY_ENCODE_SET)
                )
            })
            .collect::<Vec<_>>()
            .join("&")
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for RequestParams {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

impl<K: Into<String>, V: Into<String>> Extend<(K, V)> for RequestParams {
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (k, v) in iter {
            self.insert(k, v);
        }
    }
}

/// Fresh single-use token for an outbound request
pub fn nonce() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}

/// Current UTC time in the provider's timestamp format
pub fn utc_timestamp() -> String {
    format_timestamp(Utc::now())
}

pub fn format_timestamp(at: DateTime<Utc>) -> String {
    at.format(TIMESTAMP_FORMAT).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_canonical_string_sorted_and_raw() {
        let mut params = RequestParams::new();
        params.insert("timestamp", "2024-01-01T00:00:00Z");
        params.insert("client_id", "acc1");
        params.insert("redirect_uri", "https://example.com/done?x=1");

        assert_eq!(
            params.canonical_string(),
            "client_id=acc1&redirect_uri=https://example.com/done?x=1&timestamp=2024-01-01T00:00:00Z"
        );
    }

    #[test]
    fn test_query_string_encodes_keys_and_values() {
        let params: RequestParams = [("bill[amount]", "10.00"), ("state", "a b&c")]
            .into_iter()
            .collect();

        assert_eq!(params.to_query_string(), "bill%5Bamount%5D=10.00&state=a%20b%26c");
    }

    #[test]
    fn test_insert_opt_skips_none() {
        let mut params = RequestParams::new();
        params.insert_opt("state", None::<String>);
        params.insert_opt("cancel_uri", Some("https://example.com/cancel"));

        assert!(!params.contains_key("state"));
        assert_eq!(params.get("cancel_uri"), Some("https://example.com/cancel"));
    }

    #[test]
    fn test_nonce_unique() {
        assert_ne!(nonce(), nonce());
        assert_eq!(nonce().len(), 32);
    }

    #[test]
    fn test_timestamp_format() {
        let at = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        assert_eq!(format_timestamp(at), "2024-01-01T00:00:00Z");
    }
}
