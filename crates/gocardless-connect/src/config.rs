//! Connect Configuration
//!
//! Credentials, target environment and endpoint layout. Everything here is
//! built once at startup and handed to [`Connect`](crate::Connect).

use std::env::VarError;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{ConnectError, Result};
use crate::signature::SignatureAlgorithm;

/// App identifier and secret issued to the merchant integration
#[derive(Clone, PartialEq, Eq)]
pub struct AccountCredentials {
    app_id: String,
    app_secret: String,
}

impl AccountCredentials {
    pub fn new(app_id: impl Into<String>, app_secret: impl Into<String>) -> Self {
        Self {
            app_id: app_id.into(),
            app_secret: app_secret.into(),
        }
    }

    /// Create from environment variables
    pub fn from_env() -> Result<Self> {
        let app_id = std::env::var("GOCARDLESS_APP_ID")
            .map_err(|_| ConnectError::Config("GOCARDLESS_APP_ID not set".into()))?;
        let app_secret = std::env::var("GOCARDLESS_APP_SECRET")
            .map_err(|_| ConnectError::Config("GOCARDLESS_APP_SECRET not set".into()))?;

        Ok(Self::new(app_id, app_secret))
    }

    pub fn app_id(&self) -> &str {
        &self.app_id
    }

    pub fn app_secret(&self) -> &str {
        &self.app_secret
    }
}

impl fmt::Debug for AccountCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccountCredentials")
            .field("app_id", &self.app_id)
            .field("app_secret", &"<redacted>")
            .finish()
    }
}

/// Provider environment
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Production,
    #[default]
    Sandbox,
}

impl Environment {
    pub const fn base_url(self) -> &'static str {
        match self {
            Self::Production => "https://gocardless.com",
            Self::Sandbox => "https://sandbox.gocardless.com",
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Production => "production",
            Self::Sandbox => "sandbox",
        }
    }
}

impl FromStr for Environment {
    type Err = ConnectError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "production" | "live" => Ok(Self::Production),
            "sandbox" => Ok(Self::Sandbox),
            other => Err(ConnectError::Config(format!("unknown environment '{other}'"))),
        }
    }
}

/// Connect client configuration
#[derive(Clone, Debug)]
pub struct ConnectConfig {
    /// Target environment
    pub environment: Environment,

    /// Overrides the environment's base URL (e.g. a local stub server)
    pub base_url: Option<String>,

    /// Keyed hash used for request and callback signatures
    pub signature_algorithm: SignatureAlgorithm,
}

impl Default for ConnectConfig {
    fn default() -> Self {
        Self {
            environment: Environment::Sandbox,
            base_url: None,
            signature_algorithm: SignatureAlgorithm::HmacSha1,
        }
    }
}

impl ConnectConfig {
    pub fn new(environment: Environment) -> Self {
        Self {
            environment,
            ..Default::default()
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    pub const fn with_signature_algorithm(mut self, algorithm: SignatureAlgorithm) -> Self {
        self.signature_algorithm = algorithm;
        self
    }

    /// Read `GOCARDLESS_ENVIRONMENT`, `GOCARDLESS_API_BASE` and
    /// `GOCARDLESS_SIGNATURE_ALGORITHM`. Unset variables fall back to defaults,
    /// unparsable ones are errors.
    pub fn from_env() -> Result<Self> {
        let environment = match optional_var("GOCARDLESS_ENVIRONMENT")? {
            Some(value) => value.parse()?,
            None => Environment::default(),
        };
        let signature_algorithm = match optional_var("GOCARDLESS_SIGNATURE_ALGORITHM")? {
            Some(value) => value.parse()?,
            None => SignatureAlgorithm::default(),
        };
        let base_url =
            optional_var("GOCARDLESS_API_BASE")?.filter(|v| !v.trim().is_empty());

        Ok(Self {
            environment,
            base_url,
            signature_algorithm,
        })
    }

    /// Resolve the endpoint layout for this configuration
    pub fn api_paths(&self) -> Result<ApiPaths> {
        let raw = self
            .base_url
            .as_deref()
            .unwrap_or_else(|| self.environment.base_url());
        ApiPaths::new(raw)
    }
}

/// Unset is `None`; set but not valid unicode is an error
fn optional_var(name: &str) -> Result<Option<String>> {
    lookup_var(name, std::env::var(name))
}

fn lookup_var(
    name: &str,
    value: std::result::Result<String, VarError>,
) -> Result<Option<String>> {
    match value {
        Ok(value) => Ok(Some(value)),
        Err(VarError::NotPresent) => Ok(None),
        Err(VarError::NotUnicode(_)) => {
            Err(ConnectError::Config(format!("{name} is not valid unicode")))
        }
    }
}

/// Connect endpoints derived from a base URL
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ApiPaths {
    pub base: String,
    pub new_bill: String,
    pub new_subscription: String,
    pub new_pre_authorization: String,
    pub confirm: String,
}

impl ApiPaths {
    pub fn new(base_url: &str) -> Result<Self> {
        let parsed = Url::parse(base_url)?;
        if parsed.cannot_be_a_base() {
            return Err(ConnectError::Config(format!("'{base_url}' cannot be a base URL")));
        }

        let base = format!("{}/connect", parsed.as_str().trim_end_matches('/'));
        Ok(Self {
            new_bill: format!("{base}/bills/new"),
            new_subscription: format!("{base}/subscriptions/new"),
            new_pre_authorization: format!("{base}/pre_authorizations/new"),
            confirm: format!("{base}/confirm"),
            base,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_environment_paths() {
        let paths = ConnectConfig::new(Environment::Production).api_paths().unwrap();
        assert_eq!(paths.new_bill, "https://gocardless.com/connect/bills/new");
        assert_eq!(paths.confirm, "https://gocardless.com/connect/confirm");

        let paths = ConnectConfig::default().api_paths().unwrap();
        assert_eq!(
            paths.new_pre_authorization,
            "https://sandbox.gocardless.com/connect/pre_authorizations/new"
        );
    }

    #[test]
    fn test_base_url_override() {
        let paths = ConnectConfig::default()
            .with_base_url("http://localhost:8080/")
            .api_paths()
            .unwrap();
        assert_eq!(paths.new_subscription, "http://localhost:8080/connect/subscriptions/new");
    }

    #[test]
    fn test_invalid_base_url() {
        let result = ConnectConfig::default().with_base_url("not a url").api_paths();
        assert!(matches!(result, Err(ConnectError::Url(_))));
    }

    #[test]
    fn test_environment_parse() {
        assert_eq!("Production".parse::<Environment>().unwrap(), Environment::Production);
        assert_eq!("sandbox".parse::<Environment>().unwrap(), Environment::Sandbox);
        assert!("staging".parse::<Environment>().is_err());
    }

    #[test]
    fn test_non_unicode_variable_rejected() {
        use std::ffi::OsString;

        let result = lookup_var("GOCARDLESS_ENVIRONMENT", Err(VarError::NotPresent));
        assert!(matches!(result, Ok(None)));

        let result = lookup_var(
            "GOCARDLESS_ENVIRONMENT",
            Err(VarError::NotUnicode(OsString::from("sandbox"))),
        );
        assert!(matches!(result, Err(ConnectError::Config(_))));

        let result = lookup_var("GOCARDLESS_ENVIRONMENT", Ok("production".into()));
        assert_eq!(result.unwrap().as_deref(), Some("production"));
    }

    #[test]
    fn test_credentials_debug_redacts_secret() {
        let creds = AccountCredentials::new("app1", "topsecret");
        let printed = format!("{creds:?}");
        assert!(printed.contains("app1"));
        assert!(!printed.contains("topsecret"));
    }
}
