//! Callback Resources
//!
//! What the provider sends back to `redirect_uri` once the customer has
//! authorized a payment, and the body used to confirm it.

use serde::{Deserialize, Serialize};

use crate::error::{ConnectError, Result};
use crate::params::RequestParams;

/// Signed callback parameters for a newly authorized resource
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfirmResource {
    pub resource_id: String,
    pub resource_type: String,
    pub resource_uri: String,
    #[serde(default)]
    pub state: Option<String>,
    pub signature: String,
}

impl ConfirmResource {
    /// Reject blank required fields
    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("resource_id", &self.resource_id),
            ("resource_type", &self.resource_type),
            ("resource_uri", &self.resource_uri),
            ("signature", &self.signature),
        ] {
            if value.trim().is_empty() {
                return Err(ConnectError::MissingField(name));
            }
        }
        Ok(())
    }

    /// The subset of fields covered by the callback signature.
    /// `state` is included only when non-blank.
    pub fn signed_params(&self) -> RequestParams {
        let mut params = RequestParams::new();
        params.insert("resource_id", self.resource_id.as_str());
        params.insert("resource_type", self.resource_type.as_str());
        params.insert("resource_uri", self.resource_uri.as_str());
        params.insert_opt(
            "state",
            self.state.as_deref().filter(|s| !s.trim().is_empty()),
        );
        params
    }
}

/// JSON body of the confirmation request
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ConfirmPayload<'a> {
    pub resource_id: &'a str,
    pub resource_type: &'a str,
}

impl<'a> From<&'a ConfirmResource> for ConfirmPayload<'a> {
    fn from(resource: &'a ConfirmResource) -> Self {
        Self {
            resource_id: &resource.resource_id,
            resource_type: &resource.resource_type,
        }
    }
}
