//! Signable Resources
//!
//! Bills, subscriptions and pre-authorizations each describe their own fields.
//! [`SignableResource::to_params`] flattens them into the bracketed key paths
//! the hosted pages expect:
//!
//! ```text
//! Bill { amount: 10, merchant_id: "M1", user: { email } }
//!   → bill[amount]=10.00
//!     bill[merchant_id]=M1
//!     bill[user][email]=...
//! ```

use chrono::{DateTime, SecondsFormat, Utc};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use crate::error::{ConnectError, Result};
use crate::params::RequestParams;

/// A resource that can be embedded in a signed Connect URL
pub trait SignableResource {
    /// Key prefix, e.g. `bill`
    fn resource_key(&self) -> &'static str;

    /// Present fields, in declaration order, excluding the prefill user
    fn fields(&self) -> Vec<(&'static str, String)>;

    /// Customer details to prefill on the hosted page
    fn user(&self) -> Option<&User> {
        None
    }

    /// Fail fast on anything the provider would reject
    fn validate(&self) -> Result<()>;

    /// Flatten into `key[field]` / `key[user][field]` parameters
    fn to_params(&self) -> RequestParams {
        let key = self.resource_key();
        let mut params: RequestParams = self
            .fields()
            .into_iter()
            .map(|(field, value)| (format!("{key}[{field}]"), value))
            .collect();

        if let Some(user) = self.user() {
            params.extend(
                user.fields()
                    .into_iter()
                    .map(|(field, value)| (format!("{key}[user][{field}]"), value)),
            );
        }
        params
    }
}

/// Billing interval unit
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IntervalUnit {
    Day,
    Week,
    Month,
}

impl IntervalUnit {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Day => "day",
            Self::Week => "week",
            Self::Month => "month",
        }
    }
}

impl std::str::FromStr for IntervalUnit {
    type Err = ConnectError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "day" => Ok(Self::Day),
            "week" => Ok(Self::Week),
            "month" => Ok(Self::Month),
            other => Err(ConnectError::InvalidResource(format!(
                "unknown interval unit '{other}'"
            ))),
        }
    }
}

/// Customer prefill details
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub company_name: Option<String>,
    pub billing_address1: Option<String>,
    pub billing_address2: Option<String>,
    pub billing_town: Option<String>,
    pub billing_county: Option<String>,
    pub billing_postcode: Option<String>,
}

impl User {
    fn fields(&self) -> Vec<(&'static str, String)> {
        let mut fields = Vec::new();
        push_opt(&mut fields, "first_name", self.first_name.as_ref());
        push_opt(&mut fields, "last_name", self.last_name.as_ref());
        push_opt(&mut fields, "email", self.email.as_ref());
        push_opt(&mut fields, "company_name", self.company_name.as_ref());
        push_opt(&mut fields, "billing_address1", self.billing_address1.as_ref());
        push_opt(&mut fields, "billing_address2", self.billing_address2.as_ref());
        push_opt(&mut fields, "billing_town", self.billing_town.as_ref());
        push_opt(&mut fields, "billing_county", self.billing_county.as_ref());
        push_opt(&mut fields, "billing_postcode", self.billing_postcode.as_ref());
        fields
    }
}

/// One-off payment
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bill {
    pub amount: Decimal,
    pub merchant_id: String,
    pub name: Option<String>,
    pub description: Option<String>,
    pub user: Option<User>,
}

impl Bill {
    pub fn new(merchant_id: impl Into<String>, amount: Decimal) -> Self {
        Self {
            amount,
            merchant_id: merchant_id.into(),
            name: None,
            description: None,
            user: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_user(mut self, user: User) -> Self {
        self.user = Some(user);
        self
    }
}

impl SignableResource for Bill {
    fn resource_key(&self) -> &'static str {
        "bill"
    }

    fn fields(&self) -> Vec<(&'static str, String)> {
        let mut fields = vec![
            ("amount", format_amount(self.amount)),
            ("merchant_id", self.merchant_id.clone()),
        ];
        push_opt(&mut fields, "name", self.name.as_ref());
        push_opt(&mut fields, "description", self.description.as_ref());
        fields
    }

    fn user(&self) -> Option<&User> {
        self.user.as_ref()
    }

    fn validate(&self) -> Result<()> {
        require_positive("bill amount", self.amount)?;
        require_text("bill merchant_id", &self.merchant_id)
    }
}

/// Recurring fixed-amount payment
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subscription {
    pub amount: Decimal,
    pub merchant_id: String,
    pub interval_length: u32,
    pub interval_unit: IntervalUnit,
    pub name: Option<String>,
    pub description: Option<String>,
    pub interval_count: Option<u32>,
    pub start_at: Option<DateTime<Utc>>,
    pub expires_at: Option<DateTime<Utc>>,
    pub setup_fee: Option<Decimal>,
    pub user: Option<User>,
}

impl Subscription {
    pub fn new(
        merchant_id: impl Into<String>,
        amount: Decimal,
        interval_length: u32,
        interval_unit: IntervalUnit,
    ) -> Self {
        Self {
            amount,
            merchant_id: merchant_id.into(),
            interval_length,
            interval_unit,
            name: None,
            description: None,
            interval_count: None,
            start_at: None,
            expires_at: None,
            setup_fee: None,
            user: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub const fn with_interval_count(mut self, count: u32) -> Self {
        self.interval_count = Some(count);
        self
    }

    pub const fn with_start_at(mut self, start_at: DateTime<Utc>) -> Self {
        self.start_at = Some(start_at);
        self
    }

    pub const fn with_expires_at(mut self, expires_at: DateTime<Utc>) -> Self {
        self.expires_at = Some(expires_at);
        self
    }

    pub const fn with_setup_fee(mut self, fee: Decimal) -> Self {
        self.setup_fee = Some(fee);
        self
    }

    pub fn with_user(mut self, user: User) -> Self {
        self.user = Some(user);
        self
    }
}

impl SignableResource for Subscription {
    fn resource_key(&self) -> &'static str {
        "subscription"
    }

    fn fields(&self) -> Vec<(&'static str, String)> {
        let mut fields = vec![
            ("amount", format_amount(self.amount)),
            ("merchant_id", self.merchant_id.clone()),
            ("interval_length", self.interval_length.to_string()),
            ("interval_unit", self.interval_unit.as_str().to_string()),
        ];
        push_opt(&mut fields, "name", self.name.as_ref());
        push_opt(&mut fields, "description", self.description.as_ref());
        push_opt(&mut fields, "interval_count", self.interval_count);
        push_opt(&mut fields, "start_at", self.start_at.map(format_date));
        push_opt(&mut fields, "expires_at", self.expires_at.map(format_date));
        push_opt(&mut fields, "setup_fee", self.setup_fee.map(format_amount));
        fields
    }

    fn user(&self) -> Option<&User> {
        self.user.as_ref()
    }

    fn validate(&self) -> Result<()> {
        require_positive("subscription amount", self.amount)?;
        require_text("subscription merchant_id", &self.merchant_id)?;
        require_interval("subscription interval_length", self.interval_length)?;
        if let (Some(start), Some(expires)) = (self.start_at, self.expires_at) {
            if expires <= start {
                return Err(ConnectError::InvalidResource(
                    "subscription expires_at must be after start_at".into(),
                ));
            }
        }
        Ok(())
    }
}

/// Variable-amount mandate with a per-interval ceiling
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreAuthorization {
    pub max_amount: Decimal,
    pub merchant_id: String,
    pub interval_length: u32,
    pub interval_unit: IntervalUnit,
    pub name: Option<String>,
    pub description: Option<String>,
    pub interval_count: Option<u32>,
    pub expires_at: Option<DateTime<Utc>>,
    pub calendar_intervals: Option<bool>,
    pub setup_fee: Option<Decimal>,
    pub user: Option<User>,
}

impl PreAuthorization {
    pub fn new(
        merchant_id: impl Into<String>,
        max_amount: Decimal,
        interval_length: u32,
        interval_unit: IntervalUnit,
    ) -> Self {
        Self {
            max_amount,
            merchant_id: merchant_id.into(),
            interval_length,
            interval_unit,
            name: None,
            description: None,
            interval_count: None,
            expires_at: None,
            calendar_intervals: None,
            setup_fee: None,
            user: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub const fn with_interval_count(mut self, count: u32) -> Self {
        self.interval_count = Some(count);
        self
    }

    pub const fn with_expires_at(mut self, expires_at: DateTime<Utc>) -> Self {
        self.expires_at = Some(expires_at);
        self
    }

    pub const fn with_calendar_intervals(mut self, calendar_intervals: bool) -> Self {
        self.calendar_intervals = Some(calendar_intervals);
        self
    }

    pub const fn with_setup_fee(mut self, fee: Decimal) -> Self {
        self.setup_fee = Some(fee);
        self
    }

    pub fn with_user(mut self, user: User) -> Self {
        self.user = Some(user);
        self
    }
}

impl SignableResource for PreAuthorization {
    fn resource_key(&self) -> &'static str {
        "pre_authorization"
    }

    fn fields(&self) -> Vec<(&'static str, String)> {
        let mut fields = vec![
            ("max_amount", format_amount(self.max_amount)),
            ("merchant_id", self.merchant_id.clone()),
            ("interval_length", self.interval_length.to_string()),
            ("interval_unit", self.interval_unit.as_str().to_string()),
        ];
        push_opt(&mut fields, "name", self.name.as_ref());
        push_opt(&mut fields, "description", self.description.as_ref());
        push_opt(&mut fields, "interval_count", self.interval_count);
        push_opt(&mut fields, "expires_at", self.expires_at.map(format_date));
        push_opt(&mut fields, "calendar_intervals", self.calendar_intervals);
        push_opt(&mut fields, "setup_fee", self.setup_fee.map(format_amount));
        fields
    }

    fn user(&self) -> Option<&User> {
        self.user.as_ref()
    }

    fn validate(&self) -> Result<()> {
        require_positive("pre_authorization max_amount", self.max_amount)?;
        require_text("pre_authorization merchant_id", &self.merchant_id)?;
        require_interval("pre_authorization interval_length", self.interval_length)
    }
}

fn push_opt<T: ToString>(
    fields: &mut Vec<(&'static str, String)>,
    name: &'static str,
    value: Option<T>,
) {
    if let Some(value) = value {
        fields.push((name, value.to_string()));
    }
}

/// Round to whole cents, halves away from zero
fn round_amount(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

fn format_amount(amount: Decimal) -> String {
    format!("{:.2}", round_amount(amount))
}

fn format_date(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Secs, true)
}

fn require_text(name: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(ConnectError::InvalidResource(format!("{name} is required")));
    }
    Ok(())
}

/// Checks the amount as it will be signed, i.e. after rounding to cents
fn require_positive(name: &str, amount: Decimal) -> Result<()> {
    if round_amount(amount) <= Decimal::ZERO {
        return Err(ConnectError::InvalidResource(format!(
            "{name} must be positive, got {amount}"
        )));
    }
    Ok(())
}

fn require_interval(name: &str, length: u32) -> Result<()> {
    if length == 0 {
        return Err(ConnectError::InvalidResource(format!("{name} must be at least 1")));
    }
    Ok(())
}
