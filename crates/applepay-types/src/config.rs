//! Configuration types for Apple Pay gateway integrations.
//!
//! Two kinds of configuration live here:
//!
//! - [`GatewayConfiguration`] / [`ApplePayWebConfiguration`]: what the gateway
//!   reports about the merchant account (`GET ./configuration`). These supply
//!   the defaults merged into payment requests.
//! - [`LiteralOrEnv`] / [`Authorization`]: local configuration helpers for
//!   values that may come from environment variables.
//!
//! # Environment Variable Resolution
//!
//! ```json
//! {
//!   "gateway_url": "https://gateway.example/",   // Literal value
//!   "authorization": "$GATEWAY_TOKENIZATION_KEY" // Simple env var
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use std::fmt;
use std::ops::{Deref, DerefMut};
use std::str::FromStr;

/// Client configuration as reported by the gateway.
///
/// Only the Apple Pay section is modelled; other sections are ignored.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GatewayConfiguration {
    /// Present only when Apple Pay on the Web is enabled for the merchant.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub apple_pay_web: Option<ApplePayWebConfiguration>,
}

/// Merchant-level Apple Pay settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ApplePayWebConfiguration {
    /// Two-letter ISO 3166 country code.
    pub country_code: String,
    /// Three-letter ISO 4217 currency code.
    pub currency_code: String,
    /// Merchant id representing the merchant's association with the gateway.
    pub merchant_identifier: String,
    /// Networks in gateway spelling (`visa`, `mastercard`, ...).
    #[serde(default)]
    pub supported_networks: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub merchant_capabilities: Option<Vec<String>>,
}

impl ApplePayWebConfiguration {
    /// Capability used when the gateway does not list any.
    pub const DEFAULT_MERCHANT_CAPABILITY: &'static str = "supports3DS";

    /// Merchant capabilities to advertise in a payment request.
    pub fn merchant_capabilities(&self) -> Vec<String> {
        match &self.merchant_capabilities {
            Some(capabilities) => capabilities.clone(),
            None => vec![Self::DEFAULT_MERCHANT_CAPABILITY.to_string()],
        }
    }

    /// Supported networks renamed to Apple's spelling.
    ///
    /// The gateway says `mastercard`, Apple Pay says `masterCard`.
    pub fn supported_networks(&self) -> Vec<String> {
        self.supported_networks
            .iter()
            .map(|network| {
                if network == "mastercard" {
                    "masterCard".to_string()
                } else {
                    network.clone()
                }
            })
            .collect()
    }
}

/// Gateway authorization: a tokenization key or a client token.
///
/// The value is never printed by `Debug`.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Authorization(String);

impl Authorization {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Authorization {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Authorization(***)")
    }
}

impl FromStr for Authorization {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.to_string()))
    }
}

// ============================================================================
// Environment Variable Resolution
// ============================================================================

/// A transparent wrapper that resolves environment variables during deserialization.
///
/// Supports both literal values and environment variable references:
/// - Literal: `"sandbox_abc123"`
/// - Simple env var: `"$GATEWAY_AUTHORIZATION"`
/// - Braced env var: `"${GATEWAY_AUTHORIZATION}"`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LiteralOrEnv<T>(T);

impl<T> LiteralOrEnv<T> {
    pub fn from_literal(value: T) -> Self {
        Self(value)
    }

    pub fn inner(&self) -> &T {
        &self.0
    }

    pub fn into_inner(self) -> T {
        self.0
    }

    /// Returns the variable name if the string matches `$VAR` or `${VAR}` syntax.
    fn parse_env_var_syntax(s: &str) -> Option<&str> {
        if let Some(braced) = s.strip_prefix("${").and_then(|s| s.strip_suffix('}')) {
            Some(braced)
        } else if let Some(var_name) = s.strip_prefix('$') {
            let valid = !var_name.is_empty()
                && var_name.chars().all(|c| c.is_alphanumeric() || c == '_');
            valid.then_some(var_name)
        } else {
            None
        }
    }
}

impl<T> Deref for LiteralOrEnv<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<T> DerefMut for LiteralOrEnv<T> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}

impl<'de, T> Deserialize<'de> for LiteralOrEnv<T>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;

        let value = match Self::parse_env_var_syntax(&s) {
            Some(var_name) => std::env::var(var_name).map_err(|_| {
                serde::de::Error::custom(format!(
                    "Environment variable '{}' not found (referenced as '{}')",
                    var_name, s
                ))
            })?,
            None => s,
        };

        let parsed = value
            .parse::<T>()
            .map_err(|e| serde::de::Error::custom(format!("Failed to parse value: {}", e)))?;

        Ok(LiteralOrEnv(parsed))
    }
}

impl<T> Serialize for LiteralOrEnv<T>
where
    T: Serialize,
{
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        self.0.serialize(serializer)
    }
}
